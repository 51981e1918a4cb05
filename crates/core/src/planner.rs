use crate::config::RenameConfig;
use crate::existence::ExistenceOracle;
use crate::extension::{split_extension, ExtensionKind};
use crate::letters::encode_letters;
use crate::metadata::{format_name_base, MetadataReader};
use crate::scanner::{scan, Candidate, ScanStats};
use anyhow::{Context, Result};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Extension forced onto the image file. The raw sibling keeps its own.
    pub enforced_extension: Option<ExtensionKind>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PairKind {
    Image,
    Raw,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenamePair {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub kind: PairKind,
    /// False when source and target are the exact same path.
    pub do_rename: bool,
}

impl RenamePair {
    fn new(source_path: PathBuf, target_path: PathBuf, kind: PairKind) -> Self {
        let do_rename = source_path != target_path;
        Self {
            source_path,
            target_path,
            kind,
            do_rename,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub candidates: usize,
    pub pairs: usize,
    pub renames: usize,
    pub unchanged: usize,
    pub suffixed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenamePlan {
    pub directory: PathBuf,
    pub enforced_extension: Option<ExtensionKind>,
    pub pairs: Vec<RenamePair>,
    pub stats: PlanStats,
    #[serde(default)]
    pub scan: ScanStats,
}

impl RenamePlan {
    pub fn renames(&self) -> impl Iterator<Item = &RenamePair> {
        self.pairs.iter().filter(|pair| pair.do_rename)
    }

    pub fn rename_count(&self) -> usize {
        self.renames().count()
    }
}

/// Target names claimed so far in one planning pass.
///
/// Names are compared without case: on a case-insensitive file system two
/// claims that differ only in case would land on the same file.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    claimed: HashSet<String>,
}

impl TargetRegistry {
    pub fn is_claimed(&self, name: &str) -> bool {
        self.claimed.contains(&name.to_lowercase())
    }

    /// Returns false when the name was already claimed.
    pub fn claim(&mut self, name: &str) -> bool {
        self.claimed.insert(name.to_lowercase())
    }
}

/// Scans `directory` and builds its rename plan.
pub fn plan_directory<R>(
    directory: &Path,
    reader: &R,
    options: &PlanOptions,
    config: &RenameConfig,
) -> Result<RenamePlan>
where
    R: MetadataReader + ?Sized,
{
    let mut candidates = scan(directory, config, reader)?;
    let mut oracle = ExistenceOracle::new();
    let mut plan = build_plan(directory, &mut candidates, options, config, &mut oracle)?;
    plan.scan = candidates.stats().clone();
    info!(
        "planned {} rename(s) for {} candidate(s) in {}",
        plan.stats.renames,
        plan.stats.candidates,
        directory.display()
    );
    Ok(plan)
}

/// Assigns every candidate a collision-free target name.
///
/// Candidates are handled in iteration order. For each one the suffix counter
/// starts at -1 (no suffix) and grows until neither the image target nor the
/// raw target is taken, so the shortest free suffix always wins. Planning reads
/// the directory but never changes it.
pub fn build_plan<I>(
    directory: &Path,
    candidates: I,
    options: &PlanOptions,
    config: &RenameConfig,
    oracle: &mut ExistenceOracle,
) -> Result<RenamePlan>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut resolver = CollisionResolver {
        directory,
        oracle,
        registry: TargetRegistry::default(),
    };
    let mut pairs = Vec::new();
    let mut stats = PlanStats::default();

    for candidate in candidates {
        stats.candidates += 1;
        let base = format_name_base(&candidate.captured_at, &config.output_pattern);
        let source_name = candidate.file_name();
        let (_, original_extension) = split_extension(&source_name);
        let extension = match options.enforced_extension.and_then(ExtensionKind::canonical) {
            Some(enforced) => enforced.to_string(),
            None => original_extension.to_string(),
        };

        let names = resolver.resolve_collision(&candidate, &base, &extension)?;
        if names.counter >= 0 {
            stats.suffixed += 1;
            debug!(
                "{}: suffix '{}' needed for {}",
                source_name,
                encode_letters(names.counter),
                base
            );
        }

        pairs.push(RenamePair::new(
            candidate.source_path.clone(),
            directory.join(&names.image),
            PairKind::Image,
        ));
        if let (Some(raw), Some(raw_target)) = (&candidate.raw_sibling, names.raw) {
            pairs.push(RenamePair::new(
                raw.path.clone(),
                directory.join(raw_target),
                PairKind::Raw,
            ));
        }
    }

    stats.pairs = pairs.len();
    stats.renames = pairs.iter().filter(|p| p.do_rename).count();
    stats.unchanged = stats.pairs - stats.renames;

    Ok(RenamePlan {
        directory: directory.to_path_buf(),
        enforced_extension: options.enforced_extension,
        pairs,
        stats,
        scan: ScanStats::default(),
    })
}

struct ResolvedNames {
    counter: i64,
    image: String,
    raw: Option<String>,
}

struct CollisionResolver<'a> {
    directory: &'a Path,
    oracle: &'a mut ExistenceOracle,
    registry: TargetRegistry,
}

impl CollisionResolver<'_> {
    fn resolve_collision(
        &mut self,
        candidate: &Candidate,
        base: &str,
        extension: &str,
    ) -> Result<ResolvedNames> {
        let source_name = candidate.file_name();
        let alternate_extension = ExtensionKind::classify(extension)
            .alternate()
            .and_then(ExtensionKind::canonical);
        let raw_extension = candidate
            .raw_sibling
            .as_ref()
            .map(|raw| split_extension(&raw.file_name).1.to_string());

        let mut counter = -1i64;
        loop {
            let suffix = encode_letters(counter);
            let image = format!("{base}{suffix}{extension}");
            let alternate = alternate_extension
                .as_ref()
                .map(|ext| format!("{base}{suffix}{ext}"));
            let raw = raw_extension
                .as_ref()
                .map(|ext| format!("{base}{suffix}{ext}"));

            if self.is_available(&image, alternate.as_deref(), &source_name)?
                && self.is_raw_available(raw.as_deref(), candidate)?
            {
                self.registry.claim(&image);
                if let Some(raw) = raw.as_deref() {
                    self.registry.claim(raw);
                }
                trace!("{} -> {} (raw {:?})", source_name, image, raw);
                return Ok(ResolvedNames {
                    counter,
                    image,
                    raw,
                });
            }
            counter += 1;
        }
    }

    fn is_available(
        &mut self,
        target: &str,
        alternate: Option<&str>,
        own_name: &str,
    ) -> Result<bool> {
        if target == own_name {
            return Ok(true);
        }
        if self.registry.is_claimed(target) || self.on_disk(target, own_name, false)? {
            return Ok(false);
        }
        let Some(alternate) = alternate else {
            return Ok(true);
        };
        // The listing was just refreshed by the probe above.
        Ok(!self.registry.is_claimed(alternate) && !self.on_disk(alternate, own_name, true)?)
    }

    fn is_raw_available(&mut self, target: Option<&str>, candidate: &Candidate) -> Result<bool> {
        let (Some(target), Some(raw)) = (target, candidate.raw_sibling.as_ref()) else {
            return Ok(true);
        };
        if target == raw.file_name {
            return Ok(true);
        }
        Ok(!self.registry.is_claimed(target) && !self.on_disk(target, &raw.file_name, true)?)
    }

    /// True when some entry other than `own_name` occupies `name` on disk.
    fn on_disk(&mut self, name: &str, own_name: &str, use_cache: bool) -> Result<bool> {
        let lookup = self
            .oracle
            .exists_ci(self.directory, name, use_cache)
            .with_context(|| format!("could not list directory: {}", self.directory.display()))?;
        Ok(lookup.has_other_than(own_name))
    }
}
