use log::trace;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Result of a case-insensitive existence probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lookup {
    /// On-disk spellings matching the probed name, sorted. A case-insensitive
    /// file system holds at most one; a case-sensitive one may hold several.
    pub matches: Vec<String>,
}

impl Lookup {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn found(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Name of the matching entry as it is spelled on disk.
    pub fn original_name(&self) -> Option<&str> {
        self.matches.first().map(String::as_str)
    }

    /// True when some match is not spelled exactly `name`.
    pub fn has_other_than(&self, name: &str) -> bool {
        self.matches.iter().any(|m| m != name)
    }
}

#[derive(Debug)]
struct DirectoryListing {
    directory: PathBuf,
    names: HashMap<String, Vec<String>>,
}

/// Answers "is there an entry with this name in this directory, ignoring case?".
///
/// The oracle keeps one cached listing tagged with the directory it was read
/// from. A cached answer can be stale if the directory changed after the scan,
/// so callers pass `use_cache = true` only while they know nothing has been
/// renamed since the last uncached probe.
#[derive(Debug, Default)]
pub struct ExistenceOracle {
    cache: Option<DirectoryListing>,
    scans: usize,
}

impl ExistenceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists_ci(
        &mut self,
        directory: &Path,
        filename: &str,
        use_cache: bool,
    ) -> io::Result<Lookup> {
        if filename.is_empty() {
            return Ok(Lookup::missing());
        }

        let reusable = use_cache
            && self
                .cache
                .as_ref()
                .is_some_and(|listing| listing.directory == directory);
        if !reusable {
            self.cache = Some(read_listing(directory)?);
            self.scans += 1;
        }

        let key = filename.to_lowercase();
        let lookup = self
            .cache
            .as_ref()
            .and_then(|listing| listing.names.get(&key))
            .map(|names| Lookup {
                matches: names.clone(),
            })
            .unwrap_or_default();
        trace!(
            "exists_ci {} in {} (cached={}): {:?}",
            filename,
            directory.display(),
            reusable,
            lookup.matches
        );
        Ok(lookup)
    }

    /// Number of directory reads performed so far.
    pub fn scan_count(&self) -> usize {
        self.scans
    }
}

fn read_listing(directory: &Path) -> io::Result<DirectoryListing> {
    let mut names = HashMap::<String, Vec<String>>::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        names.entry(name.to_lowercase()).or_default().push(name);
    }
    for variants in names.values_mut() {
        variants.sort();
    }
    Ok(DirectoryListing {
        directory: directory.to_path_buf(),
        names,
    })
}
