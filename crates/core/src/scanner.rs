use crate::config::RenameConfig;
use crate::error::RenameError;
use crate::existence::ExistenceOracle;
use crate::extension::{split_extension, ExtensionKind};
use crate::metadata::{parse_capture_time, MetadataReader};
use anyhow::Result;
use chrono::NaiveDateTime;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// An image file eligible for renaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source_path: PathBuf,
    pub captured_at: NaiveDateTime,
    pub raw_sibling: Option<RawSibling>,
}

impl Candidate {
    pub fn file_name(&self) -> String {
        file_name_of(&self.source_path)
    }
}

/// Raw file sharing the candidate's stem, with its on-disk spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSibling {
    pub path: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub scanned_entries: usize,
    pub skipped_not_file: usize,
    pub skipped_non_image: usize,
    pub skipped_unreadable: usize,
    pub skipped_missing_field: usize,
    pub skipped_bad_timestamp: usize,
    pub raw_siblings: usize,
    pub candidates: usize,
}

/// Fails unless `directory` exists and is a directory.
pub fn ensure_directory(directory: &Path) -> Result<(), RenameError> {
    if !directory.exists() {
        return Err(RenameError::DirectoryNotFound(directory.to_path_buf()));
    }
    if !directory.is_dir() {
        return Err(RenameError::NotADirectory(directory.to_path_buf()));
    }
    Ok(())
}

/// Starts a lazy scan of the immediate children of `directory`.
///
/// Entries are visited in file-name order. Anything that cannot become a
/// [`Candidate`] is logged, counted in [`ScanStats`] and skipped; only a
/// missing directory or an invalid configuration fails the scan up front.
pub fn scan<'a, R>(directory: &Path, config: &'a RenameConfig, reader: &'a R) -> Result<Scan<'a, R>>
where
    R: MetadataReader + ?Sized,
{
    ensure_directory(directory)?;
    config.validate()?;

    let entries = WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    Ok(Scan {
        directory: directory.to_path_buf(),
        entries,
        config,
        reader,
        oracle: ExistenceOracle::new(),
        raw_extension: config.raw_extension_with_dot(),
        claimed_raw: HashSet::new(),
        stats: ScanStats::default(),
    })
}

pub struct Scan<'a, R: MetadataReader + ?Sized> {
    directory: PathBuf,
    entries: walkdir::IntoIter,
    config: &'a RenameConfig,
    reader: &'a R,
    oracle: ExistenceOracle,
    raw_extension: String,
    claimed_raw: HashSet<String>,
    stats: ScanStats,
}

impl<R: MetadataReader + ?Sized> Scan<'_, R> {
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    fn inspect(&mut self, path: &Path) -> Option<Candidate> {
        if !ExtensionKind::of_path(path).is_image() {
            debug!("skip (not an image): {}", path.display());
            self.stats.skipped_non_image += 1;
            return None;
        }

        let tags = match self.reader.read_tags(path) {
            Ok(tags) => tags,
            Err(err) => {
                debug!("skip (metadata unreadable): {}: {err:#}", path.display());
                self.stats.skipped_unreadable += 1;
                return None;
            }
        };

        let Some(raw_value) = tags.get(&self.config.datetime_field) else {
            debug!(
                "skip (no {} tag): {}",
                self.config.datetime_field,
                path.display()
            );
            self.stats.skipped_missing_field += 1;
            return None;
        };

        let Some(captured_at) = parse_capture_time(raw_value, &self.config.input_pattern) else {
            debug!(
                "skip (unparseable {} '{}'): {}",
                self.config.datetime_field,
                raw_value,
                path.display()
            );
            self.stats.skipped_bad_timestamp += 1;
            return None;
        };

        let raw_sibling = self.find_raw_sibling(path);
        self.stats.candidates += 1;
        trace!(
            "candidate {} captured {} raw {:?}",
            path.display(),
            captured_at,
            raw_sibling.as_ref().map(|raw| &raw.file_name)
        );
        Some(Candidate {
            source_path: path.to_path_buf(),
            captured_at,
            raw_sibling,
        })
    }

    fn find_raw_sibling(&mut self, path: &Path) -> Option<RawSibling> {
        let file_name = file_name_of(path);
        let (stem, _) = split_extension(&file_name);
        let raw_name = format!("{}{}", stem, self.raw_extension);

        // Nothing is renamed while scanning, so one listing serves every probe.
        let lookup = match self.oracle.exists_ci(&self.directory, &raw_name, true) {
            Ok(lookup) => lookup,
            Err(err) => {
                warn!(
                    "could not look up raw sibling {} in {}: {err}",
                    raw_name,
                    self.directory.display()
                );
                return None;
            }
        };
        let on_disk = lookup.original_name()?.to_string();

        if !self.claimed_raw.insert(on_disk.to_lowercase()) {
            warn!(
                "raw file {} already paired with another image; not pairing it with {}",
                on_disk, file_name
            );
            return None;
        }

        self.stats.raw_siblings += 1;
        Some(RawSibling {
            path: self.directory.join(&on_disk),
            file_name: on_disk,
        })
    }
}

impl<R: MetadataReader + ?Sized> Iterator for Scan<'_, R> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skip unreadable entry in {}: {err}", self.directory.display());
                    continue;
                }
            };
            self.stats.scanned_entries += 1;

            if !entry.file_type().is_file() {
                debug!("skip (not a regular file): {}", entry.path().display());
                self.stats.skipped_not_file += 1;
                continue;
            }

            if let Some(candidate) = self.inspect(entry.path()) {
                return Some(candidate);
            }
        }
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_default()
}
