use anyhow::Result;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::Path;

/// Tag name to display value, as returned by a metadata reader.
pub type TagMap = HashMap<String, String>;

/// Source of embedded photo metadata.
pub trait MetadataReader {
    /// Reads every tag of `path` the reader understands. Unreadable files are
    /// reported as errors; callers decide whether that is fatal.
    fn read_tags(&self, path: &Path) -> Result<TagMap>;
}

/// Parses a capture time with the given `chrono` pattern. Returns `None` when
/// the value does not match.
pub fn parse_capture_time(value: &str, pattern: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim().trim_matches('"'), pattern).ok()
}

/// Formats a capture time into the base of the new file name.
pub fn format_name_base(date: &NaiveDateTime, pattern: &str) -> String {
    date.format(pattern).to_string()
}
