use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    Jpg,
    Jpeg,
    Other,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("invalid enforced extension '{0}' (expected jpg, jpeg or empty)")]
    Invalid(String),
}

impl ExtensionKind {
    /// Classifies an extension given with or without its leading dot.
    pub fn classify(extension: &str) -> Self {
        let trimmed = extension.strip_prefix('.').unwrap_or(extension);
        if trimmed.eq_ignore_ascii_case("jpg") {
            Self::Jpg
        } else if trimmed.eq_ignore_ascii_case("jpeg") {
            Self::Jpeg
        } else {
            Self::Other
        }
    }

    pub fn of_path(path: &Path) -> Self {
        path.extension()
            .map(|ext| Self::classify(&ext.to_string_lossy()))
            .unwrap_or(Self::Other)
    }

    pub fn is_image(self) -> bool {
        matches!(self, Self::Jpg | Self::Jpeg)
    }

    /// Canonical spelling with the leading dot, used when an extension is enforced.
    pub fn canonical(self) -> Option<&'static str> {
        match self {
            Self::Jpg => Some(".jpg"),
            Self::Jpeg => Some(".jpeg"),
            Self::Other => None,
        }
    }

    /// The other member of the jpg/jpeg pair.
    pub fn alternate(self) -> Option<Self> {
        match self {
            Self::Jpg => Some(Self::Jpeg),
            Self::Jpeg => Some(Self::Jpg),
            Self::Other => None,
        }
    }
}

/// Parses the value of the enforce-extension option.
///
/// Empty input means "keep the original extension" and yields `Ok(None)`.
/// `jpg` and `jpeg` are accepted in any case, with or without a leading dot.
pub fn parse_enforced_extension(input: &str) -> Result<Option<ExtensionKind>, ExtensionError> {
    let trimmed = input.trim();
    let bare = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if bare.is_empty() {
        return Ok(None);
    }
    if bare.starts_with('.') {
        return Err(ExtensionError::Invalid(input.to_string()));
    }
    match ExtensionKind::classify(bare) {
        ExtensionKind::Other => Err(ExtensionError::Invalid(input.to_string())),
        kind => Ok(Some(kind)),
    }
}

/// Splits a file name into stem and extension (with its dot). A name without
/// a dot, or a dotfile such as `.hidden`, has an empty extension.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_ignores_case_and_dot() {
        assert_eq!(ExtensionKind::classify("JPG"), ExtensionKind::Jpg);
        assert_eq!(ExtensionKind::classify(".jpeg"), ExtensionKind::Jpeg);
        assert_eq!(ExtensionKind::classify("JpEg"), ExtensionKind::Jpeg);
        assert_eq!(ExtensionKind::classify("RW2"), ExtensionKind::Other);
        assert_eq!(ExtensionKind::classify(""), ExtensionKind::Other);
    }

    #[test]
    fn of_path_reads_last_extension() {
        assert_eq!(
            ExtensionKind::of_path(Path::new("/tmp/a.b.JPG")),
            ExtensionKind::Jpg
        );
        assert_eq!(
            ExtensionKind::of_path(Path::new("/tmp/noext")),
            ExtensionKind::Other
        );
    }

    #[test]
    fn parse_enforced_accepts_known_values() {
        assert_eq!(parse_enforced_extension(""), Ok(None));
        assert_eq!(parse_enforced_extension("."), Ok(None));
        assert_eq!(parse_enforced_extension("JPG"), Ok(Some(ExtensionKind::Jpg)));
        assert_eq!(
            parse_enforced_extension(".Jpeg"),
            Ok(Some(ExtensionKind::Jpeg))
        );
    }

    #[test]
    fn parse_enforced_rejects_other_values() {
        let err = parse_enforced_extension("png").expect_err("png must be rejected");
        assert_eq!(err, ExtensionError::Invalid("png".to_string()));
        assert!(parse_enforced_extension("..jpg").is_err());
    }

    #[test]
    fn split_extension_keeps_dot() {
        assert_eq!(split_extension("IMG1.JPG"), ("IMG1", ".JPG"));
        assert_eq!(split_extension("a.b.jpeg"), ("a.b", ".jpeg"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }
}
