use crate::error::RenameError;
use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_RAW_EXTENSION: &str = ".RW2";
pub const DEFAULT_DATETIME_FIELD: &str = "DateTimeOriginal";
pub const DEFAULT_INPUT_PATTERN: &str = "%Y:%m:%d %H:%M:%S";
pub const DEFAULT_OUTPUT_PATTERN: &str = "%Y_%m%d_%H%M%S";

/// Constants that drive scanning and naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Extension of the raw sibling, with or without the leading dot.
    pub raw_extension: String,
    /// Metadata tag holding the capture time.
    pub datetime_field: String,
    /// `chrono` pattern the tag value is parsed with.
    pub input_pattern: String,
    /// `chrono` pattern the new base name is formatted with.
    pub output_pattern: String,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            raw_extension: DEFAULT_RAW_EXTENSION.to_string(),
            datetime_field: DEFAULT_DATETIME_FIELD.to_string(),
            input_pattern: DEFAULT_INPUT_PATTERN.to_string(),
            output_pattern: DEFAULT_OUTPUT_PATTERN.to_string(),
        }
    }
}

impl RenameConfig {
    /// Raw extension normalized to carry exactly one leading dot.
    pub fn raw_extension_with_dot(&self) -> String {
        format!(".{}", self.raw_extension.trim_start_matches('.'))
    }

    pub fn validate(&self) -> Result<(), RenameError> {
        let checks = [
            ("raw_extension", self.raw_extension.trim_start_matches('.')),
            ("datetime_field", self.datetime_field.as_str()),
            ("input_pattern", self.input_pattern.as_str()),
            ("output_pattern", self.output_pattern.as_str()),
        ];
        for (key, value) in checks {
            if value.trim().is_empty() {
                return Err(RenameError::InvalidConfig(format!("{key} must not be empty")));
            }
        }
        for (key, pattern) in [
            ("input_pattern", &self.input_pattern),
            ("output_pattern", &self.output_pattern),
        ] {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(RenameError::InvalidConfig(format!(
                    "{key} is not a valid date pattern: {pattern}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "photo-date-renamer", "photo-date-renamer")
        .context("could not resolve the OS configuration directory")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

/// Loads the configuration from the OS config directory, falling back to
/// defaults when no file exists there.
pub fn load_config() -> Result<RenameConfig> {
    let paths = app_paths()?;
    if !paths.config_path.exists() {
        return Ok(RenameConfig::default());
    }
    load_config_from(&paths.config_path)
}

pub fn load_config_from(path: &Path) -> Result<RenameConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read config file: {}", path.display()))?;
    let config = toml::from_str::<RenameConfig>(&raw)
        .with_context(|| format!("could not parse config file: {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{load_config_from, RenameConfig};
    use crate::error::RenameError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_documented_constants() {
        let config = RenameConfig::default();
        assert_eq!(config.raw_extension, ".RW2");
        assert_eq!(config.datetime_field, "DateTimeOriginal");
        assert_eq!(config.input_pattern, "%Y:%m:%d %H:%M:%S");
        assert_eq!(config.output_pattern, "%Y_%m%d_%H%M%S");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn raw_extension_is_normalized_to_one_dot() {
        let mut config = RenameConfig {
            raw_extension: "ORF".to_string(),
            ..RenameConfig::default()
        };
        assert_eq!(config.raw_extension_with_dot(), ".ORF");
        config.raw_extension = "..dng".to_string();
        assert_eq!(config.raw_extension_with_dot(), ".dng");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "raw_extension = \".DNG\"\n").expect("write config");

        let config = load_config_from(&path).expect("config should load");
        assert_eq!(config.raw_extension, ".DNG");
        assert_eq!(config.datetime_field, "DateTimeOriginal");
    }

    #[test]
    fn empty_field_name_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "datetime_field = \"  \"\n").expect("write config");

        let err = load_config_from(&path).expect_err("empty field must fail");
        assert!(matches!(
            err.downcast_ref::<RenameError>(),
            Some(RenameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn broken_date_pattern_is_rejected() {
        let config = RenameConfig {
            output_pattern: "%Y_%Q".to_string(),
            ..RenameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RenameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn malformed_file_reports_path() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "raw_extension = [").expect("write config");

        let err = load_config_from(&path).expect_err("broken toml must fail");
        assert!(err.to_string().contains("config.toml"));
    }
}
