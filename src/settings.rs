//! CLI settings
//!
//! Optional TOML settings file for the `tabula` binary, supplying path and
//! output defaults so invocations don't have to repeat flags. Flags always
//! win over settings; settings win over built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing a settings file
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How the CLI serializes records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Text,
}

/// Merged settings for the `tabula` binary.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Index file path.
    pub index: Option<PathBuf>,
    /// Template directory.
    pub templates: Option<PathBuf>,
    /// Default output format.
    pub format: Option<OutputFormat>,
}

/// TOML structure for deserializing settings
#[derive(Deserialize)]
struct TomlSettings {
    paths: Option<TomlPaths>,
    output: Option<TomlOutput>,
}

#[derive(Deserialize)]
struct TomlPaths {
    index: Option<PathBuf>,
    templates: Option<PathBuf>,
}

#[derive(Deserialize)]
struct TomlOutput {
    format: Option<OutputFormat>,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load settings from a TOML string
    pub fn from_str(content: &str) -> Result<Self, SettingsError> {
        let parsed: TomlSettings = toml::from_str(content)?;
        Ok(Settings {
            index: parsed.paths.as_ref().and_then(|p| p.index.clone()),
            templates: parsed.paths.as_ref().and_then(|p| p.templates.clone()),
            format: parsed.output.as_ref().and_then(|o| o.format),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
[paths]
index = "templates/index"
templates = "templates"

[output]
format = "text"
"#;
        let settings = Settings::from_str(toml_str).expect("Should parse");
        assert_eq!(settings.index, Some(PathBuf::from("templates/index")));
        assert_eq!(settings.templates, Some(PathBuf::from("templates")));
        assert_eq!(settings.format, Some(OutputFormat::Text));
    }

    #[test]
    fn test_empty_settings_are_all_none() {
        let settings = Settings::from_str("").expect("Should parse");
        assert_eq!(settings.index, None);
        assert_eq!(settings.templates, None);
        assert_eq!(settings.format, None);
    }

    #[test]
    fn test_partial_settings() {
        let settings = Settings::from_str("[paths]\ntemplates = \"t\"\n").expect("Should parse");
        assert_eq!(settings.templates, Some(PathBuf::from("t")));
        assert_eq!(settings.index, None);
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = Settings::from_str("this is not valid toml {{{{");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = Settings::from_str("[output]\nformat = \"yaml\"\n");
        assert!(result.is_err());
    }
}
