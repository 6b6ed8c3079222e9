//! Configuration loading and parsing

use anyhow::{Context, Result};
use dbc_decoder::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub decoding: DecoderConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default)]
    pub dbc_files: Vec<PathBuf>,
    /// Files with one frame per line, candump notation
    #[serde(default)]
    pub frame_files: Vec<PathBuf>,
    /// Frames given inline, e.g. "064#8813"
    #[serde(default)]
    pub frames: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Print every loaded message definition before the decoded frames
    #[serde(default = "default_true")]
    pub list_messages: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            list_messages: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbc_decoder::{BitNumbering, SignHandling};
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            dbc_files = ["solar.dbc"]
            frames = ["6B0#A00F"]

            [decoding]
            sign_handling = "twos_complement"
            bit_numbering = "declared"

            [output]
            format = "json"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.dbc_files.len(), 1);
        assert_eq!(config.input.frames, vec!["6B0#A00F".to_string()]);
        assert!(config.input.frame_files.is_empty());
        assert_eq!(config.decoding.sign_handling, SignHandling::TwosComplement);
        assert_eq!(config.decoding.bit_numbering, BitNumbering::Declared);
        assert!(config.decoding.reject_duplicates);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.list_messages);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.input.dbc_files.is_empty());
        assert_eq!(config.output.format, OutputFormat::Txt);
        assert_eq!(config.decoding.sign_handling, SignHandling::AsUnsigned);
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[input]\ndbc_files = [\"a.dbc\", \"b.dbc\"]").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.input.dbc_files.len(), 2);

        assert!(load_config(Path::new("/nonexistent/config.toml")).is_err());
    }
}
