use crate::backend::{BackendMode, NativeAvailability};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Contents of a `phono.toml` file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhonoConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    #[serde(default)]
    pub pretty: bool,
}

impl PhonoConfig {
    pub fn native_availability(&self) -> NativeAvailability {
        NativeAvailability::detect(self.backend.mode)
    }
}

pub fn parse_config(text: &str) -> Result<PhonoConfig> {
    toml::from_str(text).context("parsing phono config")
}

pub fn read_config(path: &Path) -> Result<PhonoConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg, PhonoConfig::default());
        assert_eq!(cfg.backend.mode, BackendMode::Auto);
        assert!(!cfg.output.pretty);
    }

    #[test]
    fn parses_all_sections() {
        let cfg = parse_config(
            r#"
            [backend]
            mode = "reference"

            [output]
            pretty = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.backend.mode, BackendMode::Reference);
        assert!(cfg.output.pretty);
        assert!(!cfg.native_availability().is_available());
    }

    #[test]
    fn rejects_unknown_mode_and_keys() {
        assert!(parse_config("[backend]\nmode = \"gpu\"\n").is_err());
        assert!(parse_config("[filter]\nlow_hz = 10.0\n").is_err());
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\npretty = true").unwrap();
        let cfg = read_config(file.path()).unwrap();
        assert!(cfg.output.pretty);
        assert!(read_config(Path::new("/nonexistent/phono.toml")).is_err());
    }
}
