//! Tool configuration loaded from JSON.
//!
//! Every field has a default, so an absent file or an empty object yields the
//! same configuration as [`ToolConfig::default`].

use crate::common::constants::CGS_TO_GIGA;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "sesame-inspect.json";

/// Unit of the pressure field delivered by the decoder.
///
/// Decoders disagree on whether pressure arrives in GPa or CGS (dyn/cm²); the
/// grids are stored untouched and this setting controls the display scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureUnit {
    #[default]
    Gigapascal,
    Cgs,
}

impl PressureUnit {
    pub const fn to_gigapascal_factor(self) -> f64 {
        match self {
            Self::Gigapascal => 1.0,
            Self::Cgs => CGS_TO_GIGA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Program receiving the conversion export on stdin.
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "opac-convert".to_string(),
            args: vec!["--stdin-json".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolConfig {
    #[serde(rename = "pressureUnit")]
    pub pressure_unit: PressureUnit,
    pub converter: ConverterConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolConfigError {
    #[error("failed to read tool config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse tool config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load_tool_config(path: impl AsRef<Path>) -> Result<ToolConfig, ToolConfigError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| ToolConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ToolConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Explicit path when given, otherwise the default file if it exists.
pub fn resolve_tool_config(
    explicit: Option<&Path>,
    working_dir: &Path,
) -> Result<ToolConfig, ToolConfigError> {
    if let Some(path) = explicit {
        return load_tool_config(path);
    }

    let default_path = working_dir.join(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        load_tool_config(default_path)
    } else {
        Ok(ToolConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_CONFIG_FILE, PressureUnit, ToolConfig, ToolConfigError, load_tool_config,
        resolve_tool_config,
    };
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_object_yields_defaults() {
        let config: ToolConfig = serde_json::from_str("{}").expect("config should parse");
        assert_eq!(config, ToolConfig::default());
        assert_eq!(config.pressure_unit, PressureUnit::Gigapascal);
        assert_eq!(config.converter.program, "opac-convert");
    }

    #[test]
    fn pressure_unit_and_converter_are_read() {
        let config: ToolConfig = serde_json::from_str(
            r#"{ "pressureUnit": "cgs", "converter": { "program": "/opt/bin/ionmix-writer" } }"#,
        )
        .expect("config should parse");
        assert_eq!(config.pressure_unit, PressureUnit::Cgs);
        assert_eq!(config.pressure_unit.to_gigapascal_factor(), 1.0e-10);
        assert_eq!(config.converter.program, "/opt/bin/ionmix-writer");
        assert_eq!(config.converter.args, vec!["--stdin-json".to_string()]);
    }

    #[test]
    fn resolve_prefers_default_file_when_present() {
        let temp = TempDir::new().expect("tempdir should be created");
        assert_eq!(
            resolve_tool_config(None, temp.path()).expect("defaults"),
            ToolConfig::default()
        );

        fs::write(
            temp.path().join(DEFAULT_CONFIG_FILE),
            r#"{ "pressureUnit": "cgs" }"#,
        )
        .expect("config should be written");
        let config = resolve_tool_config(None, temp.path()).expect("config should load");
        assert_eq!(config.pressure_unit, PressureUnit::Cgs);
    }

    #[test]
    fn malformed_config_reports_parse_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("bad.json");
        fs::write(&path, "{ not json").expect("config should be written");

        let error = load_tool_config(&path).expect_err("parse should fail");
        assert!(matches!(error, ToolConfigError::Parse { .. }));
        assert!(error.to_string().contains("bad.json"));
    }
}
