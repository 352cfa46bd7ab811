use super::CliError;
use anyhow::Context;
use serde::Serialize;
use sesame_core::common::output::write_output_text;
use sesame_core::common::format::format_optional_fixed;
use sesame_core::config::{ToolConfig, resolve_tool_config};
use sesame_core::domain::{EosType, MaterialRecord, SesameError};
use sesame_core::source::{EosSource, JsonEosSource, MaterialInfo};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub(super) fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when running in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn current_working_dir() -> Result<PathBuf, CliError> {
    std::env::current_dir().map_err(|source| {
        CliError::Compute(SesameError::io_system(
            "IO.CLI_CURRENT_DIR",
            format!("failed to read current working directory: {}", source),
        ))
    })
}

pub(super) fn load_config(explicit: Option<&Path>) -> Result<ToolConfig, CliError> {
    let working_dir = current_working_dir()?;
    resolve_tool_config(explicit, &working_dir).map_err(|error| {
        CliError::Compute(SesameError::input_validation(
            "INPUT.CONFIG",
            error.to_string(),
        ))
    })
}

pub(super) fn load_record(path: &Path) -> Result<MaterialRecord, CliError> {
    let record = JsonEosSource.load(path)?;
    tracing::info!(
        path = %path.display(),
        material_id = record.material_id(),
        "material loaded"
    );
    Ok(record)
}

/// The requested type when its table exists, otherwise an input error naming
/// the usable alternatives.
pub(super) fn require_table(record: &MaterialRecord, eos_type: EosType) -> Result<(), CliError> {
    if record.table(eos_type).is_some() {
        return Ok(());
    }
    Err(CliError::Compute(SesameError::input_validation(
        "INPUT.EOS_TYPE",
        format!(
            "No {} density/temperature data found (usable types: {})",
            eos_type,
            type_list(&record.usable_types())
        ),
    )))
}

pub(super) fn type_list(types: &[EosType]) -> String {
    if types.is_empty() {
        return "none".to_string();
    }
    types
        .iter()
        .map(|eos_type| eos_type.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn render_material_info(info: &MaterialInfo) -> String {
    [
        format!("Material ID: {}", info.material_id),
        format!("Average atomic mass (abar): {}", format_optional_fixed(info.abar, 4)),
        format!("Maximum atomic number (zmax): {}", format_optional_fixed(info.zmax, 4)),
        format!("Reference density (rho0): {}", format_optional_fixed(info.rho0, 4)),
        format!("Bulk modulus: {}", format_optional_fixed(info.bulkmod, 4)),
        format!("Available EoS types: {}", type_list(&info.available_types)),
    ]
    .join("\n")
}

pub(super) fn to_pretty_json(value: &impl Serialize) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value).context("failed to serialize JSON output")?)
}

/// Writes `content` to `output` when given, otherwise prints it.
pub(super) fn emit(output: Option<&Path>, content: &str) -> Result<(), CliError> {
    match output {
        Some(path) => {
            write_output_text(path, content)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            tracing::info!(path = %path.display(), "output written");
        }
        None => println!("{content}"),
    }
    Ok(())
}
