use super::CliError;
use super::helpers::*;
use sesame_core::analysis::{QuantityScan, derive_quantities, scan_field};
use sesame_core::common::format::format_scientific;
use sesame_core::config::ToolConfig;
use sesame_core::conversion::{
    ConversionRequest, ExternalProcessConverter, RawConversionParameters, ValidationErrors,
    spawn_conversion, suggested_parameters, validate_conversion_parameters,
};
use sesame_core::domain::{EosType, GridField, SesameError};
use sesame_core::plot::{distribution_plot_data, grid_plot_data};
use sesame_core::report::build_material_report;
use sesame_core::source::{ConversionDefaults, JsonEosSource, MaterialInfo};
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct InfoArgs {
    /// Material dump (JSON) produced by a SESAME decoder
    input: PathBuf,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct ReportArgs {
    /// Material dump (JSON) produced by a SESAME decoder
    input: PathBuf,

    /// Write the report to this path instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub(super) enum ScanQuantity {
    Pressure,
    Energy,
    Both,
}

#[derive(clap::Args)]
pub(super) struct ScanArgs {
    /// Material dump (JSON) produced by a SESAME decoder
    input: PathBuf,

    /// EoS type to scan (total, ele, ion, ioncc, cc)
    #[arg(long = "type", default_value = "total")]
    eos_type: EosType,

    #[arg(long, value_enum, default_value = "both")]
    quantity: ScanQuantity,

    /// Print derived quantities as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub(super) enum PlotKind {
    Grid,
    Pressure,
    Energy,
}

#[derive(clap::Args)]
pub(super) struct PlotDataArgs {
    /// Material dump (JSON) produced by a SESAME decoder
    input: PathBuf,

    #[arg(long, value_enum, default_value = "grid")]
    kind: PlotKind,

    /// EoS type to plot; falls back to the first usable type when unusable
    #[arg(long = "type", default_value = "total")]
    eos_type: EosType,

    /// Write the payload to this path instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct SuggestArgs {
    /// Material dump (JSON) produced by a SESAME decoder
    input: PathBuf,

    /// Print suggestions and conversion defaults as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Default)]
pub(super) struct ConversionParameterArgs {
    /// Comma-separated atomic numbers, e.g. 1,6
    #[arg(long, allow_hyphen_values = true)]
    znum: Option<String>,

    /// Comma-separated element fractions, e.g. 0.5,0.5
    #[arg(long, allow_hyphen_values = true)]
    xfracs: Option<String>,

    /// SESAME table number (defaults to the material ID)
    #[arg(long, allow_hyphen_values = true)]
    tabnum: Option<String>,

    /// Minimum temperature filter in eV
    #[arg(long, allow_hyphen_values = true)]
    tmin: Option<String>,

    /// Output file name without extension
    #[arg(long)]
    outname: Option<String>,
}

impl ConversionParameterArgs {
    fn into_raw(self) -> RawConversionParameters {
        RawConversionParameters {
            atomic_numbers: self.znum,
            element_fractions: self.xfracs,
            table_number: self.tabnum,
            min_temperature_filter: self.tmin,
            output_name: self.outname,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct ValidateArgs {
    #[command(flatten)]
    parameters: ConversionParameterArgs,
}

#[derive(clap::Args)]
pub(super) struct ConvertArgs {
    /// Material dump (JSON) produced by a SESAME decoder
    input: PathBuf,

    /// Directory receiving the converted file
    #[arg(long)]
    output_dir: PathBuf,

    /// Converter program, overriding the configuration
    #[arg(long)]
    converter: Option<String>,

    #[command(flatten)]
    parameters: ConversionParameterArgs,
}

pub(super) fn run_info_command(args: InfoArgs) -> Result<i32, CliError> {
    let record = load_record(&args.input)?;
    let info = MaterialInfo::from_record(&record);
    let rendered = if args.json {
        to_pretty_json(&info)?
    } else {
        render_material_info(&info)
    };
    println!("{rendered}");
    Ok(0)
}

pub(super) fn run_report_command(args: ReportArgs) -> Result<i32, CliError> {
    let record = load_record(&args.input)?;
    emit(args.output.as_deref(), &build_material_report(&record))?;
    Ok(0)
}

pub(super) fn run_scan_command(args: ScanArgs) -> Result<i32, CliError> {
    let record = load_record(&args.input)?;
    require_table(&record, args.eos_type)?;

    if args.json {
        let derived = derive_quantities(&record, args.eos_type).map_err(SesameError::from)?;
        println!("{}", to_pretty_json(&derived)?);
        return Ok(0);
    }

    let fields: &[GridField] = match args.quantity {
        ScanQuantity::Pressure => &[GridField::Pressure],
        ScanQuantity::Energy => &[GridField::InternalEnergy],
        ScanQuantity::Both => &[GridField::Pressure, GridField::InternalEnergy],
    };

    println!("Material {} ({})", record.material_id(), args.eos_type.label());
    for field in fields {
        match scan_field(&record, args.eos_type, *field) {
            Ok(scan) => println!("{}", render_scan(&scan)),
            Err(incomplete) => println!("  {field}: {incomplete}"),
        }
    }
    Ok(0)
}

fn render_scan(scan: &QuantityScan) -> String {
    let Some(threshold) = scan.scan else {
        return format!("  {}: no valid grid points", scan.field);
    };
    let mut line = format!(
        "  {}: uniformly positive from {} eV (column {} of {}, decided by density row {})",
        scan.field,
        format_scientific(threshold.temperature, 2),
        threshold.index + 1,
        threshold.column_count,
        threshold.dominant_row + 1,
    );
    if threshold.is_clamp_dominated() {
        line.push_str(&format!(
            "\n    note: {} density row(s) never turn positive; threshold pinned to the last temperature",
            threshold.clamped_rows
        ));
    }
    line
}

pub(super) fn run_plot_data_command(
    args: PlotDataArgs,
    config: &ToolConfig,
) -> Result<i32, CliError> {
    let record = load_record(&args.input)?;
    let eos_type = record.resolve_type(args.eos_type).ok_or_else(|| {
        SesameError::input_validation(
            "INPUT.EOS_TYPE",
            "No usable EoS data available for plotting",
        )
    })?;
    if eos_type != args.eos_type {
        tracing::warn!(
            requested = %args.eos_type,
            resolved = %eos_type,
            "requested EoS type is not usable; plotting the first usable type"
        );
    }

    let payload = match args.kind {
        PlotKind::Grid => {
            to_pretty_json(&grid_plot_data(&record, eos_type).map_err(SesameError::from)?)?
        }
        PlotKind::Pressure => to_pretty_json(
            &distribution_plot_data(&record, eos_type, GridField::Pressure, config.pressure_unit)
                .map_err(SesameError::from)?,
        )?,
        PlotKind::Energy => to_pretty_json(
            &distribution_plot_data(
                &record,
                eos_type,
                GridField::InternalEnergy,
                config.pressure_unit,
            )
            .map_err(SesameError::from)?,
        )?,
    };
    emit(args.output.as_deref(), &payload)?;
    Ok(0)
}

#[derive(serde::Serialize)]
struct SuggestionPayload {
    suggested: RawConversionParameters,
    defaults: ConversionDefaults,
}

pub(super) fn run_suggest_command(args: SuggestArgs) -> Result<i32, CliError> {
    let record = load_record(&args.input)?;
    let suggested = suggested_parameters(&record);

    if args.json {
        let payload = SuggestionPayload {
            suggested,
            defaults: ConversionDefaults::from_record(&record),
        };
        println!("{}", to_pretty_json(&payload)?);
        return Ok(0);
    }

    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    println!("Znum: {}", field(&suggested.atomic_numbers));
    println!("Xfracs: {}", field(&suggested.element_fractions));
    println!("tabnum: {}", field(&suggested.table_number));
    println!("Tmin: {}", field(&suggested.min_temperature_filter));
    println!("outname: {}", field(&suggested.output_name));
    Ok(0)
}

pub(super) fn run_validate_command(args: ValidateArgs) -> Result<i32, CliError> {
    let errors = validate_conversion_parameters(&args.parameters.into_raw());
    if errors.is_empty() {
        println!("Parameters are valid");
        return Ok(0);
    }
    Err(CliError::Compute(ValidationErrors(errors).into()))
}

pub(super) fn run_convert_command(
    args: ConvertArgs,
    config: &ToolConfig,
) -> Result<i32, CliError> {
    let mut converter_config = config.converter.clone();
    if let Some(program) = args.converter {
        converter_config.program = program;
    }
    let converter = ExternalProcessConverter::from_config(&converter_config);
    let request = ConversionRequest {
        input_path: args.input,
        output_dir: args.output_dir,
        parameters: args.parameters.into_raw(),
    };

    let handle = spawn_conversion(converter, JsonEosSource, request);
    let outcome = handle.wait(|message| eprintln!("{message}"));
    if outcome.success {
        println!("{}", outcome.message);
        return Ok(0);
    }
    Err(CliError::Compute(SesameError::computation(
        "CONVERSION.FAILED",
        outcome.message,
    )))
}
