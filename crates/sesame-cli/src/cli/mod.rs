mod commands;
mod helpers;

use clap::Parser;
use sesame_core::domain::SesameError;
use std::path::PathBuf;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_sesame_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            diagnostic.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("sesame-inspect".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_logging(cli.verbose);
            let config = helpers::load_config(cli.config.as_deref())?;
            dispatch_parsed(cli.command, &config)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "sesame-inspect",
    version,
    about = "Inspect SESAME equation-of-state tables and prepare opacity conversions"
)]
struct Cli {
    /// Tool configuration file (defaults to ./sesame-inspect.json when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Show material properties and usable EoS types
    Info(commands::InfoArgs),
    /// Print the deterministic material analysis report
    Report(commands::ReportArgs),
    /// Find the minimum temperature where pressure/energy are uniformly positive
    Scan(commands::ScanArgs),
    /// Emit plot payloads as JSON
    PlotData(commands::PlotDataArgs),
    /// Suggest conversion parameters for a material
    Suggest(commands::SuggestArgs),
    /// Validate conversion parameters
    Validate(commands::ValidateArgs),
    /// Convert a material with the configured external converter
    Convert(commands::ConvertArgs),
}

fn dispatch_parsed(
    command: CliCommand,
    config: &sesame_core::config::ToolConfig,
) -> Result<i32, CliError> {
    match command {
        CliCommand::Info(args) => commands::run_info_command(args),
        CliCommand::Report(args) => commands::run_report_command(args),
        CliCommand::Scan(args) => commands::run_scan_command(args),
        CliCommand::PlotData(args) => commands::run_plot_data_command(args, config),
        CliCommand::Suggest(args) => commands::run_suggest_command(args),
        CliCommand::Validate(args) => commands::run_validate_command(args),
        CliCommand::Convert(args) => commands::run_convert_command(args, config),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(SesameError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_sesame_error(&self) -> SesameError {
        match self {
            Self::Usage(message) => {
                SesameError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => SesameError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

impl From<SesameError> for CliError {
    fn from(error: SesameError) -> Self {
        Self::Compute(error)
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};
    use sesame_core::domain::SesameError;

    #[test]
    fn help_exits_successfully() {
        assert_eq!(run(["--help"]).expect("help should render"), 0);
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let error = run(["frobnicate"]).expect_err("subcommand does not exist");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(error.as_sesame_error().exit_code(), 2);
    }

    #[test]
    fn internal_errors_map_to_io_category() {
        let error = CliError::from(anyhow::anyhow!("disk full"));
        let diagnostic = error.as_sesame_error();
        assert_eq!(diagnostic.exit_code(), 3);
        assert_eq!(diagnostic.diagnostic_line(), "ERROR: [IO.CLI] disk full");

        let error = CliError::from(SesameError::computation("CONVERSION.FAILED", "boom"));
        assert_eq!(error.as_sesame_error().exit_code(), 4);
    }
}
