//! Conversion of a loaded material into an opacity table format.
//!
//! The driver validates user parameters, prepares an [`EosTableExport`] from
//! the material and delegates the file writing to a [`FormatConverter`].
//! Failures never escape as errors: every run ends in a
//! [`ConversionOutcome`] carrying a success flag and a message.

mod converter;
mod export;
mod parameters;
mod validation;
mod worker;

pub use converter::{ConversionJob, ConverterStatus, ExternalProcessConverter, FormatConverter};
pub use export::{EosTableExport, build_table_export};
pub use parameters::{ConversionParameters, suggested_parameters};
pub use validation::{RawConversionParameters, ValidationErrors, validate_conversion_parameters};
pub use worker::{ConversionEvent, ConversionHandle, spawn_conversion};

use crate::source::EosSource;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const OUTPUT_EXTENSION: &str = "cn4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub parameters: RawConversionParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOutcome {
    pub success: bool,
    pub output_file: Option<PathBuf>,
    pub message: String,
}

impl ConversionOutcome {
    fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!(%message, "conversion failed");
        Self {
            success: false,
            output_file: None,
            message,
        }
    }
}

/// `<output_dir>/<output_name>.cn4`, or `<input stem>_converted.cn4` when no
/// output name is given.
pub fn output_path(
    input_path: &Path,
    output_dir: &Path,
    parameters: &ConversionParameters,
) -> PathBuf {
    let name = parameters.output_name.clone().unwrap_or_else(|| {
        let stem = input_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        format!("{stem}_converted")
    });
    output_dir.join(format!("{name}.{OUTPUT_EXTENSION}"))
}

pub fn run_conversion<C, S>(
    converter: &C,
    source: &S,
    request: &ConversionRequest,
    progress: &mut dyn FnMut(&str),
) -> ConversionOutcome
where
    C: FormatConverter + ?Sized,
    S: EosSource + ?Sized,
{
    let status = converter.status();
    if !status.conversion_possible {
        return ConversionOutcome::failed(format!(
            "Conversion not available: {}",
            status.limitations.join("; ")
        ));
    }
    if !request.input_path.is_file() {
        return ConversionOutcome::failed(format!(
            "Input file not found: {}",
            request.input_path.display()
        ));
    }
    if !request.output_dir.is_dir() {
        return ConversionOutcome::failed(format!(
            "Output directory not found: {}",
            request.output_dir.display()
        ));
    }

    let errors = validate_conversion_parameters(&request.parameters);
    if !errors.is_empty() {
        return ConversionOutcome::failed(ValidationErrors(errors).to_string());
    }

    progress("Loading SESAME file...");
    let record = match source.load(&request.input_path) {
        Ok(record) => record,
        Err(error) => {
            return ConversionOutcome::failed(format!(
                "Failed to load SESAME file: {}",
                error.message()
            ));
        }
    };

    progress(&format!("Converting material {}...", record.material_id()));
    let parameters =
        match ConversionParameters::from_raw(&request.parameters, record.material_id()) {
            Ok(parameters) => parameters,
            Err(errors) => return ConversionOutcome::failed(errors.to_string()),
        };
    let output_path = output_path(&request.input_path, &request.output_dir, &parameters);

    progress("Extracting ion number density from EoS data...");
    let tables = match build_table_export(&record, &parameters) {
        Ok(tables) => tables,
        Err(error) => {
            return ConversionOutcome::failed(format!("Conversion error: {}", error.message()));
        }
    };

    progress("Performing conversion...");
    let job = ConversionJob {
        input_path: request.input_path.clone(),
        output_path: output_path.clone(),
        parameters,
        tables,
    };
    if let Err(error) = converter.convert(&job, progress) {
        return ConversionOutcome::failed(format!("Conversion error: {}", error.message()));
    }

    match fs::metadata(&output_path) {
        Ok(metadata) if metadata.is_file() => {
            progress("Conversion completed successfully");
            let size_kb = metadata.len() as f64 / 1024.0;
            tracing::info!(output = %output_path.display(), size_kb, "conversion finished");
            ConversionOutcome {
                success: true,
                message: format!(
                    "Conversion successful. Output file: {} ({size_kb:.1} KB)",
                    output_path.display()
                ),
                output_file: Some(output_path),
            }
        }
        _ => ConversionOutcome::failed("Conversion completed but output file not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConversionJob, ConversionParameters, ConversionRequest, ConverterStatus,
        FormatConverter, RawConversionParameters, output_path, run_conversion,
    };
    use crate::domain::{
        EosType, MaterialRecord, SesameError, SesameResult, SourceResult, TypeGrid, ValueGrid,
    };
    use crate::source::EosSource;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct FixedSource;

    impl EosSource for FixedSource {
        fn load(&self, _path: &Path) -> SourceResult<MaterialRecord> {
            let axis: Vec<f64> = (1..=6).map(|value| value as f64).collect();
            let grid = ValueGrid::new(6, 6, vec![1.0; 36])?;
            let table = TypeGrid::new(axis.clone(), axis, Some(grid), None)?;
            Ok(MaterialRecord::new(3720)
                .with_zmax(Some(13.0))
                .with_table(EosType::Total, table))
        }
    }

    enum Behavior {
        Unavailable,
        WriteBytes(usize),
        WriteNothing,
        Fail,
    }

    struct StubConverter(Behavior);

    impl FormatConverter for StubConverter {
        fn status(&self) -> ConverterStatus {
            match self.0 {
                Behavior::Unavailable => ConverterStatus::unavailable("stub disabled"),
                _ => ConverterStatus::available(),
            }
        }

        fn convert(&self, job: &ConversionJob, progress: &mut dyn FnMut(&str)) -> SesameResult<()> {
            progress("stub writing");
            match self.0 {
                Behavior::WriteBytes(count) => fs::write(&job.output_path, vec![b'x'; count])
                    .map_err(|error| SesameError::io_system("IO.TEST", error.to_string())),
                Behavior::Fail => Err(SesameError::computation("CONVERSION.TEST", "boom")),
                _ => Ok(()),
            }
        }
    }

    fn request(dir: &TempDir, raw: RawConversionParameters) -> ConversionRequest {
        let input_path = dir.path().join("aluminum.json");
        fs::write(&input_path, "{}").expect("input should be written");
        ConversionRequest {
            input_path,
            output_dir: dir.path().to_path_buf(),
            parameters: raw,
        }
    }

    fn run(behavior: Behavior, request: &ConversionRequest) -> (super::ConversionOutcome, Vec<String>) {
        let mut messages = Vec::new();
        let outcome = run_conversion(
            &StubConverter(behavior),
            &FixedSource,
            request,
            &mut |message: &str| messages.push(message.to_string()),
        );
        (outcome, messages)
    }

    #[test]
    fn successful_conversion_reports_output_size() {
        let dir = TempDir::new().expect("tempdir should be created");
        let raw = RawConversionParameters {
            output_name: Some("al".to_string()),
            ..RawConversionParameters::new("13", "1.0")
        };
        let request = request(&dir, raw);
        let (outcome, messages) = run(Behavior::WriteBytes(2048), &request);

        let expected = dir.path().join("al.cn4");
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.output_file.as_deref(), Some(expected.as_path()));
        assert_eq!(
            outcome.message,
            format!("Conversion successful. Output file: {} (2.0 KB)", expected.display())
        );
        assert_eq!(messages.first().map(String::as_str), Some("Loading SESAME file..."));
        assert!(messages.iter().any(|message| message == "Converting material 3720..."));
        assert!(messages.iter().any(|message| message == "stub writing"));
        assert_eq!(
            messages.last().map(String::as_str),
            Some("Conversion completed successfully")
        );
    }

    #[test]
    fn preconditions_are_checked_before_loading() {
        let dir = TempDir::new().expect("tempdir should be created");
        let valid = RawConversionParameters::new("1,6", "0.5,0.5");

        let (outcome, _) = run(Behavior::Unavailable, &request(&dir, valid.clone()));
        assert_eq!(outcome.message, "Conversion not available: stub disabled");

        let mut missing_input = request(&dir, valid.clone());
        missing_input.input_path = dir.path().join("missing.json");
        let (outcome, messages) = run(Behavior::WriteBytes(1), &missing_input);
        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            format!("Input file not found: {}", dir.path().join("missing.json").display())
        );
        assert!(messages.is_empty());

        let mut missing_dir = request(&dir, valid);
        missing_dir.output_dir = dir.path().join("nowhere");
        let (outcome, _) = run(Behavior::WriteBytes(1), &missing_dir);
        assert_eq!(
            outcome.message,
            format!("Output directory not found: {}", dir.path().join("nowhere").display())
        );
    }

    #[test]
    fn validation_failure_lists_every_problem() {
        let dir = TempDir::new().expect("tempdir should be created");
        let request = request(&dir, RawConversionParameters::new("1,6", "0.5"));
        let (outcome, messages) = run(Behavior::WriteBytes(1), &request);
        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Parameter validation failed: Element fractions should sum to 1.0; \
             Number of atomic numbers must match number of fractions"
        );
        assert!(messages.is_empty());
    }

    #[test]
    fn converter_failures_become_outcomes() {
        let dir = TempDir::new().expect("tempdir should be created");
        let request = request(&dir, RawConversionParameters::new("1,6", "0.5,0.5"));

        let (outcome, _) = run(Behavior::WriteNothing, &request);
        assert_eq!(outcome.message, "Conversion completed but output file not found");

        let (outcome, _) = run(Behavior::Fail, &request);
        assert_eq!(outcome.message, "Conversion error: boom");
        assert_eq!(outcome.output_file, None);
    }

    #[test]
    fn output_name_defaults_to_input_stem() {
        let raw = RawConversionParameters::new("1", "1.0");
        let parameters = ConversionParameters::from_raw(&raw, 1).expect("parameters are valid");
        assert_eq!(
            output_path(Path::new("/data/sesame_3720.json"), Path::new("/out"), &parameters),
            PathBuf::from("/out/sesame_3720_converted.cn4")
        );
    }
}
