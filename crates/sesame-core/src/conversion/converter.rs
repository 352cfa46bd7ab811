use super::export::EosTableExport;
use super::parameters::ConversionParameters;
use crate::config::ConverterConfig;
use crate::domain::{SesameError, SesameResult};
use serde::Serialize;
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConverterStatus {
    pub conversion_possible: bool,
    pub limitations: Vec<String>,
}

impl ConverterStatus {
    pub fn available() -> Self {
        Self {
            conversion_possible: true,
            limitations: Vec::new(),
        }
    }

    pub fn unavailable(limitation: impl Into<String>) -> Self {
        Self {
            conversion_possible: false,
            limitations: vec![limitation.into()],
        }
    }
}

/// Everything a converter needs to produce one output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub parameters: ConversionParameters,
    pub tables: EosTableExport,
}

/// Writes a converted table file to `job.output_path`.
pub trait FormatConverter {
    fn status(&self) -> ConverterStatus;

    fn convert(&self, job: &ConversionJob, progress: &mut dyn FnMut(&str)) -> SesameResult<()>;
}

impl<T> FormatConverter for &T
where
    T: FormatConverter + ?Sized,
{
    fn status(&self) -> ConverterStatus {
        (**self).status()
    }

    fn convert(&self, job: &ConversionJob, progress: &mut dyn FnMut(&str)) -> SesameResult<()> {
        (**self).convert(job, progress)
    }
}

/// Runs a configured program and streams the job to it as JSON on stdin.
///
/// Each non-empty stdout line is forwarded as a progress message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProcessConverter {
    program: String,
    args: Vec<String>,
}

impl ExternalProcessConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn resolve_program(&self) -> Option<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 || program.is_absolute() {
            return program.is_file().then(|| program.to_path_buf());
        }
        let search_path = env::var_os("PATH")?;
        env::split_paths(&search_path)
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    }
}

impl FormatConverter for ExternalProcessConverter {
    fn status(&self) -> ConverterStatus {
        match self.resolve_program() {
            Some(_) => ConverterStatus::available(),
            None => ConverterStatus::unavailable(format!(
                "Converter program '{}' not found",
                self.program
            )),
        }
    }

    fn convert(&self, job: &ConversionJob, progress: &mut dyn FnMut(&str)) -> SesameResult<()> {
        let payload = serde_json::to_vec(job).map_err(|error| {
            SesameError::internal(
                "CONVERSION.PAYLOAD",
                format!("failed to serialize conversion job: {error}"),
            )
        })?;

        tracing::debug!(program = %self.program, bytes = payload.len(), "spawning converter");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                SesameError::io_system(
                    "IO.CONVERTER_SPAWN",
                    format!("failed to start converter '{}': {error}", self.program),
                )
            })?;

        // The converter may exit, or block on full output pipes, before
        // reading all of stdin.
        let stdin = child.stdin.take();
        let (sent, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(&payload),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let sent = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (sent, output)
        });

        let output = output.map_err(|error| {
            SesameError::io_system(
                "IO.CONVERTER_WAIT",
                format!("failed to wait for converter: {error}"),
            )
        })?;

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .for_each(|line| progress(line));

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SesameError::computation(
                "CONVERSION.CONVERTER_FAILED",
                format!(
                    "converter exited with {}: {}",
                    output.status,
                    stderr.trim()
                ),
            ));
        }
        sent.map_err(|error| {
            SesameError::io_system(
                "IO.CONVERTER_STDIN",
                format!("failed to send conversion job: {error}"),
            )
        })
    }
}
