use super::{ConversionOutcome, ConversionRequest, FormatConverter, run_conversion};
use crate::source::EosSource;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionEvent {
    Progress(String),
    Finished(ConversionOutcome),
}

/// A conversion running on its own thread. Events arrive in order and the
/// last one is always [`ConversionEvent::Finished`] unless the worker died.
pub struct ConversionHandle {
    events: Receiver<ConversionEvent>,
    thread: JoinHandle<()>,
}

impl ConversionHandle {
    pub fn events(&self) -> &Receiver<ConversionEvent> {
        &self.events
    }

    /// Drains progress into `on_progress` and returns the final outcome.
    pub fn wait(self, mut on_progress: impl FnMut(&str)) -> ConversionOutcome {
        let mut outcome = None;
        for event in self.events.iter() {
            match event {
                ConversionEvent::Progress(message) => on_progress(&message),
                ConversionEvent::Finished(finished) => outcome = Some(finished),
            }
        }
        if self.thread.join().is_err() {
            tracing::error!("conversion worker panicked");
        }
        outcome.unwrap_or_else(|| ConversionOutcome {
            success: false,
            output_file: None,
            message: "Conversion worker terminated unexpectedly".to_string(),
        })
    }
}

pub fn spawn_conversion<C, S>(converter: C, source: S, request: ConversionRequest) -> ConversionHandle
where
    C: FormatConverter + Send + 'static,
    S: EosSource + Send + 'static,
{
    let (sender, events) = mpsc::channel();
    let thread = thread::spawn(move || {
        let mut progress = |message: &str| {
            // The receiver may already be gone; the run still completes.
            let _ = sender.send(ConversionEvent::Progress(message.to_string()));
        };
        let outcome = run_conversion(&converter, &source, &request, &mut progress);
        let _ = sender.send(ConversionEvent::Finished(outcome));
    });
    ConversionHandle { events, thread }
}

#[cfg(test)]
mod tests {
    use super::{ConversionEvent, spawn_conversion};
    use crate::conversion::{
        ConversionJob, ConversionRequest, ConverterStatus, FormatConverter,
        RawConversionParameters,
    };
    use crate::domain::{MaterialRecord, SesameError, SesameResult, SourceResult};
    use crate::source::EosSource;
    use std::path::Path;
    use tempfile::TempDir;

    struct Unreadable;

    impl EosSource for Unreadable {
        fn load(&self, path: &Path) -> SourceResult<MaterialRecord> {
            Err(SesameError::input_validation(
                "INPUT.SOURCE_FORMAT",
                format!("Error loading file: {}", path.display()),
            ))
        }
    }

    struct Idle;

    impl FormatConverter for Idle {
        fn status(&self) -> ConverterStatus {
            ConverterStatus::available()
        }

        fn convert(&self, _job: &ConversionJob, _progress: &mut dyn FnMut(&str)) -> SesameResult<()> {
            Ok(())
        }
    }

    fn request(dir: &TempDir) -> ConversionRequest {
        let input_path = dir.path().join("broken.json");
        std::fs::write(&input_path, "not json").expect("input should be written");
        ConversionRequest {
            input_path,
            output_dir: dir.path().to_path_buf(),
            parameters: RawConversionParameters::new("1,6", "0.5,0.5"),
        }
    }

    #[test]
    fn worker_streams_progress_then_outcome() {
        let dir = TempDir::new().expect("tempdir should be created");
        let handle = spawn_conversion(Idle, Unreadable, request(&dir));

        let mut progress = Vec::new();
        let outcome = handle.wait(|message| progress.push(message.to_string()));
        assert_eq!(progress, vec!["Loading SESAME file...".to_string()]);
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Failed to load SESAME file: Error loading file:"));
    }

    #[test]
    fn events_can_be_consumed_directly() {
        let dir = TempDir::new().expect("tempdir should be created");
        let handle = spawn_conversion(Idle, Unreadable, request(&dir));
        let events: Vec<ConversionEvent> = handle.events().iter().collect();
        assert!(matches!(events.first(), Some(ConversionEvent::Progress(_))));
        assert!(matches!(events.last(), Some(ConversionEvent::Finished(outcome)) if !outcome.success));
    }
}
