//! Background execution of a single extraction.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::PipelineError;
use crate::models::invoice::ExtractionResult;
use crate::ocr::EngineKind;

use super::{ExtractionState, Orchestrator};

/// Events emitted by a running job.
///
/// Any number of `Progress` events is followed by exactly one terminal
/// `Success` or `Failure`.
#[derive(Debug)]
pub enum JobEvent {
    Progress(String),
    Success(Box<ExtractionResult>),
    Failure(String),
}

/// Handle to an extraction running on the blocking thread pool.
pub struct ExtractionJob {
    events: mpsc::UnboundedReceiver<JobEvent>,
    worker: Option<JoinHandle<()>>,
}

impl ExtractionJob {
    /// Start extracting `path` with `engine`. Must be called inside a Tokio
    /// runtime.
    pub fn spawn(orchestrator: Arc<Orchestrator>, path: PathBuf, engine: EngineKind) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = tokio::task::spawn_blocking(move || {
            let progress_tx = tx.clone();
            let mut sink = move |state: ExtractionState, message: &str| {
                // The failure reason travels in the terminal event
                if state != ExtractionState::Failed {
                    let _ = progress_tx.send(JobEvent::Progress(message.to_string()));
                }
            };

            let event = match orchestrator.process(&path, engine, &mut sink) {
                Ok(result) => JobEvent::Success(Box::new(result)),
                Err(e) => JobEvent::Failure(e.to_string()),
            };
            let _ = tx.send(event);
        });

        Self {
            events: rx,
            worker: Some(worker),
        }
    }

    /// Next event, or `None` once the terminal event has been delivered.
    ///
    /// A worker that dies without reporting is surfaced as a `Failure`.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        if let Some(event) = self.events.recv().await {
            return Some(event);
        }

        let worker = self.worker.take()?;
        match worker.await {
            Ok(()) => None,
            Err(e) => {
                warn!("Extraction worker died: {}", e);
                Some(JobEvent::Failure(PipelineError::Worker(e.to_string()).to_string()))
            }
        }
    }

    /// Drain the job, passing progress messages to `on_progress`.
    ///
    /// Returns the result, or the failure reason.
    pub async fn wait(mut self, mut on_progress: impl FnMut(&str)) -> Result<ExtractionResult, String> {
        while let Some(event) = self.next_event().await {
            match event {
                JobEvent::Progress(message) => on_progress(&message),
                JobEvent::Success(result) => return Ok(*result),
                JobEvent::Failure(reason) => return Err(reason),
            }
        }
        Err(PipelineError::Worker("worker exited without an outcome".to_string()).to_string())
    }
}
