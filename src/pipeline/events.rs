/*!
 * Notifications emitted while a pipeline runs.
 *
 * The orchestrator and the executors report through an `EventSink`. Every
 * event is logged; when a channel is attached the event is also forwarded to
 * the listener (for example a progress bar in the CLI).
 */

use std::path::{Path, PathBuf};

use log::{debug, error, info};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// One notification from a running pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingEvent {
    /// A chunk of the current stage finished
    Progress {
        current: usize,
        total: usize,
        phase: String,
    },
    /// Human readable status line
    StatusChanged(String),
    /// A step artifact was written
    StepSaved(PathBuf),
    /// A recoverable or fatal error occurred
    Error(String),
    /// The final output was written
    Finished(PathBuf),
}

/// Where processing events go
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<UnboundedSender<ProcessingEvent>>,
}

impl EventSink {
    pub fn new(sender: UnboundedSender<ProcessingEvent>) -> Self {
        Self { sender: Some(sender) }
    }

    /// Sink that only logs
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Create a sink together with the receiving end of its channel
    pub fn channel() -> (Self, UnboundedReceiver<ProcessingEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: ProcessingEvent) {
        if let Some(sender) = &self.sender {
            // A dropped receiver only means nobody is listening anymore
            if sender.send(event).is_err() {
                debug!("Event listener is gone, dropping event");
            }
        }
    }

    pub fn progress(&self, current: usize, total: usize, phase: impl Into<String>) {
        let phase = phase.into();
        debug!("{} - chunk {}/{}", phase, current, total);
        self.emit(ProcessingEvent::Progress { current, total, phase });
    }

    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.emit(ProcessingEvent::StatusChanged(message));
    }

    pub fn step_saved(&self, path: &Path) {
        debug!("Step saved: {}", path.display());
        self.emit(ProcessingEvent::StepSaved(path.to_path_buf()));
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.emit(ProcessingEvent::Error(message));
    }

    pub fn finished(&self, path: &Path) {
        info!("Processing completed: {}", path.display());
        self.emit(ProcessingEvent::Finished(path.to_path_buf()));
    }
}
