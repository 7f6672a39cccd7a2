/*!
 * Step artifacts.
 *
 * Intermediate results are written next to the final output, one file per
 * completed stage plus a snapshot that is rewritten after every chunk.
 */

use std::path::{Path, PathBuf};

use log::warn;
use parking_lot::Mutex;

use crate::file_utils::FileManager;
use crate::pipeline::events::EventSink;

/// Writes intermediate step artifacts next to the final output
///
/// A failed write is reported and logged but never aborts the run.
#[derive(Debug)]
pub struct StepWriter {
    output_base: PathBuf,
    events: EventSink,
    saved: Mutex<Vec<PathBuf>>,
}

impl StepWriter {
    pub fn new(output_base: impl Into<PathBuf>, events: EventSink) -> Self {
        Self {
            output_base: output_base.into(),
            events,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn output_base(&self) -> &Path {
        &self.output_base
    }

    /// Path the artifact for `step_name` is written to
    pub fn path_for(&self, step_name: &str) -> PathBuf {
        FileManager::step_file_path(&self.output_base, step_name)
    }

    /// Write `content` as the artifact `step_name`, replacing any earlier version
    pub fn save(&self, content: &str, step_name: &str) -> Option<PathBuf> {
        let path = self.path_for(step_name);

        match FileManager::write_to_file(&path, content) {
            Ok(()) => {
                {
                    let mut saved = self.saved.lock();
                    if !saved.contains(&path) {
                        saved.push(path.clone());
                    }
                }
                self.events.step_saved(&path);
                Some(path)
            }
            Err(e) => {
                warn!("Could not save step '{}': {:#}", step_name, e);
                self.events.error(format!("Error saving step '{}': {}", step_name, e));
                None
            }
        }
    }

    /// Every distinct artifact written so far, in first-write order
    pub fn saved(&self) -> Vec<PathBuf> {
        self.saved.lock().clone()
    }
}
