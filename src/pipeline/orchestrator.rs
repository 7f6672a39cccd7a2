/*!
 * Pipeline orchestrator.
 *
 * Runs an ordered pipeline over one input file: probes the generation
 * service, reads the document, applies every enabled stage in turn, saves a
 * numbered artifact after each completed stage and finally writes the
 * output. Only one run may be active per orchestrator.
 */

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;

use crate::errors::PipelineError;
use crate::file_utils::FileManager;
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::events::EventSink;
use crate::pipeline::executor::{CombinedExecutor, StageContext, TranslationExecutor};
use crate::pipeline::gateway::GenerationGateway;
use crate::pipeline::stage::{Pipeline, StageKind};
use crate::pipeline::steps::StepWriter;
use crate::providers::Provider;

/// Default pause after each processed chunk
pub const DEFAULT_CHUNK_PAUSE: Duration = Duration::from_millis(100);

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    ConnectionCheck,
    Reading,
    /// Index of the stage in the pipeline
    Stage(usize),
    Writing,
    Done,
    Aborted,
}

/// How a run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The output was written
    Completed { output_path: PathBuf, steps: Vec<PathBuf> },
    /// Stopped on request; no output was written
    Cancelled { steps: Vec<PathBuf> },
}

impl RunOutcome {
    pub fn steps(&self) -> &[PathBuf] {
        match self {
            Self::Completed { steps, .. } | Self::Cancelled { steps } => steps,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Mutable state shared by a run and the outside world
#[derive(Debug)]
struct RunState {
    running: AtomicBool,
    output_base: Mutex<Option<PathBuf>>,
    phase: Mutex<RunPhase>,
}

/// Clears the running flag however the run ends
struct RunningGuard<'a> {
    state: &'a RunState,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.state.running.store(false, Ordering::SeqCst);
    }
}

impl RunState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            output_base: Mutex::new(None),
            phase: Mutex::new(RunPhase::Idle),
        }
    }

    fn try_begin(&self) -> Option<RunningGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunningGuard { state: self })
    }
}

/// Drives a pipeline over one document at a time
#[derive(Debug)]
pub struct PipelineOrchestrator<P: Provider> {
    gateway: GenerationGateway<P>,
    events: EventSink,
    cancel: CancellationToken,
    state: RunState,
    chunk_pause: Duration,
}

impl<P: Provider> PipelineOrchestrator<P> {
    pub fn new(provider: P, events: EventSink) -> Self {
        Self {
            gateway: GenerationGateway::new(provider),
            events,
            cancel: CancellationToken::new(),
            state: RunState::new(),
            chunk_pause: DEFAULT_CHUNK_PAUSE,
        }
    }

    /// Override the pause after each chunk
    pub fn with_chunk_pause(mut self, pause: Duration) -> Self {
        self.chunk_pause = pause;
        self
    }

    pub fn gateway(&self) -> &GenerationGateway<P> {
        &self.gateway
    }

    /// Token that cancels the active run when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request a cooperative stop of the active run
    pub fn cancel(&self) {
        info!("Stop requested");
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> RunPhase {
        *self.state.phase.lock()
    }

    /// Output path of the current or last run
    pub fn output_base(&self) -> Option<PathBuf> {
        self.state.output_base.lock().clone()
    }

    fn set_phase(&self, phase: RunPhase) {
        *self.state.phase.lock() = phase;
    }

    /// Run `pipeline` over `input_path`, writing the result to `output_path`
    ///
    /// Exactly one error notification is emitted when the run fails.
    pub async fn run(
        &self,
        input_path: &Path,
        output_path: &Path,
        pipeline: &Pipeline,
    ) -> Result<RunOutcome, PipelineError> {
        let Some(_guard) = self.state.try_begin() else {
            let err = PipelineError::AlreadyRunning;
            self.events.error(err.to_string());
            return Err(err);
        };

        self.cancel.reset();
        *self.state.output_base.lock() = Some(output_path.to_path_buf());

        let result = self.run_pipeline(input_path, output_path, pipeline).await;
        match &result {
            Ok(RunOutcome::Completed { .. }) => self.set_phase(RunPhase::Done),
            Ok(RunOutcome::Cancelled { .. }) => self.set_phase(RunPhase::Aborted),
            Err(e) => {
                self.set_phase(RunPhase::Aborted);
                self.events.error(e.to_string());
            }
        }

        result
    }

    async fn run_pipeline(
        &self,
        input_path: &Path,
        output_path: &Path,
        pipeline: &Pipeline,
    ) -> Result<RunOutcome, PipelineError> {
        self.set_phase(RunPhase::ConnectionCheck);
        self.events
            .status(format!("Testing connection to {}...", self.gateway.provider().name()));
        let models = self.gateway.probe().await.map_err(PipelineError::Connection)?;
        self.events.status(format!(
            "Connected to {} ({} models available)",
            self.gateway.provider().name(),
            models.len()
        ));

        self.set_phase(RunPhase::Reading);
        self.events.status("Reading input file...");
        let mut text = FileManager::read_to_string(input_path).map_err(|e| PipelineError::FileRead {
            path: input_path.to_path_buf(),
            message: format!("{:#}", e),
        })?;
        self.events
            .status(format!("Loaded {} characters", text.chars().count()));

        let steps = StepWriter::new(output_path, self.events.clone());
        let ctx = StageContext {
            gateway: &self.gateway,
            events: &self.events,
            cancel: &self.cancel,
            steps: &steps,
            chunk_pause: self.chunk_pause,
        };

        let mut step_counter = 1;
        for (index, stage) in pipeline.stages().iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            if !stage.enabled {
                debug!("Skipping disabled stage '{}'", stage.name);
                continue;
            }

            let (output, step_name) = match &stage.kind {
                StageKind::Translation(settings) => {
                    self.set_phase(RunPhase::Stage(index));
                    self.events.status(format!("Starting: {}", stage.name));
                    let output = TranslationExecutor::new(&ctx).run(&text, stage, settings).await;
                    (output, settings.step_name.clone())
                }
                StageKind::Rewrite(settings) => {
                    let enabled = settings.enabled_task_ids();
                    if enabled.is_empty() {
                        debug!("Stage '{}' has no enabled tasks, skipping", stage.name);
                        continue;
                    }
                    self.set_phase(RunPhase::Stage(index));
                    self.events.status(format!("Starting: {}", stage.name));
                    let output = CombinedExecutor::new(&ctx)
                        .run(&text, stage, settings, &enabled)
                        .await;
                    (output, settings.combined_step_name(&enabled))
                }
            };

            // A partial stage result is discarded
            if self.cancel.is_cancelled() {
                break;
            }

            text = output;
            steps.save(&text, &format!("{:02}_{}", step_counter, step_name));
            step_counter += 1;
        }

        if self.cancel.is_cancelled() {
            self.events.status("Processing stopped by user");
            return Ok(RunOutcome::Cancelled { steps: steps.saved() });
        }

        self.set_phase(RunPhase::Writing);
        FileManager::write_to_file(output_path, &text).map_err(|e| PipelineError::FileWrite {
            path: output_path.to_path_buf(),
            message: format!("{:#}", e),
        })?;
        self.events.finished(output_path);

        Ok(RunOutcome::Completed {
            output_path: output_path.to_path_buf(),
            steps: steps.saved(),
        })
    }
}
