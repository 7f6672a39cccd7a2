use anyhow::{Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::pipeline::orchestrator::DEFAULT_CHUNK_PAUSE;
use crate::pipeline::{EventSink, Pipeline, PipelineOrchestrator, ProcessingEvent, RunOutcome};
use crate::providers::Provider;
use crate::providers::ollama::Ollama;

// @module: Application controller for batch document processing

/// Result of processing a batch of inputs
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    // @field: Files whose output was written
    pub processed: Vec<PathBuf>,
    // @field: Inputs skipped because the output already exists
    pub skipped: Vec<PathBuf>,
    // @field: Inputs whose run failed
    pub failed: Vec<PathBuf>,
    // @field: True when the batch was stopped by the user
    pub cancelled: bool,
}

/// Main application controller for document processing
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Pause after each chunk
    chunk_pause: Duration,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            chunk_pause: DEFAULT_CHUNK_PAUSE,
        })
    }

    pub fn with_chunk_pause(mut self, pause: Duration) -> Self {
        self.chunk_pause = pause;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn ollama(&self) -> Result<Ollama> {
        Ok(Ollama::new_with_config(
            &self.config.ollama.endpoint,
            self.config.ollama.timeout_secs,
        )?)
    }

    /// List models available on the configured service
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let ollama = self.ollama()?;
        match ollama.version().await {
            Ok(version) => info!("Ollama {} at {}", version, ollama.base_url()),
            Err(e) => warn!("Could not read the Ollama version: {}", e),
        }
        Ok(ollama.list_models().await?)
    }

    /// Expand directories into the supported files they contain
    pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for input in inputs {
            if FileManager::dir_exists(input) {
                let found = FileManager::find_input_files(input)?;
                if found.is_empty() {
                    warn!("No .txt or .md files found in {}", input.display());
                }
                files.extend(found);
            } else if FileManager::file_exists(input) {
                files.push(input.clone());
            } else {
                return Err(anyhow!("Input does not exist: {}", input.display()));
            }
        }
        Ok(files)
    }

    /// Run the configured pipeline over every input with the Ollama provider
    pub async fn run(&self, inputs: &[PathBuf], output_dir: Option<&Path>, force_overwrite: bool) -> Result<BatchSummary> {
        let provider = self.ollama()?;
        self.run_with_provider(provider, inputs, output_dir, force_overwrite).await
    }

    /// Run the configured pipeline over every input with the given provider
    pub async fn run_with_provider<P: Provider>(
        &self,
        provider: P,
        inputs: &[PathBuf],
        output_dir: Option<&Path>,
        force_overwrite: bool,
    ) -> Result<BatchSummary> {
        let start_time = Instant::now();
        let pipeline = self.config.build_pipeline();
        if pipeline.is_empty() {
            return Err(anyhow!("No operations enabled, nothing to do"));
        }

        let files = Self::collect_inputs(inputs)?;
        if let Some(dir) = output_dir {
            FileManager::ensure_dir(dir)?;
        }

        let (events, rx) = EventSink::channel();
        let orchestrator = PipelineOrchestrator::new(provider, events).with_chunk_pause(self.chunk_pause);

        let progress_bar = Self::create_progress_bar();
        let renderer = Self::spawn_event_renderer(rx, progress_bar.clone());

        let token = orchestrator.cancellation_token();
        let ctrl_c = tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current chunk");
                token.cancel();
            }
        });

        let summary = self
            .process_files(&orchestrator, &pipeline, &files, output_dir, force_overwrite, &progress_bar)
            .await;

        ctrl_c.abort();
        // Dropping the orchestrator closes the event channel
        drop(orchestrator);
        if let Err(e) = renderer.await {
            warn!("Progress renderer stopped unexpectedly: {}", e);
        }

        info!(
            "Done: {} processed, {} skipped, {} failed in {}",
            summary.processed.len(),
            summary.skipped.len(),
            summary.failed.len(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    async fn process_files<P: Provider>(
        &self,
        orchestrator: &PipelineOrchestrator<P>,
        pipeline: &Pipeline,
        files: &[PathBuf],
        output_dir: Option<&Path>,
        force_overwrite: bool,
        progress_bar: &ProgressBar,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let token = orchestrator.cancellation_token();

        for (index, input) in files.iter().enumerate() {
            // A stop requested between files would otherwise be cleared by the next run
            if token.is_cancelled() {
                info!("Stopping before {}", input.display());
                summary.cancelled = true;
                break;
            }

            let output_path = FileManager::generate_output_path(input, output_dir);
            if output_path.exists() && !force_overwrite {
                warn!(
                    "Skipping {}, output already exists (use -f to force overwrite)",
                    input.display()
                );
                summary.skipped.push(input.clone());
                continue;
            }

            let file_name = input.file_name().unwrap_or_default().to_string_lossy().to_string();
            progress_bar.reset();
            progress_bar.set_prefix(format!("[{}/{}] {}", index + 1, files.len(), file_name));

            let file_start = Instant::now();
            match orchestrator.run(input, &output_path, pipeline).await {
                Ok(RunOutcome::Completed { output_path, steps }) => {
                    for step in &steps {
                        debug!("  step artifact: {}", step.display());
                    }
                    info!(
                        "{}: {} step artifacts in {}",
                        file_name,
                        steps.len(),
                        Self::format_duration(file_start.elapsed())
                    );
                    summary.processed.push(output_path);
                }
                Ok(RunOutcome::Cancelled { .. }) => {
                    summary.cancelled = true;
                    break;
                }
                Err(e) => {
                    error!("Failed to process {}: {}", input.display(), e);
                    summary.failed.push(input.clone());
                }
            }
        }

        summary
    }

    fn create_progress_bar() -> ProgressBar {
        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} {prefix} [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        progress_bar
    }

    fn spawn_event_renderer(mut rx: UnboundedReceiver<ProcessingEvent>, progress_bar: ProgressBar) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                Self::render_event(&progress_bar, &event);
            }
            progress_bar.finish_and_clear();
        })
    }

    fn render_event(progress_bar: &ProgressBar, event: &ProcessingEvent) {
        match event {
            ProcessingEvent::Progress { current, total, phase } => {
                progress_bar.set_length(*total as u64);
                progress_bar.set_position(*current as u64);
                progress_bar.set_message(phase.clone());
            }
            ProcessingEvent::StatusChanged(message) => progress_bar.set_message(message.clone()),
            ProcessingEvent::StepSaved(_) => {}
            ProcessingEvent::Error(message) => progress_bar.println(format!("error: {}", message)),
            ProcessingEvent::Finished(path) => progress_bar.println(format!("Saved {}", path.display())),
        }
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
