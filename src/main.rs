// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;

use textpipe::app_config::{self, Config};
use textpipe::app_controller::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the configured pipeline over files or directories
    #[command(alias = "process")]
    Run(RunArgs),

    /// List models available on the Ollama server
    Models {
        /// Configuration file path
        #[arg(short, long, default_value = "textpipe.json")]
        config_path: String,
    },

    /// Generate shell completions for textpipe
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input text files or directories (.txt and .md are picked up)
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for outputs, defaults to next to each input
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "textpipe.json")]
    config_path: String,

    /// Model for every operation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language of translation operations (name or ISO code)
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language of translation operations (name or ISO code)
    #[arg(short, long)]
    target_language: Option<String>,

    /// Characters per chunk
    #[arg(long)]
    chunk_size: Option<i64>,

    /// Characters of context carried between chunks
    #[arg(long)]
    overlap: Option<usize>,

    /// Send each document as a single chunk
    #[arg(long)]
    whole_file: bool,

    /// Enable a rewrite task by id (repeatable)
    #[arg(long = "task", value_name = "TASK_ID")]
    tasks: Vec<String>,

    /// Tone for tone adjustment operations (formal, casual, professional, conversational)
    #[arg(long)]
    tone: Option<String>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// textpipe - chunked document processing with local LLMs
///
/// Runs long documents through an ordered pipeline of translation and
/// rewrite stages against a local Ollama server.
#[derive(Parser, Debug)]
#[command(name = "textpipe")]
#[command(version)]
#[command(about = "Chunked translation and rewriting of long documents with Ollama")]
#[command(long_about = "textpipe splits long documents into chunks and runs them through translation and rewrite stages on a local Ollama server.

EXAMPLES:
    textpipe run book.txt                            # Run the configured pipeline
    textpipe run -f book.txt                         # Force overwrite existing output
    textpipe run -m llama3.2:latest book.txt         # Use a specific model everywhere
    textpipe run -s en -t de book.txt                # Translate English to German
    textpipe run --task simplify_language notes/     # Process a directory with an extra task
    textpipe run --whole-file short.md               # Send the whole file at once
    textpipe models                                  # List models on the server
    textpipe completions bash > textpipe.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in textpipe.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

OUTPUT:
    <name>_processed.<ext> is written next to the input (or into --output-dir).
    Intermediate results are saved as <name>_processed_step_<step>.<ext>.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Marker and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("✗", "1;31"),
            Level::Warn => ("!", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("·", "1;36"),
            Level::Trace => ("…", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (marker, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, marker, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The max level is lowered or raised once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "textpipe", &mut std::io::stdout());
            Ok(())
        }
        Commands::Models { config_path } => {
            let config = Config::load_or_create(&config_path)?;
            let controller = Controller::with_config(config)?;
            let models = controller
                .list_models()
                .await
                .context("Cannot reach the Ollama server")?;
            for model in models {
                println!("{}", model);
            }
            Ok(())
        }
        Commands::Run(args) => run_pipeline(args).await,
    }
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, args: &RunArgs) -> Result<()> {
    if let Some(model) = &args.model {
        config.default_model = model.clone();
        for op in &mut config.operations {
            op.model = Some(model.clone());
        }
    }

    if let Some(chunk_size) = args.chunk_size {
        config.chunking.chunk_size = chunk_size;
    }
    if let Some(overlap) = args.overlap {
        config.chunking.overlap = overlap;
    }
    if args.whole_file {
        config.chunking.process_entire_file = true;
    }

    for op in &mut config.operations {
        if let Some(translation) = op.translation.as_mut() {
            if let Some(source) = &args.source_language {
                translation.source_language = source.clone();
            }
            if let Some(target) = &args.target_language {
                translation.target_language = target.clone();
            }
            if let Some(chunk_size) = args.chunk_size {
                translation.chunk_size = chunk_size;
            }
            if let Some(overlap) = args.overlap {
                translation.overlap = overlap;
            }
        }
    }

    for task_id in &args.tasks {
        let mut found = false;
        for op in config.operations.iter_mut().filter(|op| op.tasks.iter().any(|t| &t.id == task_id)) {
            found = true;
            op.enabled = true;
            if !op.enabled_tasks.contains(task_id) {
                op.enabled_tasks.push(task_id.clone());
            }
        }
        if !found {
            return Err(anyhow!("Unknown task id: {}", task_id));
        }
    }

    if let Some(tone) = &args.tone {
        let tone_task = format!("{}{}", app_config::TONE_TASK_PREFIX, tone.to_lowercase());
        let mut found = false;
        for op in config.operations.iter_mut().filter(|op| op.tasks.iter().any(|t| t.id == tone_task)) {
            found = true;
            op.enabled = true;
            op.tone = Some(tone.clone());
        }
        if !found {
            return Err(anyhow!("No operation defines the tone '{}'", tone));
        }
    }

    if let Some(log_level) = &args.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(())
}

async fn run_pipeline(args: RunArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &args.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&args.config_path)?;
    apply_overrides(&mut config, &args)?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config).context("Configuration validation failed")?;

    let summary = controller
        .run(&args.inputs, args.output_dir.as_deref(), args.force_overwrite)
        .await?;

    for output in &summary.processed {
        info!("Success: {}", output.display());
    }
    if summary.cancelled {
        warn!("Processing was stopped before all files were done");
    }
    if !summary.failed.is_empty() {
        return Err(anyhow!("{} file(s) failed", summary.failed.len()));
    }

    Ok(())
}
