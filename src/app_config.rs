use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::file_utils::FileManager;
use crate::language_utils::{is_known_language, resolve_language_name};
use crate::pipeline::chunker::{ChunkingPolicy, WHOLE_FILE_SENTINEL};
use crate::pipeline::stage::{
    Pipeline, RewriteStage, StageConfig, TaskDefinition, TranslationPrompts, TranslationStage,
};
use crate::providers::ollama::normalize_endpoint;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings, and turning the configured
/// operations into a runnable pipeline.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Generation service settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Model used by operations that do not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Chunking used by rewrite operations
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Operations in the order they are listed; `order` decides execution
    #[serde(default = "default_operations")]
    pub operations: Vec<OperationConfig>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Ollama service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds, 0 disables the timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Chunking settings shared by rewrite operations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChunkingConfig {
    /// Characters per chunk, -1 for the whole file
    #[serde(default = "default_rewrite_chunk_size")]
    pub chunk_size: i64,

    /// Characters of context carried into the next chunk
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Process every document as a single chunk, ignoring chunk sizes
    #[serde(default)]
    pub process_entire_file: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_rewrite_chunk_size(),
            overlap: default_overlap(),
            process_entire_file: false,
        }
    }
}

impl ChunkingConfig {
    pub fn policy(&self) -> ChunkingPolicy {
        if self.process_entire_file {
            ChunkingPolicy::whole_file()
        } else {
            ChunkingPolicy::from_setting(self.chunk_size, self.overlap)
        }
    }
}

/// Settings of a translation operation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationOperationConfig {
    /// Source language as a name or ISO code
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language as a name or ISO code
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Characters per chunk, -1 for the whole file
    #[serde(default = "default_translation_chunk_size")]
    pub chunk_size: i64,

    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Drop repeated paragraphs from the result
    #[serde(default = "default_true")]
    pub deduplicate: bool,

    #[serde(default = "default_translation_step_name")]
    pub step_name: String,

    #[serde(default = "default_translation_progress_step_name")]
    pub progress_step_name: String,

    #[serde(default)]
    pub prompts: TranslationPrompts,
}

impl Default for TranslationOperationConfig {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            target_language: default_target_language(),
            chunk_size: default_translation_chunk_size(),
            overlap: default_overlap(),
            deduplicate: true,
            step_name: default_translation_step_name(),
            progress_step_name: default_translation_progress_step_name(),
            prompts: TranslationPrompts::default(),
        }
    }
}

/// One configured operation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OperationConfig {
    // @field: Unique operation id
    pub id: String,

    // @field: Display name
    #[serde(default)]
    pub name: String,

    // @field: Execution order, lower runs first
    #[serde(default = "default_order")]
    pub order: u32,

    #[serde(default = "default_true")]
    pub enabled: bool,

    // @field: Model, falls back to the first operation's model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature of rewrite operations; translation always uses 0.3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    // @field: Present for translation operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationOperationConfig>,

    // @field: Rewrite tasks in definition order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskDefinition>,

    // @field: Ids of enabled tasks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled_tasks: Vec<String>,

    // @field: Tone, enables the matching `adjust_tone_<tone>` task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

impl OperationConfig {
    /// Name shown in status messages
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() { &self.id } else { &self.name }
    }

    /// Translation settings, if this is a translation operation
    pub fn translation_settings(&self) -> Option<TranslationOperationConfig> {
        match &self.translation {
            Some(settings) => Some(settings.clone()),
            None if self.id == TRANSLATION_OPERATION_ID => Some(TranslationOperationConfig::default()),
            None => None,
        }
    }

    /// Enabled state of every task, with the tone mapped onto its task
    pub fn task_states(&self) -> HashMap<String, bool> {
        let tone_task = self
            .tone
            .as_ref()
            .map(|tone| format!("{}{}", TONE_TASK_PREFIX, tone.trim().to_lowercase()));

        self.tasks
            .iter()
            .map(|task| {
                let enabled = self.enabled_tasks.contains(&task.id) || tone_task.as_deref() == Some(task.id.as_str());
                (task.id.clone(), enabled)
            })
            .collect()
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Id that marks an operation as translation even without settings
pub const TRANSLATION_OPERATION_ID: &str = "translation";

/// Task ids of the tone family share this prefix
pub const TONE_TASK_PREFIX: &str = "adjust_tone_";

/// Default temperature for rewrite operations
pub const DEFAULT_REWRITE_TEMPERATURE: f32 = 0.5;

fn default_model() -> String {
    "mistral:latest".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout_secs() -> u64 {
    600 // local models can be slow on long chunks
}

fn default_rewrite_chunk_size() -> i64 {
    5000
}

fn default_translation_chunk_size() -> i64 {
    2500
}

fn default_overlap() -> usize {
    200
}

fn default_order() -> u32 {
    999
}

fn default_true() -> bool {
    true
}

fn default_source_language() -> String {
    "English".to_string()
}

fn default_target_language() -> String {
    "Czech".to_string()
}

fn default_translation_step_name() -> String {
    "translated".to_string()
}

fn default_translation_progress_step_name() -> String {
    "translation_progress".to_string()
}

const PRESERVE_LANGUAGE: &str = " DO NOT translate or change the language of the text.";
const PRESERVE_CONTENT: &str = " Do NOT omit any content, change the meaning, or alter factual information.";

fn rewrite_prompt(task: &str, output: &str) -> String {
    format!(
        "You are a professional content rewriter. Your task is to {}{}{} Output ONLY the {} text without any explanations.",
        task, PRESERVE_LANGUAGE, PRESERVE_CONTENT, output
    )
}

fn tone_task(tone: &str) -> TaskDefinition {
    TaskDefinition::new(
        format!("{}{}", TONE_TASK_PREFIX, tone),
        rewrite_prompt(
            &format!("adjust the tone of the text to be more {} while keeping its message intact.", tone),
            "rewritten",
        ),
        tone,
    )
}

/// Operations written to a fresh config file
pub fn default_operations() -> Vec<OperationConfig> {
    vec![
        OperationConfig {
            id: TRANSLATION_OPERATION_ID.to_string(),
            name: "Translation".to_string(),
            order: 1,
            enabled: true,
            model: None,
            temperature: None,
            translation: Some(TranslationOperationConfig::default()),
            tasks: Vec::new(),
            enabled_tasks: Vec::new(),
            tone: None,
        },
        OperationConfig {
            id: "rewrite".to_string(),
            name: "Rewrite".to_string(),
            order: 2,
            enabled: true,
            model: None,
            temperature: Some(DEFAULT_REWRITE_TEMPERATURE),
            translation: None,
            tasks: vec![
                TaskDefinition::new(
                    "improve_flow",
                    rewrite_prompt(
                        "improve the flow and readability of the text by smoothing transitions and varying sentence structure.",
                        "rewritten",
                    ),
                    "flow",
                ),
                TaskDefinition::new(
                    "simplify_language",
                    rewrite_prompt(
                        "simplify complex words and long sentences so the text is easy to read.",
                        "simplified",
                    ),
                    "simplified",
                ),
                TaskDefinition::new(
                    "remove_idioms",
                    rewrite_prompt(
                        "replace idioms and figures of speech with plain, literal wording.",
                        "processed",
                    ),
                    "literal",
                ),
            ],
            enabled_tasks: vec!["improve_flow".to_string()],
            tone: None,
        },
        OperationConfig {
            id: "paraphrase".to_string(),
            name: "Tone adjustment".to_string(),
            order: 3,
            enabled: false,
            model: None,
            temperature: Some(DEFAULT_REWRITE_TEMPERATURE),
            translation: None,
            tasks: ["formal", "casual", "professional", "conversational"]
                .into_iter()
                .map(tone_task)
                .collect(),
            enabled_tasks: Vec::new(),
            tone: Some("professional".to_string()),
        },
    ]
}

fn validate_chunk_size(owner: &str, chunk_size: i64) -> Result<()> {
    if chunk_size == WHOLE_FILE_SENTINEL || chunk_size > 0 {
        Ok(())
    } else {
        Err(anyhow!(
            "{}: chunk_size must be positive or {} for the whole file, got {}",
            owner,
            WHOLE_FILE_SENTINEL,
            chunk_size
        ))
    }
}

impl Config {
    /// Load the configuration, writing the defaults first if the file is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !FileManager::file_exists(path) {
            let config = Config::default();
            config.save(path)?;
            warn!("Config file not found, created default at {}", path.display());
            return Ok(config);
        }

        let content = FileManager::read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        FileManager::write_to_file(path, &json)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        normalize_endpoint(&self.ollama.endpoint).map_err(|e| anyhow!("{}", e))?;

        if self.default_model.trim().is_empty() {
            return Err(anyhow!("default_model cannot be empty"));
        }
        validate_chunk_size("chunking", self.chunking.chunk_size)?;

        let mut ids = HashSet::new();
        for op in &self.operations {
            if op.id.trim().is_empty() {
                return Err(anyhow!("Operation id cannot be empty"));
            }
            if !ids.insert(op.id.as_str()) {
                return Err(anyhow!("Duplicate operation id: {}", op.id));
            }
            if let Some(temperature) = op.temperature {
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(anyhow!("{}: temperature must be between 0.0 and 2.0", op.id));
                }
            }

            if let Some(translation) = op.translation_settings() {
                Self::validate_translation(&op.id, &translation)?;
                continue;
            }

            let mut task_ids = HashSet::new();
            for task in &op.tasks {
                if !task_ids.insert(task.id.as_str()) {
                    return Err(anyhow!("{}: duplicate task id {}", op.id, task.id));
                }
                if task.prompt.trim().is_empty() {
                    return Err(anyhow!("{}: task {} has an empty prompt", op.id, task.id));
                }
                if task.step_name.trim().is_empty() {
                    return Err(anyhow!("{}: task {} has an empty step_name", op.id, task.id));
                }
            }
            for enabled in &op.enabled_tasks {
                if !task_ids.contains(enabled.as_str()) {
                    return Err(anyhow!("{}: enabled task {} is not defined", op.id, enabled));
                }
            }
        }

        Ok(())
    }

    fn validate_translation(op_id: &str, settings: &TranslationOperationConfig) -> Result<()> {
        validate_chunk_size(op_id, settings.chunk_size)?;

        for (label, language) in [
            ("source_language", &settings.source_language),
            ("target_language", &settings.target_language),
        ] {
            if language.trim().is_empty() {
                return Err(anyhow!("{}: {} cannot be empty", op_id, label));
            }
            if !is_known_language(language) {
                warn!("{}: unrecognized {} '{}', using it as given", op_id, label, language);
            }
        }

        let prompts = &settings.prompts;
        if [
            &prompts.system_first,
            &prompts.user_first,
            &prompts.system_continuation,
            &prompts.user_continuation,
        ]
        .iter()
        .any(|p| p.trim().is_empty())
        {
            return Err(anyhow!("{}: translation prompts cannot be empty", op_id));
        }
        if !prompts.user_first.contains("{chunk}") || !prompts.user_continuation.contains("{chunk}") {
            return Err(anyhow!("{}: translation user prompts must contain {{chunk}}", op_id));
        }

        Ok(())
    }

    /// Build the pipeline from the enabled operations, sorted by `order`
    ///
    /// Operations without a model use the first operation's model, then
    /// `default_model`. Rewrite operations with no enabled task are left out.
    pub fn build_pipeline(&self) -> Pipeline {
        let mut operations: Vec<&OperationConfig> = self.operations.iter().filter(|op| op.enabled).collect();
        operations.sort_by_key(|op| op.order);

        let mut pipeline = Pipeline::default();
        let mut first_model: Option<String> = None;

        for op in operations {
            let model = match op.model.as_deref().map(str::trim) {
                Some(model) if !model.is_empty() => model.to_string(),
                _ => first_model.clone().unwrap_or_else(|| self.default_model.clone()),
            };
            first_model.get_or_insert_with(|| model.clone());

            let stage = match op.translation_settings() {
                Some(settings) => {
                    let chunking = if self.chunking.process_entire_file {
                        ChunkingPolicy::whole_file()
                    } else {
                        ChunkingPolicy::from_setting(settings.chunk_size, settings.overlap)
                    };
                    let translation = TranslationStage {
                        source_language: resolve_language_name(&settings.source_language),
                        target_language: resolve_language_name(&settings.target_language),
                        prompts: settings.prompts,
                        deduplicate: settings.deduplicate,
                        step_name: settings.step_name,
                        progress_step_name: settings.progress_step_name,
                    };
                    StageConfig::translation(&op.id, model, chunking, translation)
                }
                None => {
                    let rewrite = RewriteStage {
                        tasks: op.tasks.clone(),
                        enabled: op.task_states(),
                    };
                    if rewrite.enabled_task_ids().is_empty() {
                        debug!("Operation '{}' has no enabled tasks, leaving it out", op.id);
                        continue;
                    }
                    StageConfig::rewrite(
                        &op.id,
                        model,
                        op.temperature.unwrap_or(DEFAULT_REWRITE_TEMPERATURE),
                        self.chunking.policy(),
                        rewrite,
                    )
                }
            };

            pipeline.push(stage.with_name(op.display_name()));
        }

        pipeline
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            ollama: OllamaConfig::default(),
            default_model: default_model(),
            chunking: ChunkingConfig::default(),
            operations: default_operations(),
            log_level: LogLevel::default(),
        }
    }
}
