/*!
 * Stage configuration types.
 *
 * A `Pipeline` is an ordered list of `StageConfig`s. Each stage is either a
 * translation stage or a combined rewrite stage that fuses several rewrite
 * tasks into one generation call per chunk.
 */

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pipeline::chunker::ChunkingPolicy;

/// A single rewrite task inside a combined stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Stable task id, e.g. `improve_flow`
    pub id: String,
    /// Optional display name overriding the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Full instruction prompt for the task
    pub prompt: String,
    /// Name used for step artifacts
    pub step_name: String,
}

impl TaskDefinition {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, step_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            prompt: prompt.into(),
            step_name: step_name.into(),
        }
    }

    /// Short description used in the combined user prompt
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_ref().filter(|n| !n.trim().is_empty()) {
            return name.clone();
        }
        task_display_name(&self.id)
    }
}

/// Built-in display name for a task id
///
/// Unknown ids fall back to the id with underscores replaced by spaces.
pub fn task_display_name(task_id: &str) -> String {
    let known = match task_id {
        "improve_flow" => Some("improve flow and readability"),
        "simplify_language" => Some("simplify complex language"),
        "remove_idioms" => Some("replace idioms with literal language"),
        "adjust_tone_formal" => Some("adjust tone to be more formal"),
        "adjust_tone_casual" => Some("adjust tone to be more casual"),
        "adjust_tone_professional" => Some("adjust tone to be more professional"),
        "adjust_tone_conversational" => Some("adjust tone to be more conversational"),
        _ => None,
    };

    match known {
        Some(name) => name.to_string(),
        None => task_id.replace('_', " "),
    }
}

/// Prompt templates for a translation stage
///
/// Templates may use `{src_lang}`, `{target_lang}`, `{context_snippet}` and `{chunk}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationPrompts {
    #[serde(default = "default_system_first")]
    pub system_first: String,
    #[serde(default = "default_user_first")]
    pub user_first: String,
    #[serde(default = "default_system_continuation")]
    pub system_continuation: String,
    #[serde(default = "default_user_continuation")]
    pub user_continuation: String,
}

fn default_system_first() -> String {
    "You are a professional literary translator. Translate the text from {src_lang} to {target_lang}. \
     Preserve paragraph breaks, tone and meaning. Output ONLY the translation without any explanations."
        .to_string()
}

fn default_user_first() -> String {
    "Translate the following text from {src_lang} to {target_lang}:\n\n{chunk}".to_string()
}

fn default_system_continuation() -> String {
    "You are a professional literary translator continuing a translation from {src_lang} to {target_lang}. \
     Keep terminology and style consistent with the preceding text and do not repeat it. \
     Output ONLY the translation of the new text without any explanations."
        .to_string()
}

fn default_user_continuation() -> String {
    "Preceding context (already translated, do not translate it again):\n{context_snippet}\n\n\
     Continue by translating the following text from {src_lang} to {target_lang}:\n\n{chunk}"
        .to_string()
}

impl Default for TranslationPrompts {
    fn default() -> Self {
        Self {
            system_first: default_system_first(),
            user_first: default_user_first(),
            system_continuation: default_system_continuation(),
            user_continuation: default_user_continuation(),
        }
    }
}

/// Settings specific to a translation stage
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationStage {
    /// Display name of the source language
    pub source_language: String,
    /// Display name of the target language
    pub target_language: String,
    pub prompts: TranslationPrompts,
    /// Drop repeated paragraphs from the joined result
    pub deduplicate: bool,
    /// Name of the final artifact for this stage
    pub step_name: String,
    /// Name of the per-chunk progress snapshot
    pub progress_step_name: String,
}

/// Settings specific to a combined rewrite stage
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RewriteStage {
    /// Tasks in definition order
    pub tasks: Vec<TaskDefinition>,
    /// Enabled state per task id
    pub enabled: HashMap<String, bool>,
}

impl RewriteStage {
    pub fn new(tasks: Vec<TaskDefinition>) -> Self {
        Self {
            tasks,
            enabled: HashMap::new(),
        }
    }

    /// Enable or disable a task by id
    pub fn with_task_enabled(mut self, task_id: impl Into<String>, enabled: bool) -> Self {
        self.enabled.insert(task_id.into(), enabled);
        self
    }

    /// Ids of enabled tasks, in definition order
    pub fn enabled_task_ids(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| self.enabled.get(&t.id).copied().unwrap_or(false))
            .map(|t| t.id.clone())
            .collect()
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Step name of the fused stage: enabled tasks' step names joined by `_`
    pub fn combined_step_name(&self, enabled: &[String]) -> String {
        enabled
            .iter()
            .filter_map(|id| self.task(id))
            .map(|t| t.step_name.as_str())
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// What a stage does
#[derive(Debug, Clone, PartialEq)]
pub enum StageKind {
    Translation(TranslationStage),
    Rewrite(RewriteStage),
}

/// One configured pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    /// Operation id the stage was built from
    pub id: String,
    /// Human readable stage name
    pub name: String,
    pub enabled: bool,
    pub model: String,
    pub temperature: f32,
    pub chunking: ChunkingPolicy,
    pub kind: StageKind,
}

impl StageConfig {
    pub fn translation(
        id: impl Into<String>,
        model: impl Into<String>,
        chunking: ChunkingPolicy,
        settings: TranslationStage,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            enabled: true,
            model: model.into(),
            temperature: crate::pipeline::executor::TRANSLATION_TEMPERATURE,
            chunking,
            kind: StageKind::Translation(settings),
        }
    }

    pub fn rewrite(
        id: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        chunking: ChunkingPolicy,
        settings: RewriteStage,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            enabled: true,
            model: model.into(),
            temperature,
            chunking,
            kind: StageKind::Rewrite(settings),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Ordered list of stages applied to one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<StageConfig>,
}

impl Pipeline {
    pub fn new(stages: Vec<StageConfig>) -> Self {
        Self { stages }
    }

    pub fn push(&mut self, stage: StageConfig) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[StageConfig] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
