/*!
 * Stage executors.
 *
 * An executor chunks the current document, sends one generation call per
 * chunk, saves a progress snapshot after every chunk and joins the results.
 * Cancellation is checked before each chunk; an in-flight call always
 * completes.
 */

use std::time::Duration;

use log::{debug, info};

use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::chunker::{Segment, TextChunker, tail_chars};
use crate::pipeline::composer::{PromptComposer, render_template};
use crate::pipeline::dedup::deduplicate_paragraphs;
use crate::pipeline::events::EventSink;
use crate::pipeline::gateway::GenerationGateway;
use crate::pipeline::stage::{RewriteStage, StageConfig, TranslationPrompts, TranslationStage};
use crate::pipeline::steps::StepWriter;
use crate::providers::Provider;

/// Sampling temperature used for every translation call
pub const TRANSLATION_TEMPERATURE: f32 = 0.3;

/// Characters of preceding context quoted in continuation prompts
pub const CONTEXT_SNIPPET_CHARS: usize = 150;

/// Separator between processed chunks
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Shared collaborators of a running stage
pub struct StageContext<'a, P: Provider> {
    pub gateway: &'a GenerationGateway<P>,
    pub events: &'a EventSink,
    pub cancel: &'a CancellationToken,
    pub steps: &'a StepWriter,
    /// Pause after each chunk
    pub chunk_pause: Duration,
}

impl<P: Provider> StageContext<'_, P> {
    async fn pause(&self) {
        if self.chunk_pause.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.chunk_pause).await;
        }
    }
}

/// Pick the template pair for a segment
fn translation_templates<'p>(prompts: &'p TranslationPrompts, segment: &Segment) -> (&'p str, &'p str) {
    if !segment.is_first && !segment.preceding_context.is_empty() {
        (prompts.system_continuation.as_str(), prompts.user_continuation.as_str())
    } else {
        (prompts.system_first.as_str(), prompts.user_first.as_str())
    }
}

/// Runs a translation stage
pub struct TranslationExecutor<'c, 'a, P: Provider> {
    ctx: &'c StageContext<'a, P>,
}

impl<'c, 'a, P: Provider> TranslationExecutor<'c, 'a, P> {
    pub fn new(ctx: &'c StageContext<'a, P>) -> Self {
        Self { ctx }
    }

    /// Translate `document`; a cancelled run returns the chunks done so far
    pub async fn run(&self, document: &str, stage: &StageConfig, settings: &TranslationStage) -> String {
        let segments = TextChunker::split(document, &stage.chunking);
        let total = segments.len();
        let src = settings.source_language.as_str();
        let target = settings.target_language.as_str();

        self.ctx.events.status(format!(
            "Translation: {} → {} | {} chunks | Model: {}",
            src, target, total, stage.model
        ));

        let mut parts: Vec<String> = Vec::with_capacity(total);
        for (index, segment) in segments.iter().enumerate() {
            if self.ctx.cancel.is_cancelled() {
                info!("Translation stopped before chunk {}/{}", index + 1, total);
                break;
            }

            let (system_template, user_template) = translation_templates(&settings.prompts, segment);
            let snippet = tail_chars(&segment.preceding_context, CONTEXT_SNIPPET_CHARS);
            let vars = [
                ("src_lang", src),
                ("target_lang", target),
                ("context_snippet", snippet),
                ("chunk", segment.text.as_str()),
            ];
            let system = render_template(system_template, &vars);
            let user = render_template(user_template, &vars);

            debug!("Translating chunk {}/{} ({} chars)", index + 1, total, segment.text.chars().count());
            let translated = self
                .ctx
                .gateway
                .generate_or_placeholder(
                    &segment.text,
                    &system,
                    &user,
                    &stage.model,
                    TRANSLATION_TEMPERATURE,
                    self.ctx.events,
                )
                .await;
            parts.push(translated);

            self.ctx
                .steps
                .save(&parts.join(CHUNK_SEPARATOR), &settings.progress_step_name);
            self.ctx
                .events
                .progress(index + 1, total, format!("Translating ({} → {})", src, target));

            self.ctx.pause().await;
        }

        let joined = parts.join(CHUNK_SEPARATOR);
        if settings.deduplicate {
            deduplicate_paragraphs(&joined)
        } else {
            joined
        }
    }
}

/// Runs a combined rewrite stage with one fused prompt
pub struct CombinedExecutor<'c, 'a, P: Provider> {
    ctx: &'c StageContext<'a, P>,
}

impl<'c, 'a, P: Provider> CombinedExecutor<'c, 'a, P> {
    pub fn new(ctx: &'c StageContext<'a, P>) -> Self {
        Self { ctx }
    }

    /// Apply every enabled task to `document` in a single pass per chunk
    ///
    /// With no enabled task the document is returned unchanged.
    pub async fn run(
        &self,
        document: &str,
        stage: &StageConfig,
        settings: &RewriteStage,
        enabled_task_ids: &[String],
    ) -> String {
        let prompt = PromptComposer::compose(settings, enabled_task_ids);
        if prompt.is_empty() {
            debug!("No enabled tasks in stage '{}', passing text through", stage.name);
            return document.to_string();
        }

        let segments = TextChunker::split(document, &stage.chunking);
        let total = segments.len();
        let task_count = enabled_task_ids.len();
        let progress_step = format!("{}_progress", settings.combined_step_name(enabled_task_ids));

        self.ctx.events.status(format!(
            "{}: {} tasks combined | {} chunks | Model: {}",
            stage.name, task_count, total, stage.model
        ));

        let mut parts: Vec<String> = Vec::with_capacity(total);
        for (index, segment) in segments.iter().enumerate() {
            if self.ctx.cancel.is_cancelled() {
                info!("Stage '{}' stopped before chunk {}/{}", stage.name, index + 1, total);
                break;
            }

            let user = prompt.render_user(&segment.text);
            let processed = self
                .ctx
                .gateway
                .generate_or_placeholder(
                    &segment.text,
                    &prompt.system,
                    &user,
                    &stage.model,
                    stage.temperature,
                    self.ctx.events,
                )
                .await;
            parts.push(processed);

            self.ctx.steps.save(&parts.join(CHUNK_SEPARATOR), &progress_step);
            self.ctx.events.progress(
                index + 1,
                total,
                format!("{} ({} tasks combined)", stage.name, task_count),
            );

            self.ctx.pause().await;
        }

        deduplicate_paragraphs(&parts.join(CHUNK_SEPARATOR))
    }
}
