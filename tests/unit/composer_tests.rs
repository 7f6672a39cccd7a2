/*!
 * Tests for fused prompt composition
 */

use textpipe::app_config::Config;
use textpipe::pipeline::composer::{PromptComposer, render_template};
use textpipe::pipeline::{RewriteStage, StageKind, TaskDefinition};

fn default_rewrite_stage() -> RewriteStage {
    let pipeline = Config::default().build_pipeline();
    pipeline
        .stages()
        .iter()
        .find_map(|s| match &s.kind {
            StageKind::Rewrite(r) => Some(r.clone()),
            _ => None,
        })
        .expect("default config has a rewrite stage")
}

/// Default task prompts reduce to their core instruction without boilerplate
#[test]
fn test_compose_defaultTasks_shouldStripBoilerplate() {
    let stage = default_rewrite_stage();
    let enabled: Vec<String> = stage.tasks.iter().map(|t| t.id.clone()).collect();

    let prompt = PromptComposer::compose(&stage, &enabled);

    assert!(prompt.system.contains(
        "\n1. improve the flow and readability of the text by smoothing transitions and varying sentence structure."
    ));
    assert!(prompt.system.contains("\n2. simplify complex words"));
    assert!(prompt.system.contains("\n3. replace idioms"));
    assert!(!prompt.system.contains("Your task is to"));
    assert!(prompt.system.contains("\n\nOUTPUT FORMAT:\n"));
    assert!(prompt.user_template.contains(
        "improve flow and readability, simplify complex language, and replace idioms with literal language."
    ));
}

/// Enabled order follows the given id order, unknown ids are ignored
#[test]
fn test_compose_unknownId_shouldBeSkipped() {
    let stage = RewriteStage::new(vec![TaskDefinition::new("custom_task", "Do the custom thing.", "custom")]);
    let enabled = vec!["missing".to_string(), "custom_task".to_string()];

    let prompt = PromptComposer::compose(&stage, &enabled);

    assert!(prompt.system.contains("\n1. Do the custom thing."));
    assert!(!prompt.system.contains("\n2."));
    assert!(prompt.user_template.contains("applying these tasks: custom task."));
}

/// A multi-line prompt contributes only its first line
#[test]
fn test_coreInstruction_multiLine_shouldKeepFirstLine() {
    let core = PromptComposer::core_instruction("  Shorten every sentence.\nAlso keep lists intact.\n");

    assert_eq!(core, "Shorten every sentence.");
}

/// Only the first sentence of a one-line prompt is listed
#[test]
fn test_compose_twoSentencePrompt_shouldListFirstSentence() {
    let stage = RewriteStage::new(vec![TaskDefinition::new(
        "fix_typos",
        "You are a professional content rewriter. Your task is to fix spelling mistakes. Keep names unchanged.",
        "typos",
    )]);

    let prompt = PromptComposer::compose(&stage, &["fix_typos".to_string()]);

    assert!(prompt.system.contains("\n1. fix spelling mistakes.\n"));
    assert!(!prompt.system.contains("Keep names unchanged."));
}

/// Template rendering leaves unknown keys and literal braces in place
#[test]
fn test_renderTemplate_shouldReplaceKnownKeysOnly() {
    let rendered = render_template(
        "{src_lang} to {target_lang}: {chunk} ({note})",
        &[("src_lang", "English"), ("target_lang", "Czech"), ("chunk", "a {b} c")],
    );

    assert_eq!(rendered, "English to Czech: a {b} c ({note})");
}
