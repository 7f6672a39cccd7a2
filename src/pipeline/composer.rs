/*!
 * Prompt composition for combined rewrite stages.
 *
 * Several enabled rewrite tasks are merged into a single system prompt and a
 * single user template, so every chunk needs only one generation call.
 */

use crate::pipeline::stage::RewriteStage;

/// Phrases removed from a task prompt before it is listed as a core instruction
const INSTRUCTION_BOILERPLATE: &[&str] = &[
    "You are a professional content rewriter. Your task is to ",
    "You are a professional content rewriter specializing in ",
    " DO NOT translate or change the language of the text.",
    " Do NOT omit any content, change the meaning, or alter factual information.",
    " Output ONLY the processed text without any explanations.",
    " Output ONLY the rewritten text without any explanations.",
    " Output ONLY the simplified text without any explanations.",
];

const SYSTEM_HEADER: &str = "You are a professional content rewriter and editor. \
You will perform MULTIPLE tasks on the provided text in a SINGLE pass.\n\nYour tasks are:";

const REQUIREMENTS: &[&str] = &[
    "Perform ALL tasks listed above in a single pass - do not process the text multiple times",
    "DO NOT translate or change the language of the text",
    "Do NOT omit any content, change the meaning, or alter factual information",
    "Preserve all key points, arguments, and details",
    "All tasks should work together harmoniously in the output",
];

const OUTPUT_FORMAT: &str = "Output ONLY the fully processed text with all tasks applied. \
No explanations, no meta-comments, no introductory remarks. Start immediately with the processed content.";

/// Placeholder in the user template that receives the chunk
pub const TEXT_PLACEHOLDER: &str = "text";

/// A fused system prompt plus the user template it pairs with
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposedPrompt {
    pub system: String,
    /// Contains `{text}` where the chunk goes
    pub user_template: String,
}

impl ComposedPrompt {
    /// True when no task was enabled
    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.user_template.is_empty()
    }

    /// User message for one chunk
    pub fn render_user(&self, chunk: &str) -> String {
        render_template(&self.user_template, &[(TEXT_PLACEHOLDER, chunk)])
    }
}

/// Builds combined prompts from a rewrite stage
pub struct PromptComposer;

impl PromptComposer {
    /// Compose the fused prompt for `enabled_task_ids`
    ///
    /// Unknown ids are skipped. With nothing left to compose the result is empty.
    pub fn compose(stage: &RewriteStage, enabled_task_ids: &[String]) -> ComposedPrompt {
        let tasks: Vec<_> = enabled_task_ids
            .iter()
            .filter_map(|id| stage.task(id))
            .collect();
        if tasks.is_empty() {
            return ComposedPrompt::default();
        }

        let mut system = String::from(SYSTEM_HEADER);
        for (idx, task) in tasks.iter().enumerate() {
            system.push_str(&format!("\n{}. {}", idx + 1, Self::core_instruction(&task.prompt)));
        }

        system.push_str("\n\nCRITICAL REQUIREMENTS:");
        for requirement in REQUIREMENTS {
            system.push_str(&format!("\n• {}", requirement));
        }
        system.push_str("\n\nOUTPUT FORMAT:\n");
        system.push_str(OUTPUT_FORMAT);

        let names: Vec<String> = tasks.iter().map(|t| t.display_name()).collect();
        let user_template = format!(
            "Process this text by applying these tasks: {}.\n\nText to process:\n\n{{{}}}",
            Self::task_list(&names),
            TEXT_PLACEHOLDER
        );

        ComposedPrompt { system, user_template }
    }

    /// The task's instruction without boilerplate, first sentence only
    ///
    /// A sentence ends at `.`, `!` or `?` followed by whitespace, or at the
    /// end of the first line.
    pub fn core_instruction(prompt: &str) -> String {
        let mut core = prompt.to_string();
        for phrase in INSTRUCTION_BOILERPLATE {
            core = core.replace(phrase, "");
        }

        let first_line = core.trim().lines().next().unwrap_or_default().trim();
        let mut chars = first_line.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            let at_break = matches!(c, '.' | '!' | '?')
                && chars.peek().is_some_and(|(_, next)| next.is_whitespace());
            if at_break {
                return first_line[..i + c.len_utf8()].to_string();
            }
        }
        first_line.to_string()
    }

    /// `a`, `a, and b`, `a, b, and c`
    pub fn task_list(names: &[String]) -> String {
        match names {
            [] => String::new(),
            [only] => only.clone(),
            [init @ .., last] => format!("{}, and {}", init.join(", "), last),
        }
    }
}

/// Substitute `{key}` placeholders in a single pass
///
/// Substituted values are never scanned again, so a chunk containing
/// `{chunk}` stays literal. Unknown placeholders are left untouched.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
