/*!
 * Paragraph deduplication.
 *
 * Neighbouring chunks can both reproduce a paragraph that sits on their
 * shared boundary; joined stage output is cleaned up here.
 */

use std::collections::HashSet;

/// Remove repeated paragraphs, keeping the first occurrence of each
///
/// Paragraphs are separated by blank lines. Two paragraphs are considered the
/// same when they match after lowercasing and collapsing whitespace. Kept
/// paragraphs are trimmed and re-joined with a single blank line, so applying
/// the function twice gives the same result as applying it once.
pub fn deduplicate_paragraphs(text: &str) -> String {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        let normalized = paragraph
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if seen.insert(normalized) {
            kept.push(paragraph);
        }
    }

    kept.join("\n\n")
}
