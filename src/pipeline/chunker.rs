/*!
 * Boundary-aware text chunking.
 *
 * Splits a document into segments of roughly `max_chars` characters, moving
 * each cut to the nearest sentence end, paragraph break or space inside a
 * small window around the naive cut point. Every segment carries the tail of
 * the previous segment as continuity context.
 *
 * All positions are measured in characters, not bytes.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Config value that disables chunking entirely
pub const WHOLE_FILE_SENTINEL: i64 = -1;

/// Sentence terminator followed by whitespace
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence break pattern is valid"));

/// Sentence terminator, closing quotation mark, whitespace
static QUOTED_SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]["»”]\s+"#).expect("quoted sentence break pattern is valid"));

/// Blank line between paragraphs
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern is valid"));

/// Upper bound on segment length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxChars {
    /// The whole document is one segment
    WholeFile,
    /// Cut at roughly this many characters
    Limit(usize),
}

/// How a document is cut into segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingPolicy {
    pub max_chars: MaxChars,
    pub overlap_chars: usize,
}

impl ChunkingPolicy {
    pub fn new(max_chars: usize, overlap_chars: usize) -> Self {
        Self {
            max_chars: MaxChars::Limit(max_chars),
            overlap_chars,
        }
    }

    pub fn whole_file() -> Self {
        Self {
            max_chars: MaxChars::WholeFile,
            overlap_chars: 0,
        }
    }

    /// Build a policy from a config value where a negative size means whole file
    pub fn from_setting(chunk_size: i64, overlap_chars: usize) -> Self {
        if chunk_size < 0 {
            Self::whole_file()
        } else {
            Self::new(chunk_size as usize, overlap_chars)
        }
    }
}

/// One contiguous slice of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Trimmed text of the span
    pub text: String,
    /// Tail of the previous segment's text, empty for the first segment
    pub preceding_context: String,
    /// True only for the segment starting at position 0
    pub is_first: bool,
    /// Char position where the raw span starts
    pub start: usize,
    /// Char position where the raw span ends (exclusive)
    pub end: usize,
}

/// Char-indexed view of a string
struct CharIndex<'a> {
    text: &'a str,
    /// Byte offset of every char, plus the total length as the last entry
    offsets: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    fn new(text: &'a str) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        Self { text, offsets }
    }

    fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    fn byte(&self, char_pos: usize) -> usize {
        self.offsets[char_pos]
    }

    /// Regex matches always end on a char boundary
    fn char_pos(&self, byte_pos: usize) -> usize {
        self.offsets.binary_search(&byte_pos).unwrap_or_else(|i| i)
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.byte(start)..self.byte(end)]
    }
}

/// Last `n` characters of `text`
pub fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &text[i..],
        None => text,
    }
}

/// Text chunker with smart boundary detection
pub struct TextChunker;

impl TextChunker {
    /// How far before the naive cut boundaries are searched
    pub const LOOKBEHIND: usize = 200;
    /// How far after the naive cut boundaries are searched
    pub const LOOKAHEAD: usize = 100;
    /// How far before the naive cut a space may be used
    pub const SPACE_SEARCH: usize = 100;

    /// Split `text` into ordered segments according to `policy`
    pub fn split(text: &str, policy: &ChunkingPolicy) -> Vec<Segment> {
        let index = CharIndex::new(text);
        let text_len = index.len();

        let max_chars = match policy.max_chars {
            MaxChars::WholeFile => None,
            MaxChars::Limit(limit) => Some(limit.max(1)),
        };

        let max_chars = match max_chars {
            Some(limit) if text_len > limit => limit,
            _ => {
                return vec![Segment {
                    text: text.to_string(),
                    preceding_context: String::new(),
                    is_first: true,
                    start: 0,
                    end: text_len,
                }];
            }
        };

        let mut segments = Vec::new();
        let mut position = 0;
        let mut previous_end = String::new();

        while position < text_len {
            let naive_cut = (position + max_chars).min(text_len);
            let cut = if naive_cut < text_len {
                Self::find_cut(&index, position, naive_cut)
            } else {
                naive_cut
            };

            let segment_text = index.slice(position, cut).trim().to_string();
            let context_size = policy.overlap_chars.min(segment_text.chars().count());
            let context = tail_chars(&segment_text, context_size).to_string();

            segments.push(Segment {
                text: segment_text,
                preceding_context: std::mem::replace(&mut previous_end, context),
                is_first: position == 0,
                start: position,
                end: cut,
            });

            position = cut;
        }

        segments
    }

    /// Choose the cut for a span starting at `position`; always returns a value > `position`
    fn find_cut(index: &CharIndex<'_>, position: usize, naive_cut: usize) -> usize {
        let search_start = naive_cut.saturating_sub(Self::LOOKBEHIND).max(position);
        let search_end = (naive_cut + Self::LOOKAHEAD).min(index.len());

        let mut sentence_breaks =
            Self::candidates(&SENTENCE_BREAK, index, search_start, search_end, position);
        sentence_breaks.extend(Self::candidates(
            &QUOTED_SENTENCE_BREAK,
            index,
            search_start,
            search_end,
            position,
        ));
        if let Some(cut) = Self::pick(&sentence_breaks, naive_cut) {
            return cut;
        }

        let paragraph_breaks =
            Self::candidates(&PARAGRAPH_BREAK, index, search_start, search_end, position);
        if let Some(cut) = Self::pick(&paragraph_breaks, naive_cut) {
            return cut;
        }

        // Nearest space within SPACE_SEARCH chars before the naive cut
        let space_from = naive_cut.saturating_sub(Self::SPACE_SEARCH);
        let space = index
            .slice(space_from, naive_cut)
            .rfind(' ')
            .map(|byte_pos| index.char_pos(index.byte(space_from) + byte_pos));
        match space {
            Some(space_pos) if space_pos > position => space_pos + 1,
            _ => naive_cut,
        }
    }

    /// Char positions right after each match inside the search window
    fn candidates(
        pattern: &Regex,
        index: &CharIndex<'_>,
        search_start: usize,
        search_end: usize,
        position: usize,
    ) -> Vec<usize> {
        let base = index.byte(search_start);
        pattern
            .find_iter(index.slice(search_start, search_end))
            .map(|m| index.char_pos(base + m.end()))
            .filter(|&pos| pos > position)
            .collect()
    }

    /// Latest candidate not past the naive cut, else the earliest candidate
    fn pick(candidates: &[usize], naive_cut: usize) -> Option<usize> {
        candidates
            .iter()
            .copied()
            .filter(|&c| c <= naive_cut)
            .max()
            .or_else(|| candidates.iter().copied().min())
    }
}
