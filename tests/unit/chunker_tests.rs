/*!
 * Tests for boundary-aware chunking
 */

use textpipe::pipeline::chunker::{ChunkingPolicy, MaxChars, Segment, TextChunker, WHOLE_FILE_SENTINEL};

/// Deterministic pseudo-random document made of words, sentences and paragraphs
fn generated_document(seed: u64, words: usize) -> String {
    const VOCABULARY: &[&str] = &[
        "river", "mountain", "světlo", "a", "quietly", "über", "the", "lantern", "ran", "into",
        "«quoted»", "north", "dům", "and", "yesterday",
    ];
    let mut state = seed;
    let mut text = String::new();
    for i in 0..words {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let pick = (state >> 33) as usize;
        text.push_str(VOCABULARY[pick % VOCABULARY.len()]);
        match pick % 23 {
            0 => text.push_str(". "),
            1 => text.push_str("!\n\n"),
            2 => text.push_str("?\" "),
            3 => text.push_str(",\n"),
            _ if i + 1 < words => text.push(' '),
            _ => {}
        }
    }
    text
}

fn assert_partition(text: &str, segments: &[Segment]) {
    let chars: Vec<char> = text.chars().collect();
    assert_eq!(segments[0].start, 0);
    assert_eq!(segments.last().unwrap().end, chars.len());
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end, pair[1].start, "segments must be contiguous");
    }
    for segment in segments {
        let raw: String = chars[segment.start..segment.end].iter().collect();
        assert_eq!(segment.text, raw.trim());
    }
}

/// Every character belongs to exactly one segment and the text survives modulo trimming
#[test]
fn test_split_generatedDocuments_shouldPartitionText() {
    for seed in 1..6 {
        let text = generated_document(seed, 900);
        for max_chars in [40, 250, 1000] {
            let segments = TextChunker::split(&text, &ChunkingPolicy::new(max_chars, 60));
            assert_partition(&text, &segments);
        }
    }
}

/// Contexts never exceed the overlap nor the previous segment's length
#[test]
fn test_split_generatedDocuments_shouldBoundContext() {
    let text = generated_document(42, 1500);
    for overlap in [0, 1, 25, 200] {
        let segments = TextChunker::split(&text, &ChunkingPolicy::new(300, overlap));
        assert!(segments[0].preceding_context.is_empty());
        for pair in segments.windows(2) {
            let context = &pair[1].preceding_context;
            assert!(context.chars().count() <= overlap);
            assert!(context.chars().count() <= pair[0].text.chars().count());
            assert!(pair[0].text.ends_with(context.as_str()));
        }
    }
}

/// Only the first segment is marked first
#[test]
fn test_split_shouldMarkOnlyFirstSegment() {
    let text = generated_document(7, 600);
    let segments = TextChunker::split(&text, &ChunkingPolicy::new(200, 50));

    assert!(segments.len() > 2);
    assert!(segments[0].is_first);
    assert!(segments[1..].iter().all(|s| !s.is_first));
}

/// Cuts never run past the lookahead window
#[test]
fn test_split_segmentLength_shouldStayNearLimit() {
    let text = generated_document(11, 2000);
    let max_chars = 500;
    let segments = TextChunker::split(&text, &ChunkingPolicy::new(max_chars, 0));

    for segment in &segments {
        assert!(segment.end - segment.start <= max_chars + TextChunker::LOOKAHEAD);
    }
}

/// Sentence ends win over spaces even when slightly past the naive cut
#[test]
fn test_split_sentenceJustAfterCut_shouldUseLookahead() {
    let text = format!("{} end. Next part follows here.", "word ".repeat(9));
    let segments = TextChunker::split(&text, &ChunkingPolicy::new(45, 0));

    assert!(segments[0].text.ends_with("end."));
}

/// The whole-file sentinel keeps even huge documents in one piece
#[test]
fn test_fromSetting_sentinel_shouldMeanWholeFile() {
    let policy = ChunkingPolicy::from_setting(WHOLE_FILE_SENTINEL, 200);

    assert_eq!(policy.max_chars, MaxChars::WholeFile);
    let text = generated_document(3, 5000);
    assert_eq!(TextChunker::split(&text, &policy).len(), 1);
}
