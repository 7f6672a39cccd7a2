//! Language utilities for prompt language names
//!
//! Translation prompts speak about languages by name ("English", "Czech"),
//! while users often type ISO 639-1 or ISO 639-2 codes. These helpers turn
//! either form into a display name.

use anyhow::{Result, anyhow};
use isolang::Language;

/// Map an ISO 639-2/B code to its ISO 639-2/T equivalent
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    let mapped = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(mapped)
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => {
            if let Some(lang) = Language::from_639_1(&normalized_code) {
                return Ok(lang.to_639_3().to_string());
            }
        }
        3 => {
            if Language::from_639_3(&normalized_code).is_some() {
                return Ok(normalized_code);
            }
            if let Some(part2t) = bibliographic_to_terminology(&normalized_code) {
                return Ok(part2t.to_string());
            }
        }
        _ => {}
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Find a language by its English name, ignoring the case of the first letter
fn language_from_name(name: &str) -> Option<Language> {
    let name = name.trim();
    Language::from_name(name).or_else(|| {
        let mut chars = name.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => return None,
        };
        Language::from_name(&capitalized)
    })
}

/// True when `value` is a known ISO code or English language name
pub fn is_known_language(value: &str) -> bool {
    normalize_to_part2t(value).is_ok() || language_from_name(value).is_some()
}

/// Display name for a code or a name
///
/// Codes resolve to their English name. Anything else is returned trimmed,
/// so custom names like "Brazilian Portuguese" keep working.
pub fn resolve_language_name(value: &str) -> String {
    if let Ok(name) = get_language_name(value) {
        return name;
    }
    match language_from_name(value) {
        Some(lang) => lang.to_name().to_string(),
        None => value.trim().to_string(),
    }
}
