//! Keyword status classifier
//!
//! Infers a live/dead status and a cleaned animal name from typed text or a
//! speech transcript. Matching is deterministic: the lowercased input is
//! scanned for a fixed, ordered set of keywords. Dead keywords are checked
//! first and short-circuit, so "dead deer sitting" resolves to dead.
//!
//! Detection is a plain substring test. Stripping is whole-word only, so
//! "deadline" is detected as dead but the word itself is left intact.
//! Multi-word keywords ("ran over") strip only when both words appear with
//! a single space between them.

use crate::models::SightingStatus;

/// Keywords implying the animal was found dead, in priority order
pub const DEAD_KEYWORDS: &[&str] = &[
    "dead",
    "roadkill",
    "road kill",
    "killed",
    "hit",
    "deceased",
    "carcass",
    "flattened",
    "squished",
    "ran over",
    "run over",
];

/// Keywords implying the animal was seen alive, in priority order
pub const LIVE_KEYWORDS: &[&str] = &[
    "live", "alive", "living", "flying", "spotted", "running", "walking", "swimming", "sitting",
    "perched",
];

/// Result of classifying one piece of input text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: SightingStatus,
    pub cleaned_animal: String,
    /// First keyword that decided the status, if any
    pub matched_keyword: Option<&'static str>,
}

/// Classify raw text into a status and a cleaned animal name.
///
/// Every keyword of the winning group is stripped as a whole word, then
/// whitespace is collapsed. If nothing would be left the trimmed input is
/// returned instead, so "dead" alone stays "dead". Empty input yields
/// `live` with an empty name; rejecting that is the caller's job.
pub fn classify(input: &str) -> Classification {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    let (status, keywords, matched) = match first_match(&lower, DEAD_KEYWORDS) {
        Some(keyword) => (SightingStatus::Dead, DEAD_KEYWORDS, Some(keyword)),
        None => match first_match(&lower, LIVE_KEYWORDS) {
            Some(keyword) => (SightingStatus::Live, LIVE_KEYWORDS, Some(keyword)),
            None => (SightingStatus::Live, LIVE_KEYWORDS, None),
        },
    };

    let cleaned_animal = match matched {
        Some(_) => {
            let stripped = keywords
                .iter()
                .fold(trimmed.to_string(), |text, keyword| strip_whole_word(&text, keyword));
            let collapsed = collapse_whitespace(&stripped);
            if collapsed.is_empty() {
                trimmed.to_string()
            } else {
                collapsed
            }
        }
        None => trimmed.to_string(),
    };

    Classification {
        status,
        cleaned_animal,
        matched_keyword: matched,
    }
}

fn first_match(lower: &str, keywords: &[&'static str]) -> Option<&'static str> {
    keywords.iter().copied().find(|keyword| lower.contains(keyword))
}

/// Word characters for boundary purposes (ASCII letters, digits, underscore)
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Remove every whole-word, ASCII case-insensitive occurrence of `keyword`.
///
/// Keywords are ASCII, so a match always starts and ends on a char boundary
/// and slicing the original text stays valid for non-ASCII input.
fn strip_whole_word(text: &str, keyword: &str) -> String {
    let bytes = text.as_bytes();
    let kw = keyword.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut i = 0;

    while i + kw.len() <= bytes.len() {
        let end = i + kw.len();
        let starts_word = i == 0 || !is_word_byte(bytes[i - 1]);
        let ends_word = end == bytes.len() || !is_word_byte(bytes[end]);

        if starts_word && ends_word && bytes[i..end].eq_ignore_ascii_case(kw) {
            out.push_str(&text[last..i]);
            i = end;
            last = end;
        } else {
            i += 1;
        }
    }

    out.push_str(&text[last..]);
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
