//! Match key normalization.
//!
//! Line items are joined across files on `(section, description, unit)`
//! after folding case, whitespace and punctuation. The fold is a pure
//! function of its input and is idempotent.

use std::fmt;

use serde::Serialize;

/// Punctuation kept when it joins two alphanumerics (`2.5`, `1/2`, `x-ray`).
const JOINERS: &[char] = &['.', '/', '-', '\'', '"', '&', '+'];

/// Fold a label into its comparable form: lowercase, punctuation outside of
/// a word turned into whitespace, whitespace runs collapsed, ends trimmed.
///
/// `"  Asphalt, 2in. "` and `"asphalt 2in"` fold to the same string.
pub fn normalize_text(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().flat_map(char::to_lowercase).collect();
    let mut out = String::with_capacity(chars.len());
    let mut pending_space = false;

    for (i, &c) in chars.iter().enumerate() {
        let keep = if c.is_alphanumeric() {
            true
        } else if JOINERS.contains(&c) {
            let prev = i.checked_sub(1).and_then(|p| chars.get(p));
            let next = chars.get(i + 1);
            matches!((prev, next), (Some(p), Some(n)) if p.is_alphanumeric() && n.is_alphanumeric())
        } else {
            false
        };

        if keep {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Normalized join key for a line item. Two items match iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MatchKey {
    pub section: String,
    pub description: String,
    pub unit: String,
}

impl MatchKey {
    pub fn new(section: &str, description: &str, unit: &str) -> Self {
        Self {
            section: normalize_text(section),
            description: normalize_text(description),
            unit: normalize_text(unit),
        }
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.section, self.description, self.unit)
    }
}
