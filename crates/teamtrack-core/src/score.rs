// Game score validation ("3-1" style: two non-negative integers and a hyphen).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

static SCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+-\d+$").unwrap());

/// Whether `s` is a well-formed score string.
pub fn is_valid_score(s: &str) -> bool {
    SCORE_RE.is_match(s)
}

/// Normalize a score coming from a form or an edit.
///
/// - `None`, `""` and whitespace-only input mean "not played" and yield `Ok(None)`.
/// - Anything else must match `^\d+-\d+$` after trimming.
pub fn normalize_score(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if is_valid_score(trimmed) {
        Ok(Some(trimmed.to_string()))
    } else {
        Err(ValidationError::MalformedScore(raw.to_string()))
    }
}
