//! Content guard for free text headed to storage or redisplay.
//!
//! Lengths are counted in characters, not bytes. Below the minimum is
//! `Malformed`, above the maximum `ContentTooLong`, and anything outside the
//! character class `ContentInvalidChars`.

use regex::Regex;

use crate::guard::rejection::{GuardResult, Rejection, RejectionReason};

/// Allowed character class.
#[derive(Debug, Clone)]
pub enum CharClass {
    /// Any non-control character; `\n` and `\t` allowed. `<` and `>` refused.
    PlainText,
    /// Any non-control character.
    Printable,
    /// Whole input must match the regex.
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub struct ContentPolicy {
    pub min_chars: usize,
    pub max_chars: usize,
    pub class: CharClass,
}

impl ContentPolicy {
    pub fn new(min_chars: usize, max_chars: usize, class: CharClass) -> Self {
        Self {
            min_chars,
            max_chars,
            class,
        }
    }
}

/// Text that satisfied a [`ContentPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidContent(String);

impl ValidContent {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for ValidContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn check(raw: &str, policy: &ContentPolicy) -> GuardResult<ValidContent> {
    // Bytes bound chars from above; skip the count for obviously huge input.
    if raw.len() > policy.max_chars.saturating_mul(4) {
        return Err(too_long(raw.len(), policy.max_chars));
    }
    let chars = raw.chars().count();
    if chars < policy.min_chars {
        return Err(Rejection::malformed(format!(
            "content has {} chars, minimum {}",
            chars, policy.min_chars
        )));
    }
    if chars > policy.max_chars {
        return Err(too_long(chars, policy.max_chars));
    }

    let offending = match &policy.class {
        CharClass::PlainText => raw
            .chars()
            .find(|c| (c.is_control() && *c != '\n' && *c != '\t') || *c == '<' || *c == '>'),
        CharClass::Printable => raw.chars().find(|c| c.is_control()),
        CharClass::Pattern(re) => {
            if re.is_match(raw) {
                None
            } else {
                return Err(Rejection::new(
                    RejectionReason::ContentInvalidChars,
                    format!("content does not match {}", re.as_str()),
                ));
            }
        }
    };
    if let Some(c) = offending {
        return Err(Rejection::new(
            RejectionReason::ContentInvalidChars,
            format!("disallowed character U+{:04X}", c as u32),
        ));
    }

    Ok(ValidContent(raw.to_string()))
}

fn too_long(len: usize, max: usize) -> Rejection {
    Rejection::new(
        RejectionReason::ContentTooLong,
        format!("content length {} exceeds {}", len, max),
    )
}
