//! Coarse retry classification of pipeline errors by message keywords.

use std::collections::BTreeMap;
use std::fmt::Display;

const SYSTEM_KEYWORDS: &[&str] = &[
    "out of memory",
    "disk full",
    "no space left",
    "memory error",
    "permission denied",
    "access denied",
];

const RECOVERABLE_KEYWORDS: &[&str] = &[
    "rate limit",
    "timeout",
    "connection",
    "network",
    "temporary",
    "503",
    "502",
    "429",
    "quota exceeded",
    "service unavailable",
];

const PERMANENT_KEYWORDS: &[&str] = &[
    "not found",
    "invalid",
    "malformed",
    "bad request",
    "404",
    "401",
    "403",
    "400",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Timeouts, rate limits, transient service failures.
    Recoverable,
    /// Bad config, missing files, malformed data.
    Permanent,
    /// Resource exhaustion on the local machine.
    System,
}

impl ErrorCategory {
    /// System keywords win over recoverable, which win over permanent.
    /// Unrecognised errors are treated as recoverable.
    pub fn classify(message: &str) -> Self {
        let msg = message.to_lowercase();
        let any = |keywords: &[&str]| keywords.iter().any(|k| msg.contains(k));

        if any(SYSTEM_KEYWORDS) {
            Self::System
        } else if any(RECOVERABLE_KEYWORDS) {
            Self::Recoverable
        } else if any(PERMANENT_KEYWORDS) {
            Self::Permanent
        } else {
            Self::Recoverable
        }
    }

    pub fn of(err: &dyn Display) -> Self {
        Self::classify(&err.to_string())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Permanent => "permanent",
            Self::System => "system",
        }
    }

    pub fn should_retry(&self) -> bool {
        *self == Self::Recoverable
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing guidance for a failed attempt (`attempt` is 1-based).
pub fn retry_guidance(err: &dyn Display, attempt: u32, max_attempts: u32) -> String {
    match ErrorCategory::of(err) {
        ErrorCategory::System => format!(
            "System error detected (attempt {}/{}): {}. Consider checking system resources.",
            attempt, max_attempts, err
        ),
        ErrorCategory::Permanent => format!(
            "Permanent error detected (attempt {}/{}): {}. This error is unlikely to resolve with retries.",
            attempt, max_attempts, err
        ),
        ErrorCategory::Recoverable if attempt < max_attempts => format!(
            "Recoverable error (attempt {}/{}): {}. Will retry with backoff.",
            attempt, max_attempts, err
        ),
        ErrorCategory::Recoverable => format!(
            "All retry attempts exhausted ({} attempts): {}. Consider checking network connectivity or service status.",
            max_attempts, err
        ),
    }
}

/// Count errors per category.
pub fn error_summary<E: Display>(errors: &[E]) -> BTreeMap<ErrorCategory, usize> {
    let mut summary = BTreeMap::new();
    for err in errors {
        *summary.entry(ErrorCategory::of(err)).or_insert(0) += 1;
    }
    summary
}

pub fn message_with_context(
    err: &dyn Display,
    stage: &str,
    item_id: Option<&str>,
    method: Option<&str>,
) -> String {
    let mut parts = Vec::new();
    if let Some(id) = item_id {
        parts.push(format!("item {}", id));
    }
    if let Some(m) = method {
        parts.push(format!("method {}", m));
    }
    let context = if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    };
    format!("Error in {} stage{}: {}", stage, context, err)
}
