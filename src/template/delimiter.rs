//! Detection of the brace dialect a template is written in.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The tag grammar with both sides doubled.
static DOUBLE_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s:\{\{\*.*?\*\}\})|\{\{[^}\n\s](?:[^{}]|\{[^{}]*\})*\}\}").unwrap()
});

/// Delimiter dialect of a single document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelimiterStyle {
    /// `{tag}`
    #[default]
    Single,
    /// `{{tag}}`
    Double,
}

impl DelimiterStyle {
    /// Classify a document. One double-brace tag anywhere is enough.
    pub fn detect(text: &str) -> Self {
        if DOUBLE_TAG_PATTERN.is_match(text) {
            Self::Double
        } else {
            Self::Single
        }
    }

    /// Block comment delimiters for this dialect.
    pub fn block_comment(self) -> (&'static str, &'static str) {
        match self {
            Self::Single => ("{*", "*}"),
            Self::Double => ("{{*", "*}}"),
        }
    }
}
