//! LSP protocol feature implementations.
//!
//! This module provides implementations for LSP features:
//! - Semantic tokens for tag decoration
//! - Completion items for include paths
//! - Delimiter dialect messages

mod completion;
mod delimiter;
mod semantic_tokens;

pub use completion::completion_response;
pub use delimiter::{DelimiterStyleNotification, DelimiterStyleParams, DELIMITER_STYLE_METHOD};
pub use semantic_tokens::{legend, token_types, tokens_for_document};
