//! Custom protocol messages carrying a document's delimiter dialect.
//!
//! Clients use the comment pair to configure block comment toggling. The
//! server pushes `smarty/delimiterStyle` notifications on open and after
//! edits, and answers a request of the same name when the active editor
//! changes.

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::Url;

use crate::template::DelimiterStyle;

pub const DELIMITER_STYLE_METHOD: &str = "smarty/delimiterStyle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelimiterStyleParams {
    pub uri: Url,
    pub style: DelimiterStyle,
    /// `[open, close]` block comment delimiters.
    pub block_comment: [String; 2],
}

impl DelimiterStyleParams {
    /// Detect the dialect of `text`.
    pub fn detect(uri: Url, text: &str) -> Self {
        let style = DelimiterStyle::detect(text);
        let (open, close) = style.block_comment();
        Self {
            uri,
            style,
            block_comment: [open.to_string(), close.to_string()],
        }
    }
}

pub enum DelimiterStyleNotification {}

impl Notification for DelimiterStyleNotification {
    type Params = DelimiterStyleParams;
    const METHOD: &'static str = DELIMITER_STYLE_METHOD;
}
