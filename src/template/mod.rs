//! Smarty template analysis.
//!
//! This module provides:
//! - Tag scanning over raw document text
//! - Literal block suppression
//! - Delimiter dialect detection
//! - Relative include path completion

mod delimiter;
pub mod include_path;
mod literal;
mod tags;

pub use delimiter::DelimiterStyle;
pub use include_path::{CandidateKind, CompletionCandidate, CompletionQuery};
pub use literal::{LiteralFilter, LiteralMarkers};
pub use tags::{scan_tags, TagKind, TagScanner, TagSpan, TagSpans};

/// Tags to decorate: every scanned tag except those inside literal blocks.
pub fn decoration_spans(text: &str, markers: LiteralMarkers) -> LiteralFilter<TagSpans<'_>> {
    LiteralFilter::new(TagScanner::new(text).spans(), markers)
}
