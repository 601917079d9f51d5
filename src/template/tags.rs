//! Regex-based tokenizer for Smarty tags.
//!
//! A tag is either a comment (`{* ... *}`, `{{* ... *}}`) or a generic
//! directive (`{if $x}`, `{{$foo|upper}}`). The grammar tolerates exactly one
//! level of interior brace nesting, so `{assign var=x value={$y}}` is a single
//! tag, while deeper nesting only matches the innermost balanced part.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{CaptureMatches, Regex};

/// Comment form first so `{* ... *}` is never read as a directive.
/// Comments may span lines; directives cannot start with whitespace.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<comment>(?s:\{\{?\*.*?\*\}\}?))|\{\{?[^}\n\s](?:[^{}]|\{[^{}]*\})*\}\}?",
    )
    .unwrap()
});

/// Which grammar form produced a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Comment,
    Directive,
}

/// A contiguous tag match within a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpan<'a> {
    /// Byte range of the tag, braces included.
    pub range: Range<usize>,
    /// The raw tag text.
    pub text: &'a str,
    pub kind: TagKind,
}

impl TagSpan<'_> {
    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TagKind::Comment
    }
}

/// Scanner over a single document.
///
/// Holds no state besides the text, so `spans()` can be called any number of
/// times and always yields the same sequence.
#[derive(Debug, Clone, Copy)]
pub struct TagScanner<'a> {
    text: &'a str,
}

impl<'a> TagScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Start a fresh left-to-right scan.
    pub fn spans(&self) -> TagSpans<'a> {
        TagSpans {
            captures: TAG_PATTERN.captures_iter(self.text),
        }
    }
}

/// Lazy iterator of non-overlapping tag spans in increasing offset order.
pub struct TagSpans<'a> {
    captures: CaptureMatches<'static, 'a>,
}

impl<'a> Iterator for TagSpans<'a> {
    type Item = TagSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.captures.next()?;
        let whole = caps.get(0)?;
        let kind = if caps.name("comment").is_some() {
            TagKind::Comment
        } else {
            TagKind::Directive
        };
        Some(TagSpan {
            range: whole.range(),
            text: whole.as_str(),
            kind,
        })
    }
}

/// Collect every tag span in `text`.
pub fn scan_tags(text: &str) -> Vec<TagSpan<'_>> {
    TagScanner::new(text).spans().collect()
}
