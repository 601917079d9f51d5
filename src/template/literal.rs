//! Suppression of tags inside `{literal}...{/literal}` blocks.

use super::tags::TagSpan;

/// Markers that open and close a literal block.
///
/// Matched as substrings of a span's text, so `{{literal}}` in the
/// double-brace dialect contains the opening marker too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralMarkers {
    pub open: &'static str,
    pub close: &'static str,
}

impl LiteralMarkers {
    /// Comments never open or close a block, whatever their text says.
    pub fn opens(&self, span: &TagSpan<'_>) -> bool {
        !span.is_comment() && span.text.contains(self.open)
    }

    pub fn closes(&self, span: &TagSpan<'_>) -> bool {
        !span.is_comment() && span.text.contains(self.close)
    }
}

impl Default for LiteralMarkers {
    fn default() -> Self {
        Self {
            open: "{literal}",
            close: "{/literal}",
        }
    }
}

/// Iterator adapter that drops the spans inside literal blocks.
///
/// The opening and closing marker spans are themselves kept. Spans are never
/// added or reordered.
pub struct LiteralFilter<I> {
    spans: I,
    markers: LiteralMarkers,
    inside_literal: bool,
}

impl<I> LiteralFilter<I> {
    pub fn new(spans: I, markers: LiteralMarkers) -> Self {
        Self {
            spans,
            markers,
            inside_literal: false,
        }
    }
}

impl<'a, I> Iterator for LiteralFilter<I>
where
    I: Iterator<Item = TagSpan<'a>>,
{
    type Item = TagSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let span = self.spans.next()?;

            if self.inside_literal {
                if self.markers.closes(&span) {
                    self.inside_literal = false;
                    return Some(span);
                }
                continue;
            }

            if self.markers.opens(&span) {
                self.inside_literal = true;
            }
            return Some(span);
        }
    }
}
