//! Byte offset <-> LSP position conversion.
//!
//! LSP columns count UTF-16 code units, tags and completion ranges are byte
//! offsets into the document text.

use std::ops::Range;
use std::sync::Arc;

use tower_lsp::lsp_types::{self, Position};

/// Document text with pre-computed line starts.
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: Arc<str>,
    /// Byte offset of the first character of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// A cheap handle on the text for background tasks.
    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset) - 1
    }

    /// End of `line`, excluding its newline.
    fn line_end(&self, line: usize) -> usize {
        self.line_starts
            .get(line + 1)
            .map_or(self.text.len(), |next| next - 1)
    }

    /// Byte offset where the line containing `offset` starts.
    pub fn line_start(&self, offset: usize) -> usize {
        self.line_starts[self.line_of(offset.min(self.text.len()))]
    }

    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self.line_of(offset);
        let start = self.line_start(offset);
        let character = self.text[start..]
            .char_indices()
            .take_while(|(i, _)| start + i < offset)
            .map(|(_, c)| c.len_utf16() as u32)
            .sum();
        Position::new(line as u32, character)
    }

    /// Returns `None` for lines past the end of the document. Columns past
    /// the end of a line clamp to the line end.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let line = position.line as usize;
        let start = *self.line_starts.get(line)?;
        let end = self.line_end(line);

        let mut column = 0u32;
        for (i, c) in self.text[start..end].char_indices() {
            if column >= position.character {
                return Some(start + i);
            }
            column += c.len_utf16() as u32;
        }
        Some(end)
    }

    pub fn span_to_range(&self, span: &Range<usize>) -> lsp_types::Range {
        lsp_types::Range::new(
            self.offset_to_position(span.start),
            self.offset_to_position(span.end),
        )
    }
}
