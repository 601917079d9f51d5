//! Semantic tokens for Smarty tag decoration.

use tower_lsp::lsp_types::{SemanticToken, SemanticTokenType, SemanticTokensLegend};

use crate::document::{DocumentState, LineIndex};
use crate::template::{decoration_spans, LiteralMarkers, TagSpan};

/// Token type indices (must match LEGEND order).
pub mod token_types {
    pub const COMMENT: u32 = 0;
    pub const TAG: u32 = 1;
    pub const LITERAL: u32 = 2;
}

/// Get the semantic tokens legend for capability declaration.
pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: vec![
            SemanticTokenType::COMMENT,
            SemanticTokenType::MACRO,
            SemanticTokenType::KEYWORD,
        ],
        token_modifiers: vec![],
    }
}

/// A single-line token before delta encoding.
#[derive(Debug, Clone)]
struct RawToken {
    start: usize,
    /// Length in UTF-16 code units.
    length: u32,
    token_type: u32,
}

fn token_type(span: &TagSpan<'_>, markers: &LiteralMarkers) -> u32 {
    if span.is_comment() {
        token_types::COMMENT
    } else if markers.opens(span) || markers.closes(span) {
        token_types::LITERAL
    } else {
        token_types::TAG
    }
}

/// Split a span into one token per line it covers.
fn push_span(tokens: &mut Vec<RawToken>, span: &TagSpan<'_>, token_type: u32) {
    let mut start = span.start();
    for line in span.text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        let length = content.encode_utf16().count() as u32;
        if length > 0 {
            tokens.push(RawToken {
                start,
                length,
                token_type,
            });
        }
        start += line.len();
    }
}

/// Generate semantic tokens for every decorated tag in a document.
pub fn tokens_for_document(state: &DocumentState, markers: LiteralMarkers) -> Vec<SemanticToken> {
    let mut tokens = Vec::new();
    for span in decoration_spans(state.text(), markers) {
        let kind = token_type(&span, &markers);
        push_span(&mut tokens, &span, kind);
    }
    encode_tokens(&tokens, &state.line_index)
}

fn encode_tokens(tokens: &[RawToken], line_index: &LineIndex) -> Vec<SemanticToken> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;

    for token in tokens {
        let pos = line_index.offset_to_position(token.start);
        let delta_line = pos.line - prev_line;
        let delta_start = if delta_line == 0 {
            pos.character - prev_start
        } else {
            pos.character
        };

        result.push(SemanticToken {
            delta_line,
            delta_start,
            length: token.length,
            token_type: token.token_type,
            token_modifiers_bitset: 0,
        });

        prev_line = pos.line;
        prev_start = pos.character;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Url;

    fn tokens(source: &str) -> Vec<(u32, u32, u32, u32)> {
        let uri = Url::parse("file:///t/page.tpl").unwrap();
        let state = DocumentState::new(&uri, source.to_string(), 0);
        tokens_for_document(&state, LiteralMarkers::default())
            .into_iter()
            .map(|t| (t.delta_line, t.delta_start, t.length, t.token_type))
            .collect()
    }

    #[test]
    fn legend_matches_token_types() {
        let leg = legend();
        assert_eq!(leg.token_types.len(), 3);
        assert_eq!(
            leg.token_types[token_types::COMMENT as usize],
            SemanticTokenType::COMMENT
        );
        assert_eq!(
            leg.token_types[token_types::TAG as usize],
            SemanticTokenType::MACRO
        );
    }

    #[test]
    fn tags_on_one_line() {
        assert_eq!(
            tokens("<b>{$a}</b>{if $b}"),
            vec![(0, 3, 4, token_types::TAG), (0, 8, 7, token_types::TAG)]
        );
    }

    #[test]
    fn multiline_comment_is_split_per_line() {
        assert_eq!(
            tokens("{$a}\n{* x\ny *}"),
            vec![
                (0, 0, 4, token_types::TAG),
                (1, 0, 4, token_types::COMMENT),
                (1, 0, 4, token_types::COMMENT),
            ]
        );
    }

    #[test]
    fn literal_body_is_not_decorated() {
        assert_eq!(
            tokens("{literal}{x}{/literal}"),
            vec![
                (0, 0, 9, token_types::LITERAL),
                (0, 12, 10, token_types::LITERAL)
            ]
        );
    }

    #[test]
    fn comment_mentioning_literal_keeps_later_tags() {
        assert_eq!(
            tokens("{* {literal} *}{$a}"),
            vec![
                (0, 0, 15, token_types::COMMENT),
                (0, 15, 4, token_types::TAG)
            ]
        );
    }

    #[test]
    fn columns_are_utf16() {
        assert_eq!(tokens("é😀{$a}"), vec![(0, 3, 4, token_types::TAG)]);
    }

    #[test]
    fn crlf_is_not_counted() {
        assert_eq!(
            tokens("{*a\r\nb*}"),
            vec![
                (0, 0, 3, token_types::COMMENT),
                (1, 0, 3, token_types::COMMENT)
            ]
        );
    }
}
