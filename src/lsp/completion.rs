//! Completion items for include paths.

use tower_lsp::lsp_types::*;

use crate::document::LineIndex;
use crate::template::{CandidateKind, CompletionCandidate};

/// Client command that reopens the suggestion widget after a folder is
/// accepted, so the user can keep descending.
const RETRIGGER_SUGGEST: &str = "editor.action.triggerSuggest";

fn to_completion_item(candidate: &CompletionCandidate, line_index: &LineIndex) -> CompletionItem {
    let range = line_index.span_to_range(&candidate.replace);
    let (kind, sort_prefix, command) = match candidate.kind {
        CandidateKind::Folder => (
            CompletionItemKind::FOLDER,
            "0",
            Some(Command {
                title: "Suggest".to_string(),
                command: RETRIGGER_SUGGEST.to_string(),
                arguments: None,
            }),
        ),
        CandidateKind::File => (CompletionItemKind::FILE, "1", None),
    };

    CompletionItem {
        label: candidate.label.clone(),
        kind: Some(kind),
        sort_text: Some(format!("{}_{}", sort_prefix, candidate.label)),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range,
            new_text: candidate.label.clone(),
        })),
        command,
        ..Default::default()
    }
}

/// Convert path candidates into a completion response.
pub fn completion_response(
    candidates: &[CompletionCandidate],
    line_index: &LineIndex,
) -> Option<CompletionResponse> {
    if candidates.is_empty() {
        return None;
    }
    let items = candidates
        .iter()
        .map(|c| to_completion_item(c, line_index))
        .collect();
    Some(CompletionResponse::Array(items))
}
