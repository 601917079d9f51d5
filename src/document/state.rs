//! Open document tracking.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use super::text::LineIndex;

/// Snapshot of one open template.
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub line_index: LineIndex,
    /// Document version from the client.
    pub version: i32,
    /// Filesystem path for `file://` documents.
    pub path: Option<PathBuf>,
}

impl DocumentState {
    pub fn new(uri: &Url, text: String, version: i32) -> Self {
        Self {
            line_index: LineIndex::new(text),
            version,
            path: uri.to_file_path().ok(),
        }
    }

    pub fn text(&self) -> &str {
        self.line_index.text()
    }

    /// Directory containing the document, used to resolve `./` includes.
    pub fn directory(&self) -> Option<&Path> {
        self.path.as_deref()?.parent()
    }
}

/// Thread-safe storage for open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Arc<DocumentState>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document or replace its contents.
    pub fn open(&self, uri: Url, text: String, version: i32) -> Arc<DocumentState> {
        let state = Arc::new(DocumentState::new(&uri, text, version));
        self.documents.insert(uri, Arc::clone(&state));
        state
    }

    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<DocumentState>> {
        self.documents.get(uri).map(|r| Arc::clone(&r))
    }
}
