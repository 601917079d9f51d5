//! Completion of relative include paths.
//!
//! While the user types `{include file="./partials/he`, the directory part
//! (`./partials/`) is resolved against the current document's directory and
//! the template files under it are offered. Files nested deeper collapse into
//! one folder candidate per subdirectory. Only `./`-relative paths are
//! completed.

use std::collections::BTreeSet;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use ignore::WalkBuilder;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};

/// A quoted path right after `{include ` or a `file=` attribute, open up to
/// the end of the line prefix.
static INCLUDE_TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:\{\{?include\s+|file=)["']([^"']*)$"#).unwrap());

const RELATIVE_PREFIX: &str = "./";

/// Path completion request derived from the cursor context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionQuery {
    /// Directory whose templates are listed.
    pub directory: PathBuf,
    /// Text typed after the last `/`.
    pub partial_segment: String,
    /// Byte range of `partial_segment` in the document.
    pub replace: Range<usize>,
}

impl CompletionQuery {
    /// Build a query for the cursor at `offset`, or `None` when the cursor is
    /// not inside a `./` include path.
    pub fn at_cursor(text: &str, offset: usize, document_dir: &Path) -> Option<Self> {
        let before = text.get(..offset)?;
        let line = &before[before.rfind('\n').map_or(0, |i| i + 1)..];

        let fragment = INCLUDE_TRIGGER.captures(line)?.get(1)?.as_str();
        if !fragment.starts_with(RELATIVE_PREFIX) {
            return None;
        }

        let split = fragment.rfind('/')? + 1;
        let (directory_part, partial) = fragment.split_at(split);

        Some(Self {
            directory: join_relative(document_dir, directory_part),
            partial_segment: partial.to_string(),
            replace: offset - partial.len()..offset,
        })
    }
}

fn join_relative(base: &Path, relative: &str) -> PathBuf {
    let mut directory = base.to_path_buf();
    for component in Path::new(relative).components() {
        if component != Component::CurDir {
            directory.push(component);
        }
    }
    directory
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CandidateKind {
    Folder,
    File,
}

/// A single path suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    /// File name, or folder name followed by `/`.
    pub label: String,
    pub kind: CandidateKind,
    /// Byte range replaced when the candidate is accepted.
    pub replace: Range<usize>,
}

/// Turn a listing of paths relative to the query directory into candidates.
///
/// Folders come first, then files, each sorted by label.
pub fn candidates_from_listing<I, P>(listing: I, replace: &Range<usize>) -> Vec<CompletionCandidate>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut folders = BTreeSet::new();
    let mut files = BTreeSet::new();

    for path in listing {
        let mut segments = path.as_ref().components().filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        });
        let Some(first) = segments.next() else {
            continue;
        };
        if segments.next().is_some() {
            folders.insert(first);
        } else {
            files.insert(first);
        }
    }

    let folders = folders.into_iter().map(|name| CompletionCandidate {
        label: format!("{}/", name),
        kind: CandidateKind::Folder,
        replace: replace.clone(),
    });
    let files = files.into_iter().map(|name| CompletionCandidate {
        label: name,
        kind: CandidateKind::File,
        replace: replace.clone(),
    });
    folders.chain(files).collect()
}

/// Resolve a query against the filesystem.
///
/// Never fails: a missing directory, an unreadable entry, or a cancelled
/// token all produce an empty list.
pub async fn resolve(
    query: &CompletionQuery,
    extension: &str,
    cancel: CancellationToken,
) -> Vec<CompletionCandidate> {
    match list_templates(query.directory.clone(), extension.to_string(), cancel).await {
        Ok(listing) => {
            debug!(
                directory = %query.directory.display(),
                matches = listing.len(),
                "listed templates"
            );
            candidates_from_listing(listing, &query.replace)
        }
        Err(error) => {
            debug!(directory = %query.directory.display(), %error, "no include candidates");
            Vec::new()
        }
    }
}

async fn list_templates(
    directory: PathBuf,
    extension: String,
    cancel: CancellationToken,
) -> Result<Vec<PathBuf>> {
    let walk_cancel = cancel.clone();
    let walk =
        tokio::task::spawn_blocking(move || walk_templates(&directory, &extension, &walk_cancel));

    tokio::select! {
        _ = cancel.cancelled() => Err(Error::Cancelled),
        joined = walk => joined?,
    }
}

/// Recursively collect files with `extension`, relative to `directory`.
fn walk_templates(
    directory: &Path,
    extension: &str,
    cancel: &CancellationToken,
) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(Error::NotADirectory(directory.to_path_buf()));
    }

    let mut found = Vec::new();
    let walker = WalkBuilder::new(directory)
        .standard_filters(false)
        .hidden(true)
        .follow_links(false)
        .build();

    for entry in walker {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let entry = entry?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == extension) {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(directory) {
            found.push(relative.to_path_buf());
        }
    }

    Ok(found)
}
