//! Settings infrastructure for smartysp.
//!
//! Settings are read from a `smartysp.toml` file discovered near the
//! workspace root:
//!
//! ```toml
//! [completion]
//! extension = "tpl"
//!
//! [decorations]
//! debounce_ms = 100
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;

pub const SETTINGS_FILE: &str = "smartysp.toml";

const DEFAULT_EXTENSION: &str = "tpl";
const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Root settings structure loaded from smartysp.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    pub completion: Option<CompletionSettings>,
    pub decorations: Option<DecorationSettings>,
}

/// Include path completion settings.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionSettings {
    /// Template file extension, with or without the leading dot.
    pub extension: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecorationSettings {
    /// Quiet period after an edit before the document is analysed again.
    pub debounce_ms: Option<u64>,
}

impl Settings {
    /// Extension offered by include completion, without the dot.
    pub fn template_extension(&self) -> &str {
        self.completion
            .as_ref()
            .and_then(|c| c.extension.as_deref())
            .map(|ext| ext.trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .unwrap_or(DEFAULT_EXTENSION)
    }

    pub fn debounce(&self) -> Duration {
        let millis = self
            .decorations
            .as_ref()
            .and_then(|d| d.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);
        Duration::from_millis(millis)
    }
}

/// Parse a settings file.
pub fn try_load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load settings from a file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match try_load_settings(path) {
        Ok(settings) => settings,
        Err(error) => {
            warn!(path = %path.display(), %error, "using default settings");
            Settings::default()
        }
    }
}

/// Discover smartysp.toml by searching up the directory tree, then direct children.
///
/// Returns `(settings, settings_dir)`; when nothing is found the defaults are
/// returned together with `start_dir`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    for dir in start_dir.ancestors() {
        let candidate = dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "found settings");
            return (load_settings(&candidate), dir.to_path_buf());
        }
    }

    if let Ok(entries) = std::fs::read_dir(start_dir) {
        for entry in entries.flatten() {
            if !entry.file_type().is_ok_and(|ft| ft.is_dir()) {
                continue;
            }
            let candidate = entry.path().join(SETTINGS_FILE);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "found settings");
                return (load_settings(&candidate), entry.path());
            }
        }
    }

    (Settings::default(), start_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn workspace() -> tempfile::TempDir {
        tempfile::Builder::new()
            .prefix("smartysp-settings")
            .tempdir()
            .unwrap()
    }

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.template_extension(), "tpl");
        assert_eq!(settings.debounce(), Duration::from_millis(100));
    }

    #[test]
    fn parses_all_sections() {
        let settings: Settings = toml::from_str(
            r#"
[completion]
extension = ".smarty"

[decorations]
debounce_ms = 250
"#,
        )
        .unwrap();
        assert_eq!(settings.template_extension(), "smarty");
        assert_eq!(settings.debounce(), Duration::from_millis(250));
    }

    #[test]
    fn empty_extension_falls_back() {
        let settings: Settings = toml::from_str("[completion]\nextension = \".\"\n").unwrap();
        assert_eq!(settings.template_extension(), "tpl");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = workspace();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "[decorations]\ndebounce_ms = \"soon\"\n").unwrap();

        assert!(try_load_settings(&path).is_err());
        let settings = load_settings(&path);
        assert!(settings.decorations.is_none());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = workspace();
        let settings = load_settings(&dir.path().join(SETTINGS_FILE));
        assert!(settings.completion.is_none());
    }

    #[test]
    fn discover_in_parent_dir() {
        let dir = workspace();
        let child = dir.path().join("templates");
        fs::create_dir_all(&child).unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "[completion]\nextension = \"html\"\n",
        )
        .unwrap();

        let (settings, settings_dir) = discover_settings(&child);
        assert_eq!(settings_dir, dir.path());
        assert_eq!(settings.template_extension(), "html");
    }

    #[test]
    fn discover_in_child_dir() {
        let dir = workspace();
        let child = dir.path().join("config");
        fs::create_dir_all(&child).unwrap();
        fs::write(child.join(SETTINGS_FILE), "[decorations]\ndebounce_ms = 5\n").unwrap();

        let (settings, settings_dir) = discover_settings(dir.path());
        assert_eq!(settings_dir, child);
        assert_eq!(settings.debounce(), Duration::from_millis(5));
    }

    #[test]
    fn discover_prefers_ancestors_over_children() {
        let dir = workspace();
        let child = dir.path().join("nested");
        fs::create_dir_all(&child).unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "[completion]\nextension = \"a\"\n").unwrap();
        fs::write(child.join(SETTINGS_FILE), "[completion]\nextension = \"b\"\n").unwrap();

        let (settings, settings_dir) = discover_settings(dir.path());
        assert_eq!(settings_dir, dir.path());
        assert_eq!(settings.template_extension(), "a");
    }

    #[test]
    fn discover_nothing() {
        let dir = workspace();
        let (settings, settings_dir) = discover_settings(dir.path());
        assert_eq!(settings_dir, dir.path());
        assert!(settings.completion.is_none());
        assert!(settings.decorations.is_none());
    }
}
