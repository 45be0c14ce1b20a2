//! Fetching of linked stylesheets.
//!
//! A loader stands in for the browser's same-origin policy: whatever it
//! refuses to read is reported as [`ScanError::InaccessibleStylesheet`] and
//! the sheet contributes no rules.

use crate::error::{Result, ScanError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub trait SheetLoader {
    /// Returns the CSS text behind `href`.
    fn load(&self, href: &str) -> Result<String>;
}

/// Reads linked sheets from the local filesystem.
///
/// Relative hrefs resolve against `base_dir`. Hrefs carrying a URL scheme or
/// starting with `//` belong to another origin and are never read.
#[derive(Debug, Clone)]
pub struct FsSheetLoader {
    base_dir: PathBuf,
}

impl FsSheetLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FsSheetLoader {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, href: &str) -> PathBuf {
        let path = href.strip_prefix("file://").unwrap_or(href);
        // Query strings and fragments do not name files.
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl SheetLoader for FsSheetLoader {
    fn load(&self, href: &str) -> Result<String> {
        if is_cross_origin(href) {
            return Err(inaccessible(href, "cross-origin stylesheet"));
        }
        let path = self.resolve(href);
        fs::read_to_string(&path).map_err(|e| inaccessible(href, e.to_string()))
    }
}

/// Serves sheets from memory, keyed by href.
#[derive(Debug, Clone, Default)]
pub struct StaticSheetLoader {
    sheets: HashMap<String, String>,
}

impl StaticSheetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, href: impl Into<String>, css: impl Into<String>) -> Self {
        self.sheets.insert(href.into(), css.into());
        self
    }
}

impl SheetLoader for StaticSheetLoader {
    fn load(&self, href: &str) -> Result<String> {
        self.sheets
            .get(href)
            .cloned()
            .ok_or_else(|| inaccessible(href, "no such sheet"))
    }
}

/// Treats every linked sheet as unreadable; only inline `<style>` counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSheetLoader;

impl SheetLoader for NoSheetLoader {
    fn load(&self, href: &str) -> Result<String> {
        Err(inaccessible(href, "linked stylesheets are not loaded"))
    }
}

fn inaccessible(href: &str, reason: impl Into<String>) -> ScanError {
    ScanError::InaccessibleStylesheet {
        href: href.to_string(),
        reason: reason.into(),
    }
}

/// True for `//host/...` and for any `scheme:` other than `file:`.
pub fn is_cross_origin(href: &str) -> bool {
    if href.starts_with("//") {
        return true;
    }
    match href.split_once(':') {
        Some((scheme, _)) => {
            let looks_like_scheme = scheme.len() > 1
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            looks_like_scheme && !scheme.eq_ignore_ascii_case("file")
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_origin_detection() {
        assert!(is_cross_origin("https://cdn.example.com/bpk.css"));
        assert!(is_cross_origin("http://cdn.example.com/bpk.css"));
        assert!(is_cross_origin("//cdn.example.com/bpk.css"));
        assert!(!is_cross_origin("styles/app.css"));
        assert!(!is_cross_origin("/abs/app.css"));
        assert!(!is_cross_origin("file:///tmp/app.css"));
        // A Windows drive letter is not a scheme.
        assert!(!is_cross_origin("C:/styles/app.css"));
    }

    #[test]
    fn test_fs_loader_refuses_remote_sheets() {
        let loader = FsSheetLoader::new(".");
        let err = loader.load("https://cdn.example.com/bpk.css").unwrap_err();
        assert!(matches!(err, ScanError::InaccessibleStylesheet { .. }));
    }

    #[test]
    fn test_fs_loader_reads_relative_files() {
        let dir = std::env::temp_dir().join(format!("bpkscan-loader-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("app.css"), ".Card { color: red; }").unwrap();
        let loader = FsSheetLoader::new(&dir);
        assert_eq!(loader.load("app.css?v=3").unwrap(), ".Card { color: red; }");
        assert!(loader.load("missing.css").is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_static_loader() {
        let loader = StaticSheetLoader::new().with_sheet("bpk.css", ".Bpk_A { color: blue; }");
        assert!(loader.load("bpk.css").is_ok());
        assert!(loader.load("other.css").is_err());
    }
}
