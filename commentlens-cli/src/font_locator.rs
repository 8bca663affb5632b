//! Font Locator - find the TrueType font embedded in PDF reports
//!
//! The PDF writer needs a real font file on disk. Nothing is downloaded: the
//! locator only checks well-known places and reports where it looked.

use anyhow::{anyhow, Result};
use commentlens_core::export::DEFAULT_FONT_FILE;
use std::path::{Path, PathBuf};

/// Ordered list of places to look for the report font
pub struct FontLocator {
    candidates: Vec<PathBuf>,
}

impl FontLocator {
    /// Candidates in priority order: an explicit path (CLI flag or config)
    /// always wins, then the working directory, the bundled assets, the
    /// binary's directory and the user data directory.
    pub fn new(explicit: Option<&Path>) -> Self {
        let mut candidates = Vec::new();
        if let Some(path) = explicit {
            candidates.push(path.to_path_buf());
        }

        candidates.push(PathBuf::from(DEFAULT_FONT_FILE));
        candidates.push(Path::new("assets").join("fonts").join(DEFAULT_FONT_FILE));
        // Running from a crate directory inside the workspace
        candidates.push(
            Path::new("..")
                .join("assets")
                .join("fonts")
                .join(DEFAULT_FONT_FILE),
        );

        // Installed alongside binary
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
        {
            candidates.push(dir.join(DEFAULT_FONT_FILE));
        }

        if let Some(dir) = Self::data_dir() {
            candidates.push(dir.join(DEFAULT_FONT_FILE));
        }

        Self { candidates }
    }

    /// Per-user data directory (e.g. ~/.local/share/commentlens)
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|base| base.join("commentlens"))
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that exists as a file
    pub fn find(&self) -> Result<PathBuf> {
        for candidate in &self.candidates {
            if candidate.is_file() {
                return Ok(candidate.clone());
            }
        }

        let searched: Vec<String> = self
            .candidates
            .iter()
            .map(|c| format!(" - {}", c.display()))
            .collect();
        Err(anyhow!(
            "Could not find {DEFAULT_FONT_FILE}.\nSearched in:\n{}",
            searched.join("\n")
        ))
    }

    /// Path handed to the PDF exporter. When nothing is found this is still
    /// the preferred candidate, so the export reports which file is missing.
    pub fn resolve(&self) -> PathBuf {
        match self.find() {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("{e}");
                self.candidates
                    .first()
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_FONT_FILE))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_is_first_candidate() {
        let locator = FontLocator::new(Some(Path::new("/opt/fonts/Custom.ttf")));
        assert_eq!(locator.candidates()[0], PathBuf::from("/opt/fonts/Custom.ttf"));
        assert_eq!(locator.candidates()[1], PathBuf::from(DEFAULT_FONT_FILE));
    }

    #[test]
    fn test_existing_explicit_font_is_found() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("Report.ttf");
        std::fs::write(&font, b"not really a font").unwrap();

        let locator = FontLocator::new(Some(&font));
        assert_eq!(locator.find().unwrap(), font);
        assert_eq!(locator.resolve(), font);
    }

    #[test]
    fn test_missing_font_resolves_to_preferred_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("missing").join("Report.ttf");
        // A directory with the font's name never counts as the font
        let shadow = dir.path().join("DejaVuSans.ttf");
        std::fs::create_dir(&shadow).unwrap();

        let locator = FontLocator {
            candidates: vec![font.clone(), shadow],
        };
        assert!(locator.find().is_err());
        assert_eq!(locator.resolve(), font);
    }

    #[test]
    fn test_later_candidate_used_when_earlier_missing() {
        let dir = tempfile::tempdir().unwrap();
        let bundled = dir.path().join("DejaVuSans.ttf");
        std::fs::write(&bundled, b"not really a font").unwrap();

        let locator = FontLocator {
            candidates: vec![dir.path().join("missing.ttf"), bundled.clone()],
        };
        assert_eq!(locator.find().unwrap(), bundled);
        assert_eq!(locator.resolve(), bundled);
    }

    #[test]
    fn test_error_lists_searched_locations() {
        let locator = FontLocator {
            candidates: vec![PathBuf::from("/nonexistent/a.ttf"), PathBuf::from("/nonexistent/b.ttf")],
        };
        let message = locator.find().unwrap_err().to_string();
        assert!(message.contains("/nonexistent/a.ttf"));
        assert!(message.contains("/nonexistent/b.ttf"));
    }
}
