// Track catalog - the fixed pool of titled audio assets
// Loaded once at startup and never mutated; every random draw comes from here

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Track list shipped with the binary so a bare install still has music.
const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// A titled audio asset reference. Identity is the filename, which is
/// unique within a catalog (duplicates are not expected and not deduplicated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub filename: String,
}

impl Track {
    pub fn new(title: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            filename: filename.into(),
        }
    }
}

/// Ordered, fixed sequence of tracks. Source of truth for all random selection.
#[derive(Debug, Clone)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    /// Load the catalog: a user-supplied JSON file when configured,
    /// otherwise the built-in list.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("failed to read catalog {}", path.display()))?;
                let catalog = Self::from_json(&content)
                    .with_context(|| format!("failed to parse catalog {}", path.display()))?;
                info!("Loaded {} tracks from {}", catalog.len(), path.display());
                Ok(catalog)
            }
            None => {
                let catalog = Self::builtin()?;
                info!("Loaded {} tracks from the built-in catalog", catalog.len());
                Ok(catalog)
            }
        }
    }

    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG).context("built-in catalog is malformed")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let tracks: Vec<Track> = serde_json::from_str(json)?;
        Ok(Self { tracks })
    }

    /// Build a catalog directly from tracks. Tests use this with small
    /// synthetic pools.
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_catalog_parses_and_is_large_enough() {
        let catalog = Catalog::builtin().expect("built-in catalog should parse");
        // The rolling window holds at most 6 tracks; the pool must dwarf it
        // for random draws to always have candidates.
        assert!(catalog.len() > 6, "catalog too small: {}", catalog.len());
    }

    #[test]
    fn builtin_catalog_filenames_are_unique() {
        let catalog = Catalog::builtin().expect("built-in catalog should parse");
        let unique: HashSet<&str> = catalog
            .tracks()
            .iter()
            .map(|t| t.filename.as_str())
            .collect();
        assert_eq!(unique.len(), catalog.len());
    }

    #[test]
    fn from_json_accepts_a_synthetic_pool() {
        let catalog = Catalog::from_json(
            r#"[{"title": "A", "filename": "a.mp3"}, {"title": "B", "filename": "b.mp3"}]"#,
        )
        .expect("synthetic catalog should parse");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.tracks()[0].title, "A");
    }
}
