//! Per-track metadata overrides (`plex-date-remapper.json`).
//!
//! Plex often carries the year of a remaster or compilation. The remapper
//! stores corrected values keyed by rating key; they are applied whenever a
//! track is fetched from Plex.

use std::collections::HashMap;
use std::path::Path;

use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};

use super::{MappedTrack, read_json, write_json};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemapMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Unknown keys are kept so hand edits survive a rewrite.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemapEntry {
    pub rating_key: String,
    /// Human readable context only, never applied.
    #[serde(default)]
    pub metadata: RemapMetadata,
    #[serde(default)]
    pub replace_data: ReplaceData,
    /// Rating keys printed on older cards for the same track.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_keys: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapChange {
    Added,
    Updated { previous_year: Option<i32> },
    Unchanged,
}

/// Explicitly constructed lookup table of overrides, passed to whoever
/// fetches tracks.
#[derive(Debug, Clone, Default)]
pub struct TrackRemapper {
    entries: Vec<RemapEntry>,
    index: HashMap<String, usize>,
}

impl TrackRemapper {
    pub fn from_entries(entries: Vec<RemapEntry>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.rating_key.clone(), position))
            .collect();
        Self { entries, index }
    }

    /// Load the remapper file; a missing file yields an empty remapper.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No remapper at {}, continuing without overrides", path.display());
            return Ok(Self::default());
        }
        let entries: Vec<RemapEntry> = read_json(path)?;
        log::debug!("Loaded {} remapper entries from {}", entries.len(), path.display());
        Ok(Self::from_entries(entries))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, &self.entries, b"    ", true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, rating_key: &str) -> Option<&RemapEntry> {
        self.index.get(rating_key).map(|&position| &self.entries[position])
    }

    /// Overlay the stored corrections onto a freshly fetched track.
    pub fn apply(&self, track: &mut MappedTrack) {
        let Some(entry) = self.get(&track.rating_key) else {
            return;
        };
        let replace = &entry.replace_data;
        if let Some(year) = replace.year {
            track.year = Some(year);
        }
        if let Some(artist) = &replace.artist {
            track.artist = Some(artist.clone());
        }
        if let Some(title) = &replace.title {
            track.title = title.clone();
        }
        if !entry.alternative_keys.is_empty() {
            track.alternative_keys = entry.alternative_keys.clone();
        }
    }

    /// Record a corrected year, creating the entry when needed.
    pub fn set_year(&mut self, rating_key: &str, artist: &str, title: &str, year: i32) -> RemapChange {
        if let Some(&position) = self.index.get(rating_key) {
            let existing = &mut self.entries[position].replace_data;
            if existing.year == Some(year) {
                return RemapChange::Unchanged;
            }
            let previous_year = existing.year.replace(year);
            return RemapChange::Updated { previous_year };
        }

        self.entries.push(RemapEntry {
            rating_key: rating_key.to_string(),
            metadata: RemapMetadata {
                artist: Some(artist.to_string()),
                title: Some(title.to_string()),
            },
            replace_data: ReplaceData {
                year: Some(year),
                ..ReplaceData::default()
            },
            alternative_keys: Vec::new(),
            extra: serde_json::Map::new(),
        });
        self.index.insert(rating_key.to_string(), self.entries.len() - 1);
        RemapChange::Added
    }
}
