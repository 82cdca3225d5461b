//! On-disk formats shared by the tools: card mappings, the game manifest,
//! the year remapper, discrepancy reports and card CSVs.

pub mod cards_csv;
pub mod manifest;
pub mod remapper;
pub mod report;

use std::collections::BTreeMap;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::plex_rs::metadata::PlexTrackMetadata;

/// A card's track as stored in a `plex-mapping-*.json` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedTrack {
    pub rating_key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub part_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbid: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_keys: Vec<String>,
}

impl From<&PlexTrackMetadata> for MappedTrack {
    fn from(track: &PlexTrackMetadata) -> Self {
        Self {
            rating_key: track.rating_key.clone(),
            title: track.title.clone(),
            artist: track.artist().map(str::to_string),
            album: track.album.clone(),
            year: track.release_year(),
            duration: track.duration,
            part_key: track.part_key().map(str::to_string),
            guid: track.guid.clone(),
            mbid: track.mbid().map(str::to_string),
            alternative_keys: Vec::new(),
        }
    }
}

impl MappedTrack {
    pub fn artist_or_unknown(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown")
    }

    /// Names of fields that differ from `previous`, for change reports.
    pub fn changes_from(&self, previous: &MappedTrack) -> Vec<String> {
        let mut changes = Vec::new();
        if self.guid.is_some() && previous.guid.is_none() {
            changes.push("guid".to_string());
        }
        if self.mbid.is_some() && previous.mbid.is_none() {
            changes.push("mbid".to_string());
        }
        if !self.alternative_keys.is_empty() && previous.alternative_keys.is_empty() {
            changes.push(format!("alternativeKeys: {:?}", self.alternative_keys));
        }
        if self.year != previous.year {
            changes.push(format!(
                "year:{}->{}",
                display_year(previous.year),
                display_year(self.year)
            ));
        }
        if self.artist != previous.artist {
            changes.push("artist".to_string());
        }
        if self.title != previous.title {
            changes.push("title".to_string());
        }
        changes
    }
}

pub fn display_year(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string())
}

/// Card id -> track, `None` for cards without a Plex match.
pub type Mapping = BTreeMap<String, Option<MappedTrack>>;

/// Entries that actually point at a Plex track.
pub fn mapped_entries(mapping: &Mapping) -> impl Iterator<Item = (&String, &MappedTrack)> {
    mapping
        .iter()
        .filter_map(|(card_id, track)| track.as_ref().map(|track| (card_id, track)))
        .filter(|(_, track)| !track.rating_key.is_empty())
}

pub fn load_mapping(path: &Path) -> Result<Mapping> {
    read_json(path).wrap_err_with(|| format!("Failed to load mapping file: {}", path.display()))
}

pub fn save_mapping(path: &Path, mapping: &Mapping) -> Result<()> {
    write_json(path, mapping, b"  ", false)
}

/* ---------- JSON helpers ---------- */

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).wrap_err_with(|| format!("Failed to parse {}", path.display()))
}

/// Pretty-print `value` with the given indent, optionally followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    indent: &[u8],
    trailing_newline: bool,
) -> Result<()> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .wrap_err_with(|| format!("Failed to serialize {}", path.display()))?;
    if trailing_newline {
        buffer.push(b'\n');
    }
    std::fs::write(path, buffer).wrap_err_with(|| format!("Failed to write {}", path.display()))
}
