use std::collections::BTreeMap;
use std::path::Path;

use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};

use super::{read_json, write_json};

pub const MANIFEST_FILE_NAME: &str = "plex-manifest.json";

/// Index of the mapping files the web frontend offers (`plex-manifest.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub mappings: Vec<String>,
    /// Mapping name -> display name.
    #[serde(default)]
    pub games: BTreeMap<String, String>,
    /// Mapping name -> percentage of cards with a Plex track.
    #[serde(default)]
    pub match_rates: BTreeMap<String, f64>,
}

impl Manifest {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            read_json(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self, b"  ", false)
    }

    /// Add or update a game. The mapping list stays sorted and unique.
    pub fn register_game(&mut self, mapping_name: &str, display_name: &str, match_rate: f64) {
        if !self.mappings.iter().any(|name| name == mapping_name) {
            self.mappings.push(mapping_name.to_string());
            self.mappings.sort();
        }
        self.games
            .insert(mapping_name.to_string(), display_name.to_string());
        self.match_rates.insert(mapping_name.to_string(), match_rate);
    }
}
