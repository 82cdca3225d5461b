//! Year discrepancy reports written by `validate-years`.

use std::path::Path;

use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};

use super::{MappedTrack, Mapping, read_json, write_json};

/// A track whose Plex year differs from the MusicBrainz first release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub album: String,
    pub plex_year: i32,
    pub musicbrainz_year: i32,
    /// `musicbrainz_year - plex_year`
    pub difference: i32,
    #[serde(default)]
    pub musicbrainz_date: String,
    #[serde(default)]
    pub musicbrainz_mbid: String,
}

pub fn load_report(path: &Path) -> Result<Vec<Discrepancy>> {
    read_json(path)
}

pub fn save_report(path: &Path, report: &[Discrepancy]) -> Result<()> {
    write_json(path, report, b"  ", false)
}

/// Turn a previous report back into a mapping keyed by rating key, so the
/// flagged tracks can be validated again.
pub fn report_to_mapping(report: &[Discrepancy]) -> Mapping {
    report
        .iter()
        .map(|entry| {
            let track = MappedTrack {
                rating_key: entry.rating_key.clone(),
                title: entry.title.clone(),
                artist: Some(entry.artist.clone()),
                album: Some(entry.album.clone()),
                year: Some(entry.plex_year),
                duration: None,
                part_key: None,
                guid: None,
                mbid: None,
                alternative_keys: Vec::new(),
            };
            (entry.rating_key.clone(), Some(track))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discrepancy() -> Discrepancy {
        Discrepancy {
            rating_key: "10".to_string(),
            artist: "Queen".to_string(),
            title: "Bohemian Rhapsody".to_string(),
            album: "Greatest Hits".to_string(),
            plex_year: 1981,
            musicbrainz_year: 1975,
            difference: -6,
            musicbrainz_date: "1975-10-31".to_string(),
            musicbrainz_mbid: "b1a9c0e9".to_string(),
        }
    }

    #[test]
    fn test_report_uses_mixed_key_style() {
        let value = serde_json::to_value(discrepancy()).unwrap();
        assert_eq!(value["ratingKey"], "10");
        assert_eq!(value["plex_year"], 1981);
        assert_eq!(value["musicbrainz_year"], 1975);
    }

    #[test]
    fn test_report_to_mapping() {
        let mapping = report_to_mapping(&[discrepancy()]);
        let track = mapping["10"].as_ref().unwrap();
        assert_eq!(track.year, Some(1981));
        assert_eq!(track.artist.as_deref(), Some("Queen"));
    }
}
