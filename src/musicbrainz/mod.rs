pub mod client;
pub mod query;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::matching::TrackCandidate;

pub const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/ws/2/";
pub const DEFAULT_USER_AGENT: &str =
    "SongSeeker-YearValidator/1.0 (https://github.com/andygruber/songseeker)";

#[derive(Debug, thiserror::Error)]
pub enum MusicBrainzError {
    #[error("MusicBrainz is unavailable (503), probably rate limited")]
    ServiceUnavailable,
    #[error("MusicBrainz returned HTTP {0}")]
    Status(StatusCode),
    #[error("Failed to send MusicBrainz request")]
    Request(#[from] reqwest::Error),
    #[error("Failed to decode MusicBrainz response")]
    Decode(#[source] reqwest::Error),
    #[error("Invalid MusicBrainz URL")]
    Url(#[from] url::ParseError),
}

impl MusicBrainzError {
    /// Errors worth retrying: throttling, server errors and network level
    /// failures.
    pub fn is_transient(&self) -> bool {
        match self {
            MusicBrainzError::ServiceUnavailable => true,
            MusicBrainzError::Status(status) => status.is_server_error(),
            MusicBrainzError::Request(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            MusicBrainzError::Decode(_) | MusicBrainzError::Url(_) => false,
        }
    }
}

/* ---------- Wire types ---------- */

/// Response of `GET /ws/2/recording?query=...&fmt=json`.
///
/// Every field is optional on the wire; missing values become empty/absent
/// rather than failing the whole response.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordingSearchResponse {
    #[serde(default)]
    pub recordings: Vec<RawRecording>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRecording {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(rename = "first-release-date", default)]
    pub first_release_date: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistCredit {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub joinphrase: String,
}

/* ---------- Domain type ---------- */

/// A MusicBrainz recording search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub mbid: String,
    pub title: String,
    /// Full artist credit, e.g. "Queen & David Bowie".
    pub artist: String,
    pub first_release_date: Option<String>,
    pub first_release_year: Option<i32>,
    pub score: u32,
}

impl From<RawRecording> for Recording {
    fn from(raw: RawRecording) -> Self {
        let artist = raw
            .artist_credit
            .iter()
            .map(|credit| format!("{}{}", credit.name, credit.joinphrase))
            .collect::<String>();
        let first_release_date = raw.first_release_date.filter(|date| !date.is_empty());
        let first_release_year = first_release_date.as_deref().and_then(parse_year);

        Self {
            mbid: raw.id,
            title: raw.title,
            artist,
            first_release_date,
            first_release_year,
            score: raw.score.unwrap_or(0),
        }
    }
}

impl Recording {
    pub fn to_candidate(&self) -> TrackCandidate {
        TrackCandidate {
            title: self.title.clone(),
            artist: self.artist.clone(),
            release_year: self.first_release_year,
            source_id: self.mbid.clone(),
            score: self.score,
        }
    }
}

/// Year from a MusicBrainz partial date ("1975", "1975-10", "1975-10-31").
fn parse_year(date: &str) -> Option<i32> {
    date.get(..4).and_then(|year| year.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_from_raw_joins_artist_credit() {
        let raw: RawRecording = serde_json::from_value(serde_json::json!({
            "id": "mbid-1",
            "title": "Under Pressure",
            "score": 97,
            "first-release-date": "1981-10-26",
            "artist-credit": [
                {"name": "Queen", "joinphrase": " & "},
                {"name": "David Bowie"}
            ]
        }))
        .unwrap();

        let recording = Recording::from(raw);
        assert_eq!(recording.artist, "Queen & David Bowie");
        assert_eq!(recording.first_release_year, Some(1981));
        assert_eq!(recording.score, 97);
    }

    #[test]
    fn test_recording_tolerates_missing_fields() {
        let raw: RawRecording = serde_json::from_value(serde_json::json!({
            "title": "Mystery",
            "first-release-date": ""
        }))
        .unwrap();

        let recording = Recording::from(raw);
        assert_eq!(recording.mbid, "");
        assert_eq!(recording.artist, "");
        assert_eq!(recording.first_release_date, None);
        assert_eq!(recording.first_release_year, None);
        assert_eq!(recording.score, 0);
    }

    #[test]
    fn test_parse_year_partial_dates() {
        assert_eq!(parse_year("1975"), Some(1975));
        assert_eq!(parse_year("1975-10"), Some(1975));
        assert_eq!(parse_year("75"), None);
        assert_eq!(parse_year("abcd-01-01"), None);
    }
}
