use color_eyre::eyre::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{PlexMediaContainer, PlexResponse, get_json};

/* ---------- Server identity ---------- */

/// `MediaContainer` of `GET /`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlexServerInfo {
    #[serde(rename = "friendlyName", default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlexServerInfoResponse {
    #[serde(rename = "MediaContainer")]
    media_container: PlexServerInfo,
}

/// Fetch the server root, used as a connection test.
pub async fn get_server_info(client: &Client, base_url: &Url, user_token: &str) -> Result<PlexServerInfo> {
    let res: PlexServerInfoResponse = get_json(client, base_url.clone(), user_token, "server info").await?;
    Ok(res.media_container)
}

/* ---------- Tracks ---------- */

/// A music track as returned by `/search`, `/library/metadata/{key}` and
/// playlist item endpoints.
///
/// Notes
/// - `grandparentTitle` is the album artist, `originalTitle` the track artist
///   on compilations.
/// - The album year (`parentYear`) is preferred over the track `year`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlexTrackMetadata {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,

    #[serde(default)]
    pub title: String,

    #[serde(rename = "grandparentTitle", default)]
    pub grandparent_title: Option<String>,

    #[serde(rename = "originalTitle", default)]
    pub original_title: Option<String>,

    #[serde(rename = "parentTitle", default)]
    pub album: Option<String>,

    #[serde(rename = "parentYear", default)]
    pub parent_year: Option<i32>,

    #[serde(default)]
    pub year: Option<i32>,

    #[serde(default)]
    pub duration: Option<u64>,

    #[serde(default)]
    pub guid: Option<String>,

    #[serde(rename = "Guid", default)]
    pub guids: Vec<PlexGuid>,

    #[serde(rename = "Media", default)]
    pub media: Vec<PlexMedia>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexGuid {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexMedia {
    #[serde(rename = "Part", default)]
    pub parts: Vec<PlexPart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexPart {
    #[serde(default)]
    pub key: Option<String>,
}

const MBID_PREFIX: &str = "mbid://";

impl PlexTrackMetadata {
    pub fn artist(&self) -> Option<&str> {
        self.grandparent_title
            .as_deref()
            .filter(|artist| !artist.is_empty())
            .or(self.original_title.as_deref())
    }

    pub fn release_year(&self) -> Option<i32> {
        self.parent_year.or(self.year)
    }

    /// Streaming path of the first media part.
    pub fn part_key(&self) -> Option<&str> {
        self.media
            .first()
            .and_then(|media| media.parts.first())
            .and_then(|part| part.key.as_deref())
    }

    /// MusicBrainz id from the `Guid` list (requires `includeGuids=1`).
    pub fn mbid(&self) -> Option<&str> {
        self.guids
            .iter()
            .find_map(|guid| guid.id.strip_prefix(MBID_PREFIX))
    }
}

/// Search tracks (`type=10`) across all libraries.
///
/// Endpoint
/// - `GET /search?query={query}&type=10`
pub async fn search_tracks(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    query: &str,
) -> Result<PlexMediaContainer<PlexTrackMetadata>> {
    let mut url = base_url.join("search")?;
    url.query_pairs_mut()
        .append_pair("query", query)
        .append_pair("type", "10");

    let res: PlexResponse<PlexTrackMetadata> = get_json(client, url, user_token, "search").await?;
    Ok(res.media_container)
}

/// Fetch a single track by rating key.
///
/// Endpoint
/// - `GET /library/metadata/{rating_key}?includeGuids=1`
///
/// Returns `None` when Plex answers 404 or with an empty container.
pub async fn get_track_metadata(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    rating_key: &str,
) -> Result<Option<PlexTrackMetadata>> {
    let mut url = base_url.join(&format!("library/metadata/{}", rating_key))?;
    url.query_pairs_mut().append_pair("includeGuids", "1");

    let response = client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .send()
        .await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let res = response
        .error_for_status()?
        .json::<PlexResponse<PlexTrackMetadata>>()
        .await?;

    Ok(res.media_container.metadata.into_iter().next())
}
