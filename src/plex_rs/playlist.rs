use color_eyre::eyre::Result;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::metadata::PlexTrackMetadata;
use super::{PlexResponse, get_json};

/* ---------- Playlists ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexPlaylist {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,

    pub title: String,

    #[serde(rename = "playlistType", default)]
    pub playlist_type: Option<String>,

    #[serde(default)]
    pub smart: Option<bool>,

    #[serde(rename = "leafCount", default)]
    pub leaf_count: Option<u32>,
}

impl PlexPlaylist {
    /// Matches a playlist by rating key or (case-insensitive) title.
    pub fn matches(&self, selector: &str) -> bool {
        self.rating_key == selector || self.title.eq_ignore_ascii_case(selector)
    }
}

/// Fetch all audio playlists.
///
/// Endpoint
/// - `GET /playlists?type=15`
pub async fn get_playlists(client: &Client, base_url: &Url, user_token: &str) -> Result<Vec<PlexPlaylist>> {
    let mut url = base_url.join("playlists")?;
    url.query_pairs_mut().append_pair("type", "15");

    let res: PlexResponse<PlexPlaylist> = get_json(client, url, user_token, "playlists").await?;
    Ok(res.media_container.metadata)
}

/* ---------- Playlist items (tracks) ---------- */

/// Fetch the tracks of a playlist.
///
/// Endpoint
/// - `GET /playlists/{playlist_id}/items?type=10`
pub async fn get_playlist_tracks(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_id: &str,
) -> Result<Vec<PlexTrackMetadata>> {
    let mut url = base_url.join(&format!("playlists/{}/items", playlist_id))?;
    url.query_pairs_mut().append_pair("type", "10");

    let res: PlexResponse<PlexTrackMetadata> =
        get_json(client, url, user_token, "playlist items").await?;
    Ok(res.media_container.metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_get_playlist_tracks() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/playlists/77/items")
                    .query_param("type", "10");
                then.status(200).json_body(serde_json::json!({
                    "MediaContainer": {
                        "size": 2,
                        "Metadata": [
                            {"ratingKey": "1", "title": "One", "grandparentTitle": "U2"},
                            {"ratingKey": "2", "title": "Two"}
                        ]
                    }
                }));
            })
            .await;

        let base_url = Url::parse(&server.url("/")).unwrap();
        let tracks = get_playlist_tracks(&Client::new(), &base_url, "secret", "77")
            .await
            .unwrap();
        let keys: Vec<&str> = tracks.iter().map(|t| t.rating_key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2"]);
    }

    #[test]
    fn test_playlist_matches_key_or_title() {
        let playlist = PlexPlaylist {
            rating_key: "77".to_string(),
            title: "Hitster DE".to_string(),
            playlist_type: Some("audio".to_string()),
            smart: Some(false),
            leaf_count: Some(300),
        };
        assert!(playlist.matches("77"));
        assert!(playlist.matches("hitster de"));
        assert!(!playlist.matches("Hitster"));
    }
}
