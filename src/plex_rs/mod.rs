use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

pub mod library_refresh;
pub mod metadata;
pub mod playlist;
pub mod sections;

/* ---------- Shared container ---------- */

/// Plex wraps every JSON response in a top level `MediaContainer`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlexResponse<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexMediaContainer<T>,
}

/// The inner `MediaContainer` for list style endpoints.
///
/// `metadata` defaults to an empty vec: Plex omits the key entirely when a
/// search or playlist is empty.
#[derive(Debug, Clone, Deserialize)]
pub struct PlexMediaContainer<T> {
    #[serde(default)]
    pub size: Option<u32>,

    #[serde(rename = "Metadata", default = "Vec::new")]
    pub metadata: Vec<T>,
}

/// Parse a server URL so that `Url::join` appends to it.
///
/// `https://host/plex` would otherwise lose its last path segment on join.
pub fn parse_server_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(&format!("{}/", trimmed)).wrap_err_with(|| format!("Invalid Plex server URL: {}", raw))
}

/// `GET` a Plex endpoint and decode its JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
    user_token: &str,
    what: &str,
) -> Result<T> {
    client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .send()
        .await
        .wrap_err_with(|| format!("Failed to send Plex request for {}", what))?
        .error_for_status()?
        .json::<T>()
        .await
        .wrap_err_with(|| format!("Failed to deserialize Plex {} response", what))
}
