use color_eyre::eyre::Result;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::get_json;

/// Response type for `/library/sections`.
#[derive(Debug, Deserialize)]
pub struct PlexLibrarySectionsResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexLibrarySectionsContainer,
}

/// `MediaContainer` for `/library/sections` which returns a `Directory` list.
#[derive(Debug, Deserialize)]
pub struct PlexLibrarySectionsContainer {
    #[serde(rename = "Directory", default)]
    pub directories: Vec<PlexLibrarySection>,
}

/// A Plex library section.
///
/// Notes
/// - `key` is the library section id.
/// - `section_type` is `artist` for music libraries.
#[derive(Debug, Clone, Deserialize)]
pub struct PlexLibrarySection {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: String,
    #[serde(rename = "Location", default)]
    pub locations: Vec<PlexLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexLocation {
    pub path: String,
}

impl PlexLibrarySection {
    /// Root folder of the section on the server's filesystem.
    pub fn root(&self) -> Option<&str> {
        self.locations.first().map(|location| location.path.as_str())
    }

    /// Matches a section by id or (case-insensitive) title.
    pub fn matches(&self, selector: &str) -> bool {
        self.key == selector || self.title.eq_ignore_ascii_case(selector)
    }
}

/// Fetch all Plex library sections.
///
/// Endpoint
/// - `GET /library/sections`
pub async fn get_library_sections(
    client: &Client,
    base_url: &Url,
    user_token: &str,
) -> Result<Vec<PlexLibrarySection>> {
    let url = base_url.join("library/sections")?;
    let res: PlexLibrarySectionsResponse = get_json(client, url, user_token, "library sections").await?;
    Ok(res.media_container.directories)
}
