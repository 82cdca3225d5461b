use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use url::Url;

use crate::plex_rs::PlexMediaContainer;
use crate::plex_rs::library_refresh::refresh_section_path;
use crate::plex_rs::metadata::{
    PlexServerInfo, PlexTrackMetadata, get_server_info, get_track_metadata, search_tracks,
};
use crate::plex_rs::playlist::{PlexPlaylist, get_playlist_tracks, get_playlists};
use crate::plex_rs::sections::{PlexLibrarySection, get_library_sections};
use crate::ports::plex::PlexClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PlexHttpAdapter {
    client: Client,
}

impl PlexHttpAdapter {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PlexClient for PlexHttpAdapter {
    async fn get_server_info(&self, server_url: &Url, token: &str) -> Result<PlexServerInfo> {
        get_server_info(&self.client, server_url, token).await
    }

    async fn search_tracks(
        &self,
        server_url: &Url,
        token: &str,
        query: &str,
    ) -> Result<PlexMediaContainer<PlexTrackMetadata>> {
        search_tracks(&self.client, server_url, token, query).await
    }

    async fn get_track(
        &self,
        server_url: &Url,
        token: &str,
        rating_key: &str,
    ) -> Result<Option<PlexTrackMetadata>> {
        get_track_metadata(&self.client, server_url, token, rating_key).await
    }

    async fn get_library_sections(
        &self,
        server_url: &Url,
        token: &str,
    ) -> Result<Vec<PlexLibrarySection>> {
        get_library_sections(&self.client, server_url, token).await
    }

    async fn refresh_section_path(
        &self,
        server_url: &Url,
        token: &str,
        section_id: &str,
        path: &str,
        force: bool,
    ) -> Result<()> {
        refresh_section_path(&self.client, server_url, token, section_id, path, force).await
    }

    async fn get_playlists(&self, server_url: &Url, token: &str) -> Result<Vec<PlexPlaylist>> {
        get_playlists(&self.client, server_url, token).await
    }

    async fn get_playlist_tracks(
        &self,
        server_url: &Url,
        token: &str,
        playlist_id: &str,
    ) -> Result<Vec<PlexTrackMetadata>> {
        get_playlist_tracks(&self.client, server_url, token, playlist_id).await
    }
}
