use color_eyre::eyre::Result;
use url::Url;

use crate::plex_rs::PlexMediaContainer;
use crate::plex_rs::metadata::{PlexServerInfo, PlexTrackMetadata};
use crate::plex_rs::playlist::PlexPlaylist;
use crate::plex_rs::sections::PlexLibrarySection;

/// Port trait wrapping the Plex API capabilities used by business logic.
///
/// Implementations live in `services::plex::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlexClient: Send + Sync {
    async fn get_server_info(&self, server_url: &Url, token: &str) -> Result<PlexServerInfo>;

    async fn search_tracks(
        &self,
        server_url: &Url,
        token: &str,
        query: &str,
    ) -> Result<PlexMediaContainer<PlexTrackMetadata>>;

    async fn get_track(
        &self,
        server_url: &Url,
        token: &str,
        rating_key: &str,
    ) -> Result<Option<PlexTrackMetadata>>;

    async fn get_library_sections(
        &self,
        server_url: &Url,
        token: &str,
    ) -> Result<Vec<PlexLibrarySection>>;

    async fn refresh_section_path(
        &self,
        server_url: &Url,
        token: &str,
        section_id: &str,
        path: &str,
        force: bool,
    ) -> Result<()>;

    async fn get_playlists(&self, server_url: &Url, token: &str) -> Result<Vec<PlexPlaylist>>;

    async fn get_playlist_tracks(
        &self,
        server_url: &Url,
        token: &str,
        playlist_id: &str,
    ) -> Result<Vec<PlexTrackMetadata>>;
}
