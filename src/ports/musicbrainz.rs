use crate::musicbrainz::{MusicBrainzError, Recording};

/// Lucene recording search against MusicBrainz.
///
/// Implemented by `musicbrainz::client::MusicBrainzHttpAdapter`; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecordingSearch: Send + Sync {
    async fn search_recordings(&self, query: &str) -> Result<Vec<Recording>, MusicBrainzError>;
}
