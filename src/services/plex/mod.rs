pub mod client;

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use regex::Regex;
use url::Url;

use crate::mapping::MappedTrack;
use crate::mapping::remapper::TrackRemapper;
use crate::matching::{MatchOutcome, MatchQuery, TrackCandidate, match_candidates};
use crate::plex_rs::metadata::PlexServerInfo;
use crate::plex_rs::playlist::PlexPlaylist;
use crate::plex_rs::sections::PlexLibrarySection;
use crate::ports::plex::PlexClient;

/// Artist and title reduced to what Plex search handles well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    pub artist: String,
    pub title: String,
}

impl SearchTerms {
    /// Drop featured artists, secondary artists and bracketed title suffixes.
    pub fn clean(artist: &str, title: &str) -> Result<Self> {
        let feat = Regex::new(r"(?i)feat\..*").wrap_err("Failed to create regex")?;
        let after_comma = Regex::new(r",.*").wrap_err("Failed to create regex")?;
        let parens = Regex::new(r"\(.*\)").wrap_err("Failed to create regex")?;
        let brackets = Regex::new(r"\[.*\]").wrap_err("Failed to create regex")?;

        let artist = feat.replace(artist, "");
        let artist = after_comma.replace(&artist, "").trim().to_string();
        let title = parens.replace(title, "");
        let title = brackets.replace(&title, "").trim().to_string();

        Ok(Self { artist, title })
    }

    /// Title only, then artist and title, then artist only.
    pub fn progressive_queries(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            format!("{} {}", self.artist, self.title),
            self.artist.clone(),
        ]
    }
}

/// Plex operations of the tools, bound to one server and one remapper.
pub struct PlexService<C: PlexClient> {
    client: C,
    server_url: Url,
    token: String,
    remapper: TrackRemapper,
    year_tolerance: u32,
}

impl<C: PlexClient> PlexService<C> {
    pub fn new(client: C, server_url: Url, token: String, remapper: TrackRemapper) -> Self {
        Self {
            client,
            server_url,
            token,
            remapper,
            year_tolerance: 0,
        }
    }

    pub fn with_year_tolerance(mut self, year_tolerance: u32) -> Self {
        self.year_tolerance = year_tolerance;
        self
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    pub async fn check_connection(&self) -> Result<PlexServerInfo> {
        self.client
            .get_server_info(&self.server_url, &self.token)
            .await
            .wrap_err_with(|| format!("Failed to connect to Plex at {}", self.server_url))
    }

    /// Run one known-good query to make sure the search endpoint answers.
    pub async fn test_search(&self, query: &str) -> Result<u32> {
        let container = self
            .client
            .search_tracks(&self.server_url, &self.token, query)
            .await
            .wrap_err("Plex search API is not working")?;
        Ok(container
            .size
            .unwrap_or(container.metadata.len() as u32))
    }

    /// Fetch a track by rating key with remapper overrides applied.
    pub async fn fetch_track(&self, rating_key: &str) -> Result<Option<MappedTrack>> {
        let Some(metadata) = self
            .client
            .get_track(&self.server_url, &self.token, rating_key)
            .await?
        else {
            return Ok(None);
        };
        let mut track = MappedTrack::from(&metadata);
        self.remapper.apply(&mut track);
        Ok(Some(track))
    }

    /// Find the Plex track for a card.
    ///
    /// Queries are tried in order and the first one with an accepted
    /// candidate wins. A failing query is logged and skipped.
    pub async fn search_track(
        &self,
        artist: &str,
        title: &str,
        expected_year: i32,
    ) -> Result<Option<MappedTrack>> {
        let terms = SearchTerms::clean(artist, title)?;
        let query = MatchQuery::exact(terms.artist.as_str(), terms.title.as_str(), expected_year)
            .with_tolerance(self.year_tolerance);

        for search in terms.progressive_queries() {
            if search.trim().is_empty() {
                continue;
            }
            log::debug!("Searching Plex for {:?}", search);
            let container = match self
                .client
                .search_tracks(&self.server_url, &self.token, &search)
                .await
            {
                Ok(container) => container,
                Err(e) => {
                    log::warn!("Plex search for {:?} failed: {:#}", search, e);
                    continue;
                }
            };
            log::debug!("Plex returned {} results", container.metadata.len());

            let tracks: Vec<MappedTrack> = container
                .metadata
                .iter()
                .map(|metadata| {
                    let mut track = MappedTrack::from(metadata);
                    self.remapper.apply(&mut track);
                    track
                })
                .collect();
            let candidates = ranked_candidates(&tracks);

            match match_candidates(&query, &candidates) {
                MatchOutcome::Matched(candidate) => {
                    log::debug!(
                        "Matched {:?} by {:?} ({:?})",
                        candidate.title,
                        candidate.artist,
                        candidate.release_year
                    );
                    return Ok(tracks
                        .into_iter()
                        .find(|track| track.rating_key == candidate.source_id));
                }
                MatchOutcome::NotFound(reason) => {
                    log::debug!("No match for {:?}: {:?}", search, reason);
                }
            }
        }
        Ok(None)
    }

    pub async fn library_sections(&self) -> Result<Vec<PlexLibrarySection>> {
        self.client
            .get_library_sections(&self.server_url, &self.token)
            .await
    }

    /// Pick a section by id or name, or the only one when no selector is given.
    pub async fn select_section(&self, selector: Option<&str>) -> Result<PlexLibrarySection> {
        let sections = self.library_sections().await?;
        match selector {
            Some(selector) => sections
                .into_iter()
                .find(|section| section.matches(selector))
                .ok_or_else(|| eyre!("Library section not found: {}", selector)),
            None => match sections.len() {
                0 => bail!("Plex server has no library sections"),
                1 => Ok(sections.into_iter().next().ok_or_else(|| eyre!("No section"))?),
                n => bail!(
                    "Plex server has {} library sections, choose one with --section: {}",
                    n,
                    sections
                        .iter()
                        .map(|s| format!("{} ({})", s.title, s.key))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            },
        }
    }

    /// Trigger a partial scan. Relative paths are resolved against the
    /// section's first location.
    pub async fn scan_path(
        &self,
        section: &PlexLibrarySection,
        path: &str,
        force: bool,
    ) -> Result<String> {
        let full_path = if Path::new(path).is_absolute() {
            path.to_string()
        } else {
            let root = section
                .root()
                .ok_or_else(|| eyre!("Section {} has no location", section.title))?;
            Path::new(root).join(path).to_string_lossy().into_owned()
        };
        self.client
            .refresh_section_path(&self.server_url, &self.token, &section.key, &full_path, force)
            .await
            .wrap_err_with(|| format!("Failed to scan {}", full_path))?;
        Ok(full_path)
    }

    pub async fn find_playlist(&self, selector: &str) -> Result<PlexPlaylist> {
        let playlists = self
            .client
            .get_playlists(&self.server_url, &self.token)
            .await?;
        playlists
            .into_iter()
            .find(|playlist| playlist.matches(selector))
            .ok_or_else(|| eyre!("Playlist not found: {}", selector))
    }

    pub async fn playlist_rating_keys(&self, playlist: &PlexPlaylist) -> Result<Vec<String>> {
        let tracks = self
            .client
            .get_playlist_tracks(&self.server_url, &self.token, &playlist.rating_key)
            .await?;
        Ok(tracks.into_iter().map(|track| track.rating_key).collect())
    }
}

/// Plex has no relevance score, so rank stands in for one.
fn ranked_candidates(tracks: &[MappedTrack]) -> Vec<TrackCandidate> {
    let count = tracks.len() as u32;
    tracks
        .iter()
        .enumerate()
        .map(|(rank, track)| TrackCandidate {
            title: track.title.clone(),
            artist: track.artist.clone().unwrap_or_default(),
            release_year: track.year,
            source_id: track.rating_key.clone(),
            score: count - rank as u32,
        })
        .collect()
}
