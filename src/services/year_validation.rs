//! Release year validation of mapped tracks against MusicBrainz.

use std::collections::HashSet;

use crate::mapping::report::Discrepancy;
use crate::mapping::{MappedTrack, Mapping};
use crate::matching::select_best;
use crate::musicbrainz::Recording;
use crate::musicbrainz::query::{
    OLDER_SEARCH_CUTOFF_YEAR, general_query, official_release_query, older_than_query,
};
use crate::ports::musicbrainz::RecordingSearch;

/// Result of checking a single track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackCheck {
    /// Missing artist, title or year; nothing to compare.
    Skipped,
    NoResults,
    /// Results came back but none plausibly matches the track.
    NoMatch { results: usize },
    /// Matched, but the recording has no release date.
    NoYear,
    Confirmed { musicbrainz_year: i32 },
    Discrepancy(Discrepancy),
}

impl TrackCheck {
    /// Counted as "not found on MusicBrainz" in summaries.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TrackCheck::NoResults | TrackCheck::NoMatch { .. } | TrackCheck::NoYear
        )
    }
}

pub struct YearValidator<S: RecordingSearch> {
    search: S,
    tolerance: u32,
}

impl<S: RecordingSearch> YearValidator<S> {
    pub fn new(search: S, tolerance: u32) -> Self {
        Self { search, tolerance }
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    /// Run one search; a failure is logged and counts as no results.
    async fn search(&self, query: &str) -> Vec<Recording> {
        match self.search.search_recordings(query).await {
            Ok(recordings) => recordings,
            Err(e) => {
                log::warn!("MusicBrainz search failed, treating as not found: {}", e);
                Vec::new()
            }
        }
    }

    /// All recordings for a track, deduplicated by MBID.
    ///
    /// Official singles/albums come first, then a general search. When the
    /// earliest year found is after 1950 a third search looks for anything
    /// released before it, which catches originals hidden behind reissues.
    pub async fn find_recordings(&self, artist: &str, title: &str) -> Vec<Recording> {
        let mut seen = HashSet::new();
        let mut recordings = Vec::new();
        let mut add = |found: Vec<Recording>, recordings: &mut Vec<Recording>| {
            for recording in found {
                if seen.insert(recording.mbid.clone()) {
                    recordings.push(recording);
                }
            }
        };

        add(
            self.search(&official_release_query(artist, title)).await,
            &mut recordings,
        );
        add(self.search(&general_query(artist, title)).await, &mut recordings);

        let Some(earliest) = recordings
            .iter()
            .filter_map(|recording| recording.first_release_year)
            .min()
        else {
            return recordings;
        };

        if earliest > OLDER_SEARCH_CUTOFF_YEAR {
            log::debug!("Searching for recordings before {}", earliest);
            let older = self.search(&older_than_query(artist, title, earliest)).await;
            if !older.is_empty() {
                log::debug!("Found {} older recordings", older.len());
            }
            add(older, &mut recordings);
        }
        recordings
    }

    pub async fn check_track(&self, track: &MappedTrack) -> TrackCheck {
        let (Some(artist), Some(plex_year)) = (track.artist.as_deref(), track.year) else {
            return TrackCheck::Skipped;
        };
        if artist.is_empty() || track.title.is_empty() {
            return TrackCheck::Skipped;
        }

        let recordings = self.find_recordings(artist, &track.title).await;
        if recordings.is_empty() {
            return TrackCheck::NoResults;
        }
        log::debug!("MusicBrainz returned {} recordings", recordings.len());

        let candidates: Vec<_> = recordings.iter().map(Recording::to_candidate).collect();
        let Some(best) = select_best(artist, &track.title, &candidates) else {
            return TrackCheck::NoMatch {
                results: recordings.len(),
            };
        };
        let Some(recording) = recordings.iter().find(|r| r.mbid == best.source_id) else {
            return TrackCheck::NoMatch {
                results: recordings.len(),
            };
        };
        let Some(musicbrainz_year) = recording.first_release_year else {
            return TrackCheck::NoYear;
        };
        log::debug!(
            "Selected {} - {} ({})",
            recording.artist,
            recording.title,
            musicbrainz_year
        );

        if plex_year.abs_diff(musicbrainz_year) <= self.tolerance {
            return TrackCheck::Confirmed { musicbrainz_year };
        }

        TrackCheck::Discrepancy(Discrepancy {
            rating_key: track.rating_key.clone(),
            artist: artist.to_string(),
            title: track.title.clone(),
            album: track.album.clone().unwrap_or_default(),
            plex_year,
            musicbrainz_year,
            difference: musicbrainz_year - plex_year,
            musicbrainz_date: recording.first_release_date.clone().unwrap_or_default(),
            musicbrainz_mbid: recording.mbid.clone(),
        })
    }
}

/// Tracks whose artist or title contains `filter` (case-insensitive), or all
/// mapped tracks without a filter.
pub fn select_tracks<'a>(mapping: &'a Mapping, filter: Option<&str>) -> Vec<&'a MappedTrack> {
    let filter = filter.map(str::to_lowercase);
    crate::mapping::mapped_entries(mapping)
        .map(|(_, track)| track)
        .filter(|track| match &filter {
            Some(filter) => {
                track.artist_or_unknown().to_lowercase().contains(filter)
                    || track.title.to_lowercase().contains(filter)
            }
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::musicbrainz::MusicBrainzError;
    use crate::ports::musicbrainz::MockRecordingSearch;
    use crate::test_utils::mapped_track;

    fn recording(mbid: &str, artist: &str, title: &str, date: Option<&str>, score: u32) -> Recording {
        Recording {
            mbid: mbid.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            first_release_date: date.map(str::to_string),
            first_release_year: date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok()),
            score,
        }
    }

    #[tokio::test]
    async fn test_find_recordings_dedupes_and_searches_older() {
        let mut search = MockRecordingSearch::new();
        search
            .expect_search_recordings()
            .with(eq(official_release_query("Queen", "Bohemian Rhapsody")))
            .times(1)
            .returning(|_| {
                Ok(vec![recording("a", "Queen", "Bohemian Rhapsody", Some("1992-02-01"), 100)])
            });
        search
            .expect_search_recordings()
            .with(eq(general_query("Queen", "Bohemian Rhapsody")))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    recording("a", "Queen", "Bohemian Rhapsody", Some("1992-02-01"), 100),
                    recording("b", "Queen", "Bohemian Rhapsody", None, 90),
                ])
            });
        search
            .expect_search_recordings()
            .with(eq(older_than_query("Queen", "Bohemian Rhapsody", 1992)))
            .times(1)
            .returning(|_| {
                Ok(vec![recording("c", "Queen", "Bohemian Rhapsody", Some("1975-10-31"), 85)])
            });

        let validator = YearValidator::new(search, 0);
        let recordings = validator.find_recordings("Queen", "Bohemian Rhapsody").await;
        let mbids: Vec<_> = recordings.iter().map(|r| r.mbid.as_str()).collect();
        assert_eq!(mbids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_find_recordings_skips_older_search_for_early_years() {
        let mut search = MockRecordingSearch::new();
        search.expect_search_recordings().times(2).returning(|_| {
            Ok(vec![recording("a", "Bing Crosby", "White Christmas", Some("1942"), 100)])
        });

        let validator = YearValidator::new(search, 0);
        assert_eq!(validator.find_recordings("Bing Crosby", "White Christmas").await.len(), 1);
    }

    #[tokio::test]
    async fn test_check_track_reports_discrepancy() {
        let mut search = MockRecordingSearch::new();
        search.expect_search_recordings().returning(|query| {
            if query.contains("firstreleasedate") {
                return Ok(Vec::new());
            }
            Ok(vec![
                recording("remaster", "Queen", "Bohemian Rhapsody", Some("1992"), 100),
                recording("original", "Queen", "Bohemian Rhapsody", Some("1975-10-31"), 90),
            ])
        });

        let validator = YearValidator::new(search, 0);
        let track = mapped_track("42", "Queen", "Bohemian Rhapsody", 1981);
        let TrackCheck::Discrepancy(discrepancy) = validator.check_track(&track).await else {
            panic!("expected discrepancy");
        };
        assert_eq!(discrepancy.rating_key, "42");
        assert_eq!(discrepancy.musicbrainz_year, 1975);
        assert_eq!(discrepancy.difference, -6);
        assert_eq!(discrepancy.musicbrainz_date, "1975-10-31");
        assert_eq!(discrepancy.musicbrainz_mbid, "original");
    }

    #[tokio::test]
    async fn test_check_track_within_tolerance() {
        let mut search = MockRecordingSearch::new();
        search.expect_search_recordings().returning(|_| {
            Ok(vec![recording("a", "Queen", "Bohemian Rhapsody", Some("1975"), 100)])
        });

        let validator = YearValidator::new(search, 1);
        let track = mapped_track("42", "Queen", "Bohemian Rhapsody", 1976);
        assert_eq!(
            validator.check_track(&track).await,
            TrackCheck::Confirmed {
                musicbrainz_year: 1975
            }
        );
    }

    #[tokio::test]
    async fn test_check_track_failed_search_is_not_found() {
        let mut search = MockRecordingSearch::new();
        search
            .expect_search_recordings()
            .times(2)
            .returning(|_| Err(MusicBrainzError::ServiceUnavailable));

        let validator = YearValidator::new(search, 0);
        let check = validator
            .check_track(&mapped_track("42", "Queen", "Bohemian Rhapsody", 1975))
            .await;
        assert_eq!(check, TrackCheck::NoResults);
        assert!(check.is_not_found());
    }

    #[tokio::test]
    async fn test_check_track_without_year_is_skipped() {
        let validator = YearValidator::new(MockRecordingSearch::new(), 0);
        let mut track = mapped_track("42", "Queen", "Bohemian Rhapsody", 1975);
        track.year = None;
        assert_eq!(validator.check_track(&track).await, TrackCheck::Skipped);
    }

    #[tokio::test]
    async fn test_check_track_no_match() {
        let mut search = MockRecordingSearch::new();
        search.expect_search_recordings().returning(|_| {
            Ok(vec![recording("a", "Queen", "Queen of Hearts Reborn", Some("2001"), 100)])
        });

        let validator = YearValidator::new(search, 0);
        let check = validator
            .check_track(&mapped_track("42", "Queen", "Reborn", 2001))
            .await;
        assert!(matches!(check, TrackCheck::NoMatch { .. }));
    }

    #[test]
    fn test_select_tracks_filter() {
        let mut mapping = Mapping::new();
        mapping.insert("1".into(), Some(mapped_track("10", "Queen", "Bohemian Rhapsody", 1975)));
        mapping.insert("2".into(), Some(mapped_track("11", "ABBA", "Waterloo", 1974)));
        mapping.insert("3".into(), None);

        assert_eq!(select_tracks(&mapping, None).len(), 2);
        let filtered = select_tracks(&mapping, Some("waTER"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].rating_key, "11");
    }
}
