//! Best-candidate selection for an (artist, title, expected year) query.
//!
//! Selection works in three stages:
//! 1. eligibility: normalized title and artist must plausibly match,
//! 2. preference: candidates with a known year win, earliest year first,
//!    ties broken by the source's relevance score,
//! 3. acceptance: the chosen year must be within the query's tolerance.

use std::cmp::Reverse;

use super::normalize::{normalize_for_comparison, normalized_tokens};

/// Minimum `shorter / longer` length ratio for a substring title match.
///
/// Lets "Satisfaction" match "(I Can't Get No) Satisfaction" while keeping
/// "Reborn" away from "Queen of Hearts Reborn".
const MIN_TITLE_OVERLAP: f64 = 0.5;

/// Artist words too common to link two names on their own. `"and"` also
/// covers `&` after normalization.
const FILLER_TOKENS: &[&str] = &["the", "and", "feat", "ft", "featuring", "with", "vs"];

/// Normalized artist tokens that can identify an artist.
fn distinctive_tokens(artist: &str) -> Vec<String> {
    normalized_tokens(artist)
        .into_iter()
        .filter(|token| !FILLER_TOKENS.contains(&token.as_str()))
        .collect()
}

/// A track record returned by a remote search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCandidate {
    pub title: String,
    pub artist: String,
    pub release_year: Option<i32>,
    /// Identifier in the originating system (Plex ratingKey, MusicBrainz MBID).
    pub source_id: String,
    /// Relevance as reported (or implied by rank) by the source. Higher is better.
    pub score: u32,
}

/// What the caller is looking for.
#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub artist: String,
    pub title: String,
    pub expected_year: i32,
    /// Maximum accepted absolute year difference. 0 means exact.
    pub year_tolerance: u32,
}

impl MatchQuery {
    pub fn exact(artist: impl Into<String>, title: impl Into<String>, expected_year: i32) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            expected_year,
            year_tolerance: 0,
        }
    }

    pub fn with_tolerance(mut self, year_tolerance: u32) -> Self {
        self.year_tolerance = year_tolerance;
        self
    }

    fn accepts_year(&self, year: i32) -> bool {
        year.abs_diff(self.expected_year) <= self.year_tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    NoCandidates,
    NoEligibleCandidate,
    /// Eligible candidates exist, but none within tolerance. Carries the year
    /// of the candidate that would otherwise have been picked.
    YearMismatch { closest_year: Option<i32> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    Matched(&'a TrackCandidate),
    NotFound(NotFoundReason),
}

impl<'a> MatchOutcome<'a> {
    pub fn matched(&self) -> Option<&'a TrackCandidate> {
        match self {
            MatchOutcome::Matched(candidate) => Some(candidate),
            MatchOutcome::NotFound(_) => None,
        }
    }
}

/// Pre-normalized form of the expected artist/title.
struct NormalizedTarget {
    title: String,
    artist: String,
    artist_tokens: Vec<String>,
}

impl NormalizedTarget {
    fn new(artist: &str, title: &str) -> Self {
        Self {
            title: normalize_for_comparison(title),
            artist: normalize_for_comparison(artist),
            artist_tokens: distinctive_tokens(artist),
        }
    }

    fn title_matches(&self, candidate_title: &str) -> bool {
        let candidate = normalize_for_comparison(candidate_title);
        if self.title.is_empty() || candidate.is_empty() {
            return false;
        }
        if self.title == candidate {
            return true;
        }
        if !(candidate.contains(&self.title) || self.title.contains(&candidate)) {
            return false;
        }
        let (shorter, longer) = if candidate.len() < self.title.len() {
            (candidate.len(), self.title.len())
        } else {
            (self.title.len(), candidate.len())
        };
        shorter as f64 / longer as f64 >= MIN_TITLE_OVERLAP
    }

    fn artist_matches(&self, candidate_artist: &str) -> bool {
        let candidate = normalize_for_comparison(candidate_artist);
        if self.artist.is_empty() || candidate.is_empty() {
            return false;
        }
        if candidate.contains(&self.artist) || self.artist.contains(&candidate) {
            return true;
        }
        let candidate_tokens = distinctive_tokens(candidate_artist);
        self.artist_tokens
            .iter()
            .any(|token| candidate_tokens.contains(token))
    }

    fn is_eligible(&self, candidate: &TrackCandidate) -> bool {
        self.title_matches(&candidate.title) && self.artist_matches(&candidate.artist)
    }
}

/// All candidates whose title and artist plausibly match, in input order.
pub fn eligible_candidates<'a>(
    artist: &str,
    title: &str,
    candidates: &'a [TrackCandidate],
) -> Vec<&'a TrackCandidate> {
    let target = NormalizedTarget::new(artist, title);
    candidates
        .iter()
        .filter(|candidate| target.is_eligible(candidate))
        .collect()
}

/// Earliest year first, then highest score. Candidates without a year are
/// only considered when nobody has one.
fn preferred<'a>(eligible: impl IntoIterator<Item = &'a TrackCandidate>) -> Option<&'a TrackCandidate> {
    let eligible: Vec<&TrackCandidate> = eligible.into_iter().collect();

    let with_year = eligible
        .iter()
        .copied()
        .filter_map(|c| c.release_year.map(|year| (year, c)))
        .min_by_key(|(year, c)| (*year, Reverse(c.score)))
        .map(|(_, c)| c);

    // max_by_key returns the last maximum, so iterate in reverse to keep the
    // first candidate among equal scores.
    with_year.or_else(|| eligible.iter().rev().copied().max_by_key(|c| c.score))
}

/// Pick the best eligible candidate without any year constraint.
///
/// Used when the caller wants the original release (earliest year) to compare
/// against its own data, e.g. year validation.
pub fn select_best<'a>(
    artist: &str,
    title: &str,
    candidates: &'a [TrackCandidate],
) -> Option<&'a TrackCandidate> {
    preferred(eligible_candidates(artist, title, candidates))
}

/// Resolve a query against a candidate list.
///
/// The year tolerance filters eligible candidates before preference is
/// applied, so an in-tolerance candidate is never shadowed by an earlier
/// out-of-tolerance one. A candidate without a year is never accepted.
pub fn match_candidates<'a>(query: &MatchQuery, candidates: &'a [TrackCandidate]) -> MatchOutcome<'a> {
    if candidates.is_empty() {
        return MatchOutcome::NotFound(NotFoundReason::NoCandidates);
    }

    let eligible = eligible_candidates(&query.artist, &query.title, candidates);
    if eligible.is_empty() {
        return MatchOutcome::NotFound(NotFoundReason::NoEligibleCandidate);
    }

    let in_tolerance = eligible
        .iter()
        .copied()
        .filter(|c| c.release_year.is_some_and(|year| query.accepts_year(year)));

    match preferred(in_tolerance) {
        Some(candidate) => MatchOutcome::Matched(candidate),
        None => {
            let closest_year = eligible
                .iter()
                .filter_map(|c| c.release_year)
                .min_by_key(|year| year.abs_diff(query.expected_year));
            MatchOutcome::NotFound(NotFoundReason::YearMismatch { closest_year })
        }
    }
}
