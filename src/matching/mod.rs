//! Fuzzy title/artist matching used to reconcile card data against remote
//! search results (Plex search, MusicBrainz recordings).

pub mod matcher;
pub mod normalize;

pub use matcher::{MatchOutcome, MatchQuery, TrackCandidate, match_candidates, select_best};
