pub mod musicbrainz;
pub mod plex;
