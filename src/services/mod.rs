pub mod plex;
pub mod year_validation;
pub mod youtube;
