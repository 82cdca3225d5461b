use crate::mapping::MappedTrack;
use crate::plex_rs::metadata::PlexTrackMetadata;

pub fn mapped_track(rating_key: &str, artist: &str, title: &str, year: i32) -> MappedTrack {
    MappedTrack {
        rating_key: rating_key.to_string(),
        title: title.to_string(),
        artist: Some(artist.to_string()),
        album: None,
        year: Some(year),
        duration: None,
        part_key: None,
        guid: None,
        mbid: None,
        alternative_keys: Vec::new(),
    }
}

/// A Plex track as the search and metadata endpoints return it.
pub fn plex_track(rating_key: &str, artist: &str, title: &str, year: Option<i32>) -> PlexTrackMetadata {
    serde_json::from_value(serde_json::json!({
        "ratingKey": rating_key,
        "title": title,
        "grandparentTitle": artist,
        "parentTitle": format!("{} (Album)", title),
        "parentYear": year,
        "duration": 200000,
        "Media": [{"Part": [{"key": format!("/library/parts/{}/file.mp3", rating_key)}]}]
    }))
    .unwrap()
}
