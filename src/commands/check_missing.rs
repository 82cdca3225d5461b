use std::collections::HashSet;
use std::path::Path;

use color_eyre::eyre::Result;

use crate::mapping::{MappedTrack, display_year, load_mapping, mapped_entries};
use crate::ports::plex::PlexClient;
use crate::services::plex::PlexService;

/// Mapping tracks that are not part of the playlist.
pub async fn run<C: PlexClient>(
    service: &PlexService<C>,
    mapping_path: &Path,
    playlist: &str,
) -> Result<Vec<MappedTrack>> {
    let mapping = load_mapping(mapping_path)?;
    let mapping_keys: HashSet<&str> = mapped_entries(&mapping)
        .map(|(_, track)| track.rating_key.as_str())
        .collect();
    println!("Loaded {} tracks from mapping", mapping_keys.len());

    let playlist = service.find_playlist(playlist).await?;
    let playlist_keys: HashSet<String> = service
        .playlist_rating_keys(&playlist)
        .await?
        .into_iter()
        .collect();
    println!("Playlist '{}' has {} tracks", playlist.title, playlist_keys.len());

    let missing_keys: HashSet<&str> = mapping_keys
        .into_iter()
        .filter(|key| !playlist_keys.contains(*key))
        .collect();
    println!("\nMissing from playlist: {} tracks\n", missing_keys.len());

    let mut missing = Vec::new();
    let mut printed = HashSet::new();
    for (_, track) in mapped_entries(&mapping) {
        if missing_keys.contains(track.rating_key.as_str()) && printed.insert(&track.rating_key) {
            println!(
                "  {}: {} - {} ({})",
                track.rating_key,
                track.artist_or_unknown(),
                track.title,
                display_year(track.year)
            );
            missing.push(track.clone());
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use url::Url;

    use super::*;
    use crate::mapping::remapper::TrackRemapper;
    use crate::mapping::{Mapping, save_mapping};
    use crate::plex_rs::playlist::PlexPlaylist;
    use crate::ports::plex::MockPlexClient;
    use crate::test_utils::{mapped_track, plex_track};

    #[tokio::test]
    async fn test_lists_tracks_missing_from_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plex-mapping-de.json");
        let mut mapping = Mapping::new();
        mapping.insert("1".into(), Some(mapped_track("10", "Queen", "Bohemian Rhapsody", 1975)));
        mapping.insert("2".into(), Some(mapped_track("11", "ABBA", "Waterloo", 1974)));
        mapping.insert("3".into(), None);
        save_mapping(&path, &mapping).unwrap();

        let mut client = MockPlexClient::new();
        client.expect_get_playlists().returning(|_, _| {
            let playlists: Vec<PlexPlaylist> = serde_json::from_value(serde_json::json!([
                {"ratingKey": "500", "title": "Hitster DE", "playlistType": "audio", "leafCount": 1}
            ]))
            .unwrap();
            Ok(playlists)
        });
        client
            .expect_get_playlist_tracks()
            .with(mockall::predicate::always(), eq("token"), eq("500"))
            .returning(|_, _, _| Ok(vec![plex_track("10", "Queen", "Bohemian Rhapsody", Some(1975))]));
        let service = PlexService::new(
            client,
            Url::parse("http://plex.local:32400/").unwrap(),
            "token".into(),
            TrackRemapper::default(),
        );

        let missing = run(&service, &path, "hitster de").await.unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].rating_key, "11");
    }
}
