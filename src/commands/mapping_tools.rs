//! Maintenance of existing mapping files, without the original card CSV.

use std::path::Path;

use color_eyre::eyre::{Result, bail};

use crate::mapping::{Mapping, load_mapping, save_mapping};
use crate::ports::plex::PlexClient;
use crate::services::plex::PlexService;

const WIDE_RULE: &str = "==================================================";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTrack {
    pub card_id: String,
    pub rating_key: String,
    pub artist: String,
    pub title: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub missing: usize,
}

fn load_existing(path: &Path) -> Result<Mapping> {
    if !path.exists() {
        bail!("Mapping file not found: {}", path.display());
    }
    load_mapping(path)
}

/// Entries pointing at a Plex track, as owned `(card id, rating key, artist, title)`.
fn tracked_entries(mapping: &Mapping) -> Vec<MissingTrack> {
    crate::mapping::mapped_entries(mapping)
        .map(|(card_id, track)| MissingTrack {
            card_id: card_id.clone(),
            rating_key: track.rating_key.clone(),
            artist: track.artist_or_unknown().to_string(),
            title: track.title.clone(),
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Verify that every rating key still exists. With `fix`, missing entries
/// are set to `null` in the mapping file.
pub async fn check<C: PlexClient>(
    service: &PlexService<C>,
    mapping_path: &Path,
    fix: bool,
) -> Result<Vec<MissingTrack>> {
    let mut mapping = load_existing(mapping_path)?;
    let entries = tracked_entries(&mapping);
    println!("Checking {} tracks in {}...\n", entries.len(), file_name(mapping_path));

    let mut missing = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        log::debug!(
            "[{}/{}] Checking {}: {} - {}",
            i + 1,
            entries.len(),
            entry.rating_key,
            entry.artist,
            entry.title
        );
        let exists = match service.fetch_track(&entry.rating_key).await {
            Ok(track) => track.is_some(),
            Err(e) => {
                log::debug!("Failed to fetch {}: {:#}", entry.rating_key, e);
                false
            }
        };
        if !exists {
            missing.push(entry.clone());
        }
    }

    println!("\n{}", WIDE_RULE);
    println!("Check complete: {} tracks checked", entries.len());
    if missing.is_empty() {
        println!("All tracks exist in Plex!");
    } else {
        println!("\nMISSING TRACKS ({}):", missing.len());
        for entry in &missing {
            println!(
                "  Card #{}: {} - {} (ratingKey: {})",
                entry.card_id, entry.artist, entry.title, entry.rating_key
            );
        }
        if fix {
            for entry in &missing {
                mapping.insert(entry.card_id.clone(), None);
            }
            save_mapping(mapping_path, &mapping)?;
            println!("\nRemoved {} missing tracks from mapping.", missing.len());
        } else {
            println!("\nUse --fix to remove these tracks from the mapping.");
        }
    }
    println!("{}", WIDE_RULE);

    Ok(missing)
}

/// Re-fetch every track (remapper applied) and store the fresh metadata.
pub async fn enrich<C: PlexClient>(
    service: &PlexService<C>,
    mapping_path: &Path,
) -> Result<EnrichSummary> {
    let mut mapping = load_existing(mapping_path)?;
    let entries = tracked_entries(&mapping);
    println!("Enriching {} tracks in {}...\n", entries.len(), file_name(mapping_path));

    let mut summary = EnrichSummary::default();
    for (i, entry) in entries.iter().enumerate() {
        let progress = format!("[{}/{}] {} - {}", i + 1, entries.len(), entry.artist, entry.title);
        let fetched = service.fetch_track(&entry.rating_key).await.unwrap_or_else(|e| {
            log::debug!("Failed to fetch {}: {:#}", entry.rating_key, e);
            None
        });
        let Some(fresh) = fetched else {
            println!("{}: MISSING (ratingKey: {})", progress, entry.rating_key);
            summary.missing += 1;
            continue;
        };

        let changes = match mapping.get(&entry.card_id) {
            Some(Some(previous)) => fresh.changes_from(previous),
            _ => Vec::new(),
        };
        if changes.is_empty() {
            log::debug!("{}: unchanged", progress);
            summary.unchanged += 1;
        } else {
            println!("{}: UPDATED ({})", progress, changes.join(", "));
            summary.updated += 1;
        }
        mapping.insert(entry.card_id.clone(), Some(fresh));
    }

    save_mapping(mapping_path, &mapping)?;

    println!("\n{}", WIDE_RULE);
    println!("Enrich complete: {} tracks processed", entries.len());
    println!("  Updated:   {}", summary.updated);
    println!("  Unchanged: {}", summary.unchanged);
    println!("  Missing:   {}", summary.missing);
    println!("\nMapping saved to: {}", mapping_path.display());
    println!("{}", WIDE_RULE);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use url::Url;

    use super::*;
    use crate::mapping::remapper::{RemapEntry, TrackRemapper};
    use crate::ports::plex::MockPlexClient;
    use crate::test_utils::{mapped_track, plex_track};

    fn write_mapping(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("plex-mapping-de.json");
        let mut mapping = Mapping::new();
        mapping.insert("00001".into(), Some(mapped_track("1", "Queen", "Bohemian Rhapsody", 1975)));
        mapping.insert("00002".into(), Some(mapped_track("2", "ABBA", "Waterloo", 1974)));
        mapping.insert("00003".into(), None);
        save_mapping(&path, &mapping).unwrap();
        path
    }

    fn service(client: MockPlexClient, remapper: TrackRemapper) -> PlexService<MockPlexClient> {
        PlexService::new(
            client,
            Url::parse("http://plex.local:32400/").unwrap(),
            "token".into(),
            remapper,
        )
    }

    #[tokio::test]
    async fn test_check_and_fix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mapping(dir.path());

        let mut client = MockPlexClient::new();
        client
            .expect_get_track()
            .with(mockall::predicate::always(), eq("token"), eq("1"))
            .returning(|_, _, _| Ok(Some(plex_track("1", "Queen", "Bohemian Rhapsody", Some(1975)))));
        client
            .expect_get_track()
            .with(mockall::predicate::always(), eq("token"), eq("2"))
            .returning(|_, _, _| Ok(None));
        let service = service(client, TrackRemapper::default());

        let missing = check(&service, &path, false).await.unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].card_id, "00002");
        assert!(load_mapping(&path).unwrap()["00002"].is_some());

        check(&service, &path, true).await.unwrap();
        assert!(load_mapping(&path).unwrap()["00002"].is_none());
    }

    #[tokio::test]
    async fn test_enrich_applies_remapper() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mapping(dir.path());

        let mut client = MockPlexClient::new();
        client
            .expect_get_track()
            .with(mockall::predicate::always(), eq("token"), eq("1"))
            .returning(|_, _, _| Ok(Some(plex_track("1", "Queen", "Bohemian Rhapsody", Some(1975)))));
        client
            .expect_get_track()
            .with(mockall::predicate::always(), eq("token"), eq("2"))
            .returning(|_, _, _| Ok(Some(plex_track("2", "ABBA", "Waterloo", Some(1992)))));
        let entries: Vec<RemapEntry> = serde_json::from_value(serde_json::json!([
            {"ratingKey": "2", "metadata": {"artist": "ABBA", "title": "Waterloo"},
             "replaceData": {"year": 1974}, "alternativeKeys": ["old-2"]}
        ]))
        .unwrap();
        let service = service(client, TrackRemapper::from_entries(entries));

        let summary = enrich(&service, &path).await.unwrap();
        assert_eq!(summary.missing, 0);
        // Both tracks gain album, duration and part key, but only track 2 gains
        // tracked fields (alternative keys).
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.unchanged, 1);

        let mapping = load_mapping(&path).unwrap();
        let waterloo = mapping["00002"].as_ref().unwrap();
        assert_eq!(waterloo.year, Some(1974));
        assert_eq!(waterloo.alternative_keys, vec!["old-2".to_string()]);
        assert!(mapping["00003"].is_none());
    }
}
