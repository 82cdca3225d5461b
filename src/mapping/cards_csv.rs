//! Hitster card lists (input) and missing-song exports (output).

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, bail};

const CARD_COLUMN: &str = "Card#";
const ARTIST_COLUMN: &str = "Artist";
const TITLE_COLUMN: &str = "Title";
const YEAR_COLUMN: &str = "Year";
const URL_COLUMN: &str = "URL";

/// One printed card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitsterCard {
    pub card_id: String,
    pub artist: String,
    pub title: String,
    /// Kept verbatim; not every list has a clean year.
    pub year: String,
    pub url: String,
}

impl HitsterCard {
    pub fn year(&self) -> Option<i32> {
        self.year.trim().parse().ok()
    }
}

/// Read a card list. Requires `Card#`, `Artist`, `Title` and `Year` columns;
/// `URL` is optional.
pub fn read_cards(path: &Path) -> Result<Vec<HitsterCard>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .wrap_err_with(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers = reader
        .headers()
        .wrap_err("Failed to read CSV header")?
        .clone();
    let column = |name: &str| headers.iter().position(|header| header.trim() == name);

    let (Some(card_idx), Some(artist_idx), Some(title_idx), Some(year_idx)) = (
        column(CARD_COLUMN),
        column(ARTIST_COLUMN),
        column(TITLE_COLUMN),
        column(YEAR_COLUMN),
    ) else {
        bail!(
            "CSV must have {}, {}, {}, and {} columns (found: {:?})",
            CARD_COLUMN,
            ARTIST_COLUMN,
            TITLE_COLUMN,
            YEAR_COLUMN,
            headers.iter().collect::<Vec<_>>()
        );
    };
    let url_idx = column(URL_COLUMN);

    let mut cards = Vec::new();
    for record in reader.records() {
        let record = record.wrap_err("Failed to read CSV row")?;
        let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
        cards.push(HitsterCard {
            card_id: field(card_idx),
            artist: field(artist_idx),
            title: field(title_idx),
            year: field(year_idx),
            url: url_idx.map(field).unwrap_or_default(),
        });
    }
    Ok(cards)
}

/// Soundiiz import format, for building a playlist of the missing songs.
pub fn write_soundiiz_csv(path: &Path, missing: &[HitsterCard]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["Track Name", "Artist Name", "Album Name"])?;
    for card in missing {
        writer.write_record([card.title.as_str(), card.artist.as_str(), ""])?;
    }
    writer.flush()?;
    Ok(())
}

/// Full details of the missing songs with YouTube Music links.
pub fn write_full_missing_csv(path: &Path, missing: &[HitsterCard]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["Artist", "Title", "Year", "YouTube Music URL"])?;
    for card in missing {
        let music_url = youtube_to_music_url(&card.url);
        writer.write_record([
            card.artist.as_str(),
            card.title.as_str(),
            card.year.as_str(),
            music_url.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Rewrite a YouTube link to the YouTube Music equivalent.
pub fn youtube_to_music_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    if let Some((_, rest)) = url.split_once("youtu.be/") {
        let video_id: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if !video_id.is_empty() {
            return format!("https://music.youtube.com/watch?v={}", video_id);
        }
    }
    url.replace("https://www.youtube.com/", "https://music.youtube.com/")
        .replace("https://youtube.com/", "https://music.youtube.com/")
}
