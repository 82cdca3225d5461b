use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};

use super::{RULE, match_rate};
use crate::mapping::cards_csv::{
    HitsterCard, read_cards, write_full_missing_csv, write_soundiiz_csv,
};
use crate::mapping::{Mapping, save_mapping};
use crate::ports::plex::PlexClient;
use crate::services::plex::PlexService;
use crate::services::youtube::{DownloadOutcome, SongDownload, download_song, ensure_yt_dlp};

/// Query used to check that the search endpoint answers at all.
const SEARCH_PROBE: &str = "test";

#[derive(clap::Args, Debug)]
pub struct MapArgs {
    /// Path to the Hitster CSV file
    #[arg(short, long)]
    pub csv: PathBuf,

    /// Output JSON file (default: plex-mapping-{lang}_{timestamp}.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only process the first N songs
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Accept Plex tracks whose year differs by up to this many years
    #[arg(long, default_value = "0")]
    pub tolerance: u32,

    /// Download missing songs from YouTube with yt-dlp
    #[arg(short = 'D', long)]
    pub download: bool,

    /// Directory for downloaded songs
    #[arg(long, default_value = "downloads")]
    pub download_dir: PathBuf,

    /// cookies.txt file or browser name (chrome, firefox, ...) for YouTube
    #[arg(long)]
    pub cookies: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MapSummary {
    pub found: usize,
    pub not_found: usize,
    pub output: PathBuf,
}

/// `plex-mapping-{lang}_{timestamp}.json`, `lang` being the CSV name without
/// its `hitster-` prefix.
pub fn default_output_path(csv: &Path) -> PathBuf {
    let stem = csv
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lang = stem.replace("hitster-", "");
    let timestamp = chrono::Local::now().format("%Y-%m-%dT%H-%M-%S");
    PathBuf::from(format!("plex-mapping-{}_{}.json", lang, timestamp))
}

/// `<output stem><suffix>` next to the mapping file.
fn sibling_path(output: &Path, suffix: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{}{}", stem, suffix))
}

pub async fn run<C: PlexClient>(service: &PlexService<C>, args: &MapArgs) -> Result<MapSummary> {
    if !args.csv.exists() {
        color_eyre::eyre::bail!("CSV file not found: {}", args.csv.display());
    }
    println!("Reading CSV: {}", args.csv.display());
    let mut cards = read_cards(&args.csv)?;

    println!("Testing Plex connection: {}", service.server_url());
    let info = service.check_connection().await?;
    println!("Plex connection successful!");
    println!("  Server: {}", info.friendly_name.as_deref().unwrap_or("Unknown"));
    println!("  Version: {}", info.version.as_deref().unwrap_or("Unknown"));

    println!("\nTesting Plex search API...");
    match service.test_search(SEARCH_PROBE).await {
        Ok(size) => println!("Search API working! (Found {} results for '{}')", size, SEARCH_PROBE),
        Err(e) => log::warn!("Search API test failed: {:#}", e),
    }

    if let Some(limit) = args.limit.filter(|&limit| limit > 0) {
        cards.truncate(limit);
        println!("\nProcessing first {} songs (limit applied)...\n", limit);
    } else {
        println!("\nProcessing {} songs...\n", cards.len());
    }

    let mut mapping = Mapping::new();
    let mut missing: Vec<HitsterCard> = Vec::new();
    let total = cards.len();

    for (i, card) in cards.into_iter().enumerate() {
        print!(
            "[{}/{}] Searching: {} - {} ({})... ",
            i + 1,
            total,
            card.artist,
            card.title,
            card.year
        );
        std::io::stdout().flush().ok();

        let expected_year = card.year().unwrap_or(0);
        match service
            .search_track(&card.artist, &card.title, expected_year)
            .await?
        {
            Some(track) => {
                println!("FOUND ({} - {})", track.artist_or_unknown(), track.title);
                mapping.insert(card.card_id, Some(track));
            }
            None => {
                println!("NOT FOUND");
                mapping.insert(card.card_id.clone(), None);
                missing.push(card);
            }
        }
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.csv));
    save_mapping(&output, &mapping)
        .wrap_err_with(|| format!("Failed to write mapping to {}", output.display()))?;

    if !missing.is_empty() {
        let soundiiz = sibling_path(&output, "-missing-soundiiz.csv");
        write_soundiiz_csv(&soundiiz, &missing)?;
        println!("\nSoundiiz CSV saved to: {}", soundiiz.display());
        println!("  -> Upload to Soundiiz to create a YouTube Music playlist");

        let full = sibling_path(&output, "-missing-full.csv");
        write_full_missing_csv(&full, &missing)?;
        println!("\nFull details CSV saved to: {}", full.display());
        println!("  -> Contains YouTube Music URLs for playlist creation");
    }

    if args.download && !missing.is_empty() {
        download_missing(&missing, &args.download_dir, args.cookies.as_deref()).await?;
    }

    let summary = MapSummary {
        found: total - missing.len(),
        not_found: missing.len(),
        output,
    };

    println!("\n{}", RULE);
    println!("Results:");
    println!("  Found in Plex: {}", summary.found);
    println!("  Not found:     {}", summary.not_found);
    println!("  Total:         {}", total);
    println!("  Match rate:    {:.1}%", match_rate(summary.found, total));
    println!("\nMapping saved to: {}", summary.output.display());
    println!("{}\n", RULE);

    Ok(summary)
}

async fn download_missing(missing: &[HitsterCard], dir: &Path, cookies: Option<&str>) -> Result<()> {
    let yt_dlp = match ensure_yt_dlp() {
        Ok(path) => path,
        Err(e) => {
            log::error!("{}", e);
            println!("\nSkipping downloads: yt-dlp is not installed");
            return Ok(());
        }
    };
    tokio::fs::create_dir_all(dir)
        .await
        .wrap_err_with(|| format!("Failed to create {}", dir.display()))?;

    println!("\n{}", RULE);
    println!("Downloading {} missing songs to: {}", missing.len(), dir.display());
    println!("{}\n", RULE);

    let (mut downloaded, mut skipped, mut failed) = (0, 0, 0);
    for (i, card) in missing.iter().enumerate() {
        if card.url.is_empty() {
            println!(
                "[{}/{}] Skipping (no URL): {} - {}",
                i + 1,
                missing.len(),
                card.artist,
                card.title
            );
            failed += 1;
            continue;
        }

        print!(
            "[{}/{}] Downloading: {} - {}... ",
            i + 1,
            missing.len(),
            card.artist,
            card.title
        );
        std::io::stdout().flush().ok();

        let song = SongDownload {
            url: &card.url,
            artist: &card.artist,
            title: &card.title,
            year: &card.year,
        };
        match download_song(&yt_dlp, &song, dir, cookies).await? {
            DownloadOutcome::Downloaded => {
                println!("OK");
                downloaded += 1;
            }
            DownloadOutcome::Skipped => {
                println!("SKIPPED (already exists)");
                skipped += 1;
            }
            DownloadOutcome::Failed => {
                println!("FAILED");
                failed += 1;
            }
        }
    }

    println!(
        "\nDownload complete: {} succeeded, {} skipped, {} failed",
        downloaded, skipped, failed
    );
    println!("Files saved to: {}", dir.display());
    Ok(())
}
