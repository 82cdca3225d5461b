//! Custom games built from a hand-picked list of Plex rating keys.

use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, bail};

use crate::mapping::manifest::{MANIFEST_FILE_NAME, Manifest};
use crate::mapping::{Mapping, save_mapping};
use crate::ports::plex::PlexClient;
use crate::services::plex::PlexService;

#[derive(clap::Args, Debug)]
pub struct CustomGameArgs {
    /// Display name of the game (e.g. "80s Classics")
    #[arg(short, long)]
    pub name: String,

    /// Mapping identifier (e.g. "80s-classics")
    #[arg(short, long)]
    pub mapping: String,

    /// Comma-separated rating keys, or a file with one key per line
    #[arg(short, long)]
    pub keys: String,

    /// Directory for the mapping file and manifest (default: mapping directory from config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Rating keys from a file (one per line, `#` comments) or a comma list.
pub fn parse_keys(keys: &str) -> Result<Vec<String>> {
    let path = Path::new(keys);
    if path.is_file() {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read keys file: {}", path.display()))?;
        return Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect());
    }
    Ok(keys
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect())
}

/// Fetch every key, write `plex-mapping-<mapping>.json` and register the
/// game in the manifest. Returns the mapping file path.
pub async fn run<C: PlexClient>(
    service: &PlexService<C>,
    args: &CustomGameArgs,
    output_dir: &Path,
) -> Result<PathBuf> {
    let keys = parse_keys(&args.keys)?;
    if keys.is_empty() {
        bail!("No rating keys provided");
    }

    println!("Creating custom game: {}", args.name);
    println!("Mapping identifier: {}", args.mapping);
    println!("Processing {} rating keys...\n", keys.len());

    let mut mapping = Mapping::new();
    let mut skipped = 0;
    for (i, key) in keys.iter().enumerate() {
        print!("[{}/{}] Fetching key {}... ", i + 1, keys.len(), key);
        std::io::stdout().flush().ok();
        let fetched = service.fetch_track(key).await.unwrap_or_else(|e| {
            log::warn!("Failed to fetch {}: {:#}", key, e);
            None
        });
        match fetched {
            Some(track) => {
                println!("OK ({} - {})", track.artist_or_unknown(), track.title);
                mapping.insert(key.clone(), Some(track));
            }
            None => {
                println!("SKIPPED (not found)");
                skipped += 1;
            }
        }
    }
    if mapping.is_empty() {
        bail!("No valid tracks found. Cannot create game.");
    }

    std::fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create {}", output_dir.display()))?;
    let mapping_path = output_dir.join(format!("plex-mapping-{}.json", args.mapping));
    save_mapping(&mapping_path, &mapping)?;
    println!("\nMapping saved to: {}", mapping_path.display());

    let manifest_path = output_dir.join(MANIFEST_FILE_NAME);
    let mut manifest = Manifest::load_or_default(&manifest_path)?;
    manifest.register_game(&args.mapping, &args.name, 100.0);
    manifest.save(&manifest_path)?;
    println!("Manifest updated: {}", manifest_path.display());

    println!("\nCreated '{}' with {} tracks ({} skipped)", args.name, mapping.len(), skipped);
    Ok(mapping_path)
}
