//! Downloading missing songs with `yt-dlp`.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::process::Command;

const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const BROWSERS: &[&str] = &["chrome", "firefox", "edge", "safari", "opera", "brave"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded,
    /// The target file already exists.
    Skipped,
    Failed,
}

/// A song to fetch. The year is only used for the filename and tags.
#[derive(Debug, Clone)]
pub struct SongDownload<'a> {
    pub url: &'a str,
    pub artist: &'a str,
    pub title: &'a str,
    pub year: &'a str,
}

impl SongDownload<'_> {
    /// `<dir>/<artist>/<title>/<title> (<year>).mp3`, one folder per single
    /// so Plex sees an album per song.
    pub fn target_file(&self, output_dir: &Path) -> PathBuf {
        let safe_artist = sanitize_filename(self.artist);
        let safe_title = sanitize_filename(self.title);
        output_dir
            .join(safe_artist)
            .join(&safe_title)
            .join(format!("{} ({}).mp3", safe_title, self.year))
    }

    fn args(&self, output_template: &str, cookies: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = [
            "--format",
            "bestaudio/best",
            "--extractor-args",
            "youtube:player_client=web_creator,mweb,ios;formats=missing_pot",
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "192K",
            "--embed-metadata",
            "--retries",
            "3",
            "--fragment-retries",
            "3",
            "--skip-unavailable-fragments",
            "--no-playlist",
            "--quiet",
            "--no-warnings",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        args.push("--postprocessor-args".to_string());
        args.push(format!(
            "ffmpeg:-metadata artist={} -metadata title={} -metadata date={}",
            shell_quote(self.artist),
            shell_quote(self.title),
            shell_quote(self.year)
        ));

        match cookies {
            Some(browser) if BROWSERS.contains(&browser) => {
                args.push("--cookies-from-browser".to_string());
                args.push(browser.to_string());
            }
            Some(file) => {
                args.push("--cookies".to_string());
                args.push(file.to_string());
            }
            None => {}
        }

        args.push("--output".to_string());
        args.push(output_template.to_string());
        args.push(self.url.to_string());
        args
    }
}

/// Remove characters that are invalid in file names on common filesystems.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !INVALID_FILENAME_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// `yt-dlp` splits postprocessor args like a shell would.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Fail early when `yt-dlp` is not installed.
pub fn ensure_yt_dlp() -> Result<PathBuf> {
    which::which("yt-dlp").map_err(|_| {
        eyre!("yt-dlp not found in PATH. Please install yt-dlp (and ffmpeg) to download songs.")
    })
}

/// Download one song as tagged mp3 below `output_dir`.
pub async fn download_song(
    yt_dlp: &Path,
    song: &SongDownload<'_>,
    output_dir: &Path,
    cookies: Option<&str>,
) -> Result<DownloadOutcome> {
    let target = song.target_file(output_dir);
    if target.exists() {
        log::debug!("File already exists: {}", target.display());
        return Ok(DownloadOutcome::Skipped);
    }
    let song_dir = target
        .parent()
        .ok_or_else(|| eyre!("Invalid download target: {}", target.display()))?;
    tokio::fs::create_dir_all(song_dir)
        .await
        .wrap_err_with(|| format!("Failed to create {}", song_dir.display()))?;

    let output_template = target.with_extension("%(ext)s");
    let args = song.args(&output_template.to_string_lossy(), cookies);
    log::debug!("Running yt-dlp {:?}", args);

    let result = Command::new(yt_dlp).args(&args).output().await;
    cleanup_temp_files(song_dir).await;

    match result {
        Ok(output) if output.status.success() => Ok(DownloadOutcome::Downloaded),
        Ok(output) => {
            log::warn!(
                "yt-dlp failed for {}: {}",
                song.url,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Ok(DownloadOutcome::Failed)
        }
        Err(e) => {
            log::warn!("Failed to run yt-dlp for {}: {}", song.url, e);
            Ok(DownloadOutcome::Failed)
        }
    }
}

/// Remove `.part` and `.ytdl` leftovers of an interrupted download.
async fn cleanup_temp_files(dir: &Path) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_temp = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "part" || ext == "ytdl");
        if !is_temp {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::debug!("Cleaned up {}", path.display()),
            Err(e) => log::debug!("Failed to remove {}: {}", path.display(), e),
        }
    }
}
