use std::io::Write;

use color_eyre::eyre::{Result, bail};

use crate::ports::plex::PlexClient;
use crate::services::plex::PlexService;

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Paths to scan, relative to the library root or absolute
    pub paths: Vec<String>,

    /// Library section id or name (auto-detected when there is only one)
    #[arg(short, long)]
    pub section: Option<String>,

    /// List all library sections and exit
    #[arg(short, long)]
    pub list_sections: bool,

    /// Rescan even if Plex thinks nothing changed (use sparingly)
    #[arg(short, long)]
    pub force: bool,
}

pub async fn list_sections<C: PlexClient>(service: &PlexService<C>) -> Result<()> {
    let sections = service.library_sections().await?;
    if sections.is_empty() {
        bail!("No library sections found");
    }
    println!("Library sections:");
    for section in &sections {
        println!("  [{}] {} ({})", section.key, section.title, section.section_type);
        if let Some(root) = section.root() {
            println!("      {}", root);
        }
    }
    Ok(())
}

/// Trigger partial scans. Returns the number of paths Plex accepted.
pub async fn run<C: PlexClient>(service: &PlexService<C>, args: &ScanArgs) -> Result<usize> {
    if args.list_sections {
        list_sections(service).await?;
        return Ok(0);
    }
    if args.paths.is_empty() {
        bail!("At least one path is required");
    }

    let section = service.select_section(args.section.as_deref()).await?;
    println!(
        "Using [{}] {} (root: {})",
        section.key,
        section.title,
        section.root().unwrap_or("unknown")
    );

    let mut scanned = 0;
    for path in &args.paths {
        print!("Scanning: {}... ", path);
        std::io::stdout().flush().ok();
        match service.scan_path(&section, path, args.force).await {
            Ok(full_path) => {
                println!("OK");
                log::debug!("Scan triggered for {}", full_path);
                scanned += 1;
            }
            Err(e) => {
                println!("FAILED");
                log::error!("{:#}", e);
            }
        }
    }

    println!("\nScanned {}/{} paths", scanned, args.paths.len());
    Ok(scanned)
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::eyre;
    use url::Url;

    use super::*;
    use crate::mapping::remapper::TrackRemapper;
    use crate::plex_rs::sections::PlexLibrarySection;
    use crate::ports::plex::MockPlexClient;

    fn service(client: MockPlexClient) -> PlexService<MockPlexClient> {
        PlexService::new(
            client,
            Url::parse("http://plex.local:32400/").unwrap(),
            "token".into(),
            TrackRemapper::default(),
        )
    }

    fn single_section() -> Vec<PlexLibrarySection> {
        serde_json::from_value(serde_json::json!([
            {"key": "3", "title": "Hitster", "type": "artist", "Location": [{"path": "/data/hitster"}]}
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn test_scan_counts_failures() {
        let mut client = MockPlexClient::new();
        client
            .expect_get_library_sections()
            .returning(|_, _| Ok(single_section()));
        client
            .expect_refresh_section_path()
            .returning(|_, _, _, path, _| {
                if path.ends_with("broken") {
                    Err(eyre!("500 Internal Server Error"))
                } else {
                    Ok(())
                }
            });

        let args = ScanArgs {
            paths: vec!["Queen".into(), "broken".into()],
            section: None,
            list_sections: false,
            force: false,
        };
        assert_eq!(run(&service(client), &args).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_scan_requires_paths() {
        let args = ScanArgs {
            paths: Vec::new(),
            section: None,
            list_sections: false,
            force: false,
        };
        assert!(run(&service(MockPlexClient::new()), &args).await.is_err());
    }
}
