use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, bail};

use crate::mapping::remapper::{RemapChange, TrackRemapper};
use crate::mapping::report::{Discrepancy, load_report, report_to_mapping, save_report};
use crate::mapping::{Mapping, load_mapping};
use crate::ports::musicbrainz::RecordingSearch;
use crate::services::year_validation::{TrackCheck, YearValidator, select_tracks};

const REMAPPER_FILE_NAME: &str = "plex-date-remapper.json";

#[derive(clap::Args, Debug)]
#[command(group(
    clap::ArgGroup::new("input").required(true).args(["mapping", "report", "apply"])
))]
pub struct ValidateYearsArgs {
    /// plex-mapping-*.json file to validate (full scan)
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,

    /// Previous report; re-check only the flagged tracks
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Apply a report to the plex-date-remapper.json next to it
    #[arg(short, long)]
    pub apply: Option<PathBuf>,

    /// Allowed year difference (0 = exact)
    #[arg(short, long, default_value = "0")]
    pub tolerance: u32,

    /// Only check the first N tracks
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Only check tracks whose artist or title contains this (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Where to write the discrepancy report
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ValidateYearsArgs {
    /// Explicit `--output`, else the re-checked report itself unless a
    /// filter would drop unchecked entries from it.
    pub fn report_output(&self) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(output.clone());
        }
        match (&self.report, &self.filter) {
            (Some(report), None) => Some(report.clone()),
            _ => None,
        }
    }

    /// Tracks to validate, from the mapping or from a previous report.
    pub fn load_tracks(&self) -> Result<Mapping> {
        if let Some(path) = &self.mapping {
            if !path.exists() {
                bail!("Mapping file not found: {}", path.display());
            }
            let mapping = load_mapping(path)?;
            println!("Loaded {} tracks from mapping file", mapping.len());
            return Ok(mapping);
        }
        if let Some(path) = &self.report {
            if !path.exists() {
                bail!("Report file not found: {}", path.display());
            }
            let mapping = report_to_mapping(&load_report(path)?);
            println!("Loaded {} tracks from previous report (re-checking)", mapping.len());
            return Ok(mapping);
        }
        bail!("Either --mapping or --report is required")
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationSummary {
    pub checked: usize,
    pub not_found: usize,
    pub discrepancies: Vec<Discrepancy>,
}

/// Validate the selected tracks. Returns whether discrepancies were found.
pub async fn run<S: RecordingSearch>(
    validator: &YearValidator<S>,
    args: &ValidateYearsArgs,
) -> Result<bool> {
    let mapping = args.load_tracks()?;
    let summary = validate(validator, &mapping, args.filter.as_deref(), args.limit).await;

    match args.report_output() {
        Some(output) => {
            save_report(&output, &summary.discrepancies)?;
            println!("\nReport saved to: {}", output.display());
        }
        None if args.report.is_some() => {
            println!("\nNote: Not auto-saving when using --filter with --report (use --output to save)");
        }
        None => {}
    }

    if !summary.discrepancies.is_empty() {
        println!("\n--- Summary of Discrepancies ---");
        for d in &summary.discrepancies {
            println!(
                "{} - {}: Plex={}, MB={} ({:+})",
                d.artist, d.title, d.plex_year, d.musicbrainz_year, d.difference
            );
        }
    }

    Ok(!summary.discrepancies.is_empty())
}

pub async fn validate<S: RecordingSearch>(
    validator: &YearValidator<S>,
    mapping: &Mapping,
    filter: Option<&str>,
    limit: Option<usize>,
) -> ValidationSummary {
    let tracks = select_tracks(mapping, filter);
    if let Some(filter) = filter {
        println!("Filter '{}' matched {} tracks", filter, tracks.len());
    }
    let total = limit.map_or(tracks.len(), |limit| limit.min(tracks.len()));

    println!("Validating {} tracks against MusicBrainz...", total);
    println!("Tolerance: ±{} year(s)\n", validator.tolerance());

    let mut summary = ValidationSummary::default();
    for track in tracks {
        if limit.is_some_and(|limit| summary.checked >= limit) {
            break;
        }

        let check = validator.check_track(track).await;
        if check == TrackCheck::Skipped {
            log::debug!("Skipping {} (missing artist, title or year)", track.rating_key);
            continue;
        }
        summary.checked += 1;
        if summary.checked % 10 == 0 {
            print!("  Progress: {}/{}\r", summary.checked, total);
            std::io::stdout().flush().ok();
        }

        match check {
            TrackCheck::Discrepancy(discrepancy) => {
                println!("  MISMATCH: {} - {}", discrepancy.artist, discrepancy.title);
                println!(
                    "           Plex: {}, MusicBrainz: {} (diff: {:+})",
                    discrepancy.plex_year, discrepancy.musicbrainz_year, discrepancy.difference
                );
                summary.discrepancies.push(discrepancy);
            }
            TrackCheck::Confirmed { musicbrainz_year } => {
                log::debug!("{} confirmed ({})", track.title, musicbrainz_year);
            }
            other if other.is_not_found() => {
                log::debug!("{} not found on MusicBrainz: {:?}", track.title, other);
                summary.not_found += 1;
            }
            _ => {}
        }
    }

    println!();
    println!("Checked: {} tracks", summary.checked);
    println!("Not found on MusicBrainz: {}", summary.not_found);
    println!("Discrepancies found: {}", summary.discrepancies.len());
    summary
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Merge the MusicBrainz years of a report into the remapper file that sits
/// next to it.
pub fn apply_report(report_path: &Path) -> Result<ApplySummary> {
    if !report_path.exists() {
        bail!("Report file not found: {}", report_path.display());
    }
    let report = load_report(report_path)?;
    if report.is_empty() {
        println!("Report is empty, nothing to apply.");
        return Ok(ApplySummary::default());
    }

    let remapper_path = report_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(REMAPPER_FILE_NAME);
    let mut remapper = TrackRemapper::load(&remapper_path)?;
    if remapper.is_empty() {
        println!("Creating new {}", REMAPPER_FILE_NAME);
    } else {
        println!("Loaded {} existing entries from {}", remapper.len(), REMAPPER_FILE_NAME);
    }

    let mut summary = ApplySummary::default();
    for item in &report {
        match remapper.set_year(&item.rating_key, &item.artist, &item.title, item.musicbrainz_year) {
            RemapChange::Added => {
                log::debug!("Added: {} - {} (year: {})", item.artist, item.title, item.musicbrainz_year);
                summary.added += 1;
            }
            RemapChange::Updated { previous_year } => {
                log::debug!(
                    "Updated: {} - {} (year: {:?} -> {})",
                    item.artist,
                    item.title,
                    previous_year,
                    item.musicbrainz_year
                );
                summary.updated += 1;
            }
            RemapChange::Unchanged => summary.unchanged += 1,
        }
    }
    remapper.save(&remapper_path)?;

    println!("\nApplied {} entries from report:", report.len());
    println!("  Added: {}", summary.added);
    println!("  Updated: {}", summary.updated);
    println!("  Unchanged: {}", summary.unchanged);
    println!("\nSaved to: {}", remapper_path.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::musicbrainz::Recording;
    use crate::ports::musicbrainz::MockRecordingSearch;
    use crate::test_utils::mapped_track;

    fn args() -> ValidateYearsArgs {
        ValidateYearsArgs {
            mapping: None,
            report: None,
            apply: None,
            tolerance: 0,
            limit: None,
            filter: None,
            output: None,
        }
    }

    fn discrepancy(rating_key: &str, musicbrainz_year: i32) -> Discrepancy {
        Discrepancy {
            rating_key: rating_key.to_string(),
            artist: "Queen".to_string(),
            title: "Bohemian Rhapsody".to_string(),
            album: String::new(),
            plex_year: 1981,
            musicbrainz_year,
            difference: musicbrainz_year - 1981,
            musicbrainz_date: String::new(),
            musicbrainz_mbid: String::new(),
        }
    }

    #[test]
    fn test_report_output() {
        let mut args = args();
        args.mapping = Some("mapping.json".into());
        assert_eq!(args.report_output(), None);

        let mut args = self::args();
        args.report = Some("report.json".into());
        assert_eq!(args.report_output(), Some(PathBuf::from("report.json")));

        args.filter = Some("queen".into());
        assert_eq!(args.report_output(), None);

        args.output = Some("out.json".into());
        assert_eq!(args.report_output(), Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_apply_report_adds_updates_and_keeps() {
        let dir = tempfile::tempdir().unwrap();
        let remapper_path = dir.path().join(REMAPPER_FILE_NAME);
        std::fs::write(
            &remapper_path,
            r#"[
    {"ratingKey": "1", "metadata": {"artist": "Queen", "title": "Bohemian Rhapsody"}, "replaceData": {"year": 1975}},
    {"ratingKey": "2", "metadata": {"artist": "Queen", "title": "Bohemian Rhapsody"}, "replaceData": {"year": 1980}}
]"#,
        )
        .unwrap();
        let report_path = dir.path().join("report.json");
        save_report(
            &report_path,
            &[discrepancy("1", 1975), discrepancy("2", 1975), discrepancy("3", 1975)],
        )
        .unwrap();

        let summary = apply_report(&report_path).unwrap();
        assert_eq!(
            summary,
            ApplySummary {
                added: 1,
                updated: 1,
                unchanged: 1
            }
        );

        let remapper = TrackRemapper::load(&remapper_path).unwrap();
        assert_eq!(remapper.len(), 3);
        assert_eq!(remapper.get("2").unwrap().replace_data.year, Some(1975));
        assert_eq!(remapper.get("3").unwrap().replace_data.year, Some(1975));
    }

    #[test]
    fn test_apply_missing_report() {
        assert!(apply_report(Path::new("/nonexistent/report.json")).is_err());
    }

    #[tokio::test]
    async fn test_validate_counts_and_limit() {
        let mut search = MockRecordingSearch::new();
        search.expect_search_recordings().returning(|_| {
            Ok(vec![Recording {
                mbid: "mb-1".into(),
                title: "Bohemian Rhapsody".into(),
                artist: "Queen".into(),
                first_release_date: Some("1975-10-31".into()),
                first_release_year: Some(1975),
                score: 100,
            }])
        });
        let validator = YearValidator::new(search, 0);

        let mut mapping = Mapping::new();
        mapping.insert("a".into(), Some(mapped_track("1", "Queen", "Bohemian Rhapsody", 1975)));
        mapping.insert("b".into(), Some(mapped_track("2", "Queen", "Bohemian Rhapsody", 1981)));
        mapping.insert("c".into(), Some(mapped_track("3", "Queen", "Bohemian Rhapsody", 1992)));

        let summary = validate(&validator, &mapping, None, None).await;
        assert_eq!(summary.checked, 3);
        assert_eq!(summary.not_found, 0);
        assert_eq!(summary.discrepancies.len(), 2);
        assert_eq!(summary.discrepancies[0].difference, -6);

        let summary = validate(&validator, &mapping, None, Some(1)).await;
        assert_eq!(summary.checked, 1);
        assert!(summary.discrepancies.is_empty());
    }

    #[tokio::test]
    async fn test_run_rechecks_report_and_overwrites_it() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("report.json");
        save_report(&report_path, &[discrepancy("7", 1975)]).unwrap();

        let mut search = MockRecordingSearch::new();
        search.expect_search_recordings().returning(|_| {
            Ok(vec![Recording {
                mbid: "mb-1".into(),
                title: "Bohemian Rhapsody".into(),
                artist: "Queen".into(),
                first_release_date: Some("1981".into()),
                first_release_year: Some(1981),
                score: 100,
            }])
        });
        let validator = YearValidator::new(search, 0);
        let mut args = args();
        args.report = Some(report_path.clone());

        let found = run(&validator, &args).await.unwrap();
        assert!(!found);
        assert!(load_report(&report_path).unwrap().is_empty());
    }
}
