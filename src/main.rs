mod commands;
mod config;
mod logging;
mod mapping;
mod matching;
mod musicbrainz;
mod plex_rs;
mod ports;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    commands::{
        custom_game::CustomGameArgs, map_cards::MapArgs, scan::ScanArgs,
        validate_years::ValidateYearsArgs,
    },
    config::Config,
    logging::setup_logging,
    mapping::remapper::TrackRemapper,
    musicbrainz::client::MusicBrainzHttpAdapter,
    services::{
        plex::{PlexService, client::PlexHttpAdapter},
        year_validation::YearValidator,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use (config.toml, or a legacy plex-config.json)
    #[arg(long, env = "SONGSEEKER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Plex server URL (overrides the config file)
    #[arg(long, env = "PLEX_SERVER_URL", global = true)]
    server: Option<String>,

    /// Plex authentication token (overrides the config file)
    #[arg(long, env = "PLEX_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Console log level
    #[arg(long, default_value = "warn", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Show detailed progress (same as --log-level debug)
    #[arg(short, long, global = true)]
    debug: bool,

    /// File log level
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "SONGSEEKER_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Map Hitster cards from a CSV to tracks in the Plex library
    Map(MapArgs),
    /// Validate mapping years against MusicBrainz first release dates
    ValidateYears(ValidateYearsArgs),
    /// Maintain existing mapping files
    #[command(subcommand)]
    Mapping(MappingCommands),
    /// Trigger a Plex library scan on specific folders
    Scan(ScanArgs),
    /// Find mapping songs missing from a playlist
    CheckMissing {
        /// Mapping name or file (e.g. de or plex-mapping-de.json)
        #[arg(short, long)]
        mapping: String,

        /// Playlist name or ratingKey
        #[arg(short, long)]
        playlist: String,
    },
    /// Create a custom game from Plex rating keys
    CustomGame(CustomGameArgs),
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum MappingCommands {
    /// Verify all rating keys still exist in Plex
    Check {
        /// Mapping name or file
        #[arg(short, long)]
        mapping: String,

        /// Set missing tracks to null in the mapping
        #[arg(short, long)]
        fix: bool,
    },
    /// Re-fetch metadata for all tracks (adds guid, mbid, alternativeKeys)
    Enrich {
        /// Mapping name or file
        #[arg(short, long)]
        mapping: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

/// Connect to Plex with the configured credentials and remapper.
fn plex_service(config: &Config, args: &Args) -> Result<PlexService<PlexHttpAdapter>> {
    let (server_url, token) =
        config.plex_credentials(args.server.as_deref(), args.token.as_deref())?;
    let remapper = TrackRemapper::load(&config.remapper_path())?;
    if !remapper.is_empty() {
        log::info!("Loaded {} remapper entries", remapper.len());
    }
    Ok(PlexService::new(
        PlexHttpAdapter::new()?,
        server_url,
        token,
        remapper,
    ))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let args = Args::parse();
    let console_level = if args.debug {
        args.log_level.max(log::LevelFilter::Debug)
    } else {
        args.log_level
    };
    setup_logging(console_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("SongSeeker tools starting");

    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load songseeker config")?;

    match &args.command {
        Commands::Map(map_args) => {
            let service = plex_service(&config, &args)?.with_year_tolerance(map_args.tolerance);
            commands::map_cards::run(&service, map_args).await?;
        }
        Commands::ValidateYears(validate_args) => {
            if let Some(report) = &validate_args.apply {
                commands::validate_years::apply_report(report)?;
                return Ok(ExitCode::SUCCESS);
            }
            let adapter = MusicBrainzHttpAdapter::new(config.musicbrainz_settings()?)?;
            let validator = YearValidator::new(adapter, validate_args.tolerance);
            if commands::validate_years::run(&validator, validate_args).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Mapping(mapping_command) => {
            let service = plex_service(&config, &args)?;
            let info = service.check_connection().await?;
            log::info!(
                "Connected to {} ({})",
                info.friendly_name.as_deref().unwrap_or("Plex"),
                info.version.as_deref().unwrap_or("unknown version")
            );
            match mapping_command {
                MappingCommands::Check { mapping, fix } => {
                    let path = config.resolve_mapping_path(mapping);
                    commands::mapping_tools::check(&service, &path, *fix).await?;
                }
                MappingCommands::Enrich { mapping } => {
                    let path = config.resolve_mapping_path(mapping);
                    commands::mapping_tools::enrich(&service, &path).await?;
                }
            }
        }
        Commands::Scan(scan_args) => {
            let service = plex_service(&config, &args)?;
            commands::scan::run(&service, scan_args).await?;
        }
        Commands::CheckMissing { mapping, playlist } => {
            let service = plex_service(&config, &args)?;
            let path = config.resolve_mapping_path(mapping);
            commands::check_missing::run(&service, &path, playlist).await?;
        }
        Commands::CustomGame(game_args) => {
            let service = plex_service(&config, &args)?;
            let output_dir = game_args
                .output_dir
                .clone()
                .unwrap_or_else(|| config.mapping_directory());
            commands::custom_game::run(&service, game_args, &output_dir).await?;
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(ExitCode::SUCCESS)
}
