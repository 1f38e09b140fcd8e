use anyhow::{anyhow, Result};
use clap::Parser;
use lyricwalk_core::model::{Category, LatLng};
use lyricwalk_game::Config;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "lyricwalk", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the catalog (default: ~/.local/share/lyricwalk/lyricwalk.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print listings as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, clap::Args)]
struct Position {
    /// Your latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Your longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    lng: f64,
}

impl Position {
    const fn to_lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// List the markers currently placed on campus
    ///
    /// With --lat and --lng, each marker is shown with its distance from
    /// you and the nearest one is highlighted.
    Markers {
        #[arg(long, allow_negative_numbers = true, requires = "lng")]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lng: Option<f64>,
    },
    /// Collect a marker you are standing next to
    ///
    /// Without --marker, the nearest marker is tried. A marker can be
    /// collected when you are within the configured radius (50 m by
    /// default). Collecting takes the next uncollected song of the marker's
    /// category and removes the marker.
    Collect {
        #[command(flatten)]
        position: Position,

        /// Marker id to collect
        #[arg(long)]
        marker: Option<i64>,
    },
    /// List songs of one category
    Songs {
        /// current or classic
        category: Category,

        /// Only songs whose collected flag matches
        #[arg(long, conflicts_with = "uncollected")]
        collected: Option<bool>,

        /// Shorthand for --collected false
        #[arg(long)]
        uncollected: bool,
    },
    /// List favourite songs from both categories
    Favourites,
    /// Mark a song as a favourite
    Favourite {
        category: Category,
        id: i64,

        /// Clear the flag instead of setting it
        #[arg(long)]
        off: bool,
    },
    /// Show one song
    Show { category: Category, id: i64 },
    /// Guess a collected song from its lyric
    ///
    /// Shows the lyric and four possible title/artist pairs along with the
    /// challenge's seed. Answer on stdin, or pass the seed back with
    /// --answer to submit a guess for that same challenge. Wrong answers can
    /// be retried as often as you like.
    Guess {
        category: Category,
        id: i64,

        /// Seed of the challenge to show (a fresh one when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Option number to submit (1-4)
        #[arg(long, requires = "seed")]
        answer: Option<usize>,
    },
    /// Regenerate every marker from the uncollected songs
    Refresh {
        /// Keep running and refresh once a day at the configured time
        #[arg(long)]
        daemon: bool,
    },
    /// Show catalog statistics
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults if it does not exist
    Init,
}

/// Logging options from configuration. Logs go to stderr so `--json`
/// output on stdout stays parseable.
fn logging_opts(config: &Config) -> Result<twyg::Opts> {
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => twyg::LogLevel::Trace,
        "debug" => twyg::LogLevel::Debug,
        "info" => twyg::LogLevel::Info,
        "warn" | "warning" => twyg::LogLevel::Warn,
        "error" => twyg::LogLevel::Error,
        other => return Err(anyhow!("Unknown log level: {}", other)),
    };

    twyg::OptsBuilder::new()
        .coloured(config.log_coloured)
        .output(twyg::Output::Stderr)
        .level(level)
        .report_caller(true)
        .build()
        .map_err(|e| anyhow!("Invalid logging options: {e:?}"))
}

fn init_logging(config: &Config) -> Result<()> {
    twyg::setup(logging_opts(config)?).map_err(|e| anyhow!("Failed to set up logging: {e:?}"))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.db {
        Some(path) => Config::load_with_db_path(path)?,
        None => Config::load()?,
    };
    init_logging(&config)?;

    let ctx = match cli.command {
        Commands::Config { action } => {
            return match action {
                ConfigAction::Show => commands::config::show_config(&config),
                ConfigAction::Path => commands::config::show_path(),
                ConfigAction::Example => commands::config::show_example(),
                ConfigAction::Init => commands::config::init_config(),
            };
        }
        _ => commands::Context::open(config, cli.json).await?,
    };

    match cli.command {
        Commands::Markers { lat, lng } => {
            let user = lat.zip(lng).map(|(lat, lng)| LatLng::new(lat, lng));
            commands::list_markers(&ctx, user).await?;
        }
        Commands::Collect { position, marker } => {
            commands::run_collect(&ctx, position.to_lat_lng(), marker).await?;
        }
        Commands::Songs {
            category,
            collected,
            uncollected,
        } => {
            let filter = if uncollected { Some(false) } else { collected };
            commands::list_songs(&ctx, category, filter).await?;
        }
        Commands::Favourites => commands::list_favourites(&ctx).await?,
        Commands::Favourite { category, id, off } => {
            commands::set_favourite(&ctx, category, id, !off).await?;
        }
        Commands::Show { category, id } => commands::show_song(&ctx, category, id).await?,
        Commands::Guess {
            category,
            id,
            seed,
            answer,
        } => {
            commands::run_guess(&ctx, category, id, seed, answer).await?;
        }
        Commands::Refresh { daemon } => commands::run_refresh(&ctx, daemon).await?,
        Commands::Status => commands::show_status(&ctx).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
