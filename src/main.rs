use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::process;
use titlehound::{
    LookupError, SeasonRequest, Settings, TitleType, find_episode, lookup_titles, normalize_title,
    provider_title_detail, search_index_info, title_detail,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "titlehound", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand)]
enum Command {
    /// Show the search cluster information
    EsInfo,
    /// Normalize a release name into a search query
    Parse {
        /// Normalizer to use (e.g. torrent_parser)
        parser: String,
        /// Release name or path
        q: String,
    },
    /// Show the primary search-index record of an IMDb id
    Detail {
        #[arg(value_enum)]
        title_type: TitleType,
        imdb_id: String,
    },
    /// Show the provider's title record of an IMDb id
    ProviderDetail {
        #[arg(value_enum)]
        title_type: TitleType,
        imdb_id: String,
    },
    /// Rank the titles matching a query
    Lookup {
        #[arg(value_enum)]
        title_type: TitleType,
        /// Query in query-string syntax
        q: String,
        /// Release year boosting matching titles
        #[arg(long)]
        year: Option<String>,
    },
    /// Fetch an episode by absolute episode number
    Episode {
        /// IMDb id of the series
        imdb_id: String,
        /// Season number, -1 to infer it from the episode number
        #[arg(allow_negative_numbers = true)]
        season: i64,
        /// Absolute episode number
        episode: u32,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    println!("{}", output);
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings;

    match cli.command {
        Command::EsInfo => {
            let index = settings.search_index()?;
            print_json(&search_index_info(&index)?)
        }
        Command::Parse { parser, q } => {
            let parsed = normalize_title(&parser, &q)?;
            print_json(&json!({
                "q_parsed": parsed.query_string(),
                "parsed": parsed,
            }))
        }
        Command::Detail {
            title_type,
            imdb_id,
        } => {
            let index = settings.search_index()?;
            print_json(&title_detail(&index, title_type, &imdb_id)?)
        }
        Command::ProviderDetail {
            title_type,
            imdb_id,
        } => {
            let provider = settings.metadata_provider()?;
            print_json(&provider_title_detail(
                provider.as_ref(),
                title_type,
                &imdb_id,
            )?)
        }
        Command::Lookup {
            title_type,
            q,
            year,
        } => {
            let index = settings.search_index()?;
            print_json(&lookup_titles(&index, title_type, &q, year.as_deref())?)
        }
        Command::Episode {
            imdb_id,
            season,
            episode,
        } => {
            let season = SeasonRequest::from_raw(season)?;
            let provider = settings.metadata_provider()?;
            let located = find_episode(provider.as_ref(), &imdb_id, season, episode)?;
            info!(
                season = located.location.season_number,
                episode = located.location.episode_number,
                "episode found"
            );
            print_json(&located.metadata)
        }
    }
}

/// Exit code per failure kind, so scripts can tell them apart
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LookupError>() {
        Some(LookupError::PreconditionViolation(_)) => 2,
        Some(LookupError::UpstreamUnavailable(_)) => 3,
        Some(LookupError::NotFound(_)) => 4,
        None => 1,
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        process::exit(exit_code(&err));
    }
}
