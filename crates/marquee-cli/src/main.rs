//! Marquee CLI - resolver and page tooling
//!
//! Subcommands:
//! - `resolve`: query the upstream providers and print the ranked,
//!   deduplicated variant list
//! - `probe`: fetch a master playlist and list its audio renditions and
//!   quality levels
//! - `page`: render the standalone player page HTML for a content id
//! - `fallback`: print the deterministic third-party embed URL

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod page;

/// Marquee - stream resolution and player page toolkit
#[derive(Parser)]
#[command(name = "marquee")]
#[command(version)]
#[command(about = "Stream variant resolution and player page toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Base URL of the upstream source API
    #[arg(long, default_value = "https://uembed.site")]
    api_base: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a content id to its ranked stream variants
    Resolve {
        /// Catalog content id (e.g. a TMDB id)
        id: String,

        /// Season number (series only)
        #[arg(short, long)]
        season: Option<u32>,

        /// Episode number (series only)
        #[arg(short, long)]
        episode: Option<u32>,
    },

    /// Probe a master playlist for audio renditions and quality levels
    Probe {
        /// URL of the master M3U8
        url: String,
    },

    /// Render the player page HTML for a content id
    Page {
        /// Catalog content id
        id: String,

        #[arg(short, long)]
        season: Option<u32>,

        #[arg(short, long)]
        episode: Option<u32>,
    },

    /// Print the fallback embed URL for a content id
    Fallback {
        /// Catalog content id
        id: String,

        #[arg(short, long)]
        season: Option<u32>,

        #[arg(short, long)]
        episode: Option<u32>,

        /// Base URL of the third-party embed player
        #[arg(long, default_value = "https://www.2embed.cc")]
        embed_base: String,
    },
}

fn content_id(id: String, season: Option<u32>, episode: Option<u32>) -> marquee_core::ContentId {
    match (season, episode) {
        (Some(s), Some(e)) => marquee_core::ContentId::episode(id, s, e),
        _ => marquee_core::ContentId::movie(id),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    match cli.command {
        Commands::Resolve { id, season, episode } => {
            commands::resolve(
                content_id(id, season, episode),
                &cli.api_base,
                &cli.format,
            )
            .await
        }
        Commands::Probe { url } => commands::probe(&url, &cli.format).await,
        Commands::Page { id, season, episode } => {
            commands::page(content_id(id, season, episode), &cli.api_base).await
        }
        Commands::Fallback { id, season, episode, embed_base } => {
            commands::fallback(content_id(id, season, episode), &embed_base)
        }
    }
}
