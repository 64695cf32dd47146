//! # Hondana CLI (`hondana`)
//!
//! The `hondana` binary is the primary interface to the catalog engine.
//! It provides commands for database initialization, catalog import,
//! search, browsing, recommendations, and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! hondana --config ./config/hondana.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hondana init` | Create the SQLite database and run schema migrations |
//! | `hondana import <file>` | Import a JSON catalog file (upsert by external id) |
//! | `hondana search "<query>"` | Keyword search across title, author, and tags |
//! | `hondana browse --genre <g>` | Browse by genre |
//! | `hondana recommend --tag <t>` | Ranked "more like this" listing |
//! | `hondana get <external_id>` | Print one item in full |
//! | `hondana genres` | List genres with item counts |
//! | `hondana serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! hondana init --config ./config/hondana.toml
//!
//! # Import a catalog dump
//! hondana import catalog.json --config ./config/hondana.toml
//!
//! # Keyword search, then continue from the printed cursor
//! hondana search "dog+tarou"
//! hondana search "dog+tarou" --cursor djE6MTcyNDM2ODAwMDo0Mg
//!
//! # Browse two genres at once
//! hondana browse --genre fantasy --genre comedy
//!
//! # Recommendations seeded from an item's tags and author
//! hondana recommend --tag fantasy --author "yamada" --exclude item-001
//!
//! # Start the HTTP server
//! hondana serve --config ./config/hondana.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use hondana::rank::RecommendRequest;
use hondana::{commands, config, ingest, migrate, server};

/// Hondana CLI — a catalog query, pagination, and ranking engine.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file. See `config/hondana.example.toml` for a full
/// example.
#[derive(Parser)]
#[command(
    name = "hondana",
    about = "Hondana — a catalog query, pagination, and ranking engine",
    version,
    long_about = "Hondana serves a content catalog with keyword search, genre browsing, \
    stable keyset cursor pagination, and relevance-ranked recommendations, backed by SQLite \
    and exposed through a CLI and a JSON HTTP server."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/hondana.toml`. Database, paging, and
    /// server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/hondana.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the items table with its
    /// indexes. This command is idempotent — running it multiple times
    /// is safe.
    Init,

    /// Import a JSON catalog file.
    ///
    /// Reads a JSON array of catalog entries and upserts each into the
    /// store, keyed by external id. Re-importing refreshes existing
    /// items in place.
    Import {
        /// Path to the JSON catalog file.
        file: PathBuf,

        /// Show entry counts without writing to the database.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of entries to import.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search the catalog by keyword.
    ///
    /// Terms are split on `+` or whitespace and matched against title,
    /// author, and tags; any term matching is enough.
    Search {
        /// The search query string.
        query: String,

        /// Continue from a cursor printed by a previous run.
        #[arg(long)]
        cursor: Option<String>,

        /// Page size.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Browse the catalog by genre.
    ///
    /// With `--genre` alone, items tagged with any requested genre
    /// match. Adding `--query` narrows to items carrying *all*
    /// requested genres that also match the keyword search.
    Browse {
        /// Genre to browse (repeatable).
        #[arg(long = "genre", required = true)]
        genres: Vec<String>,

        /// Optional keyword query to narrow the browse.
        #[arg(long)]
        query: Option<String>,

        /// Continue from a cursor printed by a previous run.
        #[arg(long)]
        cursor: Option<String>,

        /// Page size.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Ranked "more like this" recommendations.
    ///
    /// Seeds come from an item the user is viewing: its genres, tags,
    /// and author. Without any seeds the whole catalog is ranked by
    /// rating and popularity alone.
    Recommend {
        /// Seed genre (repeatable).
        #[arg(long = "genre")]
        genres: Vec<String>,

        /// Seed tag (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Seed author (repeatable).
        #[arg(long = "author")]
        authors: Vec<String>,

        /// External id to exclude, typically the seed item (repeatable).
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Continue from a cursor printed by a previous run.
        #[arg(long)]
        cursor: Option<String>,

        /// Page size.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print one item in full by its external id.
    Get {
        /// External item id.
        external_id: String,
    },

    /// List genres with item counts, most frequent first.
    Genres {
        /// Maximum number of genres to list.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// the catalog JSON API.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import {
            file,
            dry_run,
            limit,
        } => {
            ingest::run_import(&cfg, &file, dry_run, limit).await?;
        }
        Commands::Search {
            query,
            cursor,
            limit,
        } => {
            commands::run_search(&cfg, &query, cursor, limit).await?;
        }
        Commands::Browse {
            genres,
            query,
            cursor,
            limit,
        } => {
            commands::run_browse(&cfg, &genres, query.as_deref(), cursor, limit).await?;
        }
        Commands::Recommend {
            genres,
            tags,
            authors,
            exclude,
            cursor,
            limit,
        } => {
            let req = RecommendRequest {
                seed_genres: genres,
                seed_tags: tags,
                seed_authors: authors,
                exclude_ids: exclude,
            };
            commands::run_recommend(&cfg, req, cursor, limit).await?;
        }
        Commands::Get { external_id } => {
            commands::run_get(&cfg, &external_id).await?;
        }
        Commands::Genres { limit } => {
            commands::run_genres(&cfg, limit).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
