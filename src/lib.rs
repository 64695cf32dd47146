//! # Hondana
//!
//! A cursor-paginated catalog search and recommendation engine.
//!
//! Hondana ingests third-party catalog entries (title, author, price,
//! tags, imagery) into a searchable collection and serves keyword- and
//! genre-filtered result pages over a CLI and a JSON HTTP API. Pages
//! are walked with a stable keyset cursor rather than an offset, so
//! traversal stays correct while the ingestion job keeps upserting
//! fresh items.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────┐
//! │  Import    │──▶│  Keyword     │──▶│  SQLite   │
//! │  (JSON)    │   │  derivation  │   │  items    │
//! └────────────┘   └──────────────┘   └────┬─────┘
//!                                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │(hondana) │       │  (JSON)  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`keywords`] | Write-time denormalized keyword derivation |
//! | [`query`] | Request → filter construction |
//! | [`cursor`] | Opaque keyset cursor codec |
//! | [`page`] | Keyset paginator |
//! | [`rank`] | "More like this" relevance ranking |
//! | [`feed`] | Client-side pagination state machine |
//! | [`store`] | Storage abstraction (memory, SQLite) |
//! | [`ingest`] | JSON catalog import |
//! | [`server`] | JSON HTTP server |
//! | [`commands`] | CLI command runners |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod commands;
pub mod config;
pub mod cursor;
pub mod db;
pub mod feed;
pub mod ingest;
pub mod keywords;
pub mod migrate;
pub mod models;
pub mod page;
pub mod query;
pub mod rank;
pub mod server;
pub mod store;
