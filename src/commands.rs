//! CLI command runners.
//!
//! Thin wrappers over the query engine that print listings to stdout.
//! Every listing command accepts a `--cursor` token from a previous
//! run and prints the next one, so a shell loop can walk the whole
//! catalog the same way an HTTP client would.

use anyhow::Result;

use crate::config::Config;
use crate::cursor;
use crate::db;
use crate::models::{ContentItem, Page};
use crate::page::fetch_page;
use crate::query::{build_filter, GenreMode};
use crate::rank::{recommend, RecommendRequest};
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

async fn open_store(config: &Config) -> Result<SqliteStore> {
    let pool = db::connect(config).await?;
    Ok(SqliteStore::new(pool))
}

fn resolve_limit(config: &Config, limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(config.paging.default_limit)
        .clamp(1, config.paging.max_limit)
}

fn print_page(page: &Page<ContentItem>) {
    for item in &page.data {
        let tags = item.tags.join(", ");
        println!("{}  {}", item.external_id, item.title);
        println!("    author: {}", item.author);
        println!("    price: {}  tags: [{}]", item.price, tags);
        println!("    updated: {}", format_ts_iso(item.updated_at));
    }
    println!();
    println!("{} item(s)", page.data.len());
    match &page.next_cursor {
        Some(c) => println!("next cursor: {}", cursor::encode(c)),
        None => println!("end of results"),
    }
}

/// `search` command: keyword search across title, author, and tags.
pub async fn run_search(
    config: &Config,
    query: &str,
    cursor_token: Option<String>,
    limit: Option<i64>,
) -> Result<()> {
    let store = open_store(config).await?;
    let filter = build_filter(Some(query), &[], GenreMode::Any);
    let page = fetch_page(
        &store,
        &filter,
        cursor::decode_opt(cursor_token.as_deref()),
        resolve_limit(config, limit),
    )
    .await?;
    print_page(&page);
    Ok(())
}

/// `browse` command: items tagged with any of the genres, or all of
/// them when a query narrows the browse.
pub async fn run_browse(
    config: &Config,
    genres: &[String],
    query: Option<&str>,
    cursor_token: Option<String>,
    limit: Option<i64>,
) -> Result<()> {
    let store = open_store(config).await?;
    let mode = if query.is_some() {
        GenreMode::All
    } else {
        GenreMode::Any
    };
    let filter = build_filter(query, genres, mode);
    let page = fetch_page(
        &store,
        &filter,
        cursor::decode_opt(cursor_token.as_deref()),
        resolve_limit(config, limit),
    )
    .await?;
    print_page(&page);
    Ok(())
}

/// `recommend` command: ranked "more like this" listing.
pub async fn run_recommend(
    config: &Config,
    req: RecommendRequest,
    cursor_token: Option<String>,
    limit: Option<i64>,
) -> Result<()> {
    let store = open_store(config).await?;
    let page = recommend(
        &store,
        &req,
        cursor::decode_opt(cursor_token.as_deref()),
        resolve_limit(config, limit),
        config.paging.candidate_k,
    )
    .await?;
    print_page(&page);
    Ok(())
}

/// `get` command: print one item in full.
pub async fn run_get(config: &Config, external_id: &str) -> Result<()> {
    let store = open_store(config).await?;
    let item = match store.get_item(external_id).await? {
        Some(item) => item,
        None => {
            eprintln!("Error: no item with external_id: {}", external_id);
            std::process::exit(1);
        }
    };

    println!("--- Item ---");
    println!("external_id:  {}", item.external_id);
    println!("title:        {}", item.title);
    println!("author:       {}", item.author);
    println!("price:        {}", item.price);
    println!("tags:         [{}]", item.tags.join(", "));
    if let Some(rating) = item.rating {
        println!("rating:       {}", rating);
    }
    if let Some(popularity) = item.popularity {
        println!("popularity:   {}", popularity);
    }
    if !item.product_url.is_empty() {
        println!("product_url:  {}", item.product_url);
    }
    println!("created_at:   {}", format_ts_iso(item.created_at));
    println!("updated_at:   {}", format_ts_iso(item.updated_at));
    if !item.description.is_empty() {
        println!();
        println!("--- Description ---");
        println!("{}", item.description);
    }

    Ok(())
}

/// `genres` command: tag-count ranking, the catalog's genre list.
pub async fn run_genres(config: &Config, limit: Option<i64>) -> Result<()> {
    let store = open_store(config).await?;
    let counts = store.tag_counts(limit.unwrap_or(100).max(1)).await?;
    for tc in &counts {
        println!("{:>6}  {}", tc.count, tc.tag);
    }
    println!();
    println!("{} genre(s)", counts.len());
    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
