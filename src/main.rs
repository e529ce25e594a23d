mod cli;
mod error;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use crossref_cache::{Cache, Database, Expiration};
use crossref_config::Config;
use exn::{OptionExt, ResultExt};
use serde::Serialize;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let loaded = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if !loaded.config.cache.enabled {
        tracing::info!("Cache is disabled in configuration; nothing to inspect");
        return Ok(());
    }
    let path = loaded.cache_path().or_raise(|| ErrorKind::Config)?;
    let db = Database::connect(&path).await.or_raise(|| ErrorKind::Cache)?;
    let cache = Cache::from_database(&db, Expiration::new(loaded.config.cache.expiration));
    let result = lookup(&cache, cli.command).await;
    db.close().await;
    result
}

async fn lookup(cache: &Cache, command: Command) -> Result<()> {
    match command {
        Command::Guid { guid, media_type } => {
            print(&cache.lookup_guid(&guid, media_type.map(Into::into)).await.or_raise(|| ErrorKind::Cache)?)
        },
        Command::ImdbTmdb { id, media_type, reverse: false } => {
            print(&cache.lookup_imdb_to_tmdb(media_type.into(), &id).await.or_raise(|| ErrorKind::Cache)?)
        },
        Command::ImdbTmdb { id, media_type, reverse: true } => {
            let tmdb_id = id.parse::<u64>().or_raise(|| ErrorKind::Config)?;
            print(&cache.lookup_tmdb_to_imdb(media_type.into(), tmdb_id).await.or_raise(|| ErrorKind::Cache)?)
        },
        Command::ImdbTvdb { id, reverse: false } => {
            print(&cache.lookup_imdb_to_tvdb(&id).await.or_raise(|| ErrorKind::Cache)?)
        },
        Command::ImdbTvdb { id, reverse: true } => {
            let tvdb_id = id.parse::<u64>().or_raise(|| ErrorKind::Config)?;
            print(&cache.lookup_tvdb_to_imdb(tvdb_id).await.or_raise(|| ErrorKind::Cache)?)
        },
        Command::TmdbTvdb { id, reverse: false } => {
            print(&cache.lookup_tmdb_to_tvdb(id).await.or_raise(|| ErrorKind::Cache)?)
        },
        Command::TmdbTvdb { id, reverse: true } => {
            print(&cache.lookup_tvdb_to_tmdb(id).await.or_raise(|| ErrorKind::Cache)?)
        },
        Command::Letterboxd { id } => print(&cache.lookup_letterboxd(&id).await.or_raise(|| ErrorKind::Cache)?),
        Command::Ratings { imdb_id } => print(&cache.lookup_ratings(&imdb_id).await.or_raise(|| ErrorKind::Cache)?),
        Command::Anime(args) => {
            let id = args.id().ok_or_raise(|| ErrorKind::Config)?;
            print(&cache.lookup_anime(id).await.or_raise(|| ErrorKind::Cache)?)
        },
    }
}

fn print(value: &impl Serialize) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).or_raise(|| ErrorKind::Output)?;
    writeln!(stdout).or_raise(|| ErrorKind::Output)
}
