//! Command-line interface.

use clap::{Args, Parser, Subcommand, ValueEnum};
use crossref_cache::{AnimeId, MediaType};
use std::path::PathBuf;

/// Inspect the cross-reference cache of media provider identifiers.
#[derive(Parser, Debug)]
#[command(name = "crossref", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (YAML or TOML).
    #[arg(short, long, env = "CROSSREF_CONFIG")]
    pub config: Option<PathBuf>,
    /// Log debug output.
    #[arg(short, long)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Provider ID cached for a media library GUID.
    Guid {
        guid: String,
        #[arg(long, value_enum)]
        media_type: Option<Media>,
    },
    /// IMDb → TMDb (or TMDb → IMDb with --reverse).
    ImdbTmdb {
        id: String,
        #[arg(long, value_enum)]
        media_type: Media,
        #[arg(long)]
        reverse: bool,
    },
    /// IMDb → TVDb (or TVDb → IMDb with --reverse).
    ImdbTvdb {
        id: String,
        #[arg(long)]
        reverse: bool,
    },
    /// TMDb → TVDb (or TVDb → TMDb with --reverse).
    TmdbTvdb {
        id: u64,
        #[arg(long)]
        reverse: bool,
    },
    /// TMDb ID cached for a Letterboxd film.
    Letterboxd { id: String },
    /// Rating metadata cached for an IMDb ID.
    Ratings { imdb_id: String },
    /// Anime IDs cached across AniDB, AniList, MyAnimeList and Kitsu.
    Anime(AnimeArgs),
}

#[derive(Args, Debug, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct AnimeArgs {
    #[arg(long)]
    pub anidb: Option<u64>,
    #[arg(long)]
    pub anilist: Option<u64>,
    #[arg(long)]
    pub myanimelist: Option<u64>,
    #[arg(long)]
    pub kitsu: Option<u64>,
}
impl AnimeArgs {
    pub fn id(&self) -> Option<AnimeId> {
        self.anidb
            .map(AnimeId::AniDb)
            .or(self.anilist.map(AnimeId::AniList))
            .or(self.myanimelist.map(AnimeId::MyAnimeList))
            .or(self.kitsu.map(AnimeId::Kitsu))
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Media {
    Movie,
    Show,
}
impl From<Media> for MediaType {
    fn from(media: Media) -> Self {
        match media {
            Media::Movie => Self::Movie,
            Media::Show => Self::Show,
        }
    }
}
