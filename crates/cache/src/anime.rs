//! Anime cross-reference.
//!
//! Each row holds the equivalent IDs of one anime across AniDB, AniList,
//! MyAnimeList and Kitsu. Rows are anchored on AniDB: writes key off it, and a
//! row without an AniDB ID is a reserved slot that reads as a miss.

use crate::cache::{Cache, Cached};
use crate::error::{ErrorKind, Result, read_error};
use crate::models::AnimeRow;
use exn::ResultExt;
use tracing::instrument;

/// The same anime identified in each supported ID system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct AnimeIds {
    pub anidb: u64,
    pub anilist: Option<u64>,
    pub myanimelist: Option<u64>,
    pub kitsu: Option<u64>,
}
impl AnimeIds {
    pub fn new(anidb: u64) -> Self {
        Self {
            anidb,
            anilist: None,
            myanimelist: None,
            kitsu: None,
        }
    }
}

/// An anime ID in one particular ID system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimeId {
    AniDb(u64),
    AniList(u64),
    MyAnimeList(u64),
    Kitsu(u64),
}
impl AnimeId {
    fn value(&self) -> u64 {
        match self {
            Self::AniDb(id) | Self::AniList(id) | Self::MyAnimeList(id) | Self::Kitsu(id) => *id,
        }
    }

    fn select_sql(&self) -> &'static str {
        match self {
            Self::AniDb(_) => include_str!("../queries/select_anime_by_anidb.sql"),
            Self::AniList(_) => include_str!("../queries/select_anime_by_anilist.sql"),
            Self::MyAnimeList(_) => include_str!("../queries/select_anime_by_myanimelist.sql"),
            Self::Kitsu(_) => include_str!("../queries/select_anime_by_kitsu.sql"),
        }
    }
}

fn optional_text(id: Option<u64>) -> Option<String> {
    id.map(|id| id.to_string())
}

impl Cache {
    /// Look up the full set of IDs for an anime by any one of its IDs.
    #[instrument(level = "debug", skip(self))]
    pub async fn lookup_anime(&self, id: AnimeId) -> Result<Option<Cached<AnimeIds>>> {
        let row: Option<AnimeRow> = sqlx::query_as(id.select_sql())
            .bind(id.value().to_string())
            .fetch_optional(self.pool())
            .await
            .map_err(read_error)?;
        let Some(row) = row.filter(AnimeRow::is_resolved) else {
            return Ok(None);
        };
        let stale = self.is_stale(row.expiration_date.as_deref());
        Ok(Some(Cached::new(AnimeIds::try_from(row)?, stale)))
    }

    /// Store the IDs of an anime under its AniDB ID.
    #[instrument(level = "debug", skip(self))]
    pub async fn upsert_anime(&self, ids: &AnimeIds, force_expired: bool) -> Result<()> {
        let anidb = ids.anidb.to_string();
        let expiration = self.stamp(force_expired)?;
        let mut tx = self.pool().begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/reserve_anime.sql"))
            .bind(&anidb)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/update_anime.sql"))
            .bind(optional_text(ids.anilist))
            .bind(optional_text(ids.myanimelist))
            .bind(optional_text(ids.kitsu))
            .bind(expiration)
            .bind(anidb)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}
