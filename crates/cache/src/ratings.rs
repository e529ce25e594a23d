//! Rating metadata records.
//!
//! Same reserved-slot protocol as the mapping tables, but the cached value
//! is a fixed set of columns keyed by IMDb ID. Individual fields may be
//! missing; only a missing title makes the whole record a miss.

use crate::cache::{Cache, Cached};
use crate::error::{ErrorKind, Result, read_error};
use crate::models::RatingRow;
use exn::ResultExt;
use tracing::instrument;

/// Rating metadata fetched for a title.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RatingRecord {
    pub imdb_id: String,
    pub title: Option<String>,
    pub year: Option<u16>,
    /// Content/age rating (e.g. "PG-13").
    pub content_rating: Option<String>,
    pub genres: Vec<String>,
    pub imdb_rating: Option<f64>,
    pub imdb_votes: Option<u64>,
    pub metacritic_rating: Option<u8>,
    /// Provider's classification of the title ("movie", "series", ...).
    pub kind: Option<String>,
}
impl RatingRecord {
    pub fn new(imdb_id: impl Into<String>) -> Self {
        Self {
            imdb_id: imdb_id.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_content_rating(mut self, content_rating: impl Into<String>) -> Self {
        self.content_rating = Some(content_rating.into());
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_imdb_rating(mut self, rating: f64, votes: u64) -> Self {
        self.imdb_rating = Some(rating);
        self.imdb_votes = Some(votes);
        self
    }

    pub fn with_metacritic_rating(mut self, rating: u8) -> Self {
        self.metacritic_rating = Some(rating);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

impl Cache {
    /// Look up the rating record for an IMDb ID.
    #[instrument(level = "debug", skip(self))]
    pub async fn lookup_ratings(&self, imdb_id: &str) -> Result<Option<Cached<RatingRecord>>> {
        let row: Option<RatingRow> = sqlx::query_as(include_str!("../queries/select_rating.sql"))
            .bind(imdb_id)
            .fetch_optional(self.pool())
            .await
            .map_err(read_error)?;
        let Some(row) = row.filter(RatingRow::is_resolved) else {
            return Ok(None);
        };
        let stale = self.is_stale(row.expiration_date.as_deref());
        Ok(Some(Cached::new(RatingRecord::try_from(row)?, stale)))
    }

    /// Store a rating record, replacing every field of any previous record
    /// for the same IMDb ID.
    #[instrument(level = "debug", skip_all, fields(imdb_id = %record.imdb_id, force_expired = force_expired))]
    pub async fn upsert_ratings(&self, record: &RatingRecord, force_expired: bool) -> Result<()> {
        let row = RatingRow::try_from(record)?;
        let expiration = self.stamp(force_expired)?;
        let mut tx = self.pool().begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/reserve_rating.sql"))
            .bind(&row.imdb_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/update_rating.sql"))
            .bind(row.title)
            .bind(row.year)
            .bind(row.content_rating)
            .bind(row.genres)
            .bind(row.imdb_rating)
            .bind(row.imdb_votes)
            .bind(row.metacritic_rating)
            .bind(row.kind)
            .bind(expiration)
            .bind(row.imdb_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}
