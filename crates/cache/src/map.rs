//! Generic key → value mapping store.
//!
//! Every identifier mapping table has the same shape: a unique key column, a
//! nullable value column, an `expiration_date` column and, on some tables, a
//! `media_type` discriminator that takes part in the key. A [`MapTable`]
//! describes one such table, and [`Cache::lookup`] / [`Cache::upsert`]
//! implement the protocol once for all of them.
//!
//! Only the fixed identifiers of the descriptors below ever appear in query
//! text; keys and values are always bound as parameters. Descriptors cannot
//! be built outside this module, and are checked with [`MapTable::validate`]
//! when the database is opened and again before any query text is built.

use crate::cache::{Cache, Cached};
use crate::error::{ErrorKind, Result, read_error};
use crate::media::MediaType;
use crate::models::MapRow;
use exn::ResultExt;
use tracing::instrument;

/// Library GUID → provider ID, per media type.
pub const GUID_MAP: MapTable = MapTable {
    name: "guid_map",
    key: "plex_guid",
    value: "t_id",
    discriminator: Some("media_type"),
};
/// IMDb ID ↔ TMDb ID, per media type.
pub const IMDB_TO_TMDB: MapTable = MapTable {
    name: "imdb_to_tmdb_map",
    key: "imdb_id",
    value: "tmdb_id",
    discriminator: Some("media_type"),
};
/// IMDb ID ↔ TVDb ID.
pub const IMDB_TO_TVDB: MapTable = MapTable {
    name: "imdb_to_tvdb_map",
    key: "imdb_id",
    value: "tvdb_id",
    discriminator: None,
};
/// TMDb ID ↔ TVDb ID.
pub const TMDB_TO_TVDB: MapTable = MapTable {
    name: "tmdb_to_tvdb_map",
    key: "tmdb_id",
    value: "tvdb_id",
    discriminator: None,
};
/// Letterboxd film ID → TMDb ID.
pub const LETTERBOXD_TO_TMDB: MapTable = MapTable {
    name: "letterboxd_map",
    key: "letterboxd_id",
    value: "tmdb_id",
    discriminator: None,
};

/// All mapping tables served by the generic store.
pub const MAP_TABLES: [&MapTable; 5] = [
    &GUID_MAP,
    &IMDB_TO_TMDB,
    &IMDB_TO_TVDB,
    &TMDB_TO_TVDB,
    &LETTERBOXD_TO_TMDB,
];

/// Which column of a mapping table is matched during a lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Match the key column, return the value column.
    #[default]
    Forward,
    /// Match the value column, return the key column.
    Reverse,
}

/// Static description of a mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapTable {
    name: &'static str,
    /// Unique column rows are written by.
    key: &'static str,
    value: &'static str,
    /// Column that partitions otherwise identical keys (media type).
    discriminator: Option<&'static str>,
}
impl MapTable {
    /// Check that every identifier is safe to place in query text.
    pub fn validate(&self) -> Result<()> {
        let identifiers = [Some(self.name), Some(self.key), Some(self.value), self.discriminator];
        for identifier in identifiers.into_iter().flatten() {
            if !is_identifier(identifier) {
                exn::bail!(ErrorKind::InvalidDescriptor(identifier));
            }
        }
        if self.key == self.value {
            exn::bail!(ErrorKind::InvalidDescriptor(self.name));
        }
        Ok(())
    }

    /// `(matched column, returned column)` for a lookup direction.
    fn columns(&self, direction: Direction) -> (&'static str, &'static str) {
        match direction {
            Direction::Forward => (self.key, self.value),
            Direction::Reverse => (self.value, self.key),
        }
    }

    fn select_sql(&self, direction: Direction, by_discriminator: bool) -> String {
        let (from, to) = self.columns(direction);
        let discriminator = self.discriminator.unwrap_or("NULL");
        let mut sql = format!(
            "SELECT {to} AS value, {discriminator} AS media_type, expiration_date \
             FROM {table} WHERE {from} = ?",
            table = self.name,
        );
        if by_discriminator {
            sql.push_str(&format!(" AND {discriminator} = ?"));
        }
        // The value column is not unique, so a reverse lookup may match more
        // than one row. Prefer the most recently created.
        sql.push_str(" ORDER BY rowid DESC LIMIT 1");
        sql
    }

    fn insert_sql(&self) -> String {
        match self.discriminator {
            Some(d) => format!("INSERT OR IGNORE INTO {} ({}, {d}) VALUES (?, ?)", self.name, self.key),
            None => format!("INSERT OR IGNORE INTO {} ({}) VALUES (?)", self.name, self.key),
        }
    }

    fn update_sql(&self) -> String {
        let mut sql = format!(
            "UPDATE {} SET {} = ?, expiration_date = ? WHERE {} = ?",
            self.name, self.value, self.key
        );
        if let Some(d) = self.discriminator {
            sql.push_str(&format!(" AND {d} = ?"));
        }
        sql
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Value found in a mapping table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MapEntry {
    pub value: String,
    /// Media type stored on the row, for discriminated tables.
    pub media_type: Option<MediaType>,
}

impl Cache {
    /// Look up `key` in a mapping table.
    ///
    /// When the table has a discriminator and `media_type` is given, only a
    /// row for that media type matches; otherwise the media type is ignored.
    /// Returns `None` when no row matches or when the matched row has no
    /// value yet (a reserved slot).
    #[instrument(level = "debug", skip_all, fields(table = table.name, direction = ?direction, key = key))]
    pub async fn lookup(
        &self,
        table: &MapTable,
        direction: Direction,
        key: &str,
        media_type: Option<MediaType>,
    ) -> Result<Option<Cached<MapEntry>>> {
        table.validate()?;
        let media_type = media_type.filter(|_| table.discriminator.is_some());
        let sql = table.select_sql(direction, media_type.is_some());
        let mut query = sqlx::query_as::<_, MapRow>(&sql).bind(key);
        if let Some(media_type) = media_type {
            query = query.bind(media_type.as_str());
        }
        let row = query.fetch_optional(self.pool()).await.map_err(read_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let stale = self.is_stale(row.expiration_date.as_deref());
        Ok(row.into_entry()?.map(|entry| Cached::new(entry, stale)))
    }

    /// Store `value` for `key`, stamping a new expiration date.
    ///
    /// The row for `key` is created if absent and then updated in place, both
    /// within one transaction. Discriminated tables require `media_type`.
    #[instrument(level = "debug", skip_all, fields(table = table.name, key = key, force_expired = force_expired))]
    pub async fn upsert(
        &self,
        table: &MapTable,
        key: &str,
        value: &str,
        media_type: Option<MediaType>,
        force_expired: bool,
    ) -> Result<()> {
        table.validate()?;
        let media_type = match (table.discriminator, media_type) {
            (Some(_), None) => exn::bail!(ErrorKind::MissingMediaType(table.name)),
            (Some(_), Some(media_type)) => Some(media_type.as_str()),
            (None, _) => None,
        };
        let expiration = self.stamp(force_expired)?;
        let mut tx = self.pool().begin().await.or_raise(|| ErrorKind::Database)?;
        let insert_sql = table.insert_sql();
        let mut insert = sqlx::query(&insert_sql).bind(key);
        if let Some(media_type) = media_type {
            insert = insert.bind(media_type);
        }
        insert.execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
        let update_sql = table.update_sql();
        let mut update = sqlx::query(&update_sql).bind(value).bind(&expiration).bind(key);
        if let Some(media_type) = media_type {
            update = update.bind(media_type);
        }
        update.execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiration::{DATE_FORMAT, Expiration, today};
    use crate::{Cache, Database};
    use rstest::rstest;
    use time::{Date, Duration};

    async fn cache(ttl: u32) -> (Database, Cache) {
        let db = Database::connect_in_memory().await.unwrap();
        let cache = Cache::from_database(&db, Expiration::new(ttl));
        (db, cache)
    }

    async fn stored_expiration(cache: &Cache, table: &MapTable, key: &str) -> Date {
        let sql = format!("SELECT expiration_date FROM {} WHERE {} = ?", table.name, table.key);
        let raw: String = sqlx::query_scalar(&sql).bind(key).fetch_one(cache.pool()).await.unwrap();
        Date::parse(&raw, DATE_FORMAT).unwrap()
    }

    async fn row_count(cache: &Cache, table: &MapTable) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name);
        sqlx::query_scalar(&sql).fetch_one(cache.pool()).await.unwrap()
    }

    #[test]
    fn test_descriptors_are_valid() {
        for table in MAP_TABLES {
            table.validate().unwrap();
        }
    }

    #[rstest]
    #[case("guid_map; DROP TABLE x", "key", "value")]
    #[case("table", "key col", "value")]
    #[case("table", "key", "")]
    #[case("table", "1key", "value")]
    #[case("table", "same", "same")]
    fn test_invalid_descriptors(#[case] name: &'static str, #[case] key: &'static str, #[case] value: &'static str) {
        let table = MapTable { name, key, value, discriminator: None };
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_select_sql_swaps_columns() {
        assert_eq!(
            IMDB_TO_TVDB.select_sql(Direction::Reverse, false),
            "SELECT imdb_id AS value, NULL AS media_type, expiration_date \
             FROM imdb_to_tvdb_map WHERE tvdb_id = ? ORDER BY rowid DESC LIMIT 1"
        );
        assert_eq!(
            IMDB_TO_TMDB.select_sql(Direction::Forward, true),
            "SELECT tmdb_id AS value, media_type AS media_type, expiration_date \
             FROM imdb_to_tmdb_map WHERE imdb_id = ? AND media_type = ? ORDER BY rowid DESC LIMIT 1"
        );
    }

    #[tokio::test]
    async fn test_invalid_descriptor_is_never_queried() {
        let (db, cache) = cache(60).await;
        cache.upsert_letterboxd("the-matrix", 603, false).await.unwrap();
        let injected = MapTable {
            key: "1=1 OR letterboxd_id",
            ..LETTERBOXD_TO_TMDB
        };
        let err = cache.lookup(&injected, Direction::Forward, "zzz", None).await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidDescriptor("1=1 OR letterboxd_id"));
        let err = cache.upsert(&injected, "zzz", "1", None, false).await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidDescriptor("1=1 OR letterboxd_id"));
        assert_eq!(row_count(&cache, &LETTERBOXD_TO_TMDB).await, 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_lookup_missing_key() {
        let (db, cache) = cache(60).await;
        let hit = cache.lookup(&LETTERBOXD_TO_TMDB, Direction::Forward, "nope", None).await.unwrap();
        assert!(hit.is_none());
        db.close().await;
    }

    #[rstest]
    #[case(1)]
    #[case(30)]
    #[case(60)]
    #[tokio::test]
    async fn test_fresh_write_reads_back_fresh(#[case] ttl: u32) {
        let (db, cache) = cache(ttl).await;
        cache.upsert(&IMDB_TO_TVDB, "tt0944947", "121361", None, false).await.unwrap();
        let hit = cache.lookup(&IMDB_TO_TVDB, Direction::Forward, "tt0944947", None).await;
        let hit = hit.unwrap().unwrap();
        assert_eq!(hit.value.value, "121361");
        assert!(!hit.stale);
        let age = (today() - stored_expiration(&cache, &IMDB_TO_TVDB, "tt0944947").await).whole_days();
        assert!((1..=i64::from(ttl)).contains(&age));
        db.close().await;
    }

    #[tokio::test]
    async fn test_forced_write_reads_back_stale() {
        let (db, cache) = cache(60).await;
        cache.upsert(&IMDB_TO_TVDB, "tt0944947", "121361", None, true).await.unwrap();
        let hit = cache.lookup(&IMDB_TO_TVDB, Direction::Forward, "tt0944947", None).await;
        let hit = hit.unwrap().unwrap();
        assert_eq!(hit.value.value, "121361");
        assert!(hit.stale);
        db.close().await;
    }

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let (db, cache) = cache(60).await;
        cache.upsert(&TMDB_TO_TVDB, "1399", "1", None, true).await.unwrap();
        cache.upsert(&TMDB_TO_TVDB, "1399", "121361", None, false).await.unwrap();
        assert_eq!(row_count(&cache, &TMDB_TO_TVDB).await, 1);
        let hit = cache.lookup(&TMDB_TO_TVDB, Direction::Forward, "1399", None).await.unwrap().unwrap();
        assert_eq!(hit, Cached::new(MapEntry { value: "121361".to_string(), media_type: None }, false));
        db.close().await;
    }

    #[tokio::test]
    async fn test_discriminator_isolation() {
        let (db, cache) = cache(60).await;
        cache.upsert(&IMDB_TO_TMDB, "tt1", "100", Some(MediaType::Movie), false).await.unwrap();
        cache.upsert(&IMDB_TO_TMDB, "tt1", "200", Some(MediaType::Show), false).await.unwrap();
        assert_eq!(row_count(&cache, &IMDB_TO_TMDB).await, 2);
        let movie = cache.lookup(&IMDB_TO_TMDB, Direction::Forward, "tt1", Some(MediaType::Movie)).await;
        assert_eq!(movie.unwrap().unwrap().value.value, "100");
        let show = cache.lookup(&IMDB_TO_TMDB, Direction::Forward, "tt1", Some(MediaType::Show)).await;
        assert_eq!(show.unwrap().unwrap().value.value, "200");
        db.close().await;
    }

    #[tokio::test]
    async fn test_discriminator_mismatch_is_a_miss() {
        let (db, cache) = cache(60).await;
        let guid = "plex://movie/5d7768";
        cache.upsert(&GUID_MAP, guid, "tt0111161", Some(MediaType::Movie), false).await.unwrap();
        let hit = cache.lookup(&GUID_MAP, Direction::Forward, guid, Some(MediaType::Show)).await;
        assert!(hit.unwrap().is_none());
        // Without a discriminator the stored media type is reported.
        let hit = cache.lookup(&GUID_MAP, Direction::Forward, guid, None).await.unwrap().unwrap();
        assert_eq!(hit.value.media_type, Some(MediaType::Movie));
        db.close().await;
    }

    #[tokio::test]
    async fn test_discriminated_upsert_requires_media_type() {
        let (db, cache) = cache(60).await;
        let err = cache.upsert(&GUID_MAP, "plex://movie/5d7768", "tt0111161", None, false).await.unwrap_err();
        assert_eq!(*err, ErrorKind::MissingMediaType("guid_map"));
        assert_eq!(row_count(&cache, &GUID_MAP).await, 0);
        db.close().await;
    }

    #[tokio::test]
    async fn test_failed_update_leaves_no_reserved_row() {
        let (db, cache) = cache(60).await;
        sqlx::query(
            "CREATE TRIGGER reject_update BEFORE UPDATE ON letterboxd_map \
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(cache.pool())
        .await
        .unwrap();
        let err = cache.upsert(&LETTERBOXD_TO_TMDB, "the-matrix", "603", None, false).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Database);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM letterboxd_map WHERE letterboxd_id = ?")
            .bind("the-matrix")
            .fetch_one(cache.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
        db.close().await;
    }

    #[tokio::test]
    async fn test_reserved_slot_is_a_miss() {
        let (db, cache) = cache(60).await;
        sqlx::query("INSERT INTO letterboxd_map (letterboxd_id) VALUES (?)")
            .bind("the-shawshank-redemption")
            .execute(cache.pool())
            .await
            .unwrap();
        let hit = cache.lookup(&LETTERBOXD_TO_TMDB, Direction::Forward, "the-shawshank-redemption", None);
        assert!(hit.await.unwrap().is_none());
        db.close().await;
    }

    #[tokio::test]
    async fn test_reverse_lookup() {
        let (db, cache) = cache(60).await;
        cache.upsert(&IMDB_TO_TMDB, "tt1", "100", Some(MediaType::Movie), false).await.unwrap();
        let hit = cache.lookup(&IMDB_TO_TMDB, Direction::Reverse, "100", Some(MediaType::Movie)).await.unwrap();
        assert_eq!(hit.unwrap().value.value, "tt1");
        let hit = cache.lookup(&IMDB_TO_TMDB, Direction::Reverse, "100", Some(MediaType::Show)).await.unwrap();
        assert!(hit.is_none());
        db.close().await;
    }

    #[tokio::test]
    async fn test_old_expiration_is_stale() {
        let (db, cache) = cache(30).await;
        cache.upsert(&IMDB_TO_TVDB, "tt0944947", "121361", None, false).await.unwrap();
        let old = (today() - Duration::days(31)).format(DATE_FORMAT).unwrap();
        sqlx::query("UPDATE imdb_to_tvdb_map SET expiration_date = ?")
            .bind(old)
            .execute(cache.pool())
            .await
            .unwrap();
        let hit = cache.lookup(&IMDB_TO_TVDB, Direction::Forward, "tt0944947", None).await;
        assert!(hit.unwrap().unwrap().stale);
        db.close().await;
    }

    #[tokio::test]
    async fn test_malformed_expiration_is_stale_not_an_error() {
        let (db, cache) = cache(30).await;
        sqlx::query("INSERT INTO imdb_to_tvdb_map (imdb_id, tvdb_id, expiration_date) VALUES (?, ?, ?)")
            .bind("tt0944947")
            .bind("121361")
            .bind("last tuesday")
            .execute(cache.pool())
            .await
            .unwrap();
        let hit = cache.lookup(&IMDB_TO_TVDB, Direction::Forward, "tt0944947", None).await;
        let hit = hit.unwrap().unwrap();
        assert_eq!(hit.value.value, "121361");
        assert!(hit.stale);
        db.close().await;
    }
}
