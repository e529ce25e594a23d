use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::expiration::{DATE_FORMAT, Expiration, today};
use exn::ResultExt;
use sqlx::SqlitePool;

/// A cached value together with its staleness at the time it was read.
///
/// Stale values are still handed back so the caller can fall back on them if
/// refreshing from the provider fails.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Cached<T> {
    pub value: T,
    pub stale: bool,
}
impl<T> Cached<T> {
    pub fn new(value: T, stale: bool) -> Self {
        Self { value, stale }
    }

    /// The value, but only while it is still within its TTL window.
    pub fn fresh(self) -> Option<T> {
        (!self.stale).then_some(self.value)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Cached<U> {
        Cached { value: f(self.value), stale: self.stale }
    }

    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<Cached<U>> {
        Ok(Cached { value: f(self.value)?, stale: self.stale })
    }
}

/// Cross-reference cache for provider identifiers and rating metadata.
///
/// All mapping tables share one lookup/upsert protocol (see
/// [`lookup`](Self::lookup) and [`upsert`](Self::upsert)); the typed methods
/// for each relationship, the rating records and the anime cross-reference
/// are layered on top of it.
///
/// Every operation acquires its own connection from the pool and releases it
/// before returning. Upserts run inside a single transaction.
#[derive(Debug, Clone)]
pub struct Cache {
    pool: SqlitePool,
    expiration: Expiration,
}
impl Cache {
    pub fn new(pool: SqlitePool, expiration: Expiration) -> Self {
        Self { pool, expiration }
    }

    pub fn from_database(db: &Database, expiration: Expiration) -> Self {
        Self::new(db.pool().clone(), expiration)
    }

    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Expiration column value for a row written now.
    pub(crate) fn stamp(&self, force_expired: bool) -> Result<String> {
        self.expiration
            .expiration_date(force_expired, today(), &mut rand::rng())
            .format(DATE_FORMAT)
            .or_raise(|| ErrorKind::InvalidData("expiration date"))
    }

    pub(crate) fn is_stale(&self, expiration: Option<&str>) -> bool {
        self.expiration.is_stale_column(expiration, today())
    }
}
