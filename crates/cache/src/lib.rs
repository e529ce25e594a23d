//! SQLite cross-reference cache for media provider identifiers.
//!
//! Resolving an identifier from one metadata provider into another (library
//! GUID → TMDb ID, IMDb ID → TVDb ID, ...) means an external request. This
//! crate remembers those translations, plus fetched rating metadata, for a
//! configurable number of days so that callers only go back to the provider
//! once an entry is stale. The database is disposable: deleting it only costs
//! the lookups needed to rebuild it.
//!
//! # Architecture
//! - **[`Expiration`]**: the TTL window and the jittered expiration dates
//!   written with every entry.
//! - **[`Database`]**: opens the cache file and creates the tables.
//! - **[`Cache`]**: the lookup/upsert surface. One generic protocol
//!   ([`Cache::lookup`], [`Cache::upsert`]) serves every table described by a
//!   [`MapTable`]; typed methods per relationship sit on top of it, alongside
//!   the [`RatingRecord`] and [`AnimeIds`] stores.
//!
//! A lookup returns `Ok(None)` on a miss, including for rows that exist but
//! have not been resolved yet. Stale hits are still returned, flagged as
//! [`Cached::stale`].

mod anime;
mod cache;
mod db;
pub mod error;
mod expiration;
pub mod map;
mod mappings;
mod media;
mod models;
mod ratings;

pub use crate::anime::{AnimeId, AnimeIds};
pub use crate::cache::{Cache, Cached};
pub use crate::db::Database;
pub use crate::expiration::{Expiration, today};
pub use crate::map::{Direction, MapEntry, MapTable};
pub use crate::mappings::GuidTarget;
pub use crate::media::MediaType;
pub use crate::ratings::RatingRecord;
