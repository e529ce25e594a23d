//! Typed lookups and writes for each identifier relationship.
//!
//! These bind the generic mapping store to one table each. The two-way
//! relationships are stored once and can be queried from either side.

use crate::cache::{Cache, Cached};
use crate::error::{ErrorKind, Result};
use crate::map::{Direction, GUID_MAP, IMDB_TO_TMDB, IMDB_TO_TVDB, LETTERBOXD_TO_TMDB, MapEntry, TMDB_TO_TVDB};
use crate::media::MediaType;
use crate::models::parse_id;
use exn::OptionExt;

/// External ID resolved for a media library GUID.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GuidTarget {
    pub id: String,
    pub media_type: MediaType,
}
impl TryFrom<MapEntry> for GuidTarget {
    type Error = crate::error::Error;
    fn try_from(entry: MapEntry) -> Result<Self> {
        Ok(Self {
            media_type: entry.media_type.ok_or_raise(|| ErrorKind::InvalidData("media type"))?,
            id: entry.value,
        })
    }
}

fn numeric(hit: Option<Cached<MapEntry>>, field: &'static str) -> Result<Option<Cached<u64>>> {
    hit.map(|hit| hit.try_map(|entry| parse_id(&entry.value, field))).transpose()
}

fn text(hit: Option<Cached<MapEntry>>) -> Option<Cached<String>> {
    hit.map(|hit| hit.map(|entry| entry.value))
}

impl Cache {
    // =========================================================================
    // Library GUID
    // =========================================================================

    /// External ID for a media library GUID.
    ///
    /// With a media type only an entry for that type matches; without one the
    /// stored media type is reported alongside the ID.
    pub async fn lookup_guid(&self, guid: &str, media_type: Option<MediaType>) -> Result<Option<Cached<GuidTarget>>> {
        let hit = self.lookup(&GUID_MAP, Direction::Forward, guid, media_type).await?;
        hit.map(|hit| hit.try_map(GuidTarget::try_from)).transpose()
    }

    pub async fn upsert_guid(&self, guid: &str, id: &str, media_type: MediaType, force_expired: bool) -> Result<()> {
        self.upsert(&GUID_MAP, guid, id, Some(media_type), force_expired).await
    }

    // =========================================================================
    // IMDb ↔ TMDb
    // =========================================================================

    pub async fn lookup_imdb_to_tmdb(&self, media_type: MediaType, imdb_id: &str) -> Result<Option<Cached<u64>>> {
        let hit = self.lookup(&IMDB_TO_TMDB, Direction::Forward, imdb_id, Some(media_type)).await?;
        numeric(hit, "tmdb id")
    }

    pub async fn lookup_tmdb_to_imdb(&self, media_type: MediaType, tmdb_id: u64) -> Result<Option<Cached<String>>> {
        let hit = self
            .lookup(&IMDB_TO_TMDB, Direction::Reverse, &tmdb_id.to_string(), Some(media_type))
            .await?;
        Ok(text(hit))
    }

    pub async fn upsert_imdb_tmdb(
        &self,
        media_type: MediaType,
        imdb_id: &str,
        tmdb_id: u64,
        force_expired: bool,
    ) -> Result<()> {
        self.upsert(&IMDB_TO_TMDB, imdb_id, &tmdb_id.to_string(), Some(media_type), force_expired)
            .await
    }

    // =========================================================================
    // IMDb ↔ TVDb
    // =========================================================================

    pub async fn lookup_imdb_to_tvdb(&self, imdb_id: &str) -> Result<Option<Cached<u64>>> {
        let hit = self.lookup(&IMDB_TO_TVDB, Direction::Forward, imdb_id, None).await?;
        numeric(hit, "tvdb id")
    }

    pub async fn lookup_tvdb_to_imdb(&self, tvdb_id: u64) -> Result<Option<Cached<String>>> {
        let hit = self.lookup(&IMDB_TO_TVDB, Direction::Reverse, &tvdb_id.to_string(), None).await?;
        Ok(text(hit))
    }

    pub async fn upsert_imdb_tvdb(&self, imdb_id: &str, tvdb_id: u64, force_expired: bool) -> Result<()> {
        self.upsert(&IMDB_TO_TVDB, imdb_id, &tvdb_id.to_string(), None, force_expired).await
    }

    // =========================================================================
    // TMDb ↔ TVDb
    // =========================================================================

    pub async fn lookup_tmdb_to_tvdb(&self, tmdb_id: u64) -> Result<Option<Cached<u64>>> {
        let hit = self.lookup(&TMDB_TO_TVDB, Direction::Forward, &tmdb_id.to_string(), None).await?;
        numeric(hit, "tvdb id")
    }

    pub async fn lookup_tvdb_to_tmdb(&self, tvdb_id: u64) -> Result<Option<Cached<u64>>> {
        let hit = self.lookup(&TMDB_TO_TVDB, Direction::Reverse, &tvdb_id.to_string(), None).await?;
        numeric(hit, "tmdb id")
    }

    pub async fn upsert_tmdb_tvdb(&self, tmdb_id: u64, tvdb_id: u64, force_expired: bool) -> Result<()> {
        self.upsert(&TMDB_TO_TVDB, &tmdb_id.to_string(), &tvdb_id.to_string(), None, force_expired)
            .await
    }

    // =========================================================================
    // Letterboxd → TMDb
    // =========================================================================

    pub async fn lookup_letterboxd(&self, letterboxd_id: &str) -> Result<Option<Cached<u64>>> {
        let hit = self.lookup(&LETTERBOXD_TO_TMDB, Direction::Forward, letterboxd_id, None).await?;
        numeric(hit, "tmdb id")
    }

    pub async fn upsert_letterboxd(&self, letterboxd_id: &str, tmdb_id: u64, force_expired: bool) -> Result<()> {
        self.upsert(&LETTERBOXD_TO_TMDB, letterboxd_id, &tmdb_id.to_string(), None, force_expired)
            .await
    }
}
