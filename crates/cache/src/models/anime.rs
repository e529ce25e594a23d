use crate::anime::AnimeIds;
use crate::error::{Error, ErrorKind, Result};
use super::parse_id;
use exn::OptionExt;

#[derive(sqlx::FromRow)]
pub(crate) struct AnimeRow {
    pub(crate) anidb: Option<String>,
    pub(crate) anilist: Option<String>,
    pub(crate) myanimelist: Option<String>,
    pub(crate) kitsu: Option<String>,
    pub(crate) expiration_date: Option<String>,
}
impl AnimeRow {
    /// AniDB is the anchor of every entry; rows without it read as a miss.
    pub(crate) fn is_resolved(&self) -> bool {
        self.anidb.as_deref().is_some_and(|id| !id.is_empty())
    }
}

fn parse_optional_id(value: Option<String>, field: &'static str) -> Result<Option<u64>> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| parse_id(&v, field))
        .transpose()
}

impl TryFrom<AnimeRow> for AnimeIds {
    type Error = Error;
    fn try_from(row: AnimeRow) -> Result<Self> {
        let anidb = row.anidb.ok_or_raise(|| ErrorKind::InvalidData("anidb id"))?;
        Ok(Self {
            anidb: parse_id(&anidb, "anidb id")?,
            anilist: parse_optional_id(row.anilist, "anilist id")?,
            myanimelist: parse_optional_id(row.myanimelist, "myanimelist id")?,
            kitsu: parse_optional_id(row.kitsu, "kitsu id")?,
        })
    }
}
