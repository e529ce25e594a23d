use crate::error::{Error, ErrorKind};
use crate::ratings::RatingRecord;
use exn::ResultExt;

#[derive(sqlx::FromRow)]
pub(crate) struct RatingRow {
    pub(crate) imdb_id: String,
    pub(crate) title: Option<String>,
    pub(crate) year: Option<i64>,
    pub(crate) content_rating: Option<String>,
    pub(crate) genres: Option<String>,
    pub(crate) imdb_rating: Option<f64>,
    pub(crate) imdb_votes: Option<i64>,
    pub(crate) metacritic_rating: Option<i64>,
    pub(crate) kind: Option<String>,
    #[sqlx(default)]
    pub(crate) expiration_date: Option<String>,
}
impl RatingRow {
    /// Rows are only usable once a title has been written.
    pub(crate) fn is_resolved(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
    }
}
/// Genres are written as a JSON array. Older cache files hold a plain
/// comma-separated list instead.
fn parse_genres(raw: &str) -> Result<Vec<String>, Error> {
    if raw.trim_start().starts_with('[') {
        return serde_json::from_str(raw).or_raise(|| ErrorKind::InvalidData("genres"));
    }
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(String::from)
        .collect())
}

impl TryFrom<&RatingRecord> for RatingRow {
    type Error = Error;
    fn try_from(record: &RatingRecord) -> Result<Self, Self::Error> {
        let genres = match record.genres.is_empty() {
            true => None,
            false => Some(serde_json::to_string(&record.genres).or_raise(|| ErrorKind::InvalidData("genres"))?),
        };
        Ok(Self {
            imdb_id: record.imdb_id.clone(),
            title: record.title.clone(),
            year: record.year.map(i64::from),
            content_rating: record.content_rating.clone(),
            genres,
            imdb_rating: record.imdb_rating,
            imdb_votes: record
                .imdb_votes
                .map(|v| i64::try_from(v).or_raise(|| ErrorKind::InvalidData("imdb votes")))
                .transpose()?,
            metacritic_rating: record.metacritic_rating.map(i64::from),
            kind: record.kind.clone(),
            expiration_date: None,
        })
    }
}
impl TryFrom<RatingRow> for RatingRecord {
    type Error = Error;
    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            imdb_id: row.imdb_id,
            title: row.title,
            year: row
                .year
                .map(|y| u16::try_from(y).or_raise(|| ErrorKind::InvalidData("year")))
                .transpose()?,
            content_rating: row.content_rating,
            genres: row.genres.as_deref().map(parse_genres).transpose()?.unwrap_or_default(),
            imdb_rating: row.imdb_rating,
            imdb_votes: row
                .imdb_votes
                .map(|v| u64::try_from(v).or_raise(|| ErrorKind::InvalidData("imdb votes")))
                .transpose()?,
            metacritic_rating: row
                .metacritic_rating
                .map(|m| u8::try_from(m).or_raise(|| ErrorKind::InvalidData("metacritic rating")))
                .transpose()?,
            kind: row.kind,
        })
    }
}
