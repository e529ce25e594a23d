mod anime;
mod map;
mod rating;

pub(crate) use self::anime::AnimeRow;
pub(crate) use self::map::MapRow;
pub(crate) use self::rating::RatingRow;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;

/// Numeric provider IDs are stored as text.
pub(crate) fn parse_id(value: &str, field: &'static str) -> Result<u64> {
    value.trim().parse::<u64>().or_raise(|| ErrorKind::InvalidData(field))
}
