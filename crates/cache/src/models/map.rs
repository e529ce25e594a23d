use crate::error::Result;
use crate::map::MapEntry;
use crate::media::MediaType;

#[derive(sqlx::FromRow)]
pub(crate) struct MapRow {
    pub(crate) value: Option<String>,
    pub(crate) media_type: Option<String>,
    pub(crate) expiration_date: Option<String>,
}
impl MapRow {
    /// A row without a value is a reserved slot and reads as a miss.
    pub(crate) fn into_entry(self) -> Result<Option<MapEntry>> {
        let Some(value) = self.value.filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        let media_type = self.media_type.map(|m| m.parse::<MediaType>()).transpose()?;
        Ok(Some(MapEntry { value, media_type }))
    }
}
