use crate::error::{Error, ErrorKind};
use derive_more::Display;
use std::str::FromStr;

/// Kind of media an identifier refers to.
///
/// Used as the discriminator column on tables where the same key can resolve
/// to different entries for a movie and a show.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[display("movie")]
    Movie,
    #[display("show")]
    Show,
}
impl MediaType {
    /// Value persisted in the `media_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Show => "show",
        }
    }
}
impl FromStr for MediaType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Self::Movie,
            "show" => Self::Show,
            _ => exn::bail!(ErrorKind::InvalidData("media type")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("movie", MediaType::Movie)]
    #[case("show", MediaType::Show)]
    #[case(" Movie ", MediaType::Movie)]
    #[case("SHOW", MediaType::Show)]
    fn test_parse(#[case] input: &str, #[case] expected: MediaType) {
        assert_eq!(input.parse::<MediaType>().unwrap(), expected);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("episode".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_display_matches_column_value() {
        assert_eq!(MediaType::Movie.to_string(), MediaType::Movie.as_str());
        assert_eq!(MediaType::Show.to_string(), MediaType::Show.as_str());
    }
}
