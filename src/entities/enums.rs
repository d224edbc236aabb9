//! Closed value sets for client segments, localities and product
//! categories. Stored as plain strings in the database; parsed at the
//! import boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Consumer,
    Corporate,
    HomeOffice,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Consumer, Segment::Corporate, Segment::HomeOffice];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Consumer => "Consumer",
            Segment::Corporate => "Corporate",
            Segment::HomeOffice => "Home Office",
        }
    }
}

impl FromStr for Segment {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Consumer" => Ok(Segment::Consumer),
            "Corporate" => Ok(Segment::Corporate),
            "Home Office" => Ok(Segment::HomeOffice),
            other => Err(ParseEnumError::new("segment", other)),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sales region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Central,
    West,
    East,
    South,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Central => "Central",
            Region::West => "West",
            Region::East => "East",
            Region::South => "South",
        }
    }
}

impl FromStr for Region {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Central" => Ok(Region::Central),
            "West" => Ok(Region::West),
            "East" => Ok(Region::East),
            "South" => Ok(Region::South),
            other => Err(ParseEnumError::new("region", other)),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Furniture,
    OfficeSupplies,
    Technology,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Furniture => "Furniture",
            Category::OfficeSupplies => "Office Supplies",
            Category::Technology => "Technology",
        }
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Furniture" => Ok(Category::Furniture),
            "Office Supplies" => Ok(Category::OfficeSupplies),
            "Technology" => Ok(Category::Technology),
            other => Err(ParseEnumError::new("category", other)),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a value falls outside one of the closed sets
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid {field} value: {value:?}")]
pub struct ParseEnumError {
    pub field: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_round_trip() {
        for seg in Segment::ALL {
            assert_eq!(seg.as_str().parse::<Segment>().unwrap(), seg);
        }
    }

    #[test]
    fn unknown_region_is_rejected() {
        let err = "North".parse::<Region>().unwrap_err();
        assert_eq!(err.field, "region");
    }

    #[test]
    fn two_word_values_parse() {
        assert_eq!(
            "Home Office".parse::<Segment>().unwrap(),
            Segment::HomeOffice
        );
        assert_eq!(
            "Office Supplies".parse::<Category>().unwrap(),
            Category::OfficeSupplies
        );
    }
}
