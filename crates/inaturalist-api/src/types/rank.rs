use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Taxonomic rank
///
/// Known ranks carry a fixed `level`; anything else the API sends is kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rank {
    Kingdom,
    Phylum,
    Subphylum,
    Superclass,
    Class,
    Subclass,
    Superorder,
    Order,
    Suborder,
    Infraorder,
    Superfamily,
    Family,
    Subfamily,
    Tribe,
    Subtribe,
    Genus,
    Subgenus,
    Section,
    Subsection,
    Complex,
    Species,
    Subspecies,
    Variety,
    Form,
    Hybrid,
    Other(String),
}

impl Rank {
    /// Parse a wire rank name (case-insensitive)
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "kingdom" => Self::Kingdom,
            "phylum" => Self::Phylum,
            "subphylum" => Self::Subphylum,
            "superclass" => Self::Superclass,
            "class" => Self::Class,
            "subclass" => Self::Subclass,
            "superorder" => Self::Superorder,
            "order" => Self::Order,
            "suborder" => Self::Suborder,
            "infraorder" => Self::Infraorder,
            "superfamily" => Self::Superfamily,
            "family" => Self::Family,
            "subfamily" => Self::Subfamily,
            "tribe" => Self::Tribe,
            "subtribe" => Self::Subtribe,
            "genus" => Self::Genus,
            "subgenus" => Self::Subgenus,
            "section" => Self::Section,
            "subsection" => Self::Subsection,
            "complex" => Self::Complex,
            "species" => Self::Species,
            "subspecies" => Self::Subspecies,
            "variety" => Self::Variety,
            "form" => Self::Form,
            "hybrid" => Self::Hybrid,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Kingdom => "kingdom",
            Self::Phylum => "phylum",
            Self::Subphylum => "subphylum",
            Self::Superclass => "superclass",
            Self::Class => "class",
            Self::Subclass => "subclass",
            Self::Superorder => "superorder",
            Self::Order => "order",
            Self::Suborder => "suborder",
            Self::Infraorder => "infraorder",
            Self::Superfamily => "superfamily",
            Self::Family => "family",
            Self::Subfamily => "subfamily",
            Self::Tribe => "tribe",
            Self::Subtribe => "subtribe",
            Self::Genus => "genus",
            Self::Subgenus => "subgenus",
            Self::Section => "section",
            Self::Subsection => "subsection",
            Self::Complex => "complex",
            Self::Species => "species",
            Self::Subspecies => "subspecies",
            Self::Variety => "variety",
            Self::Form => "form",
            Self::Hybrid => "hybrid",
            Self::Other(s) => s,
        }
    }

    /// Numeric position in the hierarchy; higher is broader
    pub fn level(&self) -> Option<u8> {
        let level = match self {
            Self::Kingdom => 70,
            Self::Phylum => 60,
            Self::Subphylum => 57,
            Self::Superclass => 53,
            Self::Class => 50,
            Self::Subclass => 47,
            Self::Superorder => 43,
            Self::Order => 40,
            Self::Suborder => 37,
            Self::Infraorder => 35,
            Self::Superfamily => 33,
            Self::Family => 30,
            Self::Subfamily => 27,
            Self::Tribe => 25,
            Self::Subtribe => 24,
            Self::Genus => 20,
            Self::Subgenus => 17,
            Self::Section => 15,
            Self::Subsection => 14,
            Self::Complex => 13,
            Self::Species => 10,
            Self::Subspecies | Self::Variety | Self::Form | Self::Hybrid => 5,
            Self::Other(_) => return None,
        };
        Some(level)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Rank {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Rank {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_ranks() {
        assert_eq!(Rank::parse("species"), Rank::Species);
        assert_eq!(Rank::parse("Genus"), Rank::Genus);
        assert_eq!(Rank::parse(" kingdom "), Rank::Kingdom);
    }

    #[test]
    fn test_unknown_rank_is_kept() {
        let rank = Rank::parse("zoosection");
        assert_eq!(rank, Rank::Other("zoosection".to_string()));
        assert_eq!(rank.as_str(), "zoosection");
        assert_eq!(rank.level(), None);
    }

    #[test]
    fn test_levels_decrease_down_the_hierarchy() {
        let ordered = [
            Rank::Kingdom,
            Rank::Phylum,
            Rank::Class,
            Rank::Order,
            Rank::Family,
            Rank::Genus,
            Rank::Species,
            Rank::Form,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].level() > pair[1].level(), "{} vs {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_serializes_as_wire_name() {
        let json = serde_json::to_string(&Rank::Superfamily).unwrap();
        assert_eq!(json, "\"superfamily\"");
    }
}
