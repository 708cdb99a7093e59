use serde::{Deserialize, Serialize};

/// IUCN Red List conservation status categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IucnCategory {
    /// Extinct
    EX,
    /// Extinct in the Wild
    EW,
    /// Critically Endangered
    CR,
    /// Endangered
    EN,
    /// Vulnerable
    VU,
    /// Near Threatened
    NT,
    /// Conservation Dependent
    CD,
    /// Least Concern
    LC,
    /// Data Deficient
    DD,
    /// Not Evaluated
    NE,
}

impl IucnCategory {
    /// Parse an IUCN category from a status code (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "EX" => Some(Self::EX),
            "EW" => Some(Self::EW),
            "CR" => Some(Self::CR),
            "EN" => Some(Self::EN),
            "VU" => Some(Self::VU),
            "NT" => Some(Self::NT),
            "CD" => Some(Self::CD),
            "LC" => Some(Self::LC),
            "DD" => Some(Self::DD),
            "NE" => Some(Self::NE),
            _ => None,
        }
    }
}

/// How a taxon came to be present in a place
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EstablishmentMeans {
    Native,
    Endemic,
    Introduced,
    Naturalised,
    Invasive,
    Managed,
    Uncertain,
}

impl EstablishmentMeans {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "native" => Some(Self::Native),
            "endemic" => Some(Self::Endemic),
            "introduced" => Some(Self::Introduced),
            "naturalised" => Some(Self::Naturalised),
            "invasive" => Some(Self::Invasive),
            "managed" => Some(Self::Managed),
            "uncertain" => Some(Self::Uncertain),
            _ => None,
        }
    }
}

/// Observation verification tier
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Research,
    NeedsId,
    #[default]
    Casual,
}

impl QualityGrade {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "research" => Some(Self::Research),
            "needs_id" => Some(Self::NeedsId),
            "casual" => Some(Self::Casual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::NeedsId => "needs_id",
            Self::Casual => "casual",
        }
    }
}

/// How precisely an observation's coordinates are exposed
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Geoprivacy {
    Open,
    Obscured,
    Private,
}

impl Geoprivacy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "obscured" => Some(Self::Obscured),
            "private" => Some(Self::Private),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Obscured => "obscured",
            Self::Private => "private",
        }
    }
}
