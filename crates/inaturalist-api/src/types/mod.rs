//! Domain entities mapped from iNaturalist API responses
//!
//! Mapping is lenient: a missing key and an explicit `null` both fall back to
//! the field's default (0, empty string, empty list or `None`). Each entity
//! is built once from its raw JSON object.

mod aggregate;
mod observation;
mod photo;
mod rank;
mod status;
mod taxon;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

pub use aggregate::{Histogram, IdentifierCount, ObserverCount, SpeciesCount};
pub use observation::{
    GeoJson, Identification, Location, Observation, ProjectObservation, Sound, TaxonRef, User,
};
pub use photo::{ObservationPhoto, Photo, PhotoDimensions, PhotoSize, PhotoSizes, TaxonPhoto};
pub use rank::Rank;
pub use status::{EstablishmentMeans, Geoprivacy, IucnCategory, QualityGrade};
pub use taxon::{ConservationStatusInfo, EstablishmentMeansInfo, PlaceRef, Taxon, TaxonName};

/// Collection envelope shared by every list endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResponse {
    pub total_results: Option<u64>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub results: Vec<Value>,
}

impl ListResponse {
    /// Split an envelope into its parts; anything that is not an object is empty
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };

        let results = match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        Self {
            total_results: map.get("total_results").and_then(Value::as_u64),
            page: map.get("page").and_then(Value::as_u64),
            per_page: map.get("per_page").and_then(Value::as_u64),
            results,
        }
    }

    /// First result of a detail response, `None` when the list is empty
    pub fn into_first(self) -> Option<Value> {
        self.results.into_iter().next()
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: &Value) -> Result<T> {
    Ok(T::deserialize(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_from_value() {
        let response = ListResponse::from_value(json!({
            "total_results": 55,
            "page": 2,
            "per_page": 20,
            "results": [{"id": 1}, {"id": 2}]
        }));
        assert_eq!(response.total_results, Some(55));
        assert_eq!(response.page, Some(2));
        assert_eq!(response.results.len(), 2);
    }

    #[test]
    fn test_list_response_missing_results() {
        let response = ListResponse::from_value(json!({"total_results": 7}));
        assert_eq!(response.total_results, Some(7));
        assert!(response.results.is_empty());
        assert!(response.into_first().is_none());
    }

    #[test]
    fn test_list_response_not_an_object() {
        let response = ListResponse::from_value(json!([1, 2, 3]));
        assert_eq!(response, ListResponse::default());
    }
}
