//! Taxon entity and its nested records

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::photo::{Photo, PhotoSize, RawPhoto, TaxonPhoto};
use super::rank::Rank;
use super::status::{EstablishmentMeans, IucnCategory};
use super::decode;
use crate::error::Result;

const ENGLISH_LEXICON: &str = "English";
const CHINESE_LEXICON: &str = "Chinese (Simplified)";

/// A node of the classification hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Taxon {
    pub id: u64,
    /// Scientific name
    pub name: String,
    pub rank: Rank,
    /// Matches `rank.level()` whenever the rank is known
    pub rank_level: f64,
    pub iconic_taxon_id: Option<u64>,
    pub iconic_taxon_name: Option<String>,
    pub preferred_common_name: Option<String>,
    pub english_common_name: Option<String>,
    pub chinese_common_name: Option<String>,
    pub names: Vec<TaxonName>,
    pub parent_id: Option<u64>,
    /// Root first, ending at the parent; never contains `id`
    pub ancestor_ids: Vec<u64>,
    pub observations_count: u64,
    pub default_photo: Option<TaxonPhoto>,
    pub photos: Vec<TaxonPhoto>,
    pub conservation_status: Option<ConservationStatusInfo>,
    pub conservation_status_name: Option<String>,
    pub establishment_means: Option<EstablishmentMeansInfo>,
    pub wikipedia_summary: Option<String>,
    pub wikipedia_url: Option<String>,
    pub is_active: bool,
}

/// A localized name for a taxon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonName {
    pub name: String,
    pub locale: String,
    pub lexicon: String,
    pub is_valid: bool,
}

/// Place reference embedded in status records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRef {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConservationStatusInfo {
    /// Status code as reported by the authority, e.g. `"LC"` or `"S3"`
    pub status: String,
    pub authority: Option<String>,
    pub place: Option<PlaceRef>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub geoprivacy: Option<String>,
}

impl ConservationStatusInfo {
    /// IUCN category, when the status is an IUCN code
    pub fn iucn_category(&self) -> Option<IucnCategory> {
        IucnCategory::parse(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstablishmentMeansInfo {
    pub establishment_means: String,
    pub place: Option<PlaceRef>,
}

impl EstablishmentMeansInfo {
    pub fn kind(&self) -> Option<EstablishmentMeans> {
        EstablishmentMeans::parse(&self.establishment_means)
    }
}

impl Taxon {
    /// Map one raw taxon object
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw: RawTaxon = decode(value)?;
        raw.into_taxon()
    }

    /// Preferred label: Chinese, English, then preferred common name, each
    /// rendered as `"<common> (<scientific>)"`; else the scientific name.
    /// Empty common names are passed over.
    pub fn display_name(&self) -> String {
        let common = [
            &self.chinese_common_name,
            &self.english_common_name,
            &self.preferred_common_name,
        ]
        .into_iter()
        .flatten()
        .find(|n| !n.is_empty());

        match common {
            Some(c) => format!("{} ({})", c, self.name),
            None => self.name.clone(),
        }
    }

    /// Unranked taxa (level 0) are not counted as species
    pub fn is_species_or_lower(&self) -> bool {
        self.rank_level > 0.0 && self.rank_level <= 10.0
    }

    /// Largest available URL of the default photo
    pub fn best_photo_url(&self) -> Option<&str> {
        self.default_photo
            .as_ref()
            .and_then(|p| p.best_url(PhotoSize::Large))
    }

    /// One URL per taxon photo, at `size` or the best fallback
    pub fn photos_by_size(&self, size: PhotoSize) -> Vec<&str> {
        self.photos.iter().filter_map(|p| p.best_url(size)).collect()
    }
}

impl TryFrom<&Value> for Taxon {
    type Error = crate::error::ApiError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_value(value)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawTaxon {
    id: Option<u64>,
    name: Option<String>,
    rank: Option<String>,
    rank_level: Option<f64>,
    iconic_taxon_id: Option<u64>,
    iconic_taxon_name: Option<String>,
    preferred_common_name: Option<String>,
    taxon_names: Option<Vec<RawTaxonName>>,
    parent_id: Option<u64>,
    ancestor_ids: Option<Vec<u64>>,
    /// Slash-separated ancestor chain, sent by some endpoints instead of `ancestor_ids`
    ancestry: Option<String>,
    observations_count: Option<u64>,
    default_photo: Option<RawPhoto>,
    taxon_photos: Option<Vec<Value>>,
    conservation_status: Option<RawConservationStatus>,
    conservation_status_name: Option<String>,
    establishment_means: Option<RawEstablishmentMeans>,
    wikipedia_summary: Option<String>,
    wikipedia_url: Option<String>,
    is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawTaxonName {
    name: Option<String>,
    locale: Option<String>,
    lexicon: Option<String>,
    is_valid: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawConservationStatus {
    status: Option<String>,
    authority: Option<String>,
    place: Option<PlaceRef>,
    description: Option<String>,
    url: Option<String>,
    geoprivacy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEstablishmentMeans {
    establishment_means: Option<String>,
    place: Option<PlaceRef>,
}

impl RawTaxon {
    fn into_taxon(self) -> Result<Taxon> {
        let id = self.id.unwrap_or_default();
        let rank = Rank::parse(self.rank.as_deref().unwrap_or_default());
        let rank_level = rank
            .level()
            .map(f64::from)
            .or(self.rank_level)
            .unwrap_or_default();

        let names: Vec<TaxonName> = self
            .taxon_names
            .unwrap_or_default()
            .into_iter()
            .map(|n| TaxonName {
                name: n.name.unwrap_or_default(),
                locale: n.locale.unwrap_or_default(),
                lexicon: n.lexicon.unwrap_or_default(),
                is_valid: n.is_valid.unwrap_or(true),
            })
            .collect();
        let english_common_name = first_name_in(&names, ENGLISH_LEXICON);
        let chinese_common_name = first_name_in(&names, CHINESE_LEXICON);

        let ancestor_ids = match (self.ancestor_ids, self.ancestry) {
            (Some(ids), _) => ids,
            (None, Some(ancestry)) => ancestry
                .split('/')
                .filter_map(|part| part.trim().parse().ok())
                .collect(),
            (None, None) => Vec::new(),
        }
        .into_iter()
        .filter(|ancestor| *ancestor != id)
        .collect();

        let photos = self
            .taxon_photos
            .unwrap_or_default()
            .iter()
            .map(TaxonPhoto::from_value)
            .collect::<Result<Vec<_>>>()?;

        Ok(Taxon {
            id,
            name: self.name.unwrap_or_default(),
            rank,
            rank_level,
            iconic_taxon_id: self.iconic_taxon_id,
            iconic_taxon_name: self.iconic_taxon_name,
            preferred_common_name: self.preferred_common_name,
            english_common_name,
            chinese_common_name,
            names,
            parent_id: self.parent_id,
            ancestor_ids,
            observations_count: self.observations_count.unwrap_or_default(),
            default_photo: self.default_photo.map(TaxonPhoto::from_raw),
            photos,
            conservation_status: self.conservation_status.map(|s| ConservationStatusInfo {
                status: s.status.unwrap_or_default(),
                authority: s.authority,
                place: s.place,
                description: s.description,
                url: s.url,
                geoprivacy: s.geoprivacy,
            }),
            conservation_status_name: self.conservation_status_name,
            establishment_means: self.establishment_means.map(|e| EstablishmentMeansInfo {
                establishment_means: e.establishment_means.unwrap_or_default(),
                place: e.place,
            }),
            wikipedia_summary: self.wikipedia_summary,
            wikipedia_url: self.wikipedia_url,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// First name in `lexicon`; later duplicates are ignored
fn first_name_in(names: &[TaxonName], lexicon: &str) -> Option<String> {
    names
        .iter()
        .find(|n| n.lexicon == lexicon)
        .map(|n| n.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn magpie(names: Value) -> Taxon {
        Taxon::from_value(&json!({
            "id": 13823,
            "name": "Pica pica",
            "rank": "species",
            "rank_level": 10,
            "taxon_names": names
        }))
        .unwrap()
    }

    #[test]
    fn test_display_name_prefers_chinese() {
        let taxon = magpie(json!([
            {"name": "Magpie", "lexicon": "English", "locale": "en"},
            {"name": "喜鹊", "lexicon": "Chinese (Simplified)", "locale": "zh-CN"}
        ]));
        assert_eq!(taxon.display_name(), "喜鹊 (Pica pica)");
    }

    #[test]
    fn test_display_name_falls_back_to_english() {
        let taxon = magpie(json!([{"name": "Magpie", "lexicon": "English"}]));
        assert_eq!(taxon.display_name(), "Magpie (Pica pica)");
    }

    #[test]
    fn test_display_name_scientific_only() {
        let taxon = magpie(json!([]));
        assert_eq!(taxon.display_name(), "Pica pica");
    }

    #[test]
    fn test_display_name_preferred_common_name() {
        let taxon = Taxon::from_value(&json!({
            "id": 1,
            "name": "Pica pica",
            "preferred_common_name": "Eurasian Magpie"
        }))
        .unwrap();
        assert_eq!(taxon.display_name(), "Eurasian Magpie (Pica pica)");
    }

    #[test]
    fn test_first_lexicon_match_wins() {
        let taxon = magpie(json!([
            {"name": "Magpie", "lexicon": "English"},
            {"name": "Common Magpie", "lexicon": "English"}
        ]));
        assert_eq!(taxon.english_common_name.as_deref(), Some("Magpie"));
        assert_eq!(taxon.names.len(), 2);
    }

    #[test]
    fn test_first_lexicon_match_is_kept_even_if_empty() {
        let taxon = magpie(json!([
            {"name": "", "lexicon": "Chinese (Simplified)"},
            {"name": "喜鹊", "lexicon": "Chinese (Simplified)"},
            {"name": "Magpie", "lexicon": "English"}
        ]));
        assert_eq!(taxon.chinese_common_name.as_deref(), Some(""));
        assert_eq!(taxon.display_name(), "Magpie (Pica pica)");
    }

    #[test]
    fn test_missing_fields_default() {
        let taxon = Taxon::from_value(&json!({})).unwrap();
        assert_eq!(taxon.id, 0);
        assert_eq!(taxon.name, "");
        assert_eq!(taxon.rank_level, 0.0);
        assert_eq!(taxon.observations_count, 0);
        assert!(taxon.ancestor_ids.is_empty());
        assert!(taxon.photos.is_empty());
        assert!(taxon.default_photo.is_none());
        assert!(taxon.conservation_status.is_none());
    }

    #[test]
    fn test_null_fields_default() {
        let taxon = Taxon::from_value(&json!({
            "id": 3,
            "name": null,
            "observations_count": null,
            "taxon_photos": null,
            "default_photo": null,
            "ancestor_ids": null
        }))
        .unwrap();
        assert_eq!(taxon.id, 3);
        assert_eq!(taxon.name, "");
        assert!(taxon.photos.is_empty());
    }

    #[test]
    fn test_rank_level_follows_rank() {
        let taxon = Taxon::from_value(&json!({"id": 1, "rank": "genus", "rank_level": 99})).unwrap();
        assert_eq!(taxon.rank, Rank::Genus);
        assert_eq!(taxon.rank_level, 20.0);
        assert!(!taxon.is_species_or_lower());
    }

    #[test]
    fn test_unknown_rank_keeps_api_level() {
        let taxon =
            Taxon::from_value(&json!({"id": 1, "rank": "parvorder", "rank_level": 34.5})).unwrap();
        assert_eq!(taxon.rank, Rank::Other("parvorder".to_string()));
        assert_eq!(taxon.rank_level, 34.5);
    }

    #[test]
    fn test_ancestor_ids_exclude_self() {
        let taxon = Taxon::from_value(&json!({
            "id": 13823,
            "ancestor_ids": [48460, 1, 2, 355675, 3, 7251, 8318, 13823]
        }))
        .unwrap();
        assert_eq!(taxon.ancestor_ids, vec![48460, 1, 2, 355675, 3, 7251, 8318]);
    }

    #[test]
    fn test_ancestry_string_fallback() {
        let taxon = Taxon::from_value(&json!({"id": 8318, "ancestry": "48460/1/2/3/7251"})).unwrap();
        assert_eq!(taxon.ancestor_ids, vec![48460, 1, 2, 3, 7251]);
    }

    #[test]
    fn test_photos_and_statuses() {
        let taxon = Taxon::from_value(&json!({
            "id": 13823,
            "name": "Pica pica",
            "rank": "species",
            "default_photo": {
                "id": 1,
                "url": "https://example.org/1/square.jpg",
                "medium_url": "https://example.org/1/medium.jpg"
            },
            "taxon_photos": [
                {"taxon_id": 13823, "photo": {"id": 2, "url": "https://example.org/2.jpg", "large_url": "https://example.org/2/large.jpg"}},
                {"taxon_id": 13823, "photo": {"id": 3, "url": "https://example.org/3.jpg"}}
            ],
            "conservation_status": {"status": "LC", "authority": "IUCN Red List", "place": null},
            "establishment_means": {"establishment_means": "native", "place": {"id": 6903, "name": "China"}}
        }))
        .unwrap();

        assert_eq!(taxon.best_photo_url(), Some("https://example.org/1/medium.jpg"));
        assert_eq!(
            taxon.photos_by_size(PhotoSize::Large),
            vec!["https://example.org/2/large.jpg", "https://example.org/3.jpg"]
        );
        let status = taxon.conservation_status.as_ref().unwrap();
        assert_eq!(status.iucn_category(), Some(IucnCategory::LC));
        let means = taxon.establishment_means.as_ref().unwrap();
        assert_eq!(means.kind(), Some(EstablishmentMeans::Native));
        assert_eq!(means.place.as_ref().map(|p| p.id), Some(6903));
    }
}
