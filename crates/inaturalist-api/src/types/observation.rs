//! Observation entity and the records nested in it

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decode;
use super::photo::{ObservationPhoto, Photo, PhotoSize};
use super::rank::Rank;
use super::status::{Geoprivacy, QualityGrade};
use crate::error::Result;

/// Minimal taxon summary embedded in observations and identifications
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonRef {
    pub id: u64,
    pub name: Option<String>,
    pub rank: Option<Rank>,
    pub preferred_common_name: Option<String>,
    pub iconic_taxon_name: Option<String>,
}

impl TaxonRef {
    /// Built only when an id is known, from `fallback_id` or the nested object
    fn build(fallback_id: Option<u64>, raw: Option<RawTaxonRef>) -> Option<Self> {
        let raw = raw.unwrap_or_default();
        let id = fallback_id.or(raw.id)?;
        Some(Self {
            id,
            name: raw.name.filter(|n| !n.is_empty()),
            rank: raw.rank.as_deref().map(Rank::parse),
            preferred_common_name: raw.preferred_common_name,
            iconic_taxon_name: raw.iconic_taxon_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

impl User {
    pub fn from_value(value: &Value) -> Result<Self> {
        decode(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJson {
    #[serde(rename = "type", default = "point", deserialize_with = "point_or_default")]
    pub kind: String,
    /// `[longitude, latitude]`
    #[serde(default, deserialize_with = "null_as_default")]
    pub coordinates: Vec<f64>,
}

impl GeoJson {
    /// `(latitude, longitude)` of a point geometry
    pub fn lat_lng(&self) -> Option<(f64, f64)> {
        match self.coordinates.as_slice() {
            [lng, lat, ..] => Some((*lat, *lng)),
            _ => None,
        }
    }
}

/// Resolved position of an observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub geoprivacy: Option<Geoprivacy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sound {
    pub id: u64,
    pub file_url: Option<String>,
    pub file_content_type: Option<String>,
    pub attribution: Option<String>,
    pub license_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectObservation {
    pub id: u64,
    pub project_id: u64,
    pub project_title: Option<String>,
}

/// A community opinion about what an observation shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    pub id: u64,
    pub observation_id: u64,
    pub taxon_id: u64,
    pub user_id: u64,
    pub body: Option<String>,
    pub current: bool,
    /// `improving`, `supporting`, `leading` or `maverick`
    pub category: Option<String>,
    pub created_at: Option<String>,
    pub taxon: Option<TaxonRef>,
    pub user: Option<User>,
}

impl Identification {
    /// `observation_id` fills in the owning observation when the entry omits it
    pub fn from_value(value: &Value, observation_id: u64) -> Result<Self> {
        let raw: RawIdentification = decode(value)?;
        let user = raw.user.as_ref().map(User::from_value).transpose()?;
        let taxon = TaxonRef::build(raw.taxon_id, raw.taxon);

        Ok(Self {
            id: raw.id.unwrap_or_default(),
            observation_id: raw.observation_id.unwrap_or(observation_id),
            taxon_id: taxon.as_ref().map(|t| t.id).unwrap_or_default(),
            user_id: raw
                .user_id
                .or(user.as_ref().map(|u| u.id))
                .unwrap_or_default(),
            body: raw.body,
            current: raw.current.unwrap_or(true),
            category: raw.category,
            created_at: raw.created_at,
            taxon,
            user,
        })
    }
}

/// A single recorded sighting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub id: u64,
    pub uuid: String,
    pub quality_grade: QualityGrade,
    pub species_guess: Option<String>,
    pub description: Option<String>,
    pub taxon: Option<TaxonRef>,
    pub iconic_taxon_name: Option<String>,

    pub observed_on: Option<String>,
    pub observed_on_string: Option<String>,
    pub time_observed_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub positional_accuracy: Option<f64>,
    pub place_guess: Option<String>,
    pub geoprivacy: Option<Geoprivacy>,
    pub coordinates_obscured: bool,
    pub geojson: Option<GeoJson>,

    /// API order; the first is the representative photo
    pub photos: Vec<ObservationPhoto>,
    pub photo_urls: Vec<String>,
    pub sounds: Vec<Sound>,

    pub identifications: Vec<Identification>,
    pub identifications_count: u64,
    pub num_identification_agreements: u64,
    pub num_identification_disagreements: u64,
    pub comments_count: u64,
    pub faves_count: u64,
    pub identifications_most_agree: bool,
    pub identifications_some_agree: bool,
    pub identifications_most_disagree: bool,

    pub user: Option<User>,
    pub user_id: Option<u64>,
    pub user_login: Option<String>,

    pub project_ids: Vec<u64>,
    pub project_observations: Vec<ProjectObservation>,

    pub license_code: Option<String>,
    pub url: Option<String>,
    pub uri: Option<String>,
}

impl Observation {
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw: RawObservation = decode(value)?;
        let id = raw.id.unwrap_or_default();

        let photo_entries = match raw.photos {
            Some(photos) if !photos.is_empty() => photos,
            _ => raw.observation_photos.unwrap_or_default(),
        };
        let photos = photo_entries
            .iter()
            .map(|p| ObservationPhoto::from_value(p, id))
            .collect::<Result<Vec<_>>>()?;

        let identifications = raw
            .identifications
            .unwrap_or_default()
            .iter()
            .map(|i| Identification::from_value(i, id))
            .collect::<Result<Vec<_>>>()?;

        let user = raw.user.as_ref().map(User::from_value).transpose()?;
        let geojson = raw.geojson.as_ref().map(decode::<GeoJson>).transpose()?;

        let point = match (as_f64(raw.latitude.as_ref()), as_f64(raw.longitude.as_ref())) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => geojson
                .as_ref()
                .and_then(GeoJson::lat_lng)
                .or_else(|| raw.location.as_deref().and_then(parse_lat_lng)),
        };

        Ok(Self {
            id,
            uuid: raw.uuid.unwrap_or_default(),
            quality_grade: raw
                .quality_grade
                .as_deref()
                .and_then(QualityGrade::parse)
                .unwrap_or_default(),
            species_guess: raw.species_guess,
            description: raw.description,
            taxon: TaxonRef::build(raw.taxon_id, raw.taxon),
            iconic_taxon_name: raw.iconic_taxon_name,
            observed_on: raw.observed_on,
            observed_on_string: raw.observed_on_string,
            time_observed_at: raw.time_observed_at,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            latitude: point.map(|(lat, _)| lat),
            longitude: point.map(|(_, lng)| lng),
            positional_accuracy: as_f64(raw.positional_accuracy.as_ref()),
            place_guess: raw.place_guess,
            geoprivacy: raw.geoprivacy.as_deref().and_then(Geoprivacy::parse),
            coordinates_obscured: raw.coordinates_obscured.unwrap_or_default(),
            geojson,
            photos,
            photo_urls: raw.photo_urls.unwrap_or_default(),
            sounds: raw
                .sounds
                .unwrap_or_default()
                .into_iter()
                .map(RawSound::into_sound)
                .collect(),
            identifications,
            identifications_count: raw.identifications_count.unwrap_or_default(),
            num_identification_agreements: raw.num_identification_agreements.unwrap_or_default(),
            num_identification_disagreements: raw
                .num_identification_disagreements
                .unwrap_or_default(),
            comments_count: raw.comments_count.unwrap_or_default(),
            faves_count: raw.faves_count.unwrap_or_default(),
            identifications_most_agree: raw.identifications_most_agree.unwrap_or_default(),
            identifications_some_agree: raw.identifications_some_agree.unwrap_or_default(),
            identifications_most_disagree: raw.identifications_most_disagree.unwrap_or_default(),
            user_id: raw.user_id.or(user.as_ref().map(|u| u.id)),
            user_login: raw
                .user_login
                .or(user.as_ref().map(|u| u.login.clone()))
                .filter(|l| !l.is_empty()),
            user,
            project_ids: raw.project_ids.unwrap_or_default(),
            project_observations: raw
                .project_observations
                .unwrap_or_default()
                .into_iter()
                .map(RawProjectObservation::into_project_observation)
                .collect(),
            license_code: raw.license_code,
            url: raw.url,
            uri: raw.uri,
        })
    }

    pub fn taxon_id(&self) -> Option<u64> {
        self.taxon.as_ref().map(|t| t.id)
    }

    pub fn taxon_name(&self) -> Option<&str> {
        self.taxon.as_ref().and_then(|t| t.name.as_deref())
    }

    pub fn taxon_rank(&self) -> Option<&Rank> {
        self.taxon.as_ref().and_then(|t| t.rank.as_ref())
    }

    /// Species guess, else the linked taxon name, else `"Observation #<id>"`
    pub fn display_name(&self) -> String {
        self.species_guess
            .as_deref()
            .filter(|g| !g.is_empty())
            .or(self.taxon_name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Observation #{}", self.id))
    }

    pub fn is_research_grade(&self) -> bool {
        self.quality_grade == QualityGrade::Research
    }

    pub fn has_photos(&self) -> bool {
        !self.photos.is_empty()
    }

    pub fn best_photo(&self) -> Option<&ObservationPhoto> {
        self.photos.first()
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    /// One URL per photo: the requested size, else the canonical url
    pub fn photo_urls_for(&self, size: PhotoSize) -> Vec<&str> {
        self.photos
            .iter()
            .filter_map(|p| p.size_url(size).or_else(|| p.size_url(PhotoSize::Original)))
            .collect()
    }

    pub fn location(&self) -> Option<Location> {
        Some(Location {
            latitude: self.latitude?,
            longitude: self.longitude?,
            accuracy: self.positional_accuracy,
            geoprivacy: self.geoprivacy,
        })
    }

    pub fn observed_date(&self) -> Option<NaiveDate> {
        let date = self.observed_on.as_deref()?;
        NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d").ok()
    }

    pub fn time_observed(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(self.time_observed_at.as_deref())
    }

    pub fn created(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(self.created_at.as_deref())
    }

    pub fn updated(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(self.updated_at.as_deref())
    }
}

impl TryFrom<&Value> for Observation {
    type Error = crate::error::ApiError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_value(value)
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value?).ok()
}

/// Numbers sometimes arrive as strings
fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `"lat,lng"`
fn parse_lat_lng(location: &str) -> Option<(f64, f64)> {
    let (lat, lng) = location.split_once(',')?;
    Some((lat.trim().parse().ok()?, lng.trim().parse().ok()?))
}

fn point() -> String {
    "Point".to_string()
}

fn point_or_default<'de, D: serde::Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(point))
}

fn null_as_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct RawTaxonRef {
    id: Option<u64>,
    name: Option<String>,
    rank: Option<String>,
    preferred_common_name: Option<String>,
    iconic_taxon_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIdentification {
    id: Option<u64>,
    observation_id: Option<u64>,
    taxon_id: Option<u64>,
    user_id: Option<u64>,
    body: Option<String>,
    current: Option<bool>,
    category: Option<String>,
    created_at: Option<String>,
    taxon: Option<RawTaxonRef>,
    user: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawSound {
    id: Option<u64>,
    file_url: Option<String>,
    file_content_type: Option<String>,
    attribution: Option<String>,
    license_code: Option<String>,
}

impl RawSound {
    fn into_sound(self) -> Sound {
        Sound {
            id: self.id.unwrap_or_default(),
            file_url: self.file_url,
            file_content_type: self.file_content_type,
            attribution: self.attribution,
            license_code: self.license_code,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProjectObservation {
    id: Option<u64>,
    project_id: Option<u64>,
    project: Option<RawProject>,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    id: Option<u64>,
    title: Option<String>,
}

impl RawProjectObservation {
    fn into_project_observation(self) -> ProjectObservation {
        let (nested_id, title) = match self.project {
            Some(p) => (p.id, p.title),
            None => (None, None),
        };
        ProjectObservation {
            id: self.id.unwrap_or_default(),
            project_id: self.project_id.or(nested_id).unwrap_or_default(),
            project_title: title,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawObservation {
    id: Option<u64>,
    uuid: Option<String>,
    quality_grade: Option<String>,
    species_guess: Option<String>,
    description: Option<String>,
    taxon_id: Option<u64>,
    taxon: Option<RawTaxonRef>,
    iconic_taxon_name: Option<String>,
    observed_on: Option<String>,
    observed_on_string: Option<String>,
    time_observed_at: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    latitude: Option<Value>,
    longitude: Option<Value>,
    positional_accuracy: Option<Value>,
    place_guess: Option<String>,
    geoprivacy: Option<String>,
    coordinates_obscured: Option<bool>,
    geojson: Option<Value>,
    location: Option<String>,
    photos: Option<Vec<Value>>,
    observation_photos: Option<Vec<Value>>,
    photo_urls: Option<Vec<String>>,
    sounds: Option<Vec<RawSound>>,
    identifications: Option<Vec<Value>>,
    identifications_count: Option<u64>,
    num_identification_agreements: Option<u64>,
    num_identification_disagreements: Option<u64>,
    comments_count: Option<u64>,
    faves_count: Option<u64>,
    identifications_most_agree: Option<bool>,
    identifications_some_agree: Option<bool>,
    identifications_most_disagree: Option<bool>,
    user: Option<Value>,
    user_id: Option<u64>,
    user_login: Option<String>,
    project_ids: Option<Vec<u64>>,
    project_observations: Option<Vec<RawProjectObservation>>,
    license_code: Option<String>,
    url: Option<String>,
    uri: Option<String>,
}
