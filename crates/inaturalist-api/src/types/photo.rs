//! Photo value objects and size selection

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decode;
use crate::error::Result;

/// Named image sizes served by iNaturalist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSize {
    /// 75x75
    Square,
    /// 100x100
    Thumb,
    /// 240x240
    Small,
    /// 500x500
    Medium,
    /// 1024x1024
    Large,
    /// The photo's canonical `url`
    Original,
}

impl PhotoSize {
    /// Fallback order, best quality first
    pub const FALLBACK_ORDER: [PhotoSize; 6] = [
        PhotoSize::Large,
        PhotoSize::Medium,
        PhotoSize::Small,
        PhotoSize::Thumb,
        PhotoSize::Square,
        PhotoSize::Original,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "square" => Some(Self::Square),
            "thumb" => Some(Self::Thumb),
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            "original" | "url" => Some(Self::Original),
            _ => None,
        }
    }

    /// Nominal pixel dimensions; unknown for the original
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::Square => Some((75, 75)),
            Self::Thumb => Some((100, 100)),
            Self::Small => Some((240, 240)),
            Self::Medium => Some((500, 500)),
            Self::Large => Some((1024, 1024)),
            Self::Original => None,
        }
    }
}

/// The fixed set of sized URLs a photo may carry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhotoSizes {
    pub square_url: Option<String>,
    pub thumb_url: Option<String>,
    pub small_url: Option<String>,
    pub medium_url: Option<String>,
    pub large_url: Option<String>,
}

impl PhotoSizes {
    /// URL for a named size; `Original` is not a sized variant
    pub fn get(&self, size: PhotoSize) -> Option<&str> {
        let url = match size {
            PhotoSize::Square => &self.square_url,
            PhotoSize::Thumb => &self.thumb_url,
            PhotoSize::Small => &self.small_url,
            PhotoSize::Medium => &self.medium_url,
            PhotoSize::Large => &self.large_url,
            PhotoSize::Original => return None,
        };
        url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        PhotoSize::FALLBACK_ORDER.iter().all(|s| self.get(*s).is_none())
    }
}

/// Behavior shared by taxon and observation photos
pub trait Photo {
    /// Canonical URL, possibly empty
    fn url(&self) -> &str;

    fn sizes(&self) -> &PhotoSizes;

    fn size_url(&self, size: PhotoSize) -> Option<&str> {
        match size {
            PhotoSize::Original => Some(self.url()).filter(|u| !u.is_empty()),
            sized => self.sizes().get(sized),
        }
    }

    /// The requested size if present, else the best size available
    fn best_url(&self, preferred: PhotoSize) -> Option<&str> {
        std::iter::once(preferred)
            .chain(PhotoSize::FALLBACK_ORDER.into_iter().filter(|s| *s != preferred))
            .find_map(|size| self.size_url(size))
    }

    /// A photo with no URL at all cannot be shown
    fn is_usable(&self) -> bool {
        !self.url().is_empty() || !self.sizes().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoDimensions {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Photo attached to a taxon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonPhoto {
    pub id: u64,
    pub url: String,
    pub attribution: String,
    pub license_code: Option<String>,
    pub original_dimensions: Option<PhotoDimensions>,
    #[serde(flatten)]
    pub sizes: PhotoSizes,
}

impl TaxonPhoto {
    /// Map a photo object, or a `{"photo": {...}}` wrapper around one
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw: RawPhoto = decode(unwrap_photo(value))?;
        Ok(Self::from_raw(raw))
    }

    pub(crate) fn from_raw(raw: RawPhoto) -> Self {
        let sizes = raw.sizes();
        Self {
            id: raw.id.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            attribution: raw.attribution.unwrap_or_default(),
            license_code: raw.license_code,
            original_dimensions: raw.original_dimensions,
            sizes,
        }
    }
}

impl Photo for TaxonPhoto {
    fn url(&self) -> &str {
        &self.url
    }

    fn sizes(&self) -> &PhotoSizes {
        &self.sizes
    }
}

/// Photo attached to an observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationPhoto {
    /// Observation-photo link id, or the photo id for bare photo objects
    pub id: u64,
    pub photo_id: u64,
    pub observation_id: u64,
    pub position: Option<u32>,
    pub url: String,
    pub attribution: Option<String>,
    pub license_code: Option<String>,
    #[serde(flatten)]
    pub sizes: PhotoSizes,
}

impl ObservationPhoto {
    /// Map either a bare photo or an observation-photo link wrapping one
    ///
    /// `observation_id` fills in the owning observation when the entry omits it.
    pub fn from_value(value: &Value, observation_id: u64) -> Result<Self> {
        let link: RawPhotoLink = decode(value)?;
        let photo: RawPhoto = decode(unwrap_photo(value))?;
        let sizes = photo.sizes();

        Ok(Self {
            id: link.id.unwrap_or_default(),
            photo_id: link.photo_id.or(photo.id).unwrap_or_default(),
            observation_id: link.observation_id.unwrap_or(observation_id),
            position: link.position,
            url: photo.url.unwrap_or_default(),
            attribution: photo.attribution,
            license_code: photo.license_code,
            sizes,
        })
    }
}

impl Photo for ObservationPhoto {
    fn url(&self) -> &str {
        &self.url
    }

    fn sizes(&self) -> &PhotoSizes {
        &self.sizes
    }
}

fn unwrap_photo(value: &Value) -> &Value {
    match value.get("photo") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawPhoto {
    id: Option<u64>,
    url: Option<String>,
    attribution: Option<String>,
    license_code: Option<String>,
    original_dimensions: Option<PhotoDimensions>,
    square_url: Option<String>,
    thumb_url: Option<String>,
    small_url: Option<String>,
    medium_url: Option<String>,
    large_url: Option<String>,
}

impl RawPhoto {
    fn sizes(&self) -> PhotoSizes {
        PhotoSizes {
            square_url: self.square_url.clone(),
            thumb_url: self.thumb_url.clone(),
            small_url: self.small_url.clone(),
            medium_url: self.medium_url.clone(),
            large_url: self.large_url.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawPhotoLink {
    id: Option<u64>,
    photo_id: Option<u64>,
    observation_id: Option<u64>,
    position: Option<u32>,
}
