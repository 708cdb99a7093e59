//! Rows returned by the observation aggregate endpoints

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decode;
use super::observation::User;
use super::taxon::Taxon;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesCount {
    pub count: u64,
    pub taxon: Taxon,
}

impl SpeciesCount {
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw: RawCountRow = decode(value)?;
        let taxon = match &raw.taxon {
            Some(taxon) => Taxon::from_value(taxon)?,
            None => Taxon::from_value(&Value::Object(Default::default()))?,
        };
        Ok(Self {
            count: raw.count.unwrap_or_default(),
            taxon,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierCount {
    pub count: u64,
    pub user_id: u64,
    pub user: Option<User>,
}

impl IdentifierCount {
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw: RawCountRow = decode(value)?;
        let user = raw.user.as_ref().map(User::from_value).transpose()?;
        Ok(Self {
            count: raw.count.unwrap_or_default(),
            user_id: raw
                .user_id
                .or(user.as_ref().map(|u| u.id))
                .unwrap_or_default(),
            user,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObserverCount {
    pub observation_count: u64,
    pub species_count: u64,
    pub user_id: u64,
    pub user: Option<User>,
}

impl ObserverCount {
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw: RawCountRow = decode(value)?;
        let user = raw.user.as_ref().map(User::from_value).transpose()?;
        Ok(Self {
            observation_count: raw.observation_count.unwrap_or_default(),
            species_count: raw.species_count.unwrap_or_default(),
            user_id: raw
                .user_id
                .or(user.as_ref().map(|u| u.id))
                .unwrap_or_default(),
            user,
        })
    }
}

/// Observation counts bucketed by a time interval
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Histogram {
    /// Interval name as reported, e.g. `month_of_year`
    pub interval: String,
    /// Bucket key (a date or an ordinal) to count
    pub buckets: BTreeMap<String, u64>,
}

impl Histogram {
    /// Map the histogram `results` object; an absent or empty one yields no buckets
    pub fn from_results(results: &Value, requested_interval: &str) -> Self {
        let Some((interval, buckets)) = results.as_object().and_then(|m| m.iter().next()) else {
            return Self {
                interval: requested_interval.to_string(),
                buckets: BTreeMap::new(),
            };
        };

        let buckets = buckets
            .as_object()
            .map(|m| {
                m.iter()
                    .map(|(key, count)| (key.clone(), count.as_u64().unwrap_or_default()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            interval: interval.clone(),
            buckets,
        }
    }

    pub fn total(&self) -> u64 {
        self.buckets.values().sum()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawCountRow {
    count: Option<u64>,
    observation_count: Option<u64>,
    species_count: Option<u64>,
    user_id: Option<u64>,
    taxon: Option<Value>,
    user: Option<Value>,
}
