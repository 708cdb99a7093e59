//! Query builders rendering typed filters into iNaturalist wire parameters
//!
//! Every builder follows the same rules: optional filters appear only when
//! set, booleans are sent as `"true"`/`"false"`, lists are comma-joined and
//! `per_page` never exceeds [`MAX_PER_PAGE`].

mod observations;
mod taxa;

use std::collections::BTreeMap;
use std::fmt;

pub use observations::{
    AggregateQuery, HistogramQuery, ObservationDetailQuery, ObservationQuery, SortOrder,
    SpeciesCountsQuery,
};
pub use taxa::{AutocompleteQuery, IconicTaxon, TaxonQuery};

/// Largest page size the API accepts
pub const MAX_PER_PAGE: u32 = 200;

pub(crate) fn clamp_per_page(per_page: u32) -> u32 {
    per_page.min(MAX_PER_PAGE)
}

/// Rendered wire parameters, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn set_opt<T: fmt::Display>(&mut self, key: &str, value: Option<T>) {
        if let Some(v) = value {
            self.set(key, v);
        }
    }

    /// Like `set_opt`, but a blank string counts as unset
    pub fn set_str(&mut self, key: &str, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.set(key, v);
        }
    }

    /// Booleans go over the wire as string literals
    pub fn set_flag(&mut self, key: &str, value: Option<bool>) {
        if let Some(v) = value {
            self.set(key, if v { "true" } else { "false" });
        }
    }

    /// Comma-join a list; an empty list is left out
    pub fn set_list<T: AsRef<str>>(&mut self, key: &str, values: &[T]) {
        if values.is_empty() {
            return;
        }
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self.set(key, joined);
    }

    /// Copy every entry of `other` over this set
    pub fn merge(&mut self, other: &QueryParams) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}
