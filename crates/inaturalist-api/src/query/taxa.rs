use std::fmt;

use serde::Serialize;

use super::{clamp_per_page, QueryParams};
use crate::types::Rank;

/// Top-level groups iNaturalist uses to bucket taxa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IconicTaxon {
    Animalia,
    Plantae,
    Fungi,
    Aves,
    Amphibia,
    Reptilia,
    Mammalia,
    Actinopterygii,
    Mollusca,
    Arachnida,
    Insecta,
    Chromista,
    Protozoa,
    Unknown,
}

impl IconicTaxon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Animalia => "Animalia",
            Self::Plantae => "Plantae",
            Self::Fungi => "Fungi",
            Self::Aves => "Aves",
            Self::Amphibia => "Amphibia",
            Self::Reptilia => "Reptilia",
            Self::Mammalia => "Mammalia",
            Self::Actinopterygii => "Actinopterygii",
            Self::Mollusca => "Mollusca",
            Self::Arachnida => "Arachnida",
            Self::Insecta => "Insecta",
            Self::Chromista => "Chromista",
            Self::Protozoa => "Protozoa",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IconicTaxon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for IconicTaxon {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Filters for `GET /taxa`
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonQuery {
    q: Option<String>,
    ids: Vec<u64>,
    parent_id: Option<u64>,
    ranks: Vec<Rank>,
    min_rank: Option<Rank>,
    max_rank: Option<Rank>,
    iconic_taxa: Vec<IconicTaxon>,
    is_active: Option<bool>,
    per_page: u32,
    page: u32,
    extra: QueryParams,
}

impl Default for TaxonQuery {
    fn default() -> Self {
        Self {
            q: None,
            ids: Vec::new(),
            parent_id: None,
            ranks: Vec::new(),
            min_rank: None,
            max_rank: None,
            iconic_taxa: Vec::new(),
            is_active: None,
            per_page: 30,
            page: 1,
            extra: QueryParams::new(),
        }
    }
}

impl TaxonQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text name search
    pub fn q(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn id(mut self, id: u64) -> Self {
        self.ids.push(id);
        self
    }

    pub fn parent_id(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn rank(mut self, rank: Rank) -> Self {
        self.ranks.push(rank);
        self
    }

    pub fn min_rank(mut self, rank: Rank) -> Self {
        self.min_rank = Some(rank);
        self
    }

    pub fn max_rank(mut self, rank: Rank) -> Self {
        self.max_rank = Some(rank);
        self
    }

    pub fn iconic_taxon(mut self, iconic: IconicTaxon) -> Self {
        self.iconic_taxa.push(iconic);
        self
    }

    pub fn is_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    /// Clamped to 200
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = clamp_per_page(per_page);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Pass-through parameter for a wire key without a typed setter
    pub fn extra(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.extra.set(key, value);
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = self.extra.clone();
        params.set_str("q", self.q.as_deref());
        params.set_list("id", &join_ids(&self.ids));
        params.set_opt("parent_id", self.parent_id);
        params.set_list("rank", &self.ranks);
        params.set_opt("min_rank", self.min_rank.as_ref());
        params.set_opt("max_rank", self.max_rank.as_ref());
        params.set_list("iconic_taxa", &self.iconic_taxa);
        params.set_flag("is_active", self.is_active);
        params.set("per_page", self.per_page);
        params.set("page", self.page);
        params
    }
}

/// Filters for `GET /taxa/autocomplete`
#[derive(Debug, Clone, PartialEq)]
pub struct AutocompleteQuery {
    q: String,
    per_page: u32,
    rank: Option<Rank>,
    min_rank: Option<Rank>,
    extra: QueryParams,
}

impl AutocompleteQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            per_page: 10,
            rank: None,
            min_rank: None,
            extra: QueryParams::new(),
        }
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = clamp_per_page(per_page);
        self
    }

    pub fn rank(mut self, rank: Rank) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn min_rank(mut self, rank: Rank) -> Self {
        self.min_rank = Some(rank);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.extra.set(key, value);
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = self.extra.clone();
        params.set_str("q", Some(&self.q));
        params.set("per_page", self.per_page);
        params.set_opt("rank", self.rank.as_ref());
        params.set_opt("min_rank", self.min_rank.as_ref());
        params
    }
}

pub(super) fn join_ids(ids: &[u64]) -> Vec<String> {
    ids.iter().map(u64::to_string).collect()
}
