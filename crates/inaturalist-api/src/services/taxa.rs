use tracing::{debug, warn};

use super::map_all;
use super::observations::ObservationService;
use crate::client::INatClient;
use crate::error::{ApiError, Result};
use crate::query::{AutocompleteQuery, ObservationQuery, QueryParams, TaxonQuery, MAX_PER_PAGE};
use crate::types::{ListResponse, Observation, QualityGrade, Rank, Taxon};

const TAXA: &str = "taxa";

/// Taxon search and hierarchy lookups
#[derive(Clone, Copy)]
pub struct TaxonService<'a> {
    client: &'a INatClient,
}

impl<'a> TaxonService<'a> {
    pub fn new(client: &'a INatClient) -> Self {
        Self { client }
    }

    pub async fn search(&self, query: &TaxonQuery) -> Result<Vec<Taxon>> {
        self.fetch(TAXA, &query.to_params()).await
    }

    /// Name-prefix matching, as used by search-as-you-type boxes
    pub async fn autocomplete(&self, query: &AutocompleteQuery) -> Result<Vec<Taxon>> {
        self.fetch("taxa/autocomplete", &query.to_params()).await
    }

    /// `None` when the API returns no result for `id`
    pub async fn get_by_id(&self, id: u64) -> Result<Option<Taxon>> {
        let endpoint = format!("{}/{}", TAXA, id);
        let response = self.client.get(&endpoint, &QueryParams::new()).await?;
        ListResponse::from_value(response)
            .into_first()
            .map(|raw| Taxon::from_value(&raw))
            .transpose()
    }

    /// Exact scientific-name match (case-insensitive), else the top search hit
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Taxon>> {
        let mut results = self.search(&TaxonQuery::new().q(name).per_page(5)).await?;
        let exact = results
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name.trim()));
        Ok(match exact {
            Some(index) => Some(results.swap_remove(index)),
            None => results.into_iter().next(),
        })
    }

    pub async fn get_children(&self, parent_id: u64, rank: Option<Rank>) -> Result<Vec<Taxon>> {
        let mut query = TaxonQuery::new().parent_id(parent_id).per_page(MAX_PER_PAGE);
        if let Some(rank) = rank {
            query = query.rank(rank);
        }
        self.search(&query).await
    }

    /// Ancestors root first
    ///
    /// An ancestor that is absent or whose lookup fails is skipped; only a
    /// failure to load `id` itself, or cancellation, is returned as an error.
    pub async fn get_ancestors(&self, id: u64) -> Result<Vec<Taxon>> {
        let Some(taxon) = self.get_by_id(id).await? else {
            return Ok(Vec::new());
        };

        let mut ancestors = Vec::with_capacity(taxon.ancestor_ids.len());
        for ancestor_id in &taxon.ancestor_ids {
            match self.get_by_id(*ancestor_id).await {
                Ok(Some(ancestor)) => ancestors.push(ancestor),
                Ok(None) => debug!(taxon_id = id, ancestor_id, "Ancestor did not resolve"),
                Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
                Err(e) => warn!(taxon_id = id, ancestor_id, error = %e, "Ancestor lookup failed"),
            }
        }
        Ok(ancestors)
    }

    /// The kingdoms
    pub async fn get_iconic_taxa(&self) -> Result<Vec<Taxon>> {
        let query = TaxonQuery::new().rank(Rank::Kingdom).per_page(50);
        self.search(&query).await
    }

    pub async fn observation_count(
        &self,
        taxon_id: u64,
        place_id: Option<u64>,
        quality_grade: Option<QualityGrade>,
    ) -> Result<u64> {
        let mut query = ObservationQuery::new().taxon_id(taxon_id);
        if let Some(place_id) = place_id {
            query = query.place_id(place_id);
        }
        if let Some(grade) = quality_grade {
            query = query.quality_grade(grade);
        }
        ObservationService::new(self.client).count(&query).await
    }

    /// Observations of one taxon; pages through results when `max_results` is set
    pub async fn observations(
        &self,
        taxon_id: u64,
        quality_grade: Option<QualityGrade>,
        photos_only: bool,
        per_page: u32,
        max_results: Option<usize>,
    ) -> Result<Vec<Observation>> {
        let mut query = ObservationQuery::new().taxon_id(taxon_id).per_page(per_page);
        if let Some(grade) = quality_grade {
            query = query.quality_grade(grade);
        }
        if photos_only {
            query = query.photos(true);
        }

        let service = ObservationService::new(self.client);
        match max_results {
            Some(max) => service.search_all(&query, max).await,
            None => service.search(&query).await,
        }
    }

    async fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Vec<Taxon>> {
        let response = self.client.get(endpoint, params).await?;
        let list = ListResponse::from_value(response);
        map_all(&list.results, Taxon::from_value)
    }
}
