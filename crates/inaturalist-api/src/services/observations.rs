use tracing::debug;

use super::map_all;
use crate::client::INatClient;
use crate::error::Result;
use crate::query::{
    AggregateQuery, HistogramQuery, ObservationDetailQuery, ObservationQuery, SortOrder,
    SpeciesCountsQuery, MAX_PER_PAGE,
};
use crate::types::{
    Histogram, IdentifierCount, ListResponse, Observation, ObserverCount, QualityGrade,
    SpeciesCount,
};

const OBSERVATIONS: &str = "observations";

/// Observation search, lookup and aggregate statistics
#[derive(Clone, Copy)]
pub struct ObservationService<'a> {
    client: &'a INatClient,
}

impl<'a> ObservationService<'a> {
    pub fn new(client: &'a INatClient) -> Self {
        Self { client }
    }

    /// One page of observations
    pub async fn search(&self, query: &ObservationQuery) -> Result<Vec<Observation>> {
        let response = self.client.get(OBSERVATIONS, &query.to_params()).await?;
        let list = ListResponse::from_value(response);
        map_all(&list.results, Observation::from_value)
    }

    /// Every matching observation up to `max_results`, walking pages from 1
    ///
    /// A count-only query (`per_page(0)`) walks at 200 per page.
    pub async fn search_all(
        &self,
        query: &ObservationQuery,
        max_results: usize,
    ) -> Result<Vec<Observation>> {
        let per_page = match query.page_size() {
            0 => MAX_PER_PAGE,
            n => n,
        };
        let results = self
            .client
            .paginate(
                OBSERVATIONS,
                &query.to_params(),
                per_page,
                None,
                Some(max_results),
            )
            .await?;
        debug!(count = results.len(), max_results, "Collected observations");
        map_all(&results, Observation::from_value)
    }

    /// `None` when the API returns no result for `id`
    pub async fn get_by_id(
        &self,
        id: u64,
        query: &ObservationDetailQuery,
    ) -> Result<Option<Observation>> {
        let endpoint = format!("{}/{}", OBSERVATIONS, id);
        let response = self.client.get(&endpoint, &query.to_params()).await?;
        ListResponse::from_value(response)
            .into_first()
            .map(|raw| Observation::from_value(&raw))
            .transpose()
    }

    /// Number of matching observations; no records are transferred
    pub async fn count(&self, query: &ObservationQuery) -> Result<u64> {
        let params = query.clone().per_page(0).to_params();
        self.client.total_count(OBSERVATIONS, &params).await
    }

    pub async fn species_counts(&self, query: &SpeciesCountsQuery) -> Result<Vec<SpeciesCount>> {
        let response = self
            .client
            .get("observations/species_counts", &query.to_params())
            .await?;
        let list = ListResponse::from_value(response);
        map_all(&list.results, SpeciesCount::from_value)
    }

    /// Users ranked by identifications made
    pub async fn identifiers(&self, query: &AggregateQuery) -> Result<Vec<IdentifierCount>> {
        let response = self
            .client
            .get("observations/identifiers", &query.to_params())
            .await?;
        let list = ListResponse::from_value(response);
        map_all(&list.results, IdentifierCount::from_value)
    }

    /// Users ranked by observations made
    pub async fn observers(&self, query: &AggregateQuery) -> Result<Vec<ObserverCount>> {
        let response = self
            .client
            .get("observations/observers", &query.to_params())
            .await?;
        let list = ListResponse::from_value(response);
        map_all(&list.results, ObserverCount::from_value)
    }

    pub async fn histogram(&self, query: &HistogramQuery) -> Result<Histogram> {
        let response = self
            .client
            .get("observations/histogram", &query.to_params())
            .await?;
        let results = response.get("results").cloned().unwrap_or_default();
        Ok(Histogram::from_results(&results, query.interval_name()))
    }

    /// Most-faved observations with photos
    pub async fn popular(
        &self,
        place_id: Option<u64>,
        taxon_id: Option<u64>,
        per_page: u32,
    ) -> Result<Vec<Observation>> {
        let query = with_place_and_taxon(ObservationQuery::new(), place_id, taxon_id)
            .photos(true)
            .order_by("votes")
            .order(SortOrder::Desc)
            .per_page(per_page);
        self.search(&query).await
    }

    /// Most recently observed records with photos
    pub async fn latest(
        &self,
        taxon_id: Option<u64>,
        place_id: Option<u64>,
        quality_grade: QualityGrade,
        per_page: u32,
    ) -> Result<Vec<Observation>> {
        let query = with_place_and_taxon(ObservationQuery::new(), place_id, taxon_id)
            .quality_grade(quality_grade)
            .photos(true)
            .order_by("observed_on")
            .order(SortOrder::Desc)
            .per_page(per_page);
        self.search(&query).await
    }
}

fn with_place_and_taxon(
    mut query: ObservationQuery,
    place_id: Option<u64>,
    taxon_id: Option<u64>,
) -> ObservationQuery {
    if let Some(place_id) = place_id {
        query = query.place_id(place_id);
    }
    if let Some(taxon_id) = taxon_id {
        query = query.taxon_id(taxon_id);
    }
    query
}
