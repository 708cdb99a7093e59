//! Multi-page collection fetching

use serde_json::Value;
use tracing::debug;

use crate::client::INatClient;
use crate::error::Result;
use crate::query::{QueryParams, MAX_PER_PAGE};
use crate::types::ListResponse;

/// Walks the pages of one collection endpoint, starting at page 1
///
/// Fetching stops at the first of: an empty page, `max_results` collected
/// (the output is truncated to exactly that many), `max_pages` fetched, or
/// the page count implied by `total_results`.
#[derive(Clone)]
pub struct Paginator<'a> {
    client: &'a INatClient,
    endpoint: String,
    params: QueryParams,
    per_page: u32,
    max_pages: Option<u32>,
    max_results: Option<usize>,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a INatClient, endpoint: impl Into<String>, params: QueryParams) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            params,
            per_page: MAX_PER_PAGE,
            max_pages: None,
            max_results: None,
        }
    }

    /// Clamped to `1..=200`
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Fetch pages until a stopping rule fires and return the raw results
    pub async fn collect(self) -> Result<Vec<Value>> {
        let mut state = PageState::new(self.per_page, self.max_pages, self.max_results);
        if state.is_done() {
            return Ok(Vec::new());
        }

        let mut page: u32 = 1;
        let mut params = self.params;
        params.set("per_page", self.per_page);

        loop {
            params.set("page", page);
            let response = ListResponse::from_value(self.client.get(&self.endpoint, &params).await?);
            debug!(
                endpoint = %self.endpoint,
                page,
                fetched = response.results.len(),
                total_results = ?response.total_results,
                "Fetched page"
            );

            if !state.absorb(response) {
                break;
            }
            page += 1;
        }

        Ok(state.into_results())
    }
}

/// Accumulated results plus the stopping rules
#[derive(Debug)]
struct PageState {
    per_page: u32,
    max_pages: Option<u32>,
    max_results: Option<usize>,
    pages_fetched: u32,
    total_pages: Option<u64>,
    results: Vec<Value>,
}

impl PageState {
    fn new(per_page: u32, max_pages: Option<u32>, max_results: Option<usize>) -> Self {
        Self {
            per_page: per_page.max(1),
            max_pages,
            max_results,
            pages_fetched: 0,
            total_pages: None,
            results: Vec::new(),
        }
    }

    /// A zero limit means nothing is requested at all
    fn is_done(&self) -> bool {
        self.max_pages == Some(0) || self.max_results == Some(0)
    }

    /// Take one page; returns whether another page should be fetched
    fn absorb(&mut self, page: ListResponse) -> bool {
        if page.results.is_empty() {
            return false;
        }
        self.pages_fetched += 1;

        if self.total_pages.is_none() {
            self.total_pages = page
                .total_results
                .map(|total| total.div_ceil(u64::from(self.per_page)));
        }

        self.results.extend(page.results);

        if let Some(max) = self.max_results {
            if self.results.len() >= max {
                self.results.truncate(max);
                return false;
            }
        }
        if self.max_pages.is_some_and(|max| self.pages_fetched >= max) {
            return false;
        }
        if self
            .total_pages
            .is_some_and(|total| u64::from(self.pages_fetched) >= total)
        {
            return false;
        }
        true
    }

    fn into_results(self) -> Vec<Value> {
        self.results
    }
}

impl INatClient {
    /// Collect `endpoint` across pages; see [`Paginator`] for the stopping rules
    pub async fn paginate(
        &self,
        endpoint: &str,
        params: &QueryParams,
        per_page: u32,
        max_pages: Option<u32>,
        max_results: Option<usize>,
    ) -> Result<Vec<Value>> {
        let mut paginator = Paginator::new(self, endpoint, params.clone()).per_page(per_page);
        if let Some(max) = max_pages {
            paginator = paginator.max_pages(max);
        }
        if let Some(max) = max_results {
            paginator = paginator.max_results(max);
        }
        paginator.collect().await
    }

    /// Total matching records, from a single `per_page=0` request
    pub async fn total_count(&self, endpoint: &str, params: &QueryParams) -> Result<u64> {
        let mut params = params.clone();
        params.set("per_page", 0);
        let response = ListResponse::from_value(self.get(endpoint, &params).await?);
        Ok(response.total_results.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page_of(start: u64, len: u64, total: u64) -> Value {
        let results: Vec<Value> = (start..start + len).map(|id| json!({"id": id})).collect();
        json!({"total_results": total, "results": results})
    }

    async fn mount_pages(server: &MockServer, total: u64, per_page: u64) {
        let pages = total.div_ceil(per_page);
        for page in 1..=pages {
            let start = (page - 1) * per_page;
            let len = per_page.min(total - start);
            Mock::given(method("GET"))
                .and(path("/observations"))
                .and(query_param("page", page.to_string()))
                .and(query_param("per_page", per_page.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(page_of(start, len, total)))
                .expect(1)
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn test_stops_at_total_pages() {
        let server = MockServer::start().await;
        mount_pages(&server, 55, 20).await;
        let client = test_client(&server);

        let results = client
            .paginate("observations", &QueryParams::new(), 20, None, None)
            .await
            .unwrap();

        assert_eq!(results.len(), 55);
        assert_eq!(results[54]["id"], 54);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_max_results_truncates() {
        let server = MockServer::start().await;
        for page in 1..=2u64 {
            Mock::given(method("GET"))
                .and(path("/observations"))
                .and(query_param("page", page.to_string()))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(page_of((page - 1) * 20, 20, 55)),
                )
                .expect(1)
                .mount(&server)
                .await;
        }
        let client = test_client(&server);

        let results = client
            .paginate("observations", &QueryParams::new(), 20, None, Some(30))
            .await
            .unwrap();

        assert_eq!(results.len(), 30);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_max_pages_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/observations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(0, 20, 55)))
            .expect(1)
            .mount(&server)
            .await;
        let client = test_client(&server);

        let results = Paginator::new(&client, "observations", QueryParams::new())
            .per_page(20)
            .max_pages(1)
            .collect()
            .await
            .unwrap();

        assert_eq!(results.len(), 20);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_stops() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/observations"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": [{"id": 1}, {"id": 2}]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/observations"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;
        let client = test_client(&server);

        let results = client
            .paginate("observations", &QueryParams::new(), 2, Some(10), None)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_limits_make_no_request() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        let by_results = client
            .paginate("observations", &QueryParams::new(), 20, None, Some(0))
            .await
            .unwrap();
        let by_pages = client
            .paginate("observations", &QueryParams::new(), 20, Some(0), None)
            .await
            .unwrap();

        assert!(by_results.is_empty());
        assert!(by_pages.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_per_page_clamped_for_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/taxa"))
            .and(query_param("per_page", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(0, 3, 3)))
            .expect(1)
            .mount(&server)
            .await;
        let client = test_client(&server);

        let results = client
            .paginate("taxa", &QueryParams::new(), 5000, None, None)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_total_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/observations"))
            .and(query_param("per_page", "0"))
            .and(query_param("taxon_id", "13823"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"total_results": 98231, "results": []})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client = test_client(&server);

        let params: QueryParams = [("taxon_id", 13823)].into_iter().collect();
        assert_eq!(client.total_count("observations", &params).await.unwrap(), 98231);
    }

    #[test]
    fn test_total_pages_computed_once() {
        let mut state = PageState::new(20, None, None);
        let first = ListResponse {
            total_results: Some(40),
            results: vec![json!({}); 20],
            ..Default::default()
        };
        assert!(state.absorb(first));
        // a later, larger total does not extend the walk
        let second = ListResponse {
            total_results: Some(400),
            results: vec![json!({}); 20],
            ..Default::default()
        };
        assert!(!state.absorb(second));
        assert_eq!(state.into_results().len(), 40);
    }
}
