//! Endpoint-level operations returning domain entities

mod observations;
mod taxa;

use serde_json::Value;

use crate::client::INatClient;
use crate::error::Result;

pub use observations::ObservationService;
pub use taxa::TaxonService;

impl INatClient {
    pub fn taxa(&self) -> TaxonService<'_> {
        TaxonService::new(self)
    }

    pub fn observations(&self) -> ObservationService<'_> {
        ObservationService::new(self)
    }
}

/// Map every raw result with `map`, failing on the first malformed entry
fn map_all<T>(results: &[Value], map: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    results.iter().map(map).collect()
}
