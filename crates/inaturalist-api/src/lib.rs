//! Rust client for the iNaturalist API (v1)
//!
//! Typed, filtered access to taxa and observations, with client-side rate
//! limiting, retries and multi-page collection. Responses are mapped into
//! immutable domain entities.
//!
//! # Example
//!
//! ```no_run
//! use inaturalist_api::{INatClient, ObservationQuery, QualityGrade, TaxonQuery};
//!
//! # async fn example() -> Result<(), inaturalist_api::ApiError> {
//! let client = INatClient::with_defaults()?;
//!
//! // Search taxa
//! let taxa = client.taxa().search(&TaxonQuery::new().q("Pica pica")).await?;
//! for taxon in &taxa {
//!     println!("{}", taxon.display_name());
//! }
//!
//! // Research-grade observations with photos, across pages
//! let query = ObservationQuery::new()
//!     .taxon_id(13823)
//!     .quality_grade(QualityGrade::Research)
//!     .photos(true)
//!     .per_page(200);
//! let observations = client.observations().search_all(&query, 500).await?;
//! println!("{} observations", observations.len());
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! ## Taxa
//! - `GET /taxa` - Search taxa
//! - `GET /taxa/autocomplete` - Name-prefix search
//! - `GET /taxa/{id}` - Taxon details
//!
//! ## Observations
//! - `GET /observations` - Search observations
//! - `GET /observations/{id}` - Observation details
//! - `GET /observations/species_counts` - Species leaderboard
//! - `GET /observations/identifiers` - Identifier leaderboard
//! - `GET /observations/observers` - Observer leaderboard
//! - `GET /observations/histogram` - Observation counts over time

mod client;
mod config;
mod error;
mod pagination;
mod query;
mod rate_limiter;
mod services;
mod types;

pub use client::INatClient;
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use pagination::Paginator;
pub use query::{
    AggregateQuery, AutocompleteQuery, HistogramQuery, IconicTaxon, ObservationDetailQuery,
    ObservationQuery, QueryParams, SortOrder, SpeciesCountsQuery, TaxonQuery, MAX_PER_PAGE,
};
pub use rate_limiter::RateLimiter;
pub use services::{ObservationService, TaxonService};
pub use types::{
    ConservationStatusInfo, EstablishmentMeans, EstablishmentMeansInfo, GeoJson, Geoprivacy,
    Histogram, IdentifierCount, Identification, IucnCategory, ListResponse, Location,
    Observation, ObservationPhoto, ObserverCount, Photo, PhotoDimensions, PhotoSize, PhotoSizes,
    PlaceRef, ProjectObservation, QualityGrade, Rank, Sound, SpeciesCount, Taxon, TaxonName,
    TaxonPhoto, TaxonRef, User,
};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
