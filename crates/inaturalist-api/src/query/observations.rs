use std::fmt;

use chrono::NaiveDate;

use super::taxa::join_ids;
use super::{clamp_per_page, IconicTaxon, QueryParams};
use crate::types::{Geoprivacy, QualityGrade, Rank};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Filters for `GET /observations`
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationQuery {
    taxon_ids: Vec<u64>,
    taxon_name: Option<String>,
    iconic_taxa: Vec<IconicTaxon>,
    place_ids: Vec<u64>,
    /// swlat, swlng, nelat, nelng
    bounding_box: Option<(f64, f64, f64, f64)>,
    /// lat, lng
    center: Option<(f64, f64)>,
    radius_km: Option<f64>,
    observed_on: Option<NaiveDate>,
    d1: Option<NaiveDate>,
    d2: Option<NaiveDate>,
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    quality_grade: Option<QualityGrade>,
    geoprivacy: Option<Geoprivacy>,
    photos: Option<bool>,
    sounds: Option<bool>,
    geo: Option<bool>,
    identified: Option<bool>,
    user_id: Option<u64>,
    user_login: Option<String>,
    project_id: Option<u64>,
    order_by: Option<String>,
    order: SortOrder,
    per_page: u32,
    page: u32,
    extra: QueryParams,
}

impl Default for ObservationQuery {
    fn default() -> Self {
        Self {
            taxon_ids: Vec::new(),
            taxon_name: None,
            iconic_taxa: Vec::new(),
            place_ids: Vec::new(),
            bounding_box: None,
            center: None,
            radius_km: None,
            observed_on: None,
            d1: None,
            d2: None,
            year: None,
            month: None,
            day: None,
            quality_grade: None,
            geoprivacy: None,
            photos: None,
            sounds: None,
            geo: None,
            identified: None,
            user_id: None,
            user_login: None,
            project_id: None,
            order_by: None,
            order: SortOrder::Desc,
            per_page: 30,
            page: 1,
            extra: QueryParams::new(),
        }
    }
}

impl ObservationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn taxon_id(mut self, taxon_id: u64) -> Self {
        self.taxon_ids.push(taxon_id);
        self
    }

    pub fn taxon_name(mut self, name: impl Into<String>) -> Self {
        self.taxon_name = Some(name.into());
        self
    }

    pub fn iconic_taxon(mut self, iconic: IconicTaxon) -> Self {
        self.iconic_taxa.push(iconic);
        self
    }

    pub fn place_id(mut self, place_id: u64) -> Self {
        self.place_ids.push(place_id);
        self
    }

    /// Rectangle from its south-west and north-east corners
    pub fn bounding_box(mut self, swlat: f64, swlng: f64, nelat: f64, nelng: f64) -> Self {
        self.bounding_box = Some((swlat, swlng, nelat, nelng));
        self
    }

    /// Circle around a point; the radius is optional on the wire
    pub fn near(mut self, lat: f64, lng: f64) -> Self {
        self.center = Some((lat, lng));
        self
    }

    pub fn radius_km(mut self, radius: f64) -> Self {
        self.radius_km = Some(radius);
        self
    }

    pub fn observed_on(mut self, date: NaiveDate) -> Self {
        self.observed_on = Some(date);
        self
    }

    /// Observed on or after
    pub fn d1(mut self, date: NaiveDate) -> Self {
        self.d1 = Some(date);
        self
    }

    /// Observed on or before
    pub fn d2(mut self, date: NaiveDate) -> Self {
        self.d2 = Some(date);
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn quality_grade(mut self, grade: QualityGrade) -> Self {
        self.quality_grade = Some(grade);
        self
    }

    pub fn geoprivacy(mut self, geoprivacy: Geoprivacy) -> Self {
        self.geoprivacy = Some(geoprivacy);
        self
    }

    pub fn photos(mut self, photos: bool) -> Self {
        self.photos = Some(photos);
        self
    }

    pub fn sounds(mut self, sounds: bool) -> Self {
        self.sounds = Some(sounds);
        self
    }

    pub fn geo(mut self, geo: bool) -> Self {
        self.geo = Some(geo);
        self
    }

    pub fn identified(mut self, identified: bool) -> Self {
        self.identified = Some(identified);
        self
    }

    pub fn user_id(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn user_login(mut self, login: impl Into<String>) -> Self {
        self.user_login = Some(login.into());
        self
    }

    pub fn project_id(mut self, project_id: u64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Sort field, e.g. `observed_on`, `created_at` or `votes`
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Clamped to 200; 0 requests only the total count
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = clamp_per_page(per_page);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.extra.set(key, value);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.per_page
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = self.extra.clone();
        params.set_list("taxon_id", &join_ids(&self.taxon_ids));
        params.set_str("taxon_name", self.taxon_name.as_deref());
        params.set_list("iconic_taxa", &self.iconic_taxa);
        params.set_list("place_id", &join_ids(&self.place_ids));

        if let Some((swlat, swlng, nelat, nelng)) = self.bounding_box {
            params.set("swlat", swlat);
            params.set("swlng", swlng);
            params.set("nelat", nelat);
            params.set("nelng", nelng);
        }
        if let Some((lat, lng)) = self.center {
            params.set("lat", lat);
            params.set("lng", lng);
        }
        params.set_opt("radius", self.radius_km);

        params.set_opt("observed_on", format_date(self.observed_on));
        params.set_opt("d1", format_date(self.d1));
        params.set_opt("d2", format_date(self.d2));
        params.set_opt("year", self.year);
        params.set_opt("month", self.month);
        params.set_opt("day", self.day);

        params.set_opt("quality_grade", self.quality_grade.map(|g| g.as_str()));
        params.set_opt("geoprivacy", self.geoprivacy.map(|g| g.as_str()));
        params.set_flag("photos", self.photos);
        params.set_flag("sounds", self.sounds);
        params.set_flag("geo", self.geo);
        params.set_flag("identified", self.identified);

        params.set_opt("user_id", self.user_id);
        params.set_str("user_login", self.user_login.as_deref());
        params.set_opt("project_id", self.project_id);

        params.set_str("order_by", self.order_by.as_deref());
        params.set("order", self.order.as_str());
        params.set("per_page", self.per_page);
        params.set("page", self.page);
        params
    }
}

/// Options for `GET /observations/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationDetailQuery {
    include_new_projects: Option<bool>,
}

impl ObservationDetailQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_new_projects(mut self, include: bool) -> Self {
        self.include_new_projects = Some(include);
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.set_flag("include_new_projects", self.include_new_projects);
        params
    }
}

/// Filters for `GET /observations/species_counts`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeciesCountsQuery {
    place_id: Option<u64>,
    taxon_id: Option<u64>,
    user_id: Option<u64>,
    project_id: Option<u64>,
    d1: Option<NaiveDate>,
    d2: Option<NaiveDate>,
    hrank: Option<Rank>,
    lrank: Option<Rank>,
    extra: QueryParams,
}

impl SpeciesCountsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place_id(mut self, place_id: u64) -> Self {
        self.place_id = Some(place_id);
        self
    }

    pub fn taxon_id(mut self, taxon_id: u64) -> Self {
        self.taxon_id = Some(taxon_id);
        self
    }

    pub fn user_id(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn project_id(mut self, project_id: u64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn d1(mut self, date: NaiveDate) -> Self {
        self.d1 = Some(date);
        self
    }

    pub fn d2(mut self, date: NaiveDate) -> Self {
        self.d2 = Some(date);
        self
    }

    /// Highest rank to count
    pub fn hrank(mut self, rank: Rank) -> Self {
        self.hrank = Some(rank);
        self
    }

    /// Lowest rank to count
    pub fn lrank(mut self, rank: Rank) -> Self {
        self.lrank = Some(rank);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.extra.set(key, value);
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = self.extra.clone();
        params.set_opt("place_id", self.place_id);
        params.set_opt("taxon_id", self.taxon_id);
        params.set_opt("user_id", self.user_id);
        params.set_opt("project_id", self.project_id);
        params.set_opt("d1", format_date(self.d1));
        params.set_opt("d2", format_date(self.d2));
        params.set_opt("hrank", self.hrank.as_ref());
        params.set_opt("lrank", self.lrank.as_ref());
        params
    }
}

/// Filters shared by the identifier and observer leaderboards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateQuery {
    place_id: Option<u64>,
    taxon_id: Option<u64>,
    extra: QueryParams,
}

impl AggregateQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place_id(mut self, place_id: u64) -> Self {
        self.place_id = Some(place_id);
        self
    }

    pub fn taxon_id(mut self, taxon_id: u64) -> Self {
        self.taxon_id = Some(taxon_id);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.extra.set(key, value);
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = self.extra.clone();
        params.set_opt("place_id", self.place_id);
        params.set_opt("taxon_id", self.taxon_id);
        params
    }
}

/// Filters for `GET /observations/histogram`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramQuery {
    interval: String,
    taxon_id: Option<u64>,
    place_id: Option<u64>,
    extra: QueryParams,
}

impl Default for HistogramQuery {
    fn default() -> Self {
        Self {
            interval: "month".to_string(),
            taxon_id: None,
            place_id: None,
            extra: QueryParams::new(),
        }
    }
}

impl HistogramQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `year`, `month`, `week`, `day`, `hour`, `month_of_year` or `week_of_year`
    pub fn interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = interval.into();
        self
    }

    pub fn taxon_id(mut self, taxon_id: u64) -> Self {
        self.taxon_id = Some(taxon_id);
        self
    }

    pub fn place_id(mut self, place_id: u64) -> Self {
        self.place_id = Some(place_id);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.extra.set(key, value);
        self
    }

    pub fn interval_name(&self) -> &str {
        &self.interval
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = self.extra.clone();
        params.set("interval", &self.interval);
        params.set_opt("taxon_id", self.taxon_id);
        params.set_opt("place_id", self.place_id);
        params
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}
