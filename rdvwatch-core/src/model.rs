//! Domain data structures for coordinates, places, and watch options.

use std::collections::HashMap;
use std::fmt;

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Geographic coordinate resolved from a postal code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in floating-point degrees.
    pub latitude: f64,
    /// Longitude in floating-point degrees.
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a bookable place (site) within an establishment.
pub struct PlaceId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for an establishment offering services.
pub struct EstablishmentId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Opaque identifier for a bookable service offered by an establishment.
pub struct ServiceId(pub i64);

impl fmt::Display for PlaceId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl fmt::Display for EstablishmentId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A service location discovered near the watched postal code.
pub struct Place {
    /// Unique identifier; catalog identity is by this id.
    pub id: PlaceId,
    /// Establishment the place belongs to.
    pub establishment: EstablishmentId,
    /// Bookable service, resolved lazily. Stays `None` when resolution
    /// failed; such a place is treated as having no availabilities.
    pub service_id: Option<ServiceId>,
    /// Localized display name.
    pub name: String,
    /// Human-readable address.
    pub address: String,
    /// Distance from the searched coordinate, when the search reported one.
    pub distance_km: Option<f64>,
    /// Open appointment dates, chronological as returned by the source.
    pub availabilities: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
/// One page of the paginated location search.
pub struct PlacesPage {
    /// Places listed on this page, before any exclusion filtering.
    pub places: Vec<Place>,
    /// Distance in kilometres per place id; merged across pages by the caller.
    pub distances: HashMap<PlaceId, f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
/// Inclusive date range availabilities are requested for.
pub struct DateWindow {
    /// Start date (inclusive), "today" at query time.
    pub start: NaiveDate,
    /// End date (inclusive).
    pub end: NaiveDate,
}

impl DateWindow {
    /// Days ahead of `start` the window extends.
    pub const HORIZON_DAYS: i64 = 100;

    /// Window starting today, recomputed at every polling pass.
    #[must_use]
    pub fn from_today() -> Self {
        Self::starting(Local::now().date_naive())
    }

    /// Window covering [`Self::HORIZON_DAYS`] from the given day.
    #[must_use]
    pub fn starting(start: NaiveDate) -> Self {
        Self {
            start,
            end: start + Duration::days(Self::HORIZON_DAYS),
        }
    }
}

#[derive(Debug, Clone)]
/// Query options, immutable for the process lifetime.
pub struct WatchOptions {
    /// Postal code the search is centred on.
    pub postal_code: String,
    /// Maximum days from today an earliest opening may be and still match.
    pub tolerance_days: i64,
    /// Search radius in kilometres.
    pub max_distance_km: f64,
    /// Minutes to wait between polling passes.
    pub poll_minutes: u64,
    /// When set, match only places offering exactly this date.
    pub specific_date: Option<NaiveDate>,
}
