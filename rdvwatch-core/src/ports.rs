//! Traits describing the appointment-backend capabilities the pipeline uses.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, ParseError as ChronoParseError};
use reqwest::Error as ReqwestError;

use crate::model::{Coordinate, DateWindow, EstablishmentId, Place, PlacesPage, ServiceId};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the appointment backend.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Failed to parse a date from a backend response.
    #[error("Parse error: {0}")]
    Parse(#[from] ChronoParseError),
    /// The geocoder returned no result for the postal code.
    #[error("No geocode result for postal code {0}")]
    GeocodeNotFound(String),
    /// The establishment lists no bookable service.
    #[error("No service listed for establishment {0}")]
    NoService(EstablishmentId),
    /// Internal backend error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone)]
/// Query parameters for one page of the location search.
pub struct PlacesQuery {
    /// Centre of the search.
    pub coordinate: Coordinate,
    /// Date window availabilities are requested for.
    pub window: DateWindow,
    /// Search radius in kilometres.
    pub max_distance_km: f64,
    /// Postal code the search is centred on.
    pub postal_code: String,
}

#[async_trait]
/// Resolves postal codes to coordinates.
pub trait GeocodePort: Send + Sync {
    /// Resolve a postal code to a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::GeocodeNotFound`] when the geocoder has no
    /// result for the postal code, or a transport-level [`PortError`].
    async fn geocode(&self, postal_code: &str) -> Result<Coordinate, PortError>;
}

#[async_trait]
/// Searches the location directory and resolves service identifiers.
pub trait DirectoryPort: Send + Sync {
    /// Fetch one page of places near the queried coordinate.
    ///
    /// A page with an empty place list is the normal end-of-results signal,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the search request fails.
    async fn places_page(&self, query: &PlacesQuery, page: u32) -> Result<PlacesPage, PortError>;

    /// Resolve the first bookable service of an establishment.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::NoService`] when the establishment lists no
    /// service, or a transport-level [`PortError`].
    async fn first_service(
        &self,
        establishment: &EstablishmentId,
    ) -> Result<ServiceId, PortError>;
}

#[async_trait]
/// Fetches open appointment dates for a single place.
pub trait SchedulePort: Send + Sync {
    /// Fetch the open dates of `place` for `service` within the window.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the schedule request fails or a returned
    /// date cannot be parsed.
    async fn availabilities(
        &self,
        place: &Place,
        service: ServiceId,
        window: DateWindow,
    ) -> Result<Vec<NaiveDate>, PortError>;
}

/// Bundle of ports implementing one appointment backend.
pub struct Backend {
    /// Postal-code resolution.
    pub geocode: Arc<dyn GeocodePort>,
    /// Location search and service lookup.
    pub directory: Arc<dyn DirectoryPort>,
    /// Per-place schedule lookup.
    pub schedule: Arc<dyn SchedulePort>,
}
