//! Provider implementation for the Clic Santé v3 appointment API.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use rdvwatch_core::{
    model::{Coordinate, DateWindow, EstablishmentId, Place, PlaceId, PlacesPage, ServiceId},
    ports::{Backend, DirectoryPort, GeocodePort, PlacesQuery, PortError, SchedulePort},
};

const BASE_URL: &str = "https://api3.clicsante.ca/v3";
const PORTAL_URL: &str = "https://clients3.clicsante.ca";

// Static public credential shipped with the Clic Santé web client.
const AUTH_BASIC: &str = "Basic cHVibGljQHRyaW1vei5jb206MTIzNDU2Nzgh";

/// Unified service category of the tracked appointments.
pub const SERVICE_UNIFIED: u32 = 237;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMEZONE: &str = "America/Toronto";

/// Response wrapper from /geocode
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

/// Single geocode hit; only the geometry matters.
#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: GeoPoint,
}

#[derive(Debug, Deserialize)]
struct GeoPoint {
    lat: f64,
    lng: f64,
}

/// Single entry from /establishments/{id}/services
#[derive(Debug, Deserialize)]
struct ServiceEntry {
    id: i64,
    // name_fr and friends exist, we only need the id
}

/// Response from the paginated /availabilities search
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    places: Vec<PlaceEntry>,
    #[serde(default, rename = "distanceByPlaces")]
    distance_by_places: HashMap<String, f64>,
}

/// Single place from /availabilities
#[derive(Debug, Deserialize)]
struct PlaceEntry {
    id: i64,
    establishment: i64,
    name_fr: String,
    #[serde(default)]
    formatted_address: String,
}

/// Response from /establishments/{id}/schedules/public
#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    availabilities: Vec<String>,
}

/// Client for the Clic Santé REST API, implementing all backend ports.
pub struct ClicSanteApi {
    client: Client,
    base_url: String,
}

impl ClicSanteApi {
    /// Create an API client pointed at the production endpoints.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BASE_URL)
    }

    /// Create an API client with a custom base URL (for tests against a
    /// mock server).
    #[must_use]
    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl GeocodePort for ClicSanteApi {
    async fn geocode(&self, postal_code: &str) -> Result<Coordinate, PortError> {
        let response = fetch_json::<GeocodeResponse>(
            self.client
                .get(format!("{}/geocode", self.base_url))
                .query(&[("address", postal_code)]),
        )
        .await?;

        let first = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| PortError::GeocodeNotFound(postal_code.to_owned()))?;

        Ok(Coordinate {
            latitude: first.geometry.location.lat,
            longitude: first.geometry.location.lng,
        })
    }
}

#[async_trait]
impl DirectoryPort for ClicSanteApi {
    async fn places_page(&self, query: &PlacesQuery, page: u32) -> Result<PlacesPage, PortError> {
        let response = fetch_json::<SearchResponse>(
            self.client
                .get(format!("{}/availabilities", self.base_url))
                .query(&[
                    ("dateStart", query.window.start.format(DATE_FORMAT).to_string()),
                    ("dateStop", query.window.end.format(DATE_FORMAT).to_string()),
                    ("latitude", query.coordinate.latitude.to_string()),
                    ("longitude", query.coordinate.longitude.to_string()),
                    ("maxDistance", query.max_distance_km.to_string()),
                    ("postalCode", query.postal_code.clone()),
                    ("page", page.to_string()),
                    ("serviceUnified", SERVICE_UNIFIED.to_string()),
                ]),
        )
        .await?;

        let places = response
            .places
            .into_iter()
            .map(|entry| Place {
                id: PlaceId(entry.id.to_string()),
                establishment: EstablishmentId(entry.establishment.to_string()),
                service_id: None,
                name: entry.name_fr,
                address: entry.formatted_address,
                distance_km: None,
                availabilities: Vec::new(),
            })
            .collect();

        let distances = response
            .distance_by_places
            .into_iter()
            .map(|(id, km)| (PlaceId(id), km))
            .collect();

        Ok(PlacesPage { places, distances })
    }

    async fn first_service(
        &self,
        establishment: &EstablishmentId,
    ) -> Result<ServiceId, PortError> {
        let services = fetch_json::<Vec<ServiceEntry>>(self.client.get(format!(
            "{}/establishments/{establishment}/services",
            self.base_url
        )))
        .await?;

        services
            .first()
            .map(|entry| ServiceId(entry.id))
            .ok_or_else(|| PortError::NoService(establishment.clone()))
    }
}

#[async_trait]
impl SchedulePort for ClicSanteApi {
    async fn availabilities(
        &self,
        place: &Place,
        service: ServiceId,
        window: DateWindow,
    ) -> Result<Vec<NaiveDate>, PortError> {
        let response = fetch_json::<ScheduleResponse>(
            self.client
                .get(format!(
                    "{}/establishments/{}/schedules/public",
                    self.base_url, place.establishment
                ))
                .query(&[
                    ("dateStart", window.start.format(DATE_FORMAT).to_string()),
                    ("dateStop", window.end.format(DATE_FORMAT).to_string()),
                    ("service", service.to_string()),
                    ("timezone", TIMEZONE.to_owned()),
                    ("places", place.id.to_string()),
                    ("filter1", String::from("1")),
                    ("filter2", String::from("0")),
                ]),
        )
        .await?;

        let mut dates = Vec::with_capacity(response.availabilities.len());
        for raw in response.availabilities {
            dates.push(NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(PortError::from)?);
        }

        Ok(dates)
    }
}

/// Bundle the Clic Santé implementation of all three backend ports.
#[must_use]
pub fn backend(client: Client) -> Backend {
    let api = Arc::new(ClicSanteApi::new(client));

    Backend {
        geocode: Arc::clone(&api) as Arc<dyn GeocodePort>,
        directory: Arc::clone(&api) as Arc<dyn DirectoryPort>,
        schedule: api,
    }
}

/// Build the HTTP client used for all API calls, with the fixed
/// identification headers attached to every request.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] when the client cannot be
/// constructed.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent("rdvwatch/0.1")
        .default_headers(default_headers())
        .build()
}

/// Fixed headers every Clic Santé request carries: the static public
/// credential, a role marker, and a product marker.
#[must_use]
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static(AUTH_BASIC));
    headers.insert("x-trimoz-role", HeaderValue::from_static("public"));
    headers.insert("product", HeaderValue::from_static("clicsante"));
    headers
}

/// Booking-portal URL for a place, pre-filled with the unified service and
/// the watched postal code.
#[must_use]
pub fn booking_url(place: &Place, postal_code: &str) -> String {
    format!(
        "{PORTAL_URL}/{}/take-appt?unifiedService={SERVICE_UNIFIED}&portalPlace={}&portalPostalCode={postal_code}&lang=fr",
        place.establishment, place.id
    )
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_url_round_trip() {
        let place = Place {
            id: PlaceId(String::from("P1")),
            establishment: EstablishmentId(String::from("E1")),
            service_id: None,
            name: String::from("Clinique"),
            address: String::new(),
            distance_km: None,
            availabilities: Vec::new(),
        };

        assert_eq!(
            booking_url(&place, "J0J0J0"),
            "https://clients3.clicsante.ca/E1/take-appt?unifiedService=237&portalPlace=P1&portalPostalCode=J0J0J0&lang=fr"
        );
    }
}
