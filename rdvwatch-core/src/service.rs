//! Discovery pipeline: catalog building, availability refresh, selection.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use tracing::{info, warn};

use crate::model::{Coordinate, DateWindow, Place, WatchOptions};
use crate::ports::{Backend, PlacesQuery, PortError};
use crate::select::select;

/// Case-insensitive name fragment excluding a place from the catalog.
const EXCLUDED_NAME_FRAGMENT: &str = "astrazeneca";

/// Drives one discovery pass end-to-end against a [`Backend`].
///
/// The catalog is rebuilt from scratch on every pass; only the coordinate
/// per postal code is memoized for the process lifetime.
pub struct WatchService {
    backend: Backend,
    geocode_cache: Mutex<HashMap<String, Coordinate>>,
}

impl WatchService {
    /// Create a new service bound to the provided backend.
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            geocode_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Run one full pass: geocode, build the catalog, refresh
    /// availabilities, and select the qualifying places in output order.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::GeocodeNotFound`] (or a transport error from the
    /// geocoder) when no coordinate can be resolved, which makes the whole
    /// pass impossible. Every failure below that level is logged and
    /// degraded instead of propagated.
    pub async fn run_pass(&self, options: &WatchOptions) -> Result<Vec<Place>, PortError> {
        let window = DateWindow::from_today();
        let coordinate = self.coordinate_for(&options.postal_code).await?;

        let catalog = self.build_catalog(coordinate, window, options).await;
        info!(
            count = catalog.len(),
            max_distance_km = options.max_distance_km,
            postal_code = %options.postal_code,
            "checking locations for availabilities"
        );

        let catalog = self.fetch_availabilities(catalog, window).await;

        Ok(select(
            catalog,
            window.start,
            options.tolerance_days,
            options.specific_date,
        ))
    }

    /// Paginate the location search and resolve each place's service id.
    ///
    /// Pagination is sequential and stops at the first empty page; a
    /// page-level failure is logged and ends pagination the same way.
    /// Places whose name contains the excluded fragment, or whose id was
    /// already collected, are skipped. Service ids are then resolved for
    /// every retained place concurrently; a failure only affects its own
    /// place, which keeps a `None` service id.
    pub async fn build_catalog(
        &self,
        coordinate: Coordinate,
        window: DateWindow,
        options: &WatchOptions,
    ) -> Vec<Place> {
        let query = PlacesQuery {
            coordinate,
            window,
            max_distance_km: options.max_distance_km,
            postal_code: options.postal_code.clone(),
        };

        info!(postal_code = %options.postal_code, "populating locations");

        let mut places: Vec<Place> = Vec::new();
        let mut seen = HashSet::new();
        let mut distances = HashMap::new();

        let mut page = 0u32;
        loop {
            let listing = match self.backend.directory.places_page(&query, page).await {
                Ok(listing) => listing,
                Err(err) => {
                    // A failed page reads the same as an exhausted listing.
                    warn!(page, error = %err, "location search page failed, ending pagination");
                    break;
                }
            };

            if listing.places.is_empty() {
                break;
            }

            distances.extend(listing.distances);
            places.extend(listing.places.into_iter().filter(|place| {
                !place.name.to_lowercase().contains(EXCLUDED_NAME_FRAGMENT)
                    && seen.insert(place.id.clone())
            }));

            page += 1;
        }

        for place in &mut places {
            place.distance_km = distances.get(&place.id).copied();
        }

        // The service id is required before a place's schedule can be queried.
        join_all(places.into_iter().map(|mut place| async move {
            match self
                .backend
                .directory
                .first_service(&place.establishment)
                .await
            {
                Ok(service) => place.service_id = Some(service),
                Err(err) => {
                    warn!(
                        establishment = %place.establishment,
                        error = %err,
                        "could not resolve service id, ignoring this establishment"
                    );
                    place.service_id = None;
                }
            }
            place
        }))
        .await
    }

    /// Refresh the open dates of every place concurrently.
    ///
    /// The batch settles even when individual fetches fail: a failing place
    /// (or one without a service id) ends up with no availabilities and the
    /// others are unaffected.
    pub async fn fetch_availabilities(&self, places: Vec<Place>, window: DateWindow) -> Vec<Place> {
        join_all(places.into_iter().map(|mut place| async move {
            place.availabilities = match place.service_id {
                None => Vec::new(),
                Some(service) => match self
                    .backend
                    .schedule
                    .availabilities(&place, service, window)
                    .await
                {
                    Ok(dates) => dates,
                    Err(err) => {
                        warn!(
                            place = %place.id,
                            establishment = %place.establishment,
                            error = %err,
                            "could not fetch availabilities, ignoring this establishment"
                        );
                        Vec::new()
                    }
                },
            };
            place
        }))
        .await
    }

    /// Memoized geocoding; the coordinate for a postal code does not change
    /// within a process lifetime.
    async fn coordinate_for(&self, postal_code: &str) -> Result<Coordinate, PortError> {
        if let Some(coordinate) = self.cache_lock().get(postal_code) {
            return Ok(*coordinate);
        }

        let coordinate = self.backend.geocode.geocode(postal_code).await?;
        self.cache_lock()
            .insert(postal_code.to_owned(), coordinate);

        Ok(coordinate)
    }

    fn cache_lock(&self) -> MutexGuard<'_, HashMap<String, Coordinate>> {
        self.geocode_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
