//! Filter and ordering policy applied to a refreshed catalog.

use chrono::NaiveDate;

use crate::model::Place;

/// Keep only the places that qualify and order them by distance.
///
/// A place qualifies when it has at least one open date and, when
/// `specific_date` is set, offers exactly that date; otherwise its earliest
/// open date must be at most `tolerance_days` days after `today`
/// (day-granularity, boundary inclusive). Survivors are sorted by ascending
/// distance; a place without a reported distance sorts last.
#[must_use]
pub fn select(
    mut places: Vec<Place>,
    today: NaiveDate,
    tolerance_days: i64,
    specific_date: Option<NaiveDate>,
) -> Vec<Place> {
    places.retain(|place| match (specific_date, place.availabilities.first()) {
        (_, None) => false,
        (Some(date), Some(_)) => place.availabilities.contains(&date),
        (None, Some(first)) => (*first - today).num_days() <= tolerance_days,
    });

    places.sort_by(|left, right| sort_distance(left).total_cmp(&sort_distance(right)));

    places
}

// Missing distances sort after every reported distance.
fn sort_distance(place: &Place) -> f64 {
    place.distance_km.unwrap_or(f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::model::{EstablishmentId, PlaceId, ServiceId};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid date")
    }

    fn day(offset: i64) -> NaiveDate {
        today() + Duration::days(offset)
    }

    fn place(id: &str, distance_km: Option<f64>, availabilities: Vec<NaiveDate>) -> Place {
        Place {
            id: PlaceId(id.to_owned()),
            establishment: EstablishmentId(format!("est-{id}")),
            service_id: Some(ServiceId(500)),
            name: format!("Clinique {id}"),
            address: String::from("1 Rue Principale"),
            distance_km,
            availabilities,
        }
    }

    #[test]
    fn tolerance_keeps_the_boundary_and_drops_beyond() {
        let places = vec![
            place("immediate", Some(9.0), vec![day(0), day(40)]),
            place("edge", Some(3.0), vec![day(5)]),
            place("late", Some(1.0), vec![day(6)]),
        ];

        let selected = select(places, today(), 5, None);
        let ids: Vec<&str> = selected.iter().map(|p| p.id.0.as_str()).collect();

        assert_eq!(ids, vec!["edge", "immediate"]);
    }

    #[test]
    fn places_without_openings_are_dropped() {
        let places = vec![
            place("empty", Some(1.0), Vec::new()),
            place("open", Some(2.0), vec![day(1)]),
        ];

        let selected = select(places, today(), 5, None);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id.0, "open");
    }

    #[test]
    fn specific_date_matches_exactly_regardless_of_earliest() {
        let wanted = day(30);
        let places = vec![
            place("offers-it", Some(8.0), vec![day(20), wanted]),
            place("soon-but-not-it", Some(1.0), vec![day(1)]),
            place("empty", Some(0.5), Vec::new()),
        ];

        let selected = select(places, today(), 5, Some(wanted));
        let ids: Vec<&str> = selected.iter().map(|p| p.id.0.as_str()).collect();

        assert_eq!(ids, vec!["offers-it"]);
    }

    #[test]
    fn unknown_distance_sorts_last() {
        let places = vec![
            place("unknown", None, vec![day(1)]),
            place("far", Some(25.0), vec![day(1)]),
            place("near", Some(0.4), vec![day(1)]),
        ];

        let selected = select(places, today(), 5, None);
        let ids: Vec<&str> = selected.iter().map(|p| p.id.0.as_str()).collect();

        assert_eq!(ids, vec!["near", "far", "unknown"]);
    }
}
