//! Console and desktop-notification output for matching places.

use notify_rust::Notification;
use rdvwatch_core::model::Place;
use rdvwatch_provider_clicsante::booking_url;
use tracing::warn;

/// Notify the user about a matching place and print its boxed summary.
pub(crate) fn announce(place: &Place, postal_code: &str) {
    if let Some(first) = place.availabilities.first() {
        let message = format!("{} has an availability on {first}", place.name);
        if let Err(err) = Notification::new()
            .summary("rdvwatch")
            .body(&message)
            .sound_name("default")
            .show()
        {
            warn!(error = %err, "could not send desktop notification");
        }
    }

    println!("{}\n", boxed(&summary_lines(place, postal_code)));
}

/// Human-readable summary of a place, one line per fact.
fn summary_lines(place: &Place, postal_code: &str) -> Vec<String> {
    let distance = place
        .distance_km
        .map_or_else(|| String::from("unknown"), |km| format!("{km}km"));

    let dates = place
        .availabilities
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        place.name.clone(),
        place.address.clone(),
        format!("Distance: {distance}"),
        format!("Availabilities: {dates}"),
        booking_url(place, postal_code),
    ]
}

/// Draw the lines inside a box, padded one space on each side.
fn boxed(lines: &[String]) -> String {
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push('┌');
    out.push_str(&"─".repeat(width + 2));
    out.push_str("┐\n");
    for line in lines {
        let padding = width - line.chars().count();
        out.push_str("│ ");
        out.push_str(line);
        out.push_str(&" ".repeat(padding));
        out.push_str(" │\n");
    }
    out.push('└');
    out.push_str(&"─".repeat(width + 2));
    out.push('┘');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rdvwatch_core::model::{EstablishmentId, PlaceId};

    use super::*;

    fn place() -> Place {
        Place {
            id: PlaceId(String::from("P1")),
            establishment: EstablishmentId(String::from("E1")),
            service_id: None,
            name: String::from("Clinique du Plateau"),
            address: String::from("100 Avenue du Parc, Montréal"),
            distance_km: Some(1.4),
            availabilities: vec![NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")],
        }
    }

    #[test]
    fn summary_carries_every_fact_and_the_booking_url() {
        let lines = summary_lines(&place(), "J0J0J0");

        assert_eq!(lines[0], "Clinique du Plateau");
        assert_eq!(lines[2], "Distance: 1.4km");
        assert_eq!(lines[3], "Availabilities: 2024-06-01");
        assert_eq!(
            lines[4],
            "https://clients3.clicsante.ca/E1/take-appt?unifiedService=237&portalPlace=P1&portalPostalCode=J0J0J0&lang=fr"
        );
    }

    #[test]
    fn unknown_distance_is_spelled_out() {
        let mut unknown = place();
        unknown.distance_km = None;

        let lines = summary_lines(&unknown, "J0J0J0");

        assert_eq!(lines[2], "Distance: unknown");
    }

    #[test]
    fn boxed_output_pads_every_line_to_the_longest() {
        let rendered = boxed(&[String::from("abc"), String::from("a")]);
        let rows: Vec<&str> = rendered.lines().collect();

        assert_eq!(rows[0], "┌─────┐");
        assert_eq!(rows[1], "│ abc │");
        assert_eq!(rows[2], "│ a   │");
        assert_eq!(rows[3], "└─────┘");
    }
}
