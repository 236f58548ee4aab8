//! Command-line watcher polling Clic Santé for nearby appointment openings.

mod output;

use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use rdvwatch_core::{model::WatchOptions, service::WatchService};
use rdvwatch_provider_clicsante as clicsante;
use tokio::time::sleep;
use tracing::{info, warn};

/// Watch Clic Santé for appointment openings near a postal code.
#[derive(Debug, Parser)]
#[command(name = "rdvwatch", version, about)]
struct Cli {
    /// Postal code the search is centred on.
    #[arg(long = "postal-code")]
    postal_code: String,

    /// Maximum days from today an earliest opening may be and still match.
    #[arg(long, default_value_t = 5)]
    tolerance: i64,

    /// Search radius in kilometres.
    #[arg(long, default_value_t = 10.0)]
    distance: f64,

    /// Minutes to wait between polling passes.
    #[arg(long, default_value_t = 1)]
    poll: u64,

    /// Match only places offering exactly this date (YYYY-MM-DD).
    #[arg(long = "specific-date")]
    specific_date: Option<NaiveDate>,
}

impl Cli {
    fn into_options(self) -> WatchOptions {
        WatchOptions {
            postal_code: self.postal_code,
            tolerance_days: self.tolerance,
            max_distance_km: self.distance,
            poll_minutes: self.poll,
            specific_date: self.specific_date,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let options = Cli::parse().into_options();

    let client = clicsante::http_client()?;
    let service = WatchService::new(clicsante::backend(client));

    // One pass, then wait, forever; the process runs until killed.
    loop {
        match service.run_pass(&options).await {
            Ok(places) => {
                for place in &places {
                    output::announce(place, &options.postal_code);
                }
            }
            Err(err) => warn!(error = %err, "pass failed, retrying on the next poll"),
        }

        info!(
            minutes = options.poll_minutes,
            "waiting before checking again"
        );
        sleep(Duration::from_secs(options.poll_minutes * 60)).await;
    }
}
