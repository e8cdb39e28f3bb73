use tracing_subscriber::EnvFilter;

use trip_engine::config::EngineConfig;
use trip_engine::replay::{Scenario, replay};
use trip_engine::session::TripSessions;
use trip_engine::store::{JsonCheckpointStore, JsonStoreConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: trip-engine <scenario.json>");
        std::process::exit(2);
    };

    // Geofence radius, idle timeout and storage come from TRIP_* variables
    let config = EngineConfig::from_env();

    let contents = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Failed to read {path}: {e}");
        std::process::exit(1);
    });
    let scenario = Scenario::from_json(&contents).unwrap_or_else(|e| {
        eprintln!("Failed to parse {path}: {e}");
        std::process::exit(1);
    });

    let store = JsonCheckpointStore::new(JsonStoreConfig::new(&config.checkpoint_dir));
    println!(
        "Replaying {} trip(s), geofence {} km, checkpoints in {}",
        scenario.trips.len(),
        config.geofence_radius_km,
        store.dir().display()
    );

    let sessions = TripSessions::new(store, config);
    let reports = replay(&sessions, &scenario).await;

    println!();
    for report in &reports {
        if let Some(error) = &report.error {
            println!("{}: failed: {error}", report.request_id);
            continue;
        }
        println!(
            "{}: {:.2} km, {} checkpoint(s) accepted, {} rejected{}",
            report.request_id,
            report.estimated_distance_km,
            report.accepted.len(),
            report.rejected.len(),
            if report.completed { ", completed" } else { "" }
        );
        for reason in &report.rejected {
            println!("    rejected: {reason}");
        }
    }
}
