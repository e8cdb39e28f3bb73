//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Configuration for running trips.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Geofence radius around each location (kilometres).
    /// A check-in further than this from the target is rejected.
    pub geofence_radius_km: f64,

    /// How long a trip session may sit idle before it is treated as
    /// abandoned and dropped (seconds).
    pub session_idle_secs: u64,

    /// Maximum number of trips held in memory at once.
    pub max_active_trips: u64,

    /// Directory for the JSON checkpoint store.
    pub checkpoint_dir: PathBuf,
}

impl EngineConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        geofence_radius_km: f64,
        session_idle_secs: u64,
        max_active_trips: u64,
        checkpoint_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            geofence_radius_km,
            session_idle_secs,
            max_active_trips,
            checkpoint_dir: checkpoint_dir.into(),
        }
    }

    /// Build a configuration from `TRIP_*` environment variables.
    ///
    /// Missing variables use the default; invalid ones are logged and also
    /// use the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let geofence_radius_km = parse_or(
            &lookup,
            "TRIP_GEOFENCE_RADIUS_KM",
            defaults.geofence_radius_km,
            |v: &f64| v.is_finite() && *v > 0.0,
        );
        let session_idle_secs = parse_or(
            &lookup,
            "TRIP_SESSION_IDLE_SECS",
            defaults.session_idle_secs,
            |v: &u64| *v > 0,
        );
        let max_active_trips = parse_or(
            &lookup,
            "TRIP_MAX_ACTIVE_TRIPS",
            defaults.max_active_trips,
            |v: &u64| *v > 0,
        );
        let checkpoint_dir = lookup("TRIP_CHECKPOINT_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.checkpoint_dir);

        Self {
            geofence_radius_km,
            session_idle_secs,
            max_active_trips,
            checkpoint_dir,
        }
    }

    /// Returns the idle timeout as a Duration.
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

fn parse_or<T, F, V>(lookup: &F, key: &str, default: T, valid: V) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
    F: Fn(&str) -> Option<String>,
    V: Fn(&T) -> bool,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            warn!(key, value = %raw, ?default, "ignoring invalid configuration value");
            default
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            geofence_radius_km: 0.5,
            session_idle_secs: 4 * 60 * 60, // 4 hours
            max_active_trips: 10_000,
            checkpoint_dir: PathBuf::from("checkpoints"),
        }
    }
}
