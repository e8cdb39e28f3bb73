//! Active trip sessions.
//!
//! Each running trip gets its own session holding its [`TripProgress`]
//! behind an async mutex, so check-ins for one trip are strictly serialized
//! while different trips never contend. Sessions that see no activity for
//! the configured idle period are dropped, which is how abandoned trips are
//! cleaned up. Nothing is lost by dropping a session: progress is always
//! rebuilt from persisted checkpoints on the next [`TripSessions::start`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use moka::future::Cache as MokaCache;
use moka::notification::RemovalCause;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::checkpoint::{CheckInAttempt, CheckInError, CheckInReceipt, RequestId, TripProgress};
use crate::config::EngineConfig;
use crate::itinerary::{Itinerary, LocationPoint};
use crate::store::{CheckpointStore, StoreError};

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// No session is running for this request
    #[error("no active trip for request {0}")]
    UnknownTrip(RequestId),

    /// A session is already running for this request
    #[error("trip for request {0} is already active")]
    AlreadyActive(RequestId),

    /// The engine rejected the operation
    #[error(transparent)]
    CheckIn(#[from] CheckInError),

    /// Checkpoints could not be loaded or saved
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One running trip.
#[derive(Debug)]
struct TripSession {
    progress: Mutex<TripProgress>,
    /// Geofence radius read when the trip started
    radius_km: f64,
    /// Set under the progress lock once the session leaves the registry
    closed: AtomicBool,
}

/// Rebuild a trip's progress from its persisted checkpoints.
fn open_session<S: CheckpointStore>(
    store: &S,
    request_id: RequestId,
    itinerary: &Itinerary,
    radius_km: f64,
) -> Result<Arc<TripSession>, SessionError> {
    let existing = store.load(&request_id)?;
    let progress = TripProgress::for_itinerary(request_id, itinerary, existing)?;
    Ok(Arc::new(TripSession {
        progress: Mutex::new(progress),
        radius_km,
        closed: AtomicBool::new(false),
    }))
}

/// Registry of running trips.
pub struct TripSessions<S> {
    sessions: MokaCache<RequestId, Arc<TripSession>>,
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: CheckpointStore> TripSessions<S> {
    /// Create a registry persisting through `store`.
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a registry sharing an existing store.
    pub fn with_shared_store(store: Arc<S>, config: EngineConfig) -> Self {
        let sessions = MokaCache::builder()
            .max_capacity(config.max_active_trips)
            .time_to_idle(config.session_idle())
            .eviction_listener(|request_id: Arc<RequestId>, _, cause| {
                if cause == RemovalCause::Expired {
                    info!(request_id = %request_id, "trip session expired after inactivity");
                }
            })
            .build();

        Self {
            sessions,
            store,
            config,
        }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start (or resume) a trip.
    ///
    /// Loads any checkpoints already persisted for the request and rebuilds
    /// progress from them. The geofence radius is fixed for the life of the
    /// session from the configuration at this point.
    ///
    /// # Errors
    ///
    /// - `AlreadyActive` if a session for this request is running
    /// - `Store` if persisted checkpoints cannot be read
    /// - `CheckIn` if the itinerary and checkpoints are inconsistent
    pub async fn start(
        &self,
        request_id: RequestId,
        itinerary: &Itinerary,
    ) -> Result<TripProgress, SessionError> {
        let radius_km = self.config.geofence_radius_km;
        let store = Arc::clone(&self.store);
        let id = request_id.clone();

        let entry = self
            .sessions
            .entry(request_id.clone())
            .or_try_insert_with(async move { open_session(&*store, id, itinerary, radius_km) })
            .await
            .map_err(|e| (*e).clone())?;

        if !entry.is_fresh() {
            return Err(SessionError::AlreadyActive(request_id));
        }

        let progress = entry.value().progress.lock().await.clone();
        info!(
            %request_id,
            locations = progress.locations().len(),
            current_index = progress.current_index(),
            radius_km,
            "trip session started"
        );
        Ok(progress)
    }

    async fn session(&self, request_id: &RequestId) -> Result<Arc<TripSession>, SessionError> {
        self.sessions
            .get(request_id)
            .await
            .ok_or_else(|| SessionError::UnknownTrip(request_id.clone()))
    }

    /// Check in at the trip's current target.
    ///
    /// The checkpoint is persisted before progress advances. If persisting
    /// fails nothing changes and the attempt can be retried. When the
    /// destination is checked in the session is closed.
    pub async fn check_in(
        &self,
        request_id: &RequestId,
        attempt: &CheckInAttempt,
    ) -> Result<CheckInReceipt, SessionError> {
        let session = self.session(request_id).await?;
        self.check_in_on(&session, request_id, attempt).await
    }

    async fn check_in_on(
        &self,
        session: &TripSession,
        request_id: &RequestId,
        attempt: &CheckInAttempt,
    ) -> Result<CheckInReceipt, SessionError> {
        let mut progress = session.progress.lock().await;
        // Abandoned while waiting for the lock
        if session.closed.load(Ordering::Acquire) {
            return Err(SessionError::UnknownTrip(request_id.clone()));
        }

        let checkpoint = progress
            .validate_check_in(attempt, session.radius_km, Utc::now())
            .inspect_err(|e| debug!(%request_id, error = %e, "check-in rejected"))?;

        self.store.append(request_id, &checkpoint)?;
        let receipt = progress.record(checkpoint)?;
        drop(progress);

        if receipt.progress.is_completed() {
            self.sessions.invalidate(request_id).await;
            info!(%request_id, "trip session closed");
        }

        Ok(receipt)
    }

    /// Returns the location the trip must check in at next.
    pub async fn current_target(&self, request_id: &RequestId) -> Result<LocationPoint, SessionError> {
        let session = self.session(request_id).await?;
        let progress = session.progress.lock().await;
        Ok(progress.current_target()?.clone())
    }

    /// Returns a copy of a running trip's progress.
    pub async fn snapshot(&self, request_id: &RequestId) -> Option<TripProgress> {
        let session = self.sessions.get(request_id).await?;
        let progress = session.progress.lock().await;
        Some(progress.clone())
    }

    /// Drop a running trip. Returns false if it was not running.
    ///
    /// Persisted checkpoints are kept, so the trip can be started again.
    /// Waits for any in-flight check-in on the trip to finish first.
    pub async fn abandon(&self, request_id: &RequestId) -> bool {
        let Some(session) = self.sessions.get(request_id).await else {
            return false;
        };
        let _progress = session.progress.lock().await;
        session.closed.store(true, Ordering::Release);

        let removed = self.sessions.remove(request_id).await.is_some();
        if removed {
            info!(%request_id, "trip session abandoned");
        }
        removed
    }

    /// Returns the number of running trips.
    pub async fn active_count(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }
}
