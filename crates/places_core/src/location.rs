//! Device location acquisition contract.
//!
//! # Responsibility
//! - Gate position requests behind the foreground permission.
//! - Serialize requests per tap: one outstanding request at a time.
//! - Translate a fix into the camera move shown by the map.
//!
//! # Invariants
//! - `busy` is released on every exit path, including provider errors.
//! - `last_fix` only changes after a successful position read.
//!
//! Core-only helper: `places_ffi` does not export it, because a Flutter
//! shell runs the permission prompt and position read asynchronously on the
//! Dart side. Rust hosts embed `LocationTracker` with their own provider.

use crate::model::place::Coordinates;
use crate::model::region::{CameraMove, MapRegion};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Zoom span after locating the user.
pub const LOCATE_DELTA: f64 = 0.005;
/// Camera animation length after locating the user.
pub const LOCATE_DURATION_MS: u32 = 1000;

/// Foreground location permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// A previous request is still outstanding.
    Busy,
    /// User did not grant foreground location access.
    PermissionDenied,
    /// Platform could not produce a fix.
    Unavailable(String),
}

impl Display for LocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "a location request is already in progress"),
            Self::PermissionDenied => write!(f, "location permission was not granted"),
            Self::Unavailable(message) => write!(f, "location unavailable: {message}"),
        }
    }
}

impl Error for LocationError {}

/// Platform geolocation service.
pub trait LocationProvider {
    /// Prompts for (or reports) foreground permission.
    fn request_permission(&self) -> PermissionStatus;
    /// Reads a high-accuracy position fix.
    fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Per-tap location requester remembering the last fix.
pub struct LocationTracker<P: LocationProvider> {
    provider: P,
    busy: AtomicBool,
    last_fix: Mutex<Option<Coordinates>>,
}

impl<P: LocationProvider> LocationTracker<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            busy: AtomicBool::new(false),
            last_fix: Mutex::new(None),
        }
    }

    /// Acquires the current position and returns the camera move to it.
    ///
    /// # Errors
    /// - `Busy` while another call is in flight.
    /// - `PermissionDenied` unless permission is `Granted`.
    /// - Provider errors unchanged.
    pub fn locate(&self) -> Result<CameraMove, LocationError> {
        let _busy = BusyGuard::acquire(&self.busy).ok_or(LocationError::Busy)?;
        let started_at = Instant::now();

        let permission = self.provider.request_permission();
        if permission != PermissionStatus::Granted {
            warn!(
                "event=location_request module=location status=error error_code=permission_{}",
                permission.as_str()
            );
            return Err(LocationError::PermissionDenied);
        }

        let fix = self.provider.current_position().map_err(|err| {
            warn!(
                "event=location_request module=location status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            err
        })?;

        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner) = Some(fix);
        info!(
            "event=location_request module=location status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );

        Ok(CameraMove {
            region: MapRegion::around(fix, LOCATE_DELTA),
            duration_ms: LOCATE_DURATION_MS,
        })
    }

    /// Most recent successful fix, used as the position of a new place.
    pub fn last_fix(&self) -> Option<Coordinates> {
        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
