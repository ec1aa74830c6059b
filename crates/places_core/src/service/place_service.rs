//! Place use-case service.
//!
//! # Responsibility
//! - Turn user form input into store calls (save, edit, delete, refresh).
//! - Assign identity (`id`, `createdAt`) at creation time.
//! - Build camera requests for "show this place on the map".
//!
//! # Invariants
//! - Titles are trimmed and must be non-empty; lengths follow the form caps.
//! - Generated ids are epoch milliseconds, bumped until unique.
//! - Service APIs never bypass store persistence contracts.

use crate::model::place::{Coordinates, Place, PlacePatch, DESC_MAX_CHARS, TITLE_MAX_CHARS};
use crate::model::region::{CameraMove, MapRegion};
use crate::storage::KeyValueStorage;
use crate::store::{PlaceStore, StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Zoom span used when centering on a saved place.
pub const FOCUS_DELTA: f64 = 0.004;
/// Camera animation length when centering on a saved place.
pub const FOCUS_DURATION_MS: u32 = 800;
const MAX_ID_ATTEMPTS: u32 = 16;

/// Service error for place use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Save attempted before any location fix was acquired.
    MissingLocation,
    /// Coordinates are not finite or out of the WGS84 range.
    InvalidCoordinates(Coordinates),
    /// Title is empty after trimming.
    EmptyTitle,
    /// Field exceeds its form cap (in characters).
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLocation => write!(f, "current location is not available yet"),
            Self::InvalidCoordinates(coordinates) => write!(
                f,
                "invalid coordinates: lat={} lng={}",
                coordinates.latitude, coordinates.longitude
            ),
            Self::EmptyTitle => write!(f, "place title is required"),
            Self::TooLong { field, max, actual } => {
                write!(f, "{field} is too long: {actual} characters (max {max})")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Raw form input for a new or edited place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceDraft {
    pub title: String,
    pub desc: String,
}

impl PlaceDraft {
    pub fn new(title: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            desc: desc.into(),
        }
    }

    /// Returns trimmed `(title, desc)` or the first rule violation.
    pub fn normalize(&self) -> Result<(String, String), ServiceError> {
        let title = self.title.trim();
        let desc = self.desc.trim();
        if title.is_empty() {
            return Err(ServiceError::EmptyTitle);
        }
        check_length("title", title, TITLE_MAX_CHARS)?;
        check_length("desc", desc, DESC_MAX_CHARS)?;
        Ok((title.to_string(), desc.to_string()))
    }
}

/// Time source for identity assignment.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Use-case facade over a shared `PlaceStore`.
pub struct PlaceService<S: KeyValueStorage> {
    store: Arc<PlaceStore<S>>,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStorage> PlaceService<S> {
    pub fn new(store: Arc<PlaceStore<S>>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<PlaceStore<S>>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<PlaceStore<S>> {
        &self.store
    }

    /// Saves a new place at `coordinates` and returns it.
    ///
    /// # Contract
    /// - `coordinates = None` fails with `MissingLocation` before validation.
    /// - Non-finite or out-of-range coordinates fail with `InvalidCoordinates`.
    /// - New place is prepended (newest first).
    pub fn save_place(
        &self,
        draft: &PlaceDraft,
        coordinates: Option<Coordinates>,
    ) -> Result<Place, ServiceError> {
        let coordinates = coordinates.ok_or(ServiceError::MissingLocation)?;
        if !coordinates.is_valid() {
            return Err(ServiceError::InvalidCoordinates(coordinates));
        }
        let (title, desc) = draft.normalize()?;

        let now = self.clock.now();
        let created_at = format_timestamp(now);
        let mut candidate = now.timestamp_millis();

        for _ in 0..MAX_ID_ATTEMPTS {
            while self.store.get(&candidate.to_string()).is_some() {
                candidate += 1;
            }
            let place = Place::new(
                candidate.to_string(),
                title.as_str(),
                desc.as_str(),
                coordinates,
                created_at.as_str(),
            );
            match self.store.add(place.clone()) {
                Ok(()) => {
                    info!("event=place_save module=service status=ok");
                    return Ok(place);
                }
                // Another writer took the id between the check and the add.
                Err(StoreError::DuplicateId(_)) => candidate += 1,
                Err(err) => {
                    warn!("event=place_save module=service status=error error={err}");
                    return Err(err.into());
                }
            }
        }

        Err(StoreError::DuplicateId(candidate.to_string()).into())
    }

    /// Replaces title and description of an existing place.
    ///
    /// A missing id is not an error (store no-op semantics).
    pub fn edit_place(&self, id: &str, draft: &PlaceDraft) -> Result<(), ServiceError> {
        let (title, desc) = draft.normalize()?;
        let patch = PlacePatch {
            title: Some(title),
            desc: Some(desc),
        };
        self.store.update(id, &patch).map_err(|err| {
            warn!("event=place_edit module=service status=error error={}", err);
            ServiceError::from(err)
        })
    }

    /// Deletes one place. Deleting a missing id succeeds.
    pub fn delete_place(&self, id: &str) -> StoreResult<()> {
        self.store.remove(id)
    }

    /// Deletes every saved place.
    pub fn clear_places(&self) -> StoreResult<()> {
        self.store.clear_all()
    }

    /// Re-reads durable state (pull-to-refresh).
    pub fn refresh(&self) -> StoreResult<()> {
        self.store.reload()
    }

    pub fn places(&self) -> Vec<Place> {
        self.store.places()
    }

    pub fn place(&self, id: &str) -> Option<Place> {
        self.store.get(id)
    }

    /// Camera request centering the map on a saved place.
    pub fn focus_request(&self, id: &str) -> Option<CameraMove> {
        self.store.get(id).map(|place| focus_on(place.coordinates()))
    }
}

/// Camera request centering on `coordinates` at place-detail zoom.
pub fn focus_on(coordinates: Coordinates) -> CameraMove {
    CameraMove {
        region: MapRegion::around(coordinates, FOCUS_DELTA),
        duration_ms: FOCUS_DURATION_MS,
    }
}

/// Parses the `focusLat`/`focusLng` navigation parameters.
///
/// Returns `None` when either value is missing, unparsable, non-finite or
/// out of range.
pub fn focus_from_params(lat: Option<&str>, lng: Option<&str>) -> Option<CameraMove> {
    let latitude = lat?.trim().parse::<f64>().ok()?;
    let longitude = lng?.trim().parse::<f64>().ok()?;
    let coordinates = Coordinates::new(latitude, longitude);
    if !coordinates.is_valid() {
        return None;
    }
    Some(focus_on(coordinates))
}

/// Formats a creation timestamp as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Formats coordinates for display with `decimals` fraction digits.
pub fn format_coordinates(coordinates: Coordinates, decimals: usize) -> String {
    format!(
        "{:.*}, {:.*}",
        decimals, coordinates.latitude, decimals, coordinates.longitude
    )
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ServiceError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ServiceError::TooLong { field, max, actual });
    }
    Ok(())
}
