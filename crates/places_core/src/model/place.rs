//! Place domain model.
//!
//! # Responsibility
//! - Define the canonical saved-place record persisted by the store.
//! - Define the partial patch shape accepted by edits.
//!
//! # Invariants
//! - `id`, `lat`, `lng` and `created_at` never change after creation.
//! - Only `title` and `desc` are mutable, and only through `PlacePatch`.
//! - Wire names match the persisted JSON blob (`createdAt` in camelCase).

use serde::{Deserialize, Serialize};

/// Opaque stable identifier for a saved place.
///
/// Generated ids are decimal epoch milliseconds, but callers must not parse
/// them; imported records may carry any string.
pub type PlaceId = String;

/// Upper bound for `title` length enforced by the service layer.
pub const TITLE_MAX_CHARS: usize = 50;
/// Upper bound for `desc` length enforced by the service layer.
pub const DESC_MAX_CHARS: usize = 200;

/// Latitude/longitude pair reported by the device location service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `true` for finite values with `|lat| <= 90` and `|lng| <= 180`.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

/// User-saved point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    /// Display name. Never empty when created through `PlaceService`.
    pub title: String,
    /// Free text; empty string when the user left it blank.
    #[serde(default)]
    pub desc: String,
    pub lat: f64,
    pub lng: f64,
    /// ISO-8601 UTC timestamp, millisecond precision.
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Place {
    /// Builds a place from already-assigned identity fields.
    ///
    /// No validation happens here; the store accepts whatever it is given.
    pub fn new(
        id: impl Into<PlaceId>,
        title: impl Into<String>,
        desc: impl Into<String>,
        coordinates: Coordinates,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            desc: desc.into(),
            lat: coordinates.latitude,
            lng: coordinates.longitude,
            created_at: created_at.into(),
        }
    }

    /// `false` when `lat` or `lng` is NaN or infinite; JSON numbers cannot hold those.
    pub fn has_finite_position(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    /// Merges mutable fields from `patch`. Identity and position are untouched.
    pub fn apply(&mut self, patch: &PlacePatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(desc) = &patch.desc {
            self.desc = desc.clone();
        }
    }
}

/// Partial update for a place. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacePatch {
    pub title: Option<String>,
    pub desc: Option<String>,
}

impl PlacePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            desc: None,
        }
    }

    pub fn desc(desc: impl Into<String>) -> Self {
        Self {
            title: None,
            desc: Some(desc.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.desc.is_none()
    }
}
