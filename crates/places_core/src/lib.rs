//! Core domain logic for the saved-places map app.
//! This crate is the single source of truth for place data and its persistence.

pub mod db;
pub mod location;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;

pub use location::{LocationError, LocationProvider, LocationTracker, PermissionStatus};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::place::{Coordinates, Place, PlaceId, PlacePatch, DESC_MAX_CHARS, TITLE_MAX_CHARS};
pub use model::region::{CameraMove, MapRegion};
pub use service::place_service::{
    focus_from_params, focus_on, format_coordinates, format_timestamp, Clock, PlaceDraft,
    PlaceService, ServiceError, SystemClock,
};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError, StorageResult};
pub use store::{
    decode_places, encode_places, CodecError, PlaceStore, StoreError, StoreResult,
    SubscriptionId, PLACES_STORAGE_KEY,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
