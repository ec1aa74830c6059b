//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the saved-places use-cases to Dart via FRB.
//! - Own the single process-wide place store.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - All screens share one store, so every mutation is serialized.
//! - Failures are reported in response envelopes, never thrown.

use log::warn;
use once_cell::sync::OnceCell;
use places_core::{
    core_version as core_version_inner, focus_from_params, init_logging as init_logging_inner,
    ping as ping_inner, CameraMove, Coordinates, KeyValueStorage, Place, PlaceDraft,
    PlaceService, PlaceStore, SqliteStorage,
};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

const PLACES_DB_FILE_NAME: &str = "saved_places.sqlite3";
static PLACES_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static PLACE_STORE: OnceCell<Arc<PlaceStore<SqliteStorage>>> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Place row rendered by map markers and the list screen.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceItem {
    pub id: String,
    pub title: String,
    pub desc: String,
    pub lat: f64,
    pub lng: f64,
    /// ISO-8601 UTC creation timestamp.
    pub created_at: String,
}

/// Collection snapshot envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacesListResponse {
    /// Newest first.
    pub items: Vec<PlaceItem>,
    /// `true` while the first load has not finished.
    pub loading: bool,
    /// Store revision the snapshot was taken at.
    pub revision: u64,
    /// Empty on success; otherwise a human-readable failure message.
    pub message: String,
}

/// Mutation result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Affected place id, when known.
    pub place_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl PlaceActionResponse {
    fn success(message: impl Into<String>, place_id: Option<String>) -> Self {
        Self {
            ok: true,
            place_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            place_id: None,
            message: message.into(),
        }
    }
}

/// Camera move for the map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusTarget {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
    pub duration_ms: u32,
}

/// Returns the current collection, loading it on first use.
///
/// # FFI contract
/// - Sync call, DB-backed on first use only.
/// - Unreadable stored data yields an empty list plus a message.
/// - A previous storage read failure is retried before the snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn places_list() -> PlacesListResponse {
    match with_store(|store| {
        if store.has_unresolved_read_failure() {
            if let Err(err) = store.reload() {
                warn!("event=places_list module=ffi status=error error={err}");
            }
        }
        Ok(())
    }) {
        Ok(store) => snapshot(&store),
        Err(message) => PlacesListResponse {
            items: Vec::new(),
            loading: false,
            revision: 0,
            message,
        },
    }
}

/// Re-reads durable state (pull-to-refresh).
#[flutter_rust_bridge::frb(sync)]
pub fn places_reload() -> PlacesListResponse {
    match with_store(|store| store.reload().map_err(|err| err.to_string())) {
        Ok(store) => snapshot(&store),
        Err(message) => {
            let items = current_store()
                .map(|store| to_items(store.places()))
                .unwrap_or_default();
            PlacesListResponse {
                items,
                loading: false,
                revision: places_revision(),
                message: format!("places_reload failed: {message}"),
            }
        }
    }
}

/// Saves a new place at the given coordinates.
///
/// # FFI contract
/// - `latitude`/`longitude` must both be set; otherwise the call fails with
///   a missing-location message.
/// - Returns the generated place id on success.
#[flutter_rust_bridge::frb(sync)]
pub fn places_save(
    title: String,
    desc: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> PlaceActionResponse {
    let coordinates = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
        _ => None,
    };
    let draft = PlaceDraft::new(title, desc);
    match with_service(|service| {
        service
            .save_place(&draft, coordinates)
            .map_err(|err| err.to_string())
    }) {
        Ok(place) => PlaceActionResponse::success("Place saved.", Some(place.id)),
        Err(err) => PlaceActionResponse::failure(format!("places_save failed: {err}")),
    }
}

/// Replaces title and description of one place.
#[flutter_rust_bridge::frb(sync)]
pub fn places_update(id: String, title: String, desc: String) -> PlaceActionResponse {
    let draft = PlaceDraft::new(title, desc);
    match with_service(|service| {
        service
            .edit_place(&id, &draft)
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => PlaceActionResponse::success("Place updated.", Some(id)),
        Err(err) => PlaceActionResponse::failure(format!("places_update failed: {err}")),
    }
}

/// Deletes one place. Deleting an unknown id reports success.
#[flutter_rust_bridge::frb(sync)]
pub fn places_remove(id: String) -> PlaceActionResponse {
    match with_service(|service| service.delete_place(&id).map_err(|err| err.to_string())) {
        Ok(()) => PlaceActionResponse::success("Place deleted.", Some(id)),
        Err(err) => PlaceActionResponse::failure(format!("places_remove failed: {err}")),
    }
}

/// Deletes every place, including unreadable stored data.
#[flutter_rust_bridge::frb(sync)]
pub fn places_clear() -> PlaceActionResponse {
    match open_store().and_then(|store| store.clear_all().map_err(|err| err.to_string())) {
        Ok(()) => PlaceActionResponse::success("All places deleted.", None),
        Err(err) => PlaceActionResponse::failure(format!("places_clear failed: {err}")),
    }
}

/// Store revision; changes whenever the collection changes.
///
/// Returns `0` before the store is opened.
#[flutter_rust_bridge::frb(sync)]
pub fn places_revision() -> u64 {
    current_store().map_or(0, |store| store.revision())
}

/// Camera move centering on a saved place, `None` for unknown ids.
#[flutter_rust_bridge::frb(sync)]
pub fn places_focus(id: String) -> Option<FocusTarget> {
    with_service(|service| Ok(service.focus_request(&id)))
        .ok()
        .flatten()
        .map(to_focus_target)
}

/// Parses `focusLat`/`focusLng` route parameters into a camera move.
#[flutter_rust_bridge::frb(sync)]
pub fn places_focus_from_params(lat: Option<String>, lng: Option<String>) -> Option<FocusTarget> {
    focus_from_params(lat.as_deref(), lng.as_deref()).map(to_focus_target)
}

fn resolve_places_db_path() -> PathBuf {
    PLACES_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("PLACES_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(PLACES_DB_FILE_NAME)
        })
        .clone()
}

fn current_store() -> Option<Arc<PlaceStore<SqliteStorage>>> {
    PLACE_STORE.get().cloned()
}

// Open failures are not cached; the next call retries.
fn open_store() -> Result<Arc<PlaceStore<SqliteStorage>>, String> {
    PLACE_STORE
        .get_or_try_init(|| {
            let storage = SqliteStorage::open(resolve_places_db_path())
                .map_err(|err| format!("places DB open failed: {err}"))?;
            let store = PlaceStore::new(storage);
            if let Err(err) = store.load() {
                warn!("event=places_open module=ffi status=error error={err}");
            }
            Ok(Arc::new(store))
        })
        .cloned()
}

fn with_store(
    f: impl FnOnce(&PlaceStore<SqliteStorage>) -> Result<(), String>,
) -> Result<Arc<PlaceStore<SqliteStorage>>, String> {
    let store = open_store()?;
    f(&store)?;
    Ok(store)
}

fn with_service<T>(
    f: impl FnOnce(&PlaceService<SqliteStorage>) -> Result<T, String>,
) -> Result<T, String> {
    let service = PlaceService::new(open_store()?);
    f(&service)
}

fn snapshot<S: KeyValueStorage>(store: &PlaceStore<S>) -> PlacesListResponse {
    let message = if store.has_unresolved_load_failure() {
        "Saved places could not be read. Reload to retry or clear to start over.".to_string()
    } else if store.has_unresolved_read_failure() {
        "Saved places storage is unavailable. Reload to retry.".to_string()
    } else {
        String::new()
    };
    PlacesListResponse {
        items: to_items(store.places()),
        loading: store.is_loading(),
        revision: store.revision(),
        message,
    }
}

fn to_items(places: Vec<Place>) -> Vec<PlaceItem> {
    places
        .into_iter()
        .map(|place| PlaceItem {
            id: place.id,
            title: place.title,
            desc: place.desc,
            lat: place.lat,
            lng: place.lng,
            created_at: place.created_at,
        })
        .collect()
}

fn to_focus_target(camera: CameraMove) -> FocusTarget {
    FocusTarget {
        latitude: camera.region.latitude,
        longitude: camera.region.longitude,
        latitude_delta: camera.region.latitude_delta,
        longitude_delta: camera.region.longitude_delta,
        duration_ms: camera.duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, places_focus, places_focus_from_params, places_list,
        places_reload, places_remove, places_revision, places_save, places_update, snapshot,
    };
    use places_core::{MemoryStorage, PlaceStore, PLACES_STORAGE_KEY};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn save_then_list_includes_place_with_wire_fields() {
        let title = unique_token("save");
        let saved = places_save(title.clone(), "desc".to_string(), Some(13.7), Some(100.5));
        assert!(saved.ok, "{}", saved.message);
        let place_id = saved.place_id.expect("save should return place_id");

        let list = places_list();
        assert!(!list.loading);
        let item = list
            .items
            .iter()
            .find(|item| item.id == place_id)
            .expect("saved place should be listed");
        assert_eq!(item.title, title);
        assert_eq!(item.lat, 13.7);
        assert!(item.created_at.ends_with('Z'));
        assert!(places_revision() > 0);
    }

    #[test]
    fn save_without_location_or_title_fails() {
        let response = places_save("title".to_string(), String::new(), None, Some(1.0));
        assert!(!response.ok);
        assert!(response.message.contains("location"));

        let response = places_save("   ".to_string(), String::new(), Some(1.0), Some(1.0));
        assert!(!response.ok);
        assert!(response.message.contains("title"));
    }

    #[test]
    fn save_with_non_finite_coordinates_fails() {
        let response = places_save(unique_token("nan"), String::new(), Some(f64::NAN), Some(100.5));
        assert!(!response.ok);
        assert!(response.message.contains("invalid coordinates"));

        let list = places_list();
        assert!(list.message.is_empty(), "{}", list.message);
    }

    #[test]
    fn snapshot_reports_unreadable_storage_and_malformed_data() {
        let storage = MemoryStorage::new();
        storage.fail_reads(true);
        let store = PlaceStore::new(storage);
        assert!(store.load().is_err());
        let response = snapshot(&store);
        assert!(response.items.is_empty());
        assert!(!response.loading);
        assert!(response.message.contains("unavailable"));

        let malformed = MemoryStorage::with_entry(PLACES_STORAGE_KEY, b"{oops".to_vec());
        let store = PlaceStore::new(malformed);
        assert!(store.load().is_err());
        assert!(snapshot(&store).message.contains("could not be read"));

        let store = PlaceStore::new(MemoryStorage::new());
        store.load().expect("empty storage loads");
        assert!(snapshot(&store).message.is_empty());
    }

    #[test]
    fn update_remove_and_reload_flow() {
        let saved = places_save(unique_token("edit"), String::new(), Some(1.0), Some(2.0));
        let place_id = saved.place_id.expect("save should return place_id");

        let updated = places_update(place_id.clone(), "Office".to_string(), "desk".to_string());
        assert!(updated.ok, "{}", updated.message);

        let reloaded = places_reload();
        assert!(reloaded.message.is_empty(), "{}", reloaded.message);
        let item = reloaded
            .items
            .iter()
            .find(|item| item.id == place_id)
            .expect("updated place should survive reload");
        assert_eq!(item.title, "Office");
        assert_eq!(item.desc, "desk");

        let focus = places_focus(place_id.clone()).expect("known place should focus");
        assert_eq!(focus.latitude, 1.0);
        assert_eq!(focus.duration_ms, 800);

        assert!(places_remove(place_id.clone()).ok);
        assert!(places_remove(place_id.clone()).ok);
        assert!(places_focus(place_id).is_none());
    }

    #[test]
    fn focus_params_reject_unparsable_values() {
        assert!(places_focus_from_params(Some("13.7".into()), Some("100.5".into())).is_some());
        assert!(places_focus_from_params(Some("x".into()), Some("100.5".into())).is_none());
        assert!(places_focus_from_params(None, None).is_none());
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
