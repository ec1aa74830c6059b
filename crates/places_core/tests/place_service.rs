use chrono::{DateTime, TimeZone, Utc};
use places_core::{
    Clock, Coordinates, MemoryStorage, PlaceDraft, PlaceService, PlaceStore, ServiceError,
    StoreError,
};
use std::sync::Arc;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn fixed_service() -> (Arc<MemoryStorage>, PlaceService<Arc<MemoryStorage>>) {
    let storage = Arc::new(MemoryStorage::new());
    let store = Arc::new(PlaceStore::new(Arc::clone(&storage)));
    store.load().unwrap();
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (
        storage,
        PlaceService::with_clock(store, Arc::new(FixedClock(at))),
    )
}

#[test]
fn save_assigns_timestamp_identity_and_trims_input() {
    let (_, service) = fixed_service();

    let saved = service
        .save_place(
            &PlaceDraft::new("  Home  ", " my house "),
            Some(Coordinates::new(13.7, 100.5)),
        )
        .unwrap();

    assert_eq!(saved.id, "1704067200000");
    assert_eq!(saved.created_at, "2024-01-01T00:00:00.000Z");
    assert_eq!(saved.title, "Home");
    assert_eq!(saved.desc, "my house");
    assert_eq!(service.places(), vec![saved]);
}

#[test]
fn saves_in_the_same_millisecond_get_distinct_ids() {
    let (_, service) = fixed_service();
    let at = Some(Coordinates::new(1.0, 2.0));

    let first = service.save_place(&PlaceDraft::new("a", ""), at).unwrap();
    let second = service.save_place(&PlaceDraft::new("b", ""), at).unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(second.id, "1704067200001");
    let ids = service
        .places()
        .into_iter()
        .map(|place| place.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn save_requires_location_and_title() {
    let (_, service) = fixed_service();

    let err = service
        .save_place(&PlaceDraft::new("Home", ""), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::MissingLocation));

    let err = service
        .save_place(&PlaceDraft::new("   ", ""), Some(Coordinates::new(1.0, 2.0)))
        .unwrap_err();
    assert!(matches!(err, ServiceError::EmptyTitle));
    assert!(service.places().is_empty());
}

#[test]
fn edit_replaces_title_and_desc_only() {
    let (_, service) = fixed_service();
    let saved = service
        .save_place(
            &PlaceDraft::new("Home", ""),
            Some(Coordinates::new(13.7, 100.5)),
        )
        .unwrap();

    service
        .edit_place(&saved.id, &PlaceDraft::new(" Office ", "3rd floor"))
        .unwrap();

    let edited = service.place(&saved.id).unwrap();
    assert_eq!(edited.title, "Office");
    assert_eq!(edited.desc, "3rd floor");
    assert_eq!(edited.lat, saved.lat);
    assert_eq!(edited.created_at, saved.created_at);

    let err = service
        .edit_place(&saved.id, &PlaceDraft::new("", "x"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::EmptyTitle));
}

#[test]
fn save_failure_surfaces_store_error() {
    let (storage, service) = fixed_service();
    storage.fail_writes(true);

    let err = service
        .save_place(&PlaceDraft::new("Home", ""), Some(Coordinates::new(1.0, 2.0)))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::Storage(_))));
    assert!(service.places().is_empty());
}

#[test]
fn focus_request_targets_saved_coordinates() {
    let (_, service) = fixed_service();
    let saved = service
        .save_place(
            &PlaceDraft::new("Cafe", ""),
            Some(Coordinates::new(13.75, 100.53)),
        )
        .unwrap();

    let camera = service.focus_request(&saved.id).unwrap();
    assert_eq!(camera.region.center(), Coordinates::new(13.75, 100.53));
    assert_eq!(camera.region.latitude_delta, 0.004);
    assert_eq!(camera.duration_ms, 800);

    assert!(service.focus_request("missing").is_none());
}

#[test]
fn delete_clear_and_refresh_delegate_to_store() {
    let (_, service) = fixed_service();
    let at = Some(Coordinates::new(1.0, 2.0));
    let first = service.save_place(&PlaceDraft::new("a", ""), at).unwrap();
    service.save_place(&PlaceDraft::new("b", ""), at).unwrap();

    service.delete_place(&first.id).unwrap();
    service.delete_place(&first.id).unwrap();
    assert_eq!(service.places().len(), 1);

    service.clear_places().unwrap();
    service.refresh().unwrap();
    assert!(service.places().is_empty());
}

#[test]
fn save_rejects_non_finite_or_out_of_range_coordinates() {
    let (storage, service) = fixed_service();
    service
        .save_place(&PlaceDraft::new("Home", ""), Some(Coordinates::new(13.7, 100.5)))
        .unwrap();

    for bad in [
        Coordinates::new(f64::NAN, 100.5),
        Coordinates::new(13.7, f64::INFINITY),
        Coordinates::new(91.0, 0.0),
        Coordinates::new(0.0, -181.0),
    ] {
        let err = service
            .save_place(&PlaceDraft::new("Bad", ""), Some(bad))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCoordinates(_)));
    }

    let reloaded = PlaceStore::new(storage);
    reloaded.load().unwrap();
    assert_eq!(reloaded.len(), 1);
    assert!(!reloaded.has_unresolved_load_failure());
    service
        .save_place(&PlaceDraft::new("Office", ""), Some(Coordinates::new(1.0, 2.0)))
        .unwrap();
}
