//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `places_core` linkage without the Flutter/FFI runtime.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `places_cli [DB_PATH]`. Without a path an in-memory store is used.

use places_core::{PlaceStore, SqliteStorage, StorageResult};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("places_core ping={}", places_core::ping());
    println!("places_core version={}", places_core::core_version());

    let storage = match open_storage(std::env::args().nth(1)) {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("places_core storage=error error={err}");
            return ExitCode::FAILURE;
        }
    };

    let store = PlaceStore::new(storage);
    match store.load() {
        Ok(()) => {
            println!("places_core places={}", store.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("places_core load=error error={err}");
            ExitCode::FAILURE
        }
    }
}

fn open_storage(path: Option<String>) -> StorageResult<SqliteStorage> {
    match path {
        Some(path) => SqliteStorage::open(path),
        None => SqliteStorage::open_in_memory(),
    }
}
