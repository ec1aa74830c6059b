//! Domain model for saved places.
//!
//! # Responsibility
//! - Define the record shape shared by store, service and FFI layers.
//!
//! # Invariants
//! - Every place is identified by a stable `PlaceId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod place;
pub mod region;
