//! Place store: the authoritative saved-place collection.
//!
//! # Responsibility
//! - Own the in-memory collection and keep it equal to the durable record.
//! - Serialize every load and mutation through one writer.
//! - Notify subscribers after each committed change.
//!
//! # Invariants
//! - A mutation is complete only after the full collection is persisted.
//! - Failed writes never change the in-memory collection.
//! - Place ids are unique across the collection.

use crate::model::place::PlaceId;
use crate::storage::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod codec;
pub mod place_store;

pub use codec::{decode_places, encode_places, CodecError, PLACES_STORAGE_KEY};
pub use place_store::{PlaceStore, SubscriptionId};

pub type StoreResult<T> = Result<T, StoreError>;

/// Place store error.
#[derive(Debug)]
pub enum StoreError {
    /// Durable storage read or write failed.
    Storage(StorageError),
    /// The durable record exists but cannot be parsed.
    Malformed(CodecError),
    /// The in-memory collection could not be serialized.
    Encode(CodecError),
    /// `add` received an id that is already present.
    DuplicateId(PlaceId),
    /// The last load found malformed data that has not been resolved yet.
    ///
    /// Cleared by a successful `reload` or by `clear_all`.
    UnresolvedLoadFailure,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Malformed(err) => write!(f, "saved places are unreadable: {err}"),
            Self::Encode(err) => write!(f, "failed to encode saved places: {err}"),
            Self::DuplicateId(id) => write!(f, "place id already exists: {id}"),
            Self::UnresolvedLoadFailure => write!(
                f,
                "saved places are unreadable; reload or clear them before editing"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Malformed(err) | Self::Encode(err) => Some(err),
            Self::DuplicateId(_) | Self::UnresolvedLoadFailure => None,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}
