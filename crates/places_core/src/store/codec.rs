//! JSON codec for the persisted place collection.
//!
//! # Invariants
//! - The durable format is a JSON array of `Place`, newest first.
//! - Decoding preserves order and rejects duplicate ids.
//! - Encoding rejects non-finite coordinates, which would come back as `null`.
//! - Empty input and JSON `null` decode as an empty collection.

use crate::model::place::{Place, PlaceId};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed key holding the whole collection in durable storage.
pub const PLACES_STORAGE_KEY: &str = "@SAVED_PLACES";

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug)]
pub enum CodecError {
    Json(serde_json::Error),
    DuplicateId(PlaceId),
    NonFiniteCoordinate(PlaceId),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid place collection json: {err}"),
            Self::DuplicateId(id) => write!(f, "duplicate place id in collection: {id}"),
            Self::NonFiniteCoordinate(id) => {
                write!(f, "place {id} has a non-finite coordinate")
            }
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::DuplicateId(_) | Self::NonFiniteCoordinate(_) => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Serializes the full collection into its durable representation.
pub fn encode_places(places: &[Place]) -> CodecResult<Vec<u8>> {
    if let Some(place) = places.iter().find(|place| !place.has_finite_position()) {
        return Err(CodecError::NonFiniteCoordinate(place.id.clone()));
    }
    Ok(serde_json::to_vec(places)?)
}

/// Parses a durable record back into a collection.
pub fn decode_places(bytes: &[u8]) -> CodecResult<Vec<Place>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let places = serde_json::from_slice::<Option<Vec<Place>>>(bytes)?.unwrap_or_default();

    let mut seen = HashSet::with_capacity(places.len());
    for place in &places {
        if !seen.insert(place.id.as_str()) {
            return Err(CodecError::DuplicateId(place.id.clone()));
        }
    }

    Ok(places)
}

#[cfg(test)]
mod tests {
    use super::{decode_places, encode_places, CodecError};
    use crate::model::place::{Coordinates, Place};

    fn place(id: &str, title: &str) -> Place {
        Place::new(
            id,
            title,
            format!("{title} notes"),
            Coordinates::new(13.736717, 100.523186),
            "2024-01-01T00:00:00.000Z",
        )
    }

    #[test]
    fn round_trip_preserves_order_and_fields() {
        let places = vec![place("3", "Cafe"), place("2", "Office"), place("1", "Home")];
        let bytes = encode_places(&places).expect("encode");
        let decoded = decode_places(&bytes).expect("decode");
        assert_eq!(decoded, places);
    }

    #[test]
    fn encoded_blob_uses_camel_case_timestamp() {
        let bytes = encode_places(&[place("1", "Home")]).expect("encode");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("valid json");
        assert_eq!(json[0]["createdAt"], "2024-01-01T00:00:00.000Z");
        assert!(json[0].get("created_at").is_none());
    }

    #[test]
    fn blank_and_null_records_decode_as_empty() {
        assert!(decode_places(b"").expect("empty").is_empty());
        assert!(decode_places(b"  \n").expect("blank").is_empty());
        assert!(decode_places(b"null").expect("null").is_empty());
        assert!(decode_places(b"[]").expect("array").is_empty());
    }

    #[test]
    fn garbage_is_reported_not_swallowed() {
        let err = decode_places(b"{not json").expect_err("garbage must fail");
        assert!(matches!(err, CodecError::Json(_)));

        let err = decode_places(br#"{"id":"1"}"#).expect_err("object must fail");
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let bytes = encode_places(&[place("1", "Home"), place("1", "Copy")]).expect("encode");
        let err = decode_places(&bytes).expect_err("duplicates must fail");
        assert!(matches!(err, CodecError::DuplicateId(id) if id == "1"));
    }

    #[test]
    fn non_finite_coordinates_are_not_encoded() {
        let mut bad = place("2", "Bad");
        bad.lat = f64::NAN;
        let err = encode_places(&[place("1", "Home"), bad]).expect_err("NaN must fail");
        assert!(matches!(err, CodecError::NonFiniteCoordinate(id) if id == "2"));

        let mut bad = place("3", "Far");
        bad.lng = f64::NEG_INFINITY;
        assert!(encode_places(&[bad]).is_err());
    }
}
