//! Flutter bridge crate for the saved-places core.

pub mod api;
