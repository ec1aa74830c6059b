//! Core use-case services.
//!
//! # Responsibility
//! - Apply form rules and identity assignment before touching the store.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod place_service;
