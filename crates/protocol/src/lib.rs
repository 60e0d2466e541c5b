//! Wire types for the Skaha session API.
//!
//! This crate contains the serde-serializable enumerations and records that
//! appear on the wire between the client and a Skaha server. The types are:
//! * Pure data: no behavior beyond parsing and serialization
//! * Closed: every enumeration lists exactly the values the server accepts
//!
//! Request validation and dispatch live in `skaha-rs`.

pub mod image;
pub mod kind;

pub use image::*;
pub use kind::*;
