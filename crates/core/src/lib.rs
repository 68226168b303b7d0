//! Core domain for postbridge: canonical post records, validation, schema
//! projection, publish-plan generation, and application configuration.
//!
//! This crate performs no I/O. Everything here is deterministic and unit-testable:
//! the interaction gateway feeds it raw field maps, and the publish pipeline
//! consumes the records and plans it produces.

pub mod config;
pub mod errors;
pub mod identifiers;
pub mod post;
pub mod schema;
