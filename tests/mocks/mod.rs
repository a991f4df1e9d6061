//! Test doubles and fixtures for running the pipeline without network access.
//!
//! Forecast sources return canned payloads (or fail on demand) and every
//! directory setting points into a temporary folder.

pub mod fixtures;
pub mod sources;

pub use fixtures::*;
pub use sources::*;
