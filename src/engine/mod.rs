//! Validation engine module.
//!
//! Provides check execution, result aggregation, exception reporting and
//! stage orchestration.

pub mod exceptions;
pub mod executor;
pub mod pipeline;
pub mod result;
