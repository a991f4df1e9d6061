//! Pipeline stages.
//!
//! Each stage owns its artifacts: extract writes the raw payload, transform
//! the processed and star tables, validate the two quality reports.

pub mod extract;
pub mod transform;
pub mod validate;

pub use extract::{ExtractStage, ForecastSource, OpenMeteoClient};
pub use transform::TransformStage;
pub use validate::ValidateStage;
