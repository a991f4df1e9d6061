//! Integration tests for rain-alert.
//!
//! These tests run the stages end to end against temporary directories, with
//! canned forecast payloads in place of the HTTP client.

pub mod cli_tests;
pub mod output_tests;
pub mod pipeline_tests;
pub mod validation_tests;
