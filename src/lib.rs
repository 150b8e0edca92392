//! keydash — library crate for the binary and for integration testing.
//!
//! Re-exports the modules needed by integration tests in `tests/`.

pub mod api;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod keygen;
pub mod models;
pub mod store;
pub mod ui;

pub use api::AppState;
