//! QualityLens API — library crate for the natural-language query server.
//!
//! Re-exports all modules so the binary (`main.rs`) and external crates
//! (e.g. `ql-e2e-tests`) can build an `AppState` and router directly.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod sample;
pub mod state;
