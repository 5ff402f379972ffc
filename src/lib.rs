//! energydash library
//!
//! Exposes the cache, data, loading and UI modules to the binary and to
//! integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod loader;
pub mod logging;
pub mod ui;
