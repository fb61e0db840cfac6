//! valdash - terminal dashboard for the KCC Validators contract
//!
//! Library half of the binary: everything except terminal setup lives here so
//! the integration tests can drive it.

pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod modules;
pub mod ui;
