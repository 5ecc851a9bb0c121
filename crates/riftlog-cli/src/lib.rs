//! Riftlog command line front end.
//!
//! Configuration, logging and output formatting live here, separate from
//! main.rs, so they can be tested.

pub mod config;
pub mod logging;
pub mod output;
