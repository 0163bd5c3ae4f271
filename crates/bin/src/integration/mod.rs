//! Glue between the command line and the library crates.
//!
//! Configuration loading, logging setup and the concurrent fetch pipeline.

pub(crate) mod config;
pub(crate) mod logging;
pub(crate) mod pipeline;
