//! `griya-cli`: request boundary, batch runner and prediction server.
//!
//! The `griya` binary wires these to clap commands.

pub mod batch;
pub mod server;
pub mod service;
pub mod util;

pub use service::{Estimate, SchemaReport, Service, ServiceOptions, SubmitError};
