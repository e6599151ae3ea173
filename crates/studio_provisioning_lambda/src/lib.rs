//! AWS-oriented adapters and handlers for the Studio custom resources.
//!
//! This crate owns runtime integration details (Lambda handlers, git and
//! file-system adapters, response delivery) and exposes a single runtime
//! module boundary for the contract and layout primitives.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod runtime;
pub mod telemetry;
