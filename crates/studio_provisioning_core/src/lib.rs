//! Shared custom-resource domain primitives.
//!
//! This crate owns the lifecycle event contract, request dispatch, and the
//! pure rules behind the home-directory seeding and portfolio toggle
//! resources. It excludes AWS SDK and Lambda runtime concerns.

pub mod cfn_response;
pub mod contract;
pub mod error;
pub mod home_layout;
pub mod lifecycle;
pub mod portfolio;
