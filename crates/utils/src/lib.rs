//! Shared plumbing for the client crates.

pub mod logging;
pub mod response;
