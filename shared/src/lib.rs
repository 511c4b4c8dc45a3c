//! Shared types for zone setup
//!
//! Contains the domain values every consumer of the setup coordinator speaks:
//! node roles and handles, zone identities, software versions, and the command
//! shapes passed to the execution capability.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
