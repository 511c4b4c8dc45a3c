//! Core setup logic
//!
//! This module contains pure logic with no I/O dependencies: setup input
//! rendering, topology planning, and outcome bookkeeping.

pub mod outcome;
pub mod setup_input;
pub mod topology;

pub use outcome::{BatchOutcome, NodeOutcome, SetupOutcome, ZoneReport, ZoneState};
pub use setup_input::{select, SetupField, SetupFamily, SetupInput, SetupInputBuilder, SetupOverrides, SetupValues};
pub use topology::{make_negotiation_key, make_zone_key, plan_zones, ConsumerSelection, ZoneTopology};
