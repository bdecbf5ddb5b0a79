//! Typed schema of the expedition records.
//!
//! The schema is fixed up front rather than inferred from the data, so fields
//! missing from it are dropped on read and type mismatches fail loudly.

mod expedition;

pub use expedition::{
    EnvironmentalConditions, Expedition, HighLow, Location, Reserve, Sighting, Species, Tracking,
};
