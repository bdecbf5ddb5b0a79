//! Facade construction.

mod builder;

pub use builder::JungleBuilder;
pub(crate) use builder::build_engine;
