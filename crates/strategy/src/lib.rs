//! Strategy registry and signal evaluation engine.
//!
//! Strategies are immutable, declarative descriptors: a set of filters
//! (all must pass), a set of triggers (any must fire) and an entry rule.
//! The [`Registry`] runs one [`common::MarketSnapshot`] through every
//! strategy each cycle and emits at most one [`common::Signal`], with the
//! confluence meta-strategy taking absolute priority.

pub mod descriptor;
pub mod filter;
pub mod registry;
pub mod strategies;
pub mod trigger;

pub use descriptor::{Confluence, EntryRule, StrategyDescriptor};
pub use filter::Filter;
pub use registry::Registry;
pub use trigger::Trigger;
