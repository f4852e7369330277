//! Synthetic behavioral events: industry catalogs and the generator that
//! turns them into identify/track payloads.

pub mod event;
pub mod generator;
pub mod industry;
pub mod random;

pub use event::{Event, EventKind};
pub use generator::{tick_interval, EventGenerator, Variant};
pub use industry::{Industry, IndustryTemplate, UnknownIndustry};
pub use random::Payload;
