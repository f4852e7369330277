//! Control API and generator loop for the synthetic events simulator.

pub mod collector;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event_log;
pub mod routes;
pub mod simulator;

pub use config::{ConfigUpdate, Settings, StreamConfig};
pub use dispatcher::Dispatcher;
pub use simulator::Simulator;
