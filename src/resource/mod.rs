//! Scheduling of load tasks onto agents.

pub mod loader;

pub use loader::ResourceLoader;
