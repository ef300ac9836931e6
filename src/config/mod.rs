//! Configuration models for the loader and the reference pool.

pub mod pipeline;

pub use pipeline::{LoaderConfig, PipelineConfig, ReferencePoolConfig, ENV_PREFIX};
