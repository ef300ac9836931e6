//! Builders for pipelines, loaders and pools.

pub mod pipeline_builder;

pub use pipeline_builder::{build_loader, build_pipeline, build_reference_pool, Pipeline};
