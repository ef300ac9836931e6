//! # Prometheus Asset Pipeline
//!
//! Asynchronous asset and scene loading with pooled task descriptors.
//!
//! The pipeline turns a request for an addressable resource into a tracked,
//! callback-driven unit of work. It enforces one in-flight load per scene
//! address, fans backend outcomes out to caller callbacks and event
//! subscribers, and recycles every short-lived record (tasks, asset wrappers,
//! event arguments) through a typed reference pool.
//!
//! ## Pieces
//!
//! - **`ReferencePool`**: type-keyed registry of reusable instances with
//!   strict double-release and type-mismatch detection.
//! - **`AssetAddress`**: package name plus location; the key for everything.
//! - **`LoadResourceTask`**: pooled descriptor of one load, tagged asset or scene.
//! - **`LoadResourceAgent`**: runs one task at a time through a helper that
//!   performs the actual fetch and reports through a one-shot completion.
//! - **`ResourceLoader`**: priority queue plus agents; the owner drives
//!   `update()`, on which every callback runs.
//! - **`SceneManager`**: loading/loaded/unloading bookkeeping and scene events.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_asset_pipeline::builders::build_pipeline;
//! use prometheus_asset_pipeline::config::PipelineConfig;
//! use prometheus_asset_pipeline::core::AssetAddress;
//!
//! let cfg = PipelineConfig::from_env()?;
//! let pipeline = build_pipeline(&cfg, Arc::new(my_resource_helper), |_| Ok(Box::new(MyFetcher::default())))?;
//!
//! pipeline.scenes.on_load_scene_success(|args| println!("loaded {}", args.address()));
//! pipeline.scenes.load_scene(&AssetAddress::new("base", "scenes/level1"), None, None)?;
//!
//! // Once per frame:
//! pipeline.update()?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core pipeline abstractions: pooling, identity, tasks, agents and state.
pub mod core;
/// Configuration models for the loader and the reference pool.
pub mod config;
/// Builders to construct a wired pipeline from configuration.
pub mod builders;
/// Infrastructure adapters: the waiting queue and async helper bridging.
pub mod infra;
/// Scheduling of load tasks onto agents.
pub mod resource;
/// Runtime adapters for async fetching.
pub mod runtime;
/// Scene tracking and scene events.
pub mod scene;
/// Shared utilities.
pub mod util;
