//! Tests for utility functions

use prometheus_asset_pipeline::util::{init_tracing, init_tracing_with_default};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing_with_default("prometheus_asset_pipeline=debug");
    init_tracing();
    init_tracing_with_default("warn");
    tracing::info!("tracing initialized twice without panicking");
}
