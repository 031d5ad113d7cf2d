//! Shared setup for integration tests

use ffp_core::FootprintInput;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness, filtered by `RUST_LOG`.
#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Unstable daytime observation over short grass.
#[allow(dead_code)]
pub fn unstable_grass() -> FootprintInput {
    FootprintInput::roughness_based(2.0, 0.02, 1000.0, -50.0, 0.5, 0.3, Some(0.0))
}

/// Stable night-time observation from a taller tower.
#[allow(dead_code)]
pub fn stable_tower() -> FootprintInput {
    FootprintInput::roughness_based(20.0, 0.5, 300.0, 80.0, 0.4, 0.2, Some(135.0))
}
