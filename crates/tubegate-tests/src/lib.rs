//! Integration test infrastructure for Tubegate.
//!
//! Runs the real router on a loopback port with an in-process extraction
//! engine, so the HTTP surface can be exercised without `yt-dlp`.
//!
//! # Usage
//!
//! ```ignore
//! use tubegate_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::new().await.unwrap();
//!     let resp = ctx.client.get("/api/health").await.unwrap();
//! }
//! ```

pub mod context;
pub mod fixtures;
pub mod helpers;

pub use context::{TestContext, TestSettings};
pub use fixtures::*;
pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,tubegate_tests=debug")),
        )
        .with_test_writer()
        .try_init();
}
