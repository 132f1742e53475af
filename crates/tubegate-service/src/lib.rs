//! Request admission, metadata lookup and download streaming for Tubegate.

pub mod download;
pub mod metadata;
pub mod ratelimit;

#[cfg(test)]
mod testing;

pub use download::{ArtifactStream, Download, DownloadConfig, DownloadPipeline};
pub use metadata::MetadataService;
pub use ratelimit::{RateDecision, RateLimitConfig, RateLimiter};
