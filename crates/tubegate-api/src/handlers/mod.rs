//! Request handlers organized by resource.

pub mod download;
pub mod health;
pub mod video;
