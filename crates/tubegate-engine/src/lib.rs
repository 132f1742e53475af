//! Extraction engine adapter that drives the `yt-dlp` binary.

pub mod args;
pub mod process;
pub mod ytdlp;

pub use ytdlp::{YtDlpConfig, YtDlpEngine};
