//! Tubegate Core
//!
//! Domain types, collaborator ports and the error taxonomy shared by every
//! other Tubegate crate. Nothing in here performs I/O.

pub mod content_id;
pub mod error;
pub mod options;
pub mod ports;
pub mod video;

pub use content_id::{ContentId, YoutubeIdResolver};
pub use error::{EngineError, Error, Result};
pub use options::EngineOptions;
pub use ports::{ExtractionEngine, IdResolver};
pub use video::{ACCEPTED_EXTENSIONS, SourceFormat, SourceMetadata, VideoFormat, VideoInfo};
