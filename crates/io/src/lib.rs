//! Photomark I/O
//!
//! Collaborators at the edge of the pipeline:
//! - EXIF extraction ([`MetadataExtractor`], [`ExifExtractor`])
//! - Source loading with MIME sniffing and content hashing
//! - Settings persistence ([`SettingsStore`])
//! - Save targets for rendered output ([`SaveTarget`])

pub mod extract;
pub mod save;
pub mod source;
pub mod store;

pub use extract::*;
pub use save::*;
pub use source::*;
pub use store::*;
