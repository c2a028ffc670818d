//! Photomark Data Model
//!
//! Defines the data contracts shared by the compositor, preview cache and
//! batch orchestrator:
//! - **Overlay:** which metadata fields to draw, preset anchoring, styling
//! - **Custom layout:** free-form element positions with grid snapping
//! - **Frame:** decorative border styles
//! - **Metadata:** per-photo EXIF record and immutable source bytes
//! - **Batch:** progress reports and run results
//! - **Wire:** the backend renderer's naming, translated losslessly
//!
//! Settings are read-only to the pipeline. The one exception is
//! [`OverlaySettings::switch_layout_mode`], which synthesizes custom layout
//! elements the first time custom mode is entered.

pub mod batch;
pub mod custom_layout;
pub mod format;
pub mod frame;
pub mod metadata;
pub mod overlay;
pub mod settings;
pub mod wire;

pub use batch::*;
pub use custom_layout::*;
pub use format::*;
pub use frame::*;
pub use metadata::*;
pub use overlay::*;
pub use settings::*;
