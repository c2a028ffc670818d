//! Photomark Compositor
//!
//! Turns a source photo plus overlay and frame settings into an encoded
//! image. Identical inputs always produce identical bytes; the preview and
//! export paths both depend on that.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source bytes ──┐
//!                ├── Decode (RGBA8)
//!                │        │
//!                │        ├── Resize to fit (optional, Lanczos3)
//!                │        │
//! settings ──────┤        ├── Layout Resolver ── positioned fields
//! metadata ──────┘        │          │
//!                         ├── Overlay (panels, text, logo)
//!                         │
//!                         ├── Frame (simple/shadow/film/polaroid/vintage)
//!                         │
//!                         ▼
//!                  Encode (JPEG/PNG)
//!                         │
//!                         ▼
//!                     output blob
//! ```

pub mod color;
pub mod draw;
pub mod engine;
pub mod export;
pub mod frame;
pub mod layout;
pub mod overlay;
pub mod text;

pub use engine::*;
pub use export::{decode_image, export_image, jpeg_quality, resize_to_fit};
pub use frame::apply_frame;
pub use layout::{resolve_layout, FieldContent, ResolvedField, ResolvedLayout};
pub use overlay::apply_overlay;
pub use text::{FieldMeasure, FontAssets, TextExtent};
