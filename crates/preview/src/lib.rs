//! Photomark Preview Cache
//!
//! Interactive preview rendering on top of the compositing engine:
//! - `key`: content-and-settings cache keys
//! - `state`: bounded storage with insertion-order eviction
//! - `renderer`: local, backend and fallback render paths
//! - `controller`: the cache itself, with debounce and a single in-flight render

pub mod controller;
pub mod key;
pub mod renderer;
pub mod state;

pub use controller::*;
pub use key::cache_key;
pub use renderer::*;
pub use state::*;
