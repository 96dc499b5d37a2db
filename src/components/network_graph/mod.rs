//! Live network view.
//!
//! Draws the synchronized graph on an HTML canvas with:
//! - Physics-based peer positioning via force simulation
//! - Broadcast overlays fanned out between their endpoints, colored by kind
//! - Pan, zoom and peer dragging
//! - Shift-drag between two peers to request a link, or its removal
//!
//! # Example
//!
//! ```ignore
//! let session = LiveSession::connect(&SyncConfig::default(), display)?;
//! view! { <NetworkCanvas session=session fullscreen=true /> }
//! ```

mod component;
mod render;
pub mod scale;
mod state;
pub mod theme;

pub use component::NetworkCanvas;
pub use theme::Theme;
