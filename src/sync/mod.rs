//! Live synchronization with the chat simulation server.
//!
//! The server pushes structural notifications (peers joining and leaving,
//! links forming and breaking) and traffic notifications (broadcasts,
//! setting changes) over one WebSocket. This module keeps a local model
//! consistent with that stream:
//!
//! - [`store`] holds peers, undirected links and overlay edges
//! - [`format`] turns broadcast payloads into overlay labels
//! - [`overlay`] admits overlays under a concurrency cap and expires them
//! - [`translator`] applies each notification to the model
//! - [`commands`] encodes operator requests; the model only changes once
//!   the server echoes them back
//! - [`session`] drives the connection lifecycle, and [`browser`] binds it to
//!   a real `WebSocket` and `setTimeout`
//!
//! Everything except [`browser`] is plain Rust and runs without a browser.

pub mod browser;
pub mod commands;
pub mod error;
pub mod format;
pub mod overlay;
pub mod protocol;
pub mod session;
pub mod settings;
pub mod store;
#[cfg(test)]
mod testing;
pub mod translator;

pub use browser::LiveSession;
pub use error::SyncError;
pub use session::SessionState;
pub use settings::{DisplaySettings, LabelMode, LiveSettings, SettingKind};
pub use store::{GraphChange, GraphStore};
pub use translator::{Applied, SyncEngine};
