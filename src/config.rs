//! Runtime configuration for the live view.
//!
//! Defaults match the simulation server's own client. A page may override
//! any subset by embedding JSON in a `<script id="sync-config">` element.

use std::time::Duration;

use serde::Deserialize;

/// Tunables for the synchronization engine.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
	/// WebSocket path on the page's host.
	pub endpoint_path: String,
	/// How long a broadcast overlay stays on screen, in milliseconds.
	pub overlay_lifetime_ms: u64,
	/// Overlays admitted per known peer before new ones are dropped.
	pub overlay_cap_per_node: usize,
	/// Label wrap width hint for overlays, in pixels.
	pub overlay_label_width: f64,
	/// Radius of the circle new peers are seeded on.
	pub spawn_radius: f64,
	/// Decimal places shown for link settings.
	pub display_precision: usize,
}

impl SyncConfig {
	pub fn overlay_lifetime(&self) -> Duration {
		Duration::from_millis(self.overlay_lifetime_ms)
	}
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			endpoint_path: "/messaging".to_string(),
			overlay_lifetime_ms: 1000,
			overlay_cap_per_node: 8,
			overlay_label_width: 400.0,
			spawn_radius: 0.2,
			display_precision: 2,
		}
	}
}
