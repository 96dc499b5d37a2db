//! chatnet-view: live observer for a simulated distributed chat network.
//!
//! This crate connects to the simulation server over a WebSocket, keeps a
//! local model of peers, links and in-flight broadcasts in sync with it,
//! and renders that model with physics-based layout, pan/zoom and
//! link-drawing gestures.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod config;
pub mod sync;

pub use components::controls::SettingsPanel;
pub use components::network_graph::NetworkCanvas;
pub use config::SyncConfig;
pub use sync::{DisplaySettings, LiveSession};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("chatnet-view: logging initialized");
}

/// Load config overrides from a script element with id="sync-config".
/// Missing or malformed overrides fall back to the defaults.
fn load_config() -> SyncConfig {
	fn script_text() -> Option<String> {
		let window: Window = web_sys::window()?;
		let document = window.document()?;
		let element = document.get_element_by_id("sync-config")?;
		let script: HtmlScriptElement = element.dyn_into().ok()?;
		script.text().ok()
	}

	let Some(json_text) = script_text() else {
		return SyncConfig::default();
	};
	match serde_json::from_str::<SyncConfig>(&json_text) {
		Ok(config) => {
			info!("chatnet-view: loaded config overrides");
			config
		}
		Err(e) => {
			warn!("chatnet-view: failed to parse config: {}", e);
			SyncConfig::default()
		}
	}
}

/// Main application component.
/// Opens the observer session and renders the live view with its controls.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config();
	let display = RwSignal::new(DisplaySettings::default());
	let session = LiveSession::connect(&config, display);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Chat Network Simulation" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			{match session {
				Ok(session) => {
					view! {
						<NetworkCanvas session=session.clone() fullscreen=true />
						<SettingsPanel session=session display=display />
					}
						.into_any()
				}
				Err(e) => {
					warn!("chatnet-view: could not connect: {e}");
					view! { <p class="error">{format!("Could not connect: {e}")}</p> }.into_any()
				}
			}}
			<div class="graph-overlay">
				<h1>"Chat Network"</h1>
				<p class="subtitle">
					"Drag peers to reposition. Shift-drag between peers to link or unlink. Scroll to zoom."
				</p>
			</div>
		</div>
	}
}
