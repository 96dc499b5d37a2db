//! Settings panel: display toggles and the link setting sliders.
//!
//! Toggles only change what is drawn locally. Sliders send a request to the
//! server and the read-out follows whatever the server reports back.

use leptos::prelude::*;
use log::warn;

use crate::sync::{DisplaySettings, LabelMode, LiveSession, SettingKind};

/// Slider for one numeric link setting.
#[component]
fn SettingSlider(
	session: LiveSession,
	kind: SettingKind,
	label: &'static str,
	max: f64,
	step: f64,
) -> impl IntoView {
	let live = session.live;
	let on_change = move |ev: leptos::ev::Event| {
		let raw = event_target_value(&ev);
		match raw.parse::<f64>() {
			Ok(value) => session.request_setting(kind, value),
			Err(e) => warn!("controls: bad {kind} value {raw:?}: {e}"),
		}
	};

	view! {
		<label class="setting">
			<span>{label}</span>
			<input
				type="range"
				min="0"
				max=max.to_string()
				step=step.to_string()
				prop:value=move || live.get().get(kind).value.to_string()
				on:change=on_change
			/>
			<output>{move || live.get().get(kind).display.clone()}</output>
		</label>
	}
}

/// Display toggles, link settings and the connection badge.
#[component]
pub fn SettingsPanel(session: LiveSession, display: RwSignal<DisplaySettings>) -> impl IntoView {
	let state = session.state;

	view! {
		<aside class="settings-panel">
			<p class="connection" data-state=move || state.get().as_str()>
				{move || state.get().as_str()}
			</p>

			<label>
				<input
					type="checkbox"
					prop:checked=move || display.get().edges_enabled
					on:change=move |ev| display.update(|d| d.edges_enabled = event_target_checked(&ev))
				/>
				"Show traffic"
			</label>
			<label>
				"Labels "
				<select
					prop:value=move || display.get().label_mode.as_key()
					on:change=move |ev| {
						let mode = LabelMode::from_key(&event_target_value(&ev));
						display.update(|d| d.label_mode = mode);
					}
				>
					<option value="formatted">"Formatted"</option>
					<option value="raw">"Raw"</option>
				</select>
			</label>
			<label>
				<input
					type="checkbox"
					prop:checked=move || display.get().chat_enabled
					on:change=move |ev| display.update(|d| d.chat_enabled = event_target_checked(&ev))
				/>
				"Chat messages"
			</label>
			<label>
				<input
					type="checkbox"
					prop:checked=move || display.get().presence_enabled
					on:change=move |ev| display.update(|d| d.presence_enabled = event_target_checked(&ev))
				/>
				"Presence updates"
			</label>

			<SettingSlider
				session=session.clone()
				kind=SettingKind::Reliability
				label="Link reliability"
				max=1.0
				step=0.01
			/>
			<SettingSlider
				session=session
				kind=SettingKind::Delay
				label="Link delay"
				max=10.0
				step=0.1
			/>
		</aside>
	}
}
