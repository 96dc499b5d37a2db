//! Live link settings and the display-toggle snapshot.
//!
//! The settings surface is owned by the UI. The engine never reads it
//! ambiently: callers hand a [`DisplaySettings`] snapshot to each operation
//! that needs one, and read [`LiveSettings`] back after a frame changes it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::SyncError;

/// How overlay labels are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
	/// Decode chat-protocol payloads into readable summaries.
	#[default]
	Formatted,
	/// Show the payload text verbatim.
	Raw,
}

impl LabelMode {
	/// Parse the value of the mode selector. Anything but `"formatted"` is raw.
	pub fn from_key(key: &str) -> Self {
		match key {
			"formatted" => Self::Formatted,
			_ => Self::Raw,
		}
	}

	pub fn as_key(self) -> &'static str {
		match self {
			Self::Formatted => "formatted",
			Self::Raw => "raw",
		}
	}
}

/// Read-only snapshot of the display toggles, taken at a decision point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplaySettings {
	/// Whether broadcast overlays are drawn at all.
	pub edges_enabled: bool,
	pub label_mode: LabelMode,
	pub chat_enabled: bool,
	pub presence_enabled: bool,
}

impl Default for DisplaySettings {
	fn default() -> Self {
		Self {
			edges_enabled: true,
			label_mode: LabelMode::Formatted,
			chat_enabled: true,
			presence_enabled: true,
		}
	}
}

/// The two numeric link settings the server simulates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingKind {
	/// Probability that a message survives a link, in `[0, 1]`.
	Reliability,
	/// Simulated link latency, non-negative.
	Delay,
}

impl SettingKind {
	/// Reject values the server would never accept.
	pub fn validate(self, value: f64) -> Result<f64, SyncError> {
		let in_range = match self {
			Self::Reliability => (0.0..=1.0).contains(&value),
			Self::Delay => value.is_finite() && value >= 0.0,
		};
		if in_range {
			Ok(value)
		} else {
			Err(SyncError::OutOfRange { kind: self, value })
		}
	}
}

impl fmt::Display for SettingKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Reliability => "link reliability",
			Self::Delay => "link delay",
		})
	}
}

/// Fixed-point text with exact ties rounded away from zero, the way the
/// server's own client formats these read-outs.
fn to_fixed(value: f64, precision: usize) -> String {
	// Float formatting prints the exact binary expansion, then breaks ties to even.
	let exact = format!("{value:.1100}");
	let tie = exact.split_once('.').is_some_and(|(_, frac)| {
		frac.get(precision..)
			.is_some_and(|rest| rest.starts_with('5') && rest[1..].bytes().all(|b| b == b'0'))
	});
	let value = if tie && value != 0.0 {
		f64::from_bits(value.to_bits() + 1)
	} else {
		value
	};
	format!("{value:.precision$}")
}

/// A setting's control value and its formatted read-out.
#[derive(Clone, Debug, PartialEq)]
pub struct SettingValue {
	pub value: f64,
	pub display: String,
}

/// Mirrors of the reliability and delay controls. Last write wins.
#[derive(Clone, Debug, PartialEq)]
pub struct LiveSettings {
	pub reliability: SettingValue,
	pub delay: SettingValue,
	precision: usize,
}

impl LiveSettings {
	pub fn new(precision: usize) -> Self {
		let seed = |value: f64| SettingValue {
			value,
			display: to_fixed(value, precision),
		};
		Self {
			reliability: seed(1.0),
			delay: seed(0.0),
			precision,
		}
	}

	pub fn get(&self, kind: SettingKind) -> &SettingValue {
		match kind {
			SettingKind::Reliability => &self.reliability,
			SettingKind::Delay => &self.delay,
		}
	}

	/// Overwrite both the control value and its display.
	pub fn set(&mut self, kind: SettingKind, value: f64) {
		let display = to_fixed(value, self.precision);
		let slot = match kind {
			SettingKind::Reliability => &mut self.reliability,
			SettingKind::Delay => &mut self.delay,
		};
		*slot = SettingValue { value, display };
	}
}

impl Default for LiveSettings {
	fn default() -> Self {
		Self::new(2)
	}
}
