//! Turns broadcast payloads into overlay labels.

use serde::Deserialize;
use serde_json::Value;

use super::error::SyncError;
use super::settings::{DisplaySettings, LabelMode};

/// Stable color tag for an overlay. The renderer's theme picks the hue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayColor {
	Chat,
	Presence,
	Raw,
}

/// A formatted overlay label.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLabel {
	pub text: String,
	pub color: OverlayColor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatUpdate {
	#[serde(default)]
	added_chat_messages: Option<Vec<ChatMessage>>,
	#[serde(default)]
	updated_presences: Option<Vec<PresenceUpdate>>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
	author: ChatUser,
	content: ChatContent,
}

#[derive(Debug, Deserialize)]
struct ChatUser {
	name: String,
}

#[derive(Debug, Deserialize)]
struct ChatContent {
	#[serde(rename = "type")]
	kind: String,
	#[serde(default)]
	data: Value,
}

#[derive(Debug, Deserialize)]
struct PresenceUpdate {
	user: ChatUser,
	status: Value,
}

fn plain(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

fn render_content(content: &ChatContent) -> String {
	match content.kind.as_str() {
		"text" => plain(&content.data),
		"encrypted" => "<encrypted>".to_string(),
		_ => "?".to_string(),
	}
}

/// Label a broadcast payload according to the display snapshot.
///
/// Returns `Ok(None)` when the formatted view has nothing enabled to show.
/// Raw mode never suppresses and never fails.
pub fn format_broadcast(
	raw: &str,
	display: &DisplaySettings,
) -> Result<Option<OverlayLabel>, SyncError> {
	if display.label_mode != LabelMode::Formatted {
		return Ok(Some(OverlayLabel {
			text: raw.to_string(),
			color: OverlayColor::Raw,
		}));
	}

	let update: ChatUpdate = serde_json::from_str(raw).map_err(SyncError::MalformedContent)?;

	if let Some(messages) = update.added_chat_messages.filter(|m| !m.is_empty()) {
		if display.chat_enabled {
			let text = messages
				.iter()
				.map(|m| format!("{}: {}", m.author.name, render_content(&m.content)))
				.collect::<Vec<_>>()
				.join(", ");
			return Ok(Some(OverlayLabel {
				text,
				color: OverlayColor::Chat,
			}));
		}
	}

	if let Some(presences) = update.updated_presences.filter(|p| !p.is_empty()) {
		if display.presence_enabled {
			let text = presences
				.iter()
				.map(|p| format!("{}: {}", p.user.name, plain(&p.status)))
				.collect::<Vec<_>>()
				.join(", ");
			return Ok(Some(OverlayLabel {
				text,
				color: OverlayColor::Presence,
			}));
		}
	}

	Ok(None)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn formatted() -> DisplaySettings {
		DisplaySettings::default()
	}

	#[test]
	fn formats_text_chat_message() {
		let raw = r#"{"addedChatMessages":[{"author":{"name":"Alice"},"content":{"type":"text","data":"hi"}}]}"#;
		assert_eq!(
			format_broadcast(raw, &formatted()).unwrap(),
			Some(OverlayLabel {
				text: "Alice: hi".to_string(),
				color: OverlayColor::Chat,
			})
		);
	}

	#[test]
	fn hides_encrypted_and_unknown_content() {
		let raw = r#"{"addedChatMessages":[
			{"author":{"name":"Alice"},"content":{"type":"encrypted","data":{"sealed":"xyz"}}},
			{"author":{"name":"Bob"},"content":{"type":"file","data":"blob"}}
		]}"#;
		let label = format_broadcast(raw, &formatted()).unwrap().unwrap();
		assert_eq!(label.text, "Alice: <encrypted>, Bob: ?");
	}

	#[test]
	fn falls_back_to_presence_when_chat_disabled() {
		let raw = r#"{
			"addedChatMessages":[{"author":{"name":"Alice"},"content":{"type":"text","data":"hi"}}],
			"updatedPresences":[{"user":{"name":"Bob"},"status":"away"},{"user":{"name":"Eve"},"status":"online"}]
		}"#;
		let display = DisplaySettings {
			chat_enabled: false,
			..formatted()
		};
		assert_eq!(
			format_broadcast(raw, &display).unwrap(),
			Some(OverlayLabel {
				text: "Bob: away, Eve: online".to_string(),
				color: OverlayColor::Presence,
			})
		);
	}

	#[test]
	fn empty_chat_list_falls_through_to_presence() {
		let raw = r#"{
			"addedChatMessages":[],
			"updatedPresences":[{"user":{"name":"Bob"},"status":"away"}]
		}"#;
		assert_eq!(
			format_broadcast(raw, &formatted()).unwrap(),
			Some(OverlayLabel {
				text: "Bob: away".to_string(),
				color: OverlayColor::Presence,
			})
		);
		assert_eq!(
			format_broadcast(r#"{"addedChatMessages":[],"updatedPresences":[]}"#, &formatted()).unwrap(),
			None
		);
	}

	#[test]
	fn suppresses_when_nothing_enabled_applies() {
		let raw = r#"{"updatedPresences":[{"user":{"name":"Bob"},"status":"away"}]}"#;
		let display = DisplaySettings {
			presence_enabled: false,
			..formatted()
		};
		assert_eq!(format_broadcast(raw, &display).unwrap(), None);
		assert_eq!(format_broadcast("{}", &formatted()).unwrap(), None);
	}

	#[test]
	fn raw_mode_is_verbatim_and_never_suppressed() {
		let display = DisplaySettings {
			label_mode: LabelMode::Raw,
			chat_enabled: false,
			presence_enabled: false,
			..formatted()
		};
		assert_eq!(
			format_broadcast("not even json", &display).unwrap(),
			Some(OverlayLabel {
				text: "not even json".to_string(),
				color: OverlayColor::Raw,
			})
		);
	}

	#[test]
	fn unparsable_payload_is_malformed_in_formatted_mode() {
		assert!(matches!(
			format_broadcast("not even json", &formatted()),
			Err(SyncError::MalformedContent(_))
		));
	}
}
