//! Wire frames exchanged with the simulation server.
//!
//! Every frame is a JSON object whose `type` field discriminates the payload
//! carried under `data`. Inbound decoding happens in two steps so that an
//! unknown `type` can be ignored while a known `type` with a bad payload is
//! reported as malformed.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::SyncError;

const HELLO: &str = "helloNotification";
const GOODBYE: &str = "goodbyeNotification";
const ADD_LINK: &str = "addLinkNotification";
const REMOVE_LINK: &str = "removeLinkNotification";
const BROADCAST: &str = "broadcastNotification";
const SET_RELIABILITY: &str = "setLinkReliabilityNotification";
const SET_DELAY: &str = "setLinkDelayNotification";

/// Server-assigned peer identifier. Opaque to the client.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl fmt::Display for PeerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for PeerId {
	fn from(s: &str) -> Self {
		Self(s.to_string())
	}
}

/// The two endpoints of a link as they appear on the wire.
///
/// Direction is kept because overlays draw an arrow from sender to
/// receiver, but structural links compare with [`LinkPair::connects`],
/// which ignores it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPair {
	#[serde(rename = "fromUUID")]
	pub from: PeerId,
	#[serde(rename = "toUUID")]
	pub to: PeerId,
}

impl LinkPair {
	pub fn new(from: impl Into<PeerId>, to: impl Into<PeerId>) -> Self {
		Self {
			from: from.into(),
			to: to.into(),
		}
	}

	/// Whether this pair joins `a` and `b` in either direction.
	pub fn connects(&self, a: &PeerId, b: &PeerId) -> bool {
		(self.from == *a && self.to == *b) || (self.from == *b && self.to == *a)
	}

	/// Whether either endpoint is `peer`.
	pub fn touches(&self, peer: &PeerId) -> bool {
		self.from == *peer || self.to == *peer
	}
}

/// A peer announcing itself.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Hello {
	pub uuid: PeerId,
	pub name: String,
}

/// A peer leaving the network.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Goodbye {
	pub uuid: PeerId,
}

/// One message crossing one link.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Broadcast {
	/// Either a JSON string holding the raw chat-protocol text, or the
	/// chat-protocol object itself.
	pub content: Value,
	pub link: LinkPair,
}

impl Broadcast {
	/// The payload as text, exactly as the server sent it when it was a string.
	pub fn raw_text(&self) -> Cow<'_, str> {
		match &self.content {
			Value::String(s) => Cow::Borrowed(s),
			other => Cow::Owned(other.to_string()),
		}
	}
}

/// A decoded notification from the server.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
	Hello(Hello),
	Goodbye(Goodbye),
	AddLink(LinkPair),
	RemoveLink(LinkPair),
	Broadcast(Broadcast),
	SetLinkReliability(f64),
	SetLinkDelay(f64),
}

#[derive(Deserialize)]
struct Envelope {
	#[serde(rename = "type")]
	kind: String,
	#[serde(default)]
	data: Value,
}

impl Inbound {
	/// Decode one text frame.
	///
	/// Returns `Ok(None)` for a well-formed frame whose `type` this client
	/// does not know about.
	pub fn decode(text: &str) -> Result<Option<Self>, SyncError> {
		let Envelope { kind, data } =
			serde_json::from_str(text).map_err(|source| SyncError::MalformedFrame {
				kind: "untyped".to_string(),
				source,
			})?;

		let decoded = match kind.as_str() {
			HELLO => serde_json::from_value(data).map(Inbound::Hello),
			GOODBYE => serde_json::from_value(data).map(Inbound::Goodbye),
			ADD_LINK => serde_json::from_value(data).map(Inbound::AddLink),
			REMOVE_LINK => serde_json::from_value(data).map(Inbound::RemoveLink),
			BROADCAST => serde_json::from_value(data).map(Inbound::Broadcast),
			SET_RELIABILITY => serde_json::from_value(data).map(Inbound::SetLinkReliability),
			SET_DELAY => serde_json::from_value(data).map(Inbound::SetLinkDelay),
			_ => return Ok(None),
		};

		decoded
			.map(Some)
			.map_err(|source| SyncError::MalformedFrame { kind, source })
	}
}

/// A frame sent to the server.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Outbound {
	/// Observer handshake. Always the first frame of a session.
	Observe,
	AddLink(LinkPair),
	RemoveLink(LinkPair),
	SetLinkReliability(f64),
	SetLinkDelay(f64),
}

impl Outbound {
	pub fn encode(&self) -> Result<String, SyncError> {
		serde_json::to_string(self).map_err(SyncError::Encode)
	}
}
