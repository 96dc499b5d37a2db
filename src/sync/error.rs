//! Error taxonomy for the synchronization engine.
//!
//! Nothing here is fatal to a session. Malformed frames and rejected
//! commands are logged by the caller, which then carries on with the next
//! unit of work.

use thiserror::Error;

use super::protocol::PeerId;
use super::settings::SettingKind;

/// Everything that can go wrong while syncing with the simulation server.
#[derive(Debug, Error)]
pub enum SyncError {
	/// A frame was not valid JSON or did not match the shape its `type` promised.
	#[error("malformed {kind} frame: {source}")]
	MalformedFrame {
		kind: String,
		#[source]
		source: serde_json::Error,
	},

	/// A broadcast payload could not be read as chat-protocol content.
	#[error("malformed broadcast content: {0}")]
	MalformedContent(#[source] serde_json::Error),

	/// A setting value was NaN, infinite, or outside its range.
	#[error("{kind} value {value} is out of range")]
	OutOfRange { kind: SettingKind, value: f64 },

	/// A link from a peer to itself.
	#[error("self-loop on peer {0}")]
	SelfLoop(PeerId),

	/// The unordered pair is already linked.
	#[error("peers {0} and {1} are already linked")]
	AlreadyLinked(PeerId, PeerId),

	/// A link or overlay references a peer the store does not know.
	#[error("unknown peer {0}")]
	UnknownPeer(PeerId),

	/// Outbound serialization failed.
	#[error("failed to encode outbound frame: {0}")]
	Encode(#[source] serde_json::Error),

	/// The transport rejected a send or could not be opened.
	#[error("transport error: {0}")]
	Transport(String),

	/// The session is closed; nothing more can be sent.
	#[error("session is closed")]
	Closed,
}
