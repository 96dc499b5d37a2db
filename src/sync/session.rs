//! Connection lifecycle, independent of the actual socket.
//!
//! A session starts out connecting, becomes an observer once the handshake
//! is sent, and ends closed. Closing is terminal: timers are cancelled, the
//! model is torn down and later frames are dropped.

use log::{debug, info, warn};

use super::commands::FrameSink;
use super::error::SyncError;
use super::overlay::ExpiryScheduler;
use super::protocol::Outbound;
use super::settings::DisplaySettings;
use super::store::EdgeId;
use super::translator::{Applied, SyncEngine};
use crate::config::SyncConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
	Connecting,
	Observing,
	Closed,
}

impl SessionState {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Connecting => "connecting",
			Self::Observing => "live",
			Self::Closed => "disconnected",
		}
	}
}

/// WebSocket URL for `path` on the page's host, secure if the page is.
pub fn endpoint_url(page_protocol: &str, host: &str, path: &str) -> String {
	let scheme = if page_protocol == "https:" { "wss" } else { "ws" };
	format!("{scheme}://{host}{path}")
}

#[derive(Debug)]
pub struct Session {
	engine: SyncEngine,
	state: SessionState,
}

impl Session {
	pub fn new(config: &SyncConfig) -> Self {
		Self {
			engine: SyncEngine::new(config),
			state: SessionState::Connecting,
		}
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	/// Transport is up: announce ourselves as an observer.
	pub fn on_open(&mut self, sink: &mut dyn FrameSink) -> Result<(), SyncError> {
		if self.state != SessionState::Connecting {
			return Err(SyncError::Closed);
		}
		sink.send_text(&Outbound::Observe.encode()?)?;
		self.state = SessionState::Observing;
		info!("sync: observing");
		Ok(())
	}

	/// Route one inbound frame. Errors are logged and swallowed so the next
	/// frame is processed normally.
	pub fn on_frame(
		&mut self,
		text: &str,
		display: &DisplaySettings,
		timers: &mut dyn ExpiryScheduler,
	) -> Option<Applied> {
		if self.state != SessionState::Observing {
			debug!("sync: dropping frame while {:?}", self.state);
			return None;
		}
		match self.engine.handle_frame(text, display, timers) {
			Ok(applied) => Some(applied),
			Err(e) => {
				warn!("sync: skipped frame: {e}");
				None
			}
		}
	}

	/// Transport is gone. Safe to call more than once.
	pub fn on_close(&mut self, timers: &mut dyn ExpiryScheduler) {
		if self.state == SessionState::Closed {
			return;
		}
		self.state = SessionState::Closed;
		self.engine.teardown(timers);
		info!("sync: connection closed");
	}

	/// Overlay expiry callback.
	pub fn expire(&mut self, id: EdgeId) -> bool {
		self.engine.expire(id)
	}

	/// Commands may only be sent while observing.
	pub fn ensure_observing(&self) -> Result<(), SyncError> {
		match self.state {
			SessionState::Observing => Ok(()),
			SessionState::Connecting => Err(SyncError::Transport("not connected yet".to_string())),
			SessionState::Closed => Err(SyncError::Closed),
		}
	}

	pub fn engine(&self) -> &SyncEngine {
		&self.engine
	}

	pub fn engine_mut(&mut self) -> &mut SyncEngine {
		&mut self.engine
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::super::commands::RecordingSink;
	use super::super::testing::ManualTimers;
	use super::*;

	const HELLO: &str = r#"{"type":"helloNotification","data":{"uuid":"a","name":"A"}}"#;
	const HELLO_B: &str = r#"{"type":"helloNotification","data":{"uuid":"b","name":"B"}}"#;
	const RAW: &str = r#"{"type":"broadcastNotification","data":{"content":"x","link":{"fromUUID":"a","toUUID":"b"}}}"#;

	#[test]
	fn handshake_is_the_first_frame() {
		let mut session = Session::new(&SyncConfig::default());
		let mut sink = RecordingSink::default();
		session.on_open(&mut sink).unwrap();
		assert_eq!(sink.sent, [r#"{"type":"observe"}"#]);
		assert_eq!(session.state(), SessionState::Observing);
		assert!(session.on_open(&mut sink).is_err());
		assert_eq!(sink.sent.len(), 1);
	}

	#[test]
	fn frames_before_open_are_dropped() {
		let mut session = Session::new(&SyncConfig::default());
		let mut timers = ManualTimers::default();
		assert_eq!(
			session.on_frame(HELLO, &DisplaySettings::default(), &mut timers),
			None
		);
		assert_eq!(session.engine().store().node_count(), 0);
	}

	#[test]
	fn malformed_frame_is_swallowed() {
		let mut session = Session::new(&SyncConfig::default());
		let mut timers = ManualTimers::default();
		session.on_open(&mut RecordingSink::default()).unwrap();
		assert_eq!(
			session.on_frame("][", &DisplaySettings::default(), &mut timers),
			None
		);
		assert!(
			session
				.on_frame(HELLO, &DisplaySettings::default(), &mut timers)
				.is_some()
		);
	}

	#[test]
	fn close_tears_down_and_is_terminal() {
		let mut session = Session::new(&SyncConfig::default());
		let mut timers = ManualTimers::default();
		let display = DisplaySettings {
			label_mode: super::super::settings::LabelMode::Raw,
			..DisplaySettings::default()
		};
		session.on_open(&mut RecordingSink::default()).unwrap();
		for frame in [HELLO, HELLO_B, RAW] {
			session.on_frame(frame, &display, &mut timers);
		}
		assert_eq!(timers.pending(), 1);

		session.on_close(&mut timers);
		session.on_close(&mut timers);
		assert_eq!(session.state(), SessionState::Closed);
		assert_eq!(timers.pending(), 0);
		assert_eq!(timers.cancelled.len(), 1);
		assert_eq!(session.engine().store().node_count(), 0);
		assert_eq!(session.on_frame(HELLO, &display, &mut timers), None);
		assert!(matches!(session.ensure_observing(), Err(SyncError::Closed)));
		assert!(timers.advance(Duration::from_secs(2)).is_empty());
	}

	#[test]
	fn endpoint_follows_page_scheme() {
		assert_eq!(
			endpoint_url("http:", "localhost:8080", "/messaging"),
			"ws://localhost:8080/messaging"
		);
		assert_eq!(
			endpoint_url("https:", "chat.example", "/messaging"),
			"wss://chat.example/messaging"
		);
	}
}
