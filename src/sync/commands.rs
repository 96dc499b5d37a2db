//! Operator commands sent to the server.
//!
//! None of these touch the graph. A link appears or disappears only when
//! the server's notification comes back through the translator. Setting
//! commands do refresh the local read-out straight away.

use log::debug;

use super::error::SyncError;
use super::protocol::{LinkPair, Outbound, PeerId};
use super::settings::{LiveSettings, SettingKind};
use super::store::GraphStore;

/// Where encoded frames go. Implemented by the browser socket and by test sinks.
pub trait FrameSink {
	fn send_text(&mut self, text: &str) -> Result<(), SyncError>;
}

/// Which request a link gesture turned into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkRequest {
	Add,
	Remove,
}

/// Encodes operator gestures onto a [`FrameSink`].
pub struct CommandDispatcher<'a> {
	sink: &'a mut dyn FrameSink,
}

impl<'a> CommandDispatcher<'a> {
	pub fn new(sink: &'a mut dyn FrameSink) -> Self {
		Self { sink }
	}

	/// Ask the server to link `a` and `b`.
	///
	/// Refused locally for self-loops and for pairs that are already linked,
	/// since the server would ignore them anyway.
	pub fn request_add_link(
		&mut self,
		store: &GraphStore,
		a: &PeerId,
		b: &PeerId,
	) -> Result<(), SyncError> {
		if a == b {
			return Err(SyncError::SelfLoop(a.clone()));
		}
		if !store.find_edges(a, b).is_empty() {
			return Err(SyncError::AlreadyLinked(a.clone(), b.clone()));
		}
		self.send(&Outbound::AddLink(LinkPair {
			from: a.clone(),
			to: b.clone(),
		}))
	}

	pub fn request_remove_link(&mut self, a: &PeerId, b: &PeerId) -> Result<(), SyncError> {
		self.send(&Outbound::RemoveLink(LinkPair {
			from: a.clone(),
			to: b.clone(),
		}))
	}

	/// A drag from one peer to another: link them, or unlink them if they
	/// already are.
	pub fn request_link_toggle(
		&mut self,
		store: &GraphStore,
		a: &PeerId,
		b: &PeerId,
	) -> Result<LinkRequest, SyncError> {
		if store.find_edges(a, b).is_empty() {
			self.request_add_link(store, a, b)?;
			Ok(LinkRequest::Add)
		} else {
			self.request_remove_link(a, b)?;
			Ok(LinkRequest::Remove)
		}
	}

	pub fn request_set_reliability(
		&mut self,
		settings: &mut LiveSettings,
		value: f64,
	) -> Result<(), SyncError> {
		self.request_setting(settings, SettingKind::Reliability, value)
	}

	pub fn request_set_delay(&mut self, settings: &mut LiveSettings, value: f64) -> Result<(), SyncError> {
		self.request_setting(settings, SettingKind::Delay, value)
	}

	fn request_setting(
		&mut self,
		settings: &mut LiveSettings,
		kind: SettingKind,
		value: f64,
	) -> Result<(), SyncError> {
		let value = kind.validate(value)?;
		let frame = match kind {
			SettingKind::Reliability => Outbound::SetLinkReliability(value),
			SettingKind::Delay => Outbound::SetLinkDelay(value),
		};
		self.send(&frame)?;
		settings.set(kind, value);
		Ok(())
	}

	fn send(&mut self, frame: &Outbound) -> Result<(), SyncError> {
		let text = frame.encode()?;
		debug!("sync: sending {text}");
		self.sink.send_text(&text)
	}
}

/// Collects frames in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
	pub sent: Vec<String>,
	pub closed: bool,
}

#[cfg(test)]
impl FrameSink for RecordingSink {
	fn send_text(&mut self, text: &str) -> Result<(), SyncError> {
		if self.closed {
			return Err(SyncError::Closed);
		}
		self.sent.push(text.to_string());
		Ok(())
	}
}
