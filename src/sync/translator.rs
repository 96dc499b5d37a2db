//! Applies server notifications to the local model.
//!
//! [`SyncEngine`] owns the store, the overlay manager and the live settings.
//! Every inbound frame runs to completion against them; nothing here blocks
//! or suspends, and no ordering between frames is assumed beyond arrival.

use std::f64::consts::TAU;

use log::{debug, info};

use super::error::SyncError;
use super::format::format_broadcast;
use super::overlay::{ExpiryScheduler, OverlayManager, Rejection};
use super::protocol::{Broadcast, Inbound, LinkPair, PeerId};
use super::settings::{DisplaySettings, LiveSettings, SettingKind};
use super::store::{EdgeId, GraphStore, Position, Purged};
use crate::config::SyncConfig;

/// What a single notification did to local state.
#[derive(Clone, Debug, PartialEq)]
pub enum Applied {
	Joined(PeerId),
	Rejoined(PeerId),
	Left(PeerId, Purged),
	LinkAdded(EdgeId),
	/// Every edge that matched the pair; empty if none did.
	LinkRemoved(Vec<EdgeId>),
	OverlayAdmitted(EdgeId),
	OverlayRejected(Rejection),
	SettingChanged(SettingKind),
	/// Unknown frame type, or a notification that changed nothing.
	Ignored,
}

/// Deterministic hash in `[0, 1)`.
fn pseudo_random(seed: f64) -> f64 {
	let x = (seed * 12.9898 + seed * 78.233).sin() * 43758.5453;
	x - x.floor()
}

#[derive(Debug)]
pub struct SyncEngine {
	store: GraphStore,
	overlays: OverlayManager,
	settings: LiveSettings,
	spawn_radius: f64,
	spawned: u64,
}

impl SyncEngine {
	pub fn new(config: &SyncConfig) -> Self {
		Self {
			store: GraphStore::new(),
			overlays: OverlayManager::new(config),
			settings: LiveSettings::new(config.display_precision),
			spawn_radius: config.spawn_radius,
			spawned: 0,
		}
	}

	/// Decode and apply one text frame.
	///
	/// An error means this frame was skipped; the engine is still consistent
	/// and ready for the next one.
	pub fn handle_frame(
		&mut self,
		text: &str,
		display: &DisplaySettings,
		timers: &mut dyn ExpiryScheduler,
	) -> Result<Applied, SyncError> {
		debug!("sync: got {text}");
		match Inbound::decode(text)? {
			Some(message) => self.apply(message, display, timers),
			None => Ok(Applied::Ignored),
		}
	}

	/// Apply one decoded notification.
	pub fn apply(
		&mut self,
		message: Inbound,
		display: &DisplaySettings,
		timers: &mut dyn ExpiryScheduler,
	) -> Result<Applied, SyncError> {
		match message {
			Inbound::Hello(hello) => {
				let position = self.spawn_position(&hello.uuid);
				if self.store.add_node(hello.uuid.clone(), hello.name, position) {
					Ok(Applied::Joined(hello.uuid))
				} else {
					Ok(Applied::Rejoined(hello.uuid))
				}
			}
			Inbound::Goodbye(goodbye) => Ok(self.remove_peer(goodbye.uuid, timers)),
			Inbound::AddLink(link) => match self.store.add_edge(&link.from, &link.to) {
				Ok(id) => Ok(Applied::LinkAdded(id)),
				Err(SyncError::AlreadyLinked(..)) => Ok(Applied::Ignored),
				Err(e) => Err(e),
			},
			Inbound::RemoveLink(link) => Ok(self.remove_link(&link, timers)),
			Inbound::Broadcast(broadcast) => self.admit_broadcast(&broadcast, display, timers),
			Inbound::SetLinkReliability(value) => self.overwrite(SettingKind::Reliability, value),
			Inbound::SetLinkDelay(value) => self.overwrite(SettingKind::Delay, value),
		}
	}

	/// Expiry callback for an overlay. Idempotent.
	pub fn expire(&mut self, id: EdgeId) -> bool {
		self.overlays.expire(&mut self.store, id)
	}

	/// Drop all derived state after the connection is gone.
	pub fn teardown(&mut self, timers: &mut dyn ExpiryScheduler) {
		self.overlays.clear(timers);
		let purged = self.store.clear();
		info!(
			"sync: torn down ({} links, {} overlays dropped)",
			purged.edges.len(),
			purged.overlays.len()
		);
	}

	pub fn store(&self) -> &GraphStore {
		&self.store
	}

	pub fn store_mut(&mut self) -> &mut GraphStore {
		&mut self.store
	}

	pub fn overlays(&self) -> &OverlayManager {
		&self.overlays
	}

	pub fn settings(&self) -> &LiveSettings {
		&self.settings
	}

	pub fn settings_mut(&mut self) -> &mut LiveSettings {
		&mut self.settings
	}

	fn remove_peer(&mut self, peer: PeerId, timers: &mut dyn ExpiryScheduler) -> Applied {
		let Some(purged) = self.store.remove_node(&peer) else {
			return Applied::Ignored;
		};
		self.overlays.purge(&mut self.store, &purged.overlays, timers);
		Applied::Left(peer, purged)
	}

	fn remove_link(&mut self, link: &LinkPair, timers: &mut dyn ExpiryScheduler) -> Applied {
		let removed = self.store.find_edges(&link.from, &link.to);
		for &id in &removed {
			self.store.remove_edge(id);
		}
		let stale = self.store.overlays_between(&link.from, &link.to);
		self.overlays.purge(&mut self.store, &stale, timers);
		Applied::LinkRemoved(removed)
	}

	fn admit_broadcast(
		&mut self,
		broadcast: &Broadcast,
		display: &DisplaySettings,
		timers: &mut dyn ExpiryScheduler,
	) -> Result<Applied, SyncError> {
		// Skip formatting entirely when nothing would be drawn.
		if !display.edges_enabled {
			return Ok(Applied::OverlayRejected(Rejection::Disabled));
		}
		let label = format_broadcast(&broadcast.raw_text(), display)?;
		Ok(
			match self
				.overlays
				.try_admit(&mut self.store, &broadcast.link, label, display, timers)
			{
				Ok(id) => Applied::OverlayAdmitted(id),
				Err(rejection) => Applied::OverlayRejected(rejection),
			},
		)
	}

	fn overwrite(&mut self, kind: SettingKind, value: f64) -> Result<Applied, SyncError> {
		let value = kind.validate(value)?;
		self.settings.set(kind, value);
		Ok(Applied::SettingChanged(kind))
	}

	fn spawn_position(&mut self, peer: &PeerId) -> Position {
		self.spawned += 1;
		let seed = peer
			.0
			.bytes()
			.fold(self.spawned as f64, |acc, b| (acc * 1.31 + f64::from(b)) % 10_000.0);
		let angle = TAU * pseudo_random(seed);
		Position {
			x: angle.cos() * self.spawn_radius,
			y: angle.sin() * self.spawn_radius,
		}
	}
}
