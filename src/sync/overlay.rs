//! Admission and expiry of broadcast overlays.
//!
//! Each admitted overlay owns exactly one pending expiry, keyed by its edge
//! id. Expiry, purge and teardown all go through the `live` set, so whichever
//! path runs first wins and the others become no-ops.

use std::collections::BTreeSet;
use std::time::Duration;

use log::debug;

use super::format::OverlayLabel;
use super::protocol::LinkPair;
use super::settings::DisplaySettings;
use super::store::{EdgeId, GraphStore};
use crate::config::SyncConfig;

/// Deferred, cancellable expiry of overlays.
///
/// Implementations call back into [`OverlayManager::expire`] (usually via
/// the engine) once `after` has elapsed, unless the id was cancelled first.
pub trait ExpiryScheduler {
	fn schedule(&mut self, id: EdgeId, after: Duration);
	/// Cancel a pending expiry. Unknown or already-fired ids are ignored.
	fn cancel(&mut self, id: EdgeId);
}

/// Why a broadcast did not produce an overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
	/// Live edges are switched off.
	Disabled,
	/// The formatter had nothing to show.
	Suppressed,
	/// The concurrency cap is reached.
	AtCapacity,
	/// One end of the link is not a known peer.
	UnknownPeer,
}

#[derive(Debug)]
pub struct OverlayManager {
	live: BTreeSet<EdgeId>,
	lifetime: Duration,
	cap_per_node: usize,
	label_width: f64,
}

impl OverlayManager {
	pub fn new(config: &SyncConfig) -> Self {
		Self {
			live: BTreeSet::new(),
			lifetime: config.overlay_lifetime(),
			cap_per_node: config.overlay_cap_per_node,
			label_width: config.overlay_label_width,
		}
	}

	/// Overlays currently on screen.
	pub fn live_count(&self) -> usize {
		self.live.len()
	}

	/// Admission ceiling for a network of `node_count` peers.
	pub fn capacity(&self, node_count: usize) -> usize {
		self.cap_per_node * node_count
	}

	/// Create an overlay for one broadcast and schedule its expiry.
	pub fn try_admit(
		&mut self,
		store: &mut GraphStore,
		link: &LinkPair,
		label: Option<OverlayLabel>,
		display: &DisplaySettings,
		timers: &mut dyn ExpiryScheduler,
	) -> Result<EdgeId, Rejection> {
		if !display.edges_enabled {
			return Err(Rejection::Disabled);
		}
		let label = label.ok_or(Rejection::Suppressed)?;
		if self.live.len() >= self.capacity(store.node_count()) {
			return Err(Rejection::AtCapacity);
		}

		let id = store
			.add_overlay(link, label.text, label.color, self.label_width)
			.map_err(|_| Rejection::UnknownPeer)?;
		self.live.insert(id);
		timers.schedule(id, self.lifetime);
		Ok(id)
	}

	/// Expiry callback. Returns `false` if the overlay was already gone.
	pub fn expire(&mut self, store: &mut GraphStore, id: EdgeId) -> bool {
		if !self.live.remove(&id) {
			return false;
		}
		store.remove_overlay(id);
		true
	}

	/// Remove overlays early, cancelling their pending expiry.
	pub fn purge(
		&mut self,
		store: &mut GraphStore,
		ids: &[EdgeId],
		timers: &mut dyn ExpiryScheduler,
	) {
		for &id in ids {
			if self.live.remove(&id) {
				timers.cancel(id);
				debug!("overlay {id} purged before expiry");
			}
			store.remove_overlay(id);
		}
	}

	/// Cancel every pending expiry. The store is cleared separately.
	pub fn clear(&mut self, timers: &mut dyn ExpiryScheduler) {
		for id in std::mem::take(&mut self.live) {
			timers.cancel(id);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::format::OverlayColor;
	use super::super::protocol::PeerId;
	use super::super::store::Position;
	use super::super::testing::ManualTimers;
	use super::*;

	fn label(text: &str) -> Option<OverlayLabel> {
		Some(OverlayLabel {
			text: text.to_string(),
			color: OverlayColor::Chat,
		})
	}

	fn setup(peers: &[&str]) -> (GraphStore, OverlayManager, ManualTimers) {
		let mut store = GraphStore::new();
		for p in peers {
			store.add_node(PeerId::from(*p), p.to_string(), Position::default());
		}
		(store, OverlayManager::new(&SyncConfig::default()), ManualTimers::default())
	}

	#[test]
	fn admitted_overlay_expires_once_after_lifetime() {
		let (mut store, mut overlays, mut timers) = setup(&["a", "b"]);
		let display = DisplaySettings::default();
		let id = overlays
			.try_admit(&mut store, &LinkPair::new("a", "b"), label("hi"), &display, &mut timers)
			.unwrap();
		assert_eq!(overlays.live_count(), 1);

		assert!(timers.advance(Duration::from_millis(999)).is_empty());
		let due = timers.advance(Duration::from_millis(1));
		assert_eq!(due, vec![id]);
		assert!(overlays.expire(&mut store, id));
		assert!(!overlays.expire(&mut store, id));
		assert_eq!(overlays.live_count(), 0);
		assert!(store.overlay(id).is_none());
	}

	#[test]
	fn disabled_and_suppressed_are_rejected() {
		let (mut store, mut overlays, mut timers) = setup(&["a", "b"]);
		let link = LinkPair::new("a", "b");
		let off = DisplaySettings {
			edges_enabled: false,
			..DisplaySettings::default()
		};
		assert_eq!(
			overlays.try_admit(&mut store, &link, label("hi"), &off, &mut timers),
			Err(Rejection::Disabled)
		);
		assert_eq!(
			overlays.try_admit(&mut store, &link, None, &DisplaySettings::default(), &mut timers),
			Err(Rejection::Suppressed)
		);
		assert_eq!(timers.pending(), 0);
		assert_eq!(store.overlay_count(), 0);
	}

	#[test]
	fn cap_is_eight_per_node() {
		let (mut store, mut overlays, mut timers) = setup(&["a", "b"]);
		let link = LinkPair::new("a", "b");
		let display = DisplaySettings::default();
		for _ in 0..16 {
			overlays
				.try_admit(&mut store, &link, label("x"), &display, &mut timers)
				.unwrap();
		}
		assert_eq!(
			overlays.try_admit(&mut store, &link, label("x"), &display, &mut timers),
			Err(Rejection::AtCapacity)
		);

		let due = timers.advance(Duration::from_millis(1000));
		overlays.expire(&mut store, due[0]);
		assert!(
			overlays
				.try_admit(&mut store, &link, label("x"), &display, &mut timers)
				.is_ok()
		);
	}

	#[test]
	fn unknown_endpoint_is_rejected_without_scheduling() {
		let (mut store, mut overlays, mut timers) = setup(&["a"]);
		assert_eq!(
			overlays.try_admit(
				&mut store,
				&LinkPair::new("a", "ghost"),
				label("x"),
				&DisplaySettings::default(),
				&mut timers
			),
			Err(Rejection::UnknownPeer)
		);
		assert_eq!(overlays.live_count(), 0);
		assert_eq!(timers.pending(), 0);
	}

	#[test]
	fn purge_cancels_timer_and_later_expiry_is_a_no_op() {
		let (mut store, mut overlays, mut timers) = setup(&["a", "b"]);
		let id = overlays
			.try_admit(
				&mut store,
				&LinkPair::new("a", "b"),
				label("x"),
				&DisplaySettings::default(),
				&mut timers,
			)
			.unwrap();
		overlays.purge(&mut store, &[id], &mut timers);
		assert_eq!(timers.cancelled, vec![id]);
		assert_eq!(overlays.live_count(), 0);
		assert!(!overlays.expire(&mut store, id));
	}
}
