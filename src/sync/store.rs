//! Local model of the network: peers, structural links and overlay edges.
//!
//! Links are undirected: `(a, b)` and `(b, a)` name the same link, and at
//! most one structural edge exists per unordered pair. Overlay edges share
//! the id space but are not unique per pair.
//!
//! Every mutation is recorded in a change journal. The renderer drains it
//! once per frame and replays it onto its own layout state, so the store
//! never needs to know how it is drawn.

use std::collections::BTreeMap;
use std::fmt;

use super::error::SyncError;
use super::format::OverlayColor;
use super::protocol::{LinkPair, PeerId};

/// Store-assigned edge identifier. Structural and overlay edges share one
/// sequence, so an id is never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u64);

impl fmt::Display for EdgeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "e{}", self.0)
	}
}

/// Seed position handed to the layout engine when a peer appears.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

/// A peer.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: PeerId,
	pub label: String,
	pub position: Position,
}

/// An active structural link.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub id: EdgeId,
	pub link: LinkPair,
}

/// The visual trace of one in-flight broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayEdge {
	pub id: EdgeId,
	pub link: LinkPair,
	pub label: String,
	pub color: OverlayColor,
	/// Maximum label width before wrapping, in screen pixels.
	pub width: f64,
}

/// One mutation, as seen by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphChange {
	NodeAdded(PeerId),
	NodeRelabeled(PeerId),
	NodeRemoved(PeerId),
	EdgeAdded(EdgeId),
	EdgeRemoved(EdgeId),
	OverlayAdded(EdgeId),
	OverlayRemoved(EdgeId),
}

/// Edges swept away as a side effect of removing a node or clearing the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Purged {
	pub edges: Vec<EdgeId>,
	pub overlays: Vec<EdgeId>,
}

#[derive(Debug, Default)]
pub struct GraphStore {
	nodes: BTreeMap<PeerId, Node>,
	edges: BTreeMap<EdgeId, Edge>,
	overlays: BTreeMap<EdgeId, OverlayEdge>,
	next_id: u64,
	changes: Vec<GraphChange>,
}

impl GraphStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a peer. A repeated hello only refreshes the label; the seed
	/// position and any links survive. Returns `true` for a new peer.
	pub fn add_node(&mut self, id: PeerId, label: String, position: Position) -> bool {
		if let Some(node) = self.nodes.get_mut(&id) {
			if node.label != label {
				node.label = label;
				self.changes.push(GraphChange::NodeRelabeled(id));
			}
			return false;
		}
		self.nodes.insert(
			id.clone(),
			Node {
				id: id.clone(),
				label,
				position,
			},
		);
		self.changes.push(GraphChange::NodeAdded(id));
		true
	}

	/// Remove a peer together with every structural and overlay edge that
	/// touches it. Returns `None` if the peer was unknown.
	pub fn remove_node(&mut self, id: &PeerId) -> Option<Purged> {
		self.nodes.remove(id)?;

		let edges: Vec<EdgeId> = self
			.edges
			.values()
			.filter(|e| e.link.touches(id))
			.map(|e| e.id)
			.collect();
		let overlays: Vec<EdgeId> = self
			.overlays
			.values()
			.filter(|o| o.link.touches(id))
			.map(|o| o.id)
			.collect();

		for &edge in &edges {
			self.remove_edge(edge);
		}
		for &overlay in &overlays {
			self.remove_overlay(overlay);
		}
		self.changes.push(GraphChange::NodeRemoved(id.clone()));

		Some(Purged { edges, overlays })
	}

	/// All structural edges joining `a` and `b`, in either direction.
	pub fn find_edges(&self, a: &PeerId, b: &PeerId) -> Vec<EdgeId> {
		self.edges
			.values()
			.filter(|e| e.link.connects(a, b))
			.map(|e| e.id)
			.collect()
	}

	/// Insert a structural edge unless it would be a self-loop, dangle, or
	/// duplicate an existing link on the same unordered pair.
	pub fn add_edge(&mut self, a: &PeerId, b: &PeerId) -> Result<EdgeId, SyncError> {
		if a == b {
			return Err(SyncError::SelfLoop(a.clone()));
		}
		self.require_node(a)?;
		self.require_node(b)?;
		if !self.find_edges(a, b).is_empty() {
			return Err(SyncError::AlreadyLinked(a.clone(), b.clone()));
		}

		let id = self.allocate_id();
		self.edges.insert(
			id,
			Edge {
				id,
				link: LinkPair {
					from: a.clone(),
					to: b.clone(),
				},
			},
		);
		self.changes.push(GraphChange::EdgeAdded(id));
		Ok(id)
	}

	/// Remove one structural edge. Unknown ids are ignored.
	pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
		let edge = self.edges.remove(&id)?;
		self.changes.push(GraphChange::EdgeRemoved(id));
		Some(edge)
	}

	/// Insert an overlay edge. Both endpoints must be known peers.
	pub fn add_overlay(
		&mut self,
		link: &LinkPair,
		label: String,
		color: OverlayColor,
		width: f64,
	) -> Result<EdgeId, SyncError> {
		self.require_node(&link.from)?;
		self.require_node(&link.to)?;

		let id = self.allocate_id();
		self.overlays.insert(
			id,
			OverlayEdge {
				id,
				link: link.clone(),
				label,
				color,
				width,
			},
		);
		self.changes.push(GraphChange::OverlayAdded(id));
		Ok(id)
	}

	/// Remove one overlay edge. Unknown ids are ignored, so expiry and
	/// purge may race without double-removing.
	pub fn remove_overlay(&mut self, id: EdgeId) -> Option<OverlayEdge> {
		let overlay = self.overlays.remove(&id)?;
		self.changes.push(GraphChange::OverlayRemoved(id));
		Some(overlay)
	}

	/// Overlay edges currently drawn between `a` and `b`, in either direction.
	pub fn overlays_between(&self, a: &PeerId, b: &PeerId) -> Vec<EdgeId> {
		self.overlays
			.values()
			.filter(|o| o.link.connects(a, b))
			.map(|o| o.id)
			.collect()
	}

	/// Drop everything, journaling a removal for each node and edge.
	pub fn clear(&mut self) -> Purged {
		let purged = Purged {
			edges: self.edges.keys().copied().collect(),
			overlays: self.overlays.keys().copied().collect(),
		};
		for &id in &purged.overlays {
			self.remove_overlay(id);
		}
		for &id in &purged.edges {
			self.remove_edge(id);
		}
		for id in std::mem::take(&mut self.nodes).into_keys() {
			self.changes.push(GraphChange::NodeRemoved(id));
		}
		purged
	}

	/// Take every change recorded since the last drain, oldest first.
	pub fn drain_changes(&mut self) -> Vec<GraphChange> {
		std::mem::take(&mut self.changes)
	}

	pub fn node(&self, id: &PeerId) -> Option<&Node> {
		self.nodes.get(id)
	}

	pub fn contains_node(&self, id: &PeerId) -> bool {
		self.nodes.contains_key(id)
	}

	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.values()
	}

	pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
		self.edges.get(&id)
	}

	pub fn edges(&self) -> impl Iterator<Item = &Edge> {
		self.edges.values()
	}

	pub fn overlay(&self, id: EdgeId) -> Option<&OverlayEdge> {
		self.overlays.get(&id)
	}

	pub fn overlays(&self) -> impl Iterator<Item = &OverlayEdge> {
		self.overlays.values()
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn overlay_count(&self) -> usize {
		self.overlays.len()
	}

	fn require_node(&self, id: &PeerId) -> Result<(), SyncError> {
		if self.nodes.contains_key(id) {
			Ok(())
		} else {
			Err(SyncError::UnknownPeer(id.clone()))
		}
	}

	fn allocate_id(&mut self) -> EdgeId {
		self.next_id += 1;
		EdgeId(self.next_id)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use proptest::prelude::*;

	use super::*;

	fn peer(s: &str) -> PeerId {
		PeerId::from(s)
	}

	fn store_with(peers: &[&str]) -> GraphStore {
		let mut store = GraphStore::new();
		for p in peers {
			store.add_node(peer(p), p.to_uppercase(), Position::default());
		}
		store
	}

	#[test]
	fn edges_are_undirected() {
		let mut store = store_with(&["u1", "u2"]);
		let id = store.add_edge(&peer("u1"), &peer("u2")).unwrap();
		assert_eq!(store.find_edges(&peer("u1"), &peer("u2")), vec![id]);
		assert_eq!(store.find_edges(&peer("u2"), &peer("u1")), vec![id]);
	}

	#[test]
	fn duplicate_link_is_rejected_in_either_direction() {
		let mut store = store_with(&["a", "b"]);
		store.add_edge(&peer("a"), &peer("b")).unwrap();
		assert!(matches!(
			store.add_edge(&peer("a"), &peer("b")),
			Err(SyncError::AlreadyLinked(..))
		));
		assert!(matches!(
			store.add_edge(&peer("b"), &peer("a")),
			Err(SyncError::AlreadyLinked(..))
		));
		assert_eq!(store.edge_count(), 1);
	}

	#[test]
	fn relinking_after_removal_is_allowed() {
		let mut store = store_with(&["a", "b"]);
		let first = store.add_edge(&peer("a"), &peer("b")).unwrap();
		store.remove_edge(first);
		let second = store.add_edge(&peer("b"), &peer("a")).unwrap();
		assert_ne!(first, second);
	}

	#[test]
	fn self_loops_and_dangling_links_are_rejected() {
		let mut store = store_with(&["a"]);
		assert!(matches!(
			store.add_edge(&peer("a"), &peer("a")),
			Err(SyncError::SelfLoop(_))
		));
		assert!(matches!(
			store.add_edge(&peer("a"), &peer("ghost")),
			Err(SyncError::UnknownPeer(_))
		));
	}

	#[test]
	fn removing_a_node_cascades_to_its_edges_and_overlays() {
		let mut store = store_with(&["a", "b", "c"]);
		let ab = store.add_edge(&peer("a"), &peer("b")).unwrap();
		let bc = store.add_edge(&peer("b"), &peer("c")).unwrap();
		let overlay = store
			.add_overlay(&LinkPair::new("b", "a"), "hi".into(), OverlayColor::Chat, 400.0)
			.unwrap();

		let purged = store.remove_node(&peer("a")).unwrap();
		assert_eq!(purged.edges, vec![ab]);
		assert_eq!(purged.overlays, vec![overlay]);
		assert!(store.edge(ab).is_none());
		assert!(store.edge(bc).is_some());
		assert_eq!(store.overlay_count(), 0);
		assert!(store.remove_node(&peer("a")).is_none());
	}

	#[test]
	fn repeated_hello_refreshes_label_and_keeps_links() {
		let mut store = store_with(&["a", "b"]);
		store.add_edge(&peer("a"), &peer("b")).unwrap();
		store.drain_changes();

		let position = Position { x: 9.0, y: 9.0 };
		assert!(!store.add_node(peer("a"), "Alice".into(), position));
		assert_eq!(store.node(&peer("a")).unwrap().label, "Alice");
		assert_eq!(store.node(&peer("a")).unwrap().position, Position::default());
		assert_eq!(store.edge_count(), 1);
		assert_eq!(store.drain_changes(), vec![GraphChange::NodeRelabeled(peer("a"))]);
	}

	#[test]
	fn overlays_may_repeat_on_one_pair() {
		let mut store = store_with(&["a", "b"]);
		let link = LinkPair::new("a", "b");
		let first = store.add_overlay(&link, "1".into(), OverlayColor::Raw, 400.0).unwrap();
		let second = store.add_overlay(&link, "2".into(), OverlayColor::Raw, 400.0).unwrap();
		assert_eq!(store.overlays_between(&peer("b"), &peer("a")), vec![first, second]);
		assert!(store.remove_overlay(first).is_some());
		assert!(store.remove_overlay(first).is_none());
	}

	#[test]
	fn journal_records_mutations_in_order() {
		let mut store = store_with(&["a", "b"]);
		let edge = store.add_edge(&peer("a"), &peer("b")).unwrap();
		store.remove_node(&peer("b"));
		assert_eq!(
			store.drain_changes(),
			vec![
				GraphChange::NodeAdded(peer("a")),
				GraphChange::NodeAdded(peer("b")),
				GraphChange::EdgeAdded(edge),
				GraphChange::EdgeRemoved(edge),
				GraphChange::NodeRemoved(peer("b")),
			]
		);
		assert!(store.drain_changes().is_empty());
	}

	#[test]
	fn clear_empties_everything() {
		let mut store = store_with(&["a", "b"]);
		let edge = store.add_edge(&peer("a"), &peer("b")).unwrap();
		let overlay = store
			.add_overlay(&LinkPair::new("a", "b"), "x".into(), OverlayColor::Presence, 400.0)
			.unwrap();
		let purged = store.clear();
		assert_eq!(purged.edges, vec![edge]);
		assert_eq!(purged.overlays, vec![overlay]);
		assert_eq!(store.node_count(), 0);
		assert_eq!(store.edge_count(), 0);
		assert_eq!(store.overlay_count(), 0);
	}

	#[derive(Clone, Debug)]
	enum Presence {
		Join(u8),
		Leave(u8),
	}

	fn presence() -> impl Strategy<Value = Presence> {
		prop_oneof![
			(0u8..6).prop_map(Presence::Join),
			(0u8..6).prop_map(Presence::Leave),
		]
	}

	proptest! {
		#[test]
		fn node_set_tracks_latest_join_or_leave(ops in prop::collection::vec(presence(), 0..40)) {
			let mut store = GraphStore::new();
			let mut expected = BTreeSet::new();
			for op in &ops {
				match op {
					Presence::Join(n) => {
						store.add_node(PeerId(n.to_string()), String::new(), Position::default());
						expected.insert(n.to_string());
					}
					Presence::Leave(n) => {
						store.remove_node(&PeerId(n.to_string()));
						expected.remove(&n.to_string());
					}
				}
			}
			let actual: BTreeSet<String> = store.nodes().map(|n| n.id.0.clone()).collect();
			prop_assert_eq!(actual, expected);
		}

		#[test]
		fn find_edges_is_symmetric(links in prop::collection::vec((0u8..5, 0u8..5), 0..20), a in 0u8..5, b in 0u8..5) {
			let mut store = GraphStore::new();
			for n in 0..5u8 {
				store.add_node(PeerId(n.to_string()), String::new(), Position::default());
			}
			for (x, y) in links {
				let _ = store.add_edge(&PeerId(x.to_string()), &PeerId(y.to_string()));
			}
			let (a, b) = (PeerId(a.to_string()), PeerId(b.to_string()));
			let forward = store.find_edges(&a, &b);
			prop_assert_eq!(&forward, &store.find_edges(&b, &a));
			prop_assert!(forward.len() <= 1);
		}
	}
}
