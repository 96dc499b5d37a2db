//! Layout state for the network view.
//!
//! Wraps the `force_graph` physics simulation. The simulation only knows
//! about peers and structural links; overlays are drawn on top from the
//! store. Whenever the store journals a structural change, the simulation
//! is rebuilt with surviving peers kept where they were.

use std::collections::HashMap;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::scale::{ScaleConfig, ScaledValues};
use super::theme::{Color, Theme};
use crate::sync::protocol::PeerId;
use crate::sync::store::{GraphChange, GraphStore};

/// Per-peer display data attached to each simulated node.
#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub peer: PeerId,
	pub label: String,
	pub color: Color,
	/// Size multiplier, grows with link count.
	pub size: f64,
}

/// Pan and zoom transform applied to the entire view.
#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor, clamped to 0.1..10.0.
	pub k: f64,
}

/// An in-progress node drag.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub peer: Option<PeerId>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

/// An in-progress canvas pan.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// A link being dragged out from `from` towards the cursor, in world space.
#[derive(Clone, Debug)]
pub struct LinkDraft {
	pub from: PeerId,
	pub x: f64,
	pub y: f64,
}

pub struct NetworkGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub draft: Option<LinkDraft>,
	pub hovered: Option<PeerId>,
	pub width: f64,
	pub height: f64,
	positions: HashMap<PeerId, (f64, f64)>,
}

fn new_simulation() -> ForceGraph<NodeInfo, ()> {
	ForceGraph::new(SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	})
}

impl NetworkGraphState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			graph: new_simulation(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			draft: None,
			hovered: None,
			width,
			height,
			positions: HashMap::new(),
		}
	}

	/// Replay journaled store changes. Overlay changes need no layout work.
	pub fn apply_changes(
		&mut self,
		changes: &[GraphChange],
		store: &GraphStore,
		theme: &Theme,
		config: &ScaleConfig,
	) {
		let structural = changes.iter().any(|c| {
			!matches!(
				c,
				GraphChange::OverlayAdded(_) | GraphChange::OverlayRemoved(_)
			)
		});
		if structural {
			self.rebuild(store, theme, config);
		}
	}

	fn rebuild(&mut self, store: &GraphStore, theme: &Theme, config: &ScaleConfig) {
		let mut previous: HashMap<PeerId, (f32, f32, bool)> = HashMap::new();
		self.graph.visit_nodes(|node| {
			previous.insert(
				node.data.user_data.peer.clone(),
				(node.x(), node.y(), node.data.is_anchor),
			);
		});

		let mut degree: HashMap<&PeerId, usize> = HashMap::new();
		for edge in store.edges() {
			*degree.entry(&edge.link.from).or_insert(0) += 1;
			*degree.entry(&edge.link.to).or_insert(0) += 1;
		}
		let max_degree = degree.values().copied().max().unwrap_or(1).max(1);

		let mut graph = new_simulation();
		let mut index = HashMap::new();
		for node in store.nodes() {
			let (x, y, is_anchor) = previous.get(&node.id).copied().unwrap_or((
				(node.position.x * config.seed_scale) as f32,
				(node.position.y * config.seed_scale) as f32,
				false,
			));
			let links = degree.get(&node.id).copied().unwrap_or(0);
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor,
				user_data: NodeInfo {
					peer: node.id.clone(),
					label: node.label.clone(),
					color: theme.palette.for_key(&node.id.0),
					size: 1.0 + 0.6 * (links as f64 / max_degree as f64).sqrt(),
				},
			});
			index.insert(&node.id, idx);
		}

		for edge in store.edges() {
			if let (Some(&a), Some(&b)) = (index.get(&edge.link.from), index.get(&edge.link.to)) {
				graph.add_edge(a, b, EdgeData::default());
			}
		}

		self.graph = graph;
		if self.drag.peer.as_ref().is_some_and(|p| !store.contains_node(p)) {
			self.drag = DragState::default();
		}
		if self.draft.as_ref().is_some_and(|d| !store.contains_node(&d.from)) {
			self.draft = None;
		}
		if self.hovered.as_ref().is_some_and(|p| !store.contains_node(p)) {
			self.hovered = None;
		}
		self.refresh_positions();
	}

	fn refresh_positions(&mut self) {
		self.positions.clear();
		let positions = &mut self.positions;
		self.graph.visit_nodes(|node| {
			positions.insert(
				node.data.user_data.peer.clone(),
				(node.x() as f64, node.y() as f64),
			);
		});
	}

	/// World position of a peer as of the last tick.
	pub fn position_of(&self, peer: &PeerId) -> Option<(f64, f64)> {
		self.positions.get(peer).copied()
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn peer_at_position(&self, sx: f64, sy: f64, config: &ScaleConfig) -> Option<PeerId> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let scale = ScaledValues::new(config, self.transform.k);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if dx.hypot(dy) < scale.hit_radius * node.data.user_data.size {
				found = Some(node.data.user_data.peer.clone());
			}
		});
		found
	}

	/// Start dragging `peer` from screen position `(sx, sy)`.
	pub fn begin_drag(&mut self, peer: PeerId, sx: f64, sy: f64) {
		let mut start = (0.0, 0.0);
		self.graph.visit_nodes(|node| {
			if node.data.user_data.peer == peer {
				start = (node.x(), node.y());
			}
		});
		self.drag = DragState {
			peer: Some(peer),
			start_x: sx,
			start_y: sy,
			node_start_x: start.0,
			node_start_y: start.1,
		};
	}

	/// Move the dragged peer and pin it where it is dropped.
	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(peer) = self.drag.peer.clone() else {
			return;
		};
		let (nx, ny) = (
			self.drag.node_start_x + ((sx - self.drag.start_x) / self.transform.k) as f32,
			self.drag.node_start_y + ((sy - self.drag.start_y) / self.transform.k) as f32,
		);
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data.peer == peer {
				node.data.x = nx;
				node.data.y = ny;
				node.data.is_anchor = true;
			}
		});
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.refresh_positions();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sync::store::Position;

	fn store_with(peers: &[&str]) -> GraphStore {
		let mut store = GraphStore::new();
		for (i, p) in peers.iter().enumerate() {
			store.add_node(
				PeerId::from(*p),
				p.to_uppercase(),
				Position {
					x: 0.2 * i as f64,
					y: 0.0,
				},
			);
		}
		store
	}

	fn sync(state: &mut NetworkGraphState, store: &mut GraphStore) {
		let changes = store.drain_changes();
		state.apply_changes(&changes, store, &Theme::default(), &ScaleConfig::default());
	}

	#[test]
	fn seeds_new_peers_from_store_positions() {
		let mut store = store_with(&["a", "b"]);
		let mut state = NetworkGraphState::new(800.0, 600.0);
		sync(&mut state, &mut store);
		assert_eq!(state.position_of(&"a".into()), Some((0.0, 0.0)));
		let (bx, _) = state.position_of(&"b".into()).unwrap();
		assert!((bx - 100.0).abs() < 1e-3);
	}

	#[test]
	fn rebuild_keeps_surviving_positions_and_drops_departed() {
		let mut store = store_with(&["a", "b"]);
		let mut state = NetworkGraphState::new(800.0, 600.0);
		sync(&mut state, &mut store);

		state.begin_drag("b".into(), 0.0, 0.0);
		state.drag_to(50.0, 50.0);

		store.add_edge(&"a".into(), &"b".into()).unwrap();
		sync(&mut state, &mut store);
		let (bx, by) = state.position_of(&"b".into()).unwrap();
		assert!((bx - 150.0).abs() < 1e-3 && (by - 50.0).abs() < 1e-3);

		store.remove_node(&"b".into());
		sync(&mut state, &mut store);
		assert_eq!(state.position_of(&"b".into()), None);
		assert!(state.drag.peer.is_none());
	}

	#[test]
	fn hit_testing_finds_peer_under_cursor() {
		let mut store = store_with(&["a"]);
		let mut state = NetworkGraphState::new(800.0, 600.0);
		sync(&mut state, &mut store);
		assert_eq!(state.peer_at_position(400.0, 300.0, &ScaleConfig::default()), Some("a".into()));
		assert_eq!(state.peer_at_position(10.0, 10.0, &ScaleConfig::default()), None);
	}
}
