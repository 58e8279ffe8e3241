use log::debug;

use super::config::{ConceptMapConfig, LayoutConfig, ZoomConfig};
use super::render::{self, NodeStyle, node_radius};
use super::simulation::Simulation;
use super::store::{GraphStore, MergeOutcome};
use super::tooltip::Tooltip;
use super::types::{ConceptContextResult, EdgeKey};

/// Screen distance a press may travel and still count as a click.
const CLICK_TOLERANCE: f64 = 3.0;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Node under the pointer and the pointer's container-local position.
#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub x: f64,
	pub y: f64,
}

/// Everything the explorer mutates between frames: the graph, its layout and
/// the pointer-driven view state.
pub struct ConceptMapState {
	pub store: GraphStore,
	pub simulation: Simulation,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	layout: LayoutConfig,
	zoom: ZoomConfig,
}

impl ConceptMapState {
	pub fn new(config: &ConceptMapConfig, seed: u64, width: f64, height: f64) -> Self {
		let mut state = Self {
			store: GraphStore::new(&config.layout, seed),
			simulation: Simulation::new(config.layout.clone(), seed.wrapping_add(1)),
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			layout: config.layout.clone(),
			zoom: config.zoom.clone(),
		};
		state.resize(width, height);
		state
	}

	/// Merge a retrieval result and restart the layout over the new membership.
	pub fn merge_result(&mut self, result: &ConceptContextResult) -> MergeOutcome {
		let outcome = self.store.merge(result);
		self.simulation.restart(&self.store);
		if outcome.is_structural() {
			debug!(
				"merged '{}': +{} nodes, +{} edges ({} nodes, {} edges total)",
				result.concept_name,
				outcome.added_nodes,
				outcome.added_edges,
				self.store.node_count(),
				self.store.edge_count()
			);
		} else {
			debug!("merged '{}': no new nodes or edges", result.concept_name);
		}
		outcome
	}

	/// Returns true when positions changed and the scene needs redrawing.
	pub fn tick(&mut self, dt: f64) -> bool {
		self.simulation.advance(&mut self.store, dt)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.store.set_viewport_center(width / 2.0, height / 2.0);
		self.simulation.set_center(width / 2.0, height / 2.0);
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node under a screen point; later nodes are drawn over earlier ones.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.store
			.nodes()
			.iter()
			.enumerate()
			.rev()
			.find(|(_, node)| {
				let (dx, dy) = (node.x - gx, node.y - gy);
				let r = node_radius(node);
				dx * dx + dy * dy <= r * r
			})
			.map(|(idx, _)| idx)
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		if let Some(idx) = self.node_at_position(sx, sy) {
			let node = &mut self.store.nodes_mut()[idx];
			node.fx = Some(node.x);
			node.fy = Some(node.y);
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				start_x: sx,
				start_y: sy,
				node_start_x: node.x,
				node_start_y: node.y,
				moved: false,
			};
			self.simulation.set_alpha_target(self.layout.drag_alpha_target);
		} else {
			self.pan = PanState {
				active: true,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		let node = if self.drag.active {
			self.drag.node_idx
		} else {
			self.node_at_position(sx, sy)
		};
		self.hover = HoverState { node, x: sx, y: sy };

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
			if dx * dx + dy * dy > CLICK_TOLERANCE * CLICK_TOLERANCE {
				self.drag.moved = true;
			}
			let (nx, ny) = (
				self.drag.node_start_x + dx / self.transform.k,
				self.drag.node_start_y + dy / self.transform.k,
			);
			if let Some(node) = self.store.nodes_mut().get_mut(idx) {
				node.fx = Some(nx);
				node.fy = Some(ny);
			}
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	/// Ends a drag or pan. Returns the concept name when the press was a click
	/// on a node rather than a drag.
	pub fn pointer_up(&mut self) -> Option<String> {
		let clicked = if self.drag.active && !self.drag.moved {
			self.drag
				.node_idx
				.and_then(|idx| self.store.nodes().get(idx))
				.map(|node| node.id.clone())
		} else {
			None
		};
		self.release();
		clicked
	}

	pub fn pointer_leave(&mut self) {
		self.release();
		self.hover.node = None;
	}

	fn release(&mut self) {
		if self.drag.active {
			if let Some(node) = self
				.drag
				.node_idx
				.and_then(|idx| self.store.nodes_mut().get_mut(idx))
			{
				node.fx = None;
				node.fy = None;
			}
			self.simulation.set_alpha_target(0.0);
		}
		self.drag = DragState::default();
		self.pan.active = false;
	}

	/// Zoom about a screen point, keeping the graph point under it fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if delta_y == 0.0 || !delta_y.is_finite() {
			return;
		}
		let factor = if delta_y > 0.0 {
			1.0 / self.zoom.wheel_factor
		} else {
			self.zoom.wheel_factor
		};
		let new_k = (self.transform.k * factor)
			.max(self.zoom.min_scale)
			.min(self.zoom.max_scale);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn node_ids(&self) -> Vec<String> {
		self.store.nodes().iter().map(|n| n.id.clone()).collect()
	}

	pub fn edge_keys(&self) -> Vec<EdgeKey> {
		self.store.edges().iter().map(|e| e.key.clone()).collect()
	}

	pub fn node_position(&self, id: &str) -> (f64, f64) {
		self.store.node(id).map_or((0.0, 0.0), |n| (n.x, n.y))
	}

	pub fn node_style(&self, id: &str) -> Option<NodeStyle> {
		self.store.node(id).map(NodeStyle::of)
	}

	pub fn edge_line(&self, key: &EdgeKey) -> (f64, f64, f64, f64) {
		let (a, b) = key.endpoints();
		let ((x1, y1), (x2, y2)) = (self.node_position(a), self.node_position(b));
		(x1, y1, x2, y2)
	}

	pub fn edge_width(&self, key: &EdgeKey) -> f64 {
		let (a, b) = key.endpoints();
		self.store.edge(a, b).map_or(0.0, render::edge_width)
	}

	pub fn tooltip(&self) -> Option<Tooltip> {
		let node = self.store.nodes().get(self.hover.node?)?;
		Some(Tooltip::for_node(node, self.hover.x, self.hover.y))
	}
}
