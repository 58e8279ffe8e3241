use super::palette::color_for;
use super::state::ViewTransform;
use super::types::{GraphEdge, GraphNode};

pub const NODE_RADIUS_DEFAULT: f64 = 8.0;
pub const NODE_RADIUS_EXPANDED: f64 = 10.0;
pub const NODE_RADIUS_CENTER: f64 = 16.0;

const CENTER_RING_GAP: f64 = 4.0;
const LABEL_GAP: f64 = 14.0;
const MIN_EDGE_WIDTH: f64 = 0.5;

/// Center beats expanded beats default.
pub fn node_radius(node: &GraphNode) -> f64 {
	if node.is_center {
		NODE_RADIUS_CENTER
	} else if node.expanded {
		NODE_RADIUS_EXPANDED
	} else {
		NODE_RADIUS_DEFAULT
	}
}

pub fn edge_width(edge: &GraphEdge) -> f64 {
	let weight = if edge.weight.is_finite() { edge.weight } else { 0.0 };
	(weight * 2.0).max(MIN_EDGE_WIDTH)
}

/// Everything the scene needs to draw a node, apart from its position.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub radius: f64,
	pub fill: &'static str,
	pub stroke: &'static str,
	pub stroke_width: f64,
	pub ring: Option<RingStyle>,
	pub label_dy: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RingStyle {
	pub radius: f64,
	pub stroke: &'static str,
}

impl NodeStyle {
	pub fn of(node: &GraphNode) -> Self {
		let radius = node_radius(node);
		let fill = color_for(node.community_id);
		let (stroke, stroke_width) = if node.expanded {
			("#fff", 2.0)
		} else {
			("none", 0.0)
		};
		Self {
			radius,
			fill,
			stroke,
			stroke_width,
			ring: node.is_center.then(|| RingStyle {
				radius: radius + CENTER_RING_GAP,
				stroke: fill,
			}),
			label_dy: radius + LABEL_GAP,
		}
	}
}

pub fn translate(x: f64, y: f64) -> String {
	format!("translate({},{})", x, y)
}

/// SVG transform for the zoom/pan root group.
pub fn scene_transform(transform: &ViewTransform) -> String {
	format!(
		"translate({},{}) scale({})",
		transform.x, transform.y, transform.k
	)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::concept_map::types::EdgeKey;

	fn node(expanded: bool, is_center: bool) -> GraphNode {
		GraphNode {
			expanded,
			is_center,
			..GraphNode::new("n", 0.0, 0.0)
		}
	}

	#[test]
	fn radius_policy_prefers_center() {
		assert_eq!(node_radius(&node(false, false)), NODE_RADIUS_DEFAULT);
		assert_eq!(node_radius(&node(true, false)), NODE_RADIUS_EXPANDED);
		assert_eq!(node_radius(&node(true, true)), NODE_RADIUS_CENTER);
	}

	#[test]
	fn edge_width_grows_with_weight_above_a_floor() {
		let edge = |weight| GraphEdge {
			key: EdgeKey::new("a", "b"),
			weight,
		};
		assert_eq!(edge_width(&edge(0.0)), 0.5);
		assert_eq!(edge_width(&edge(0.8)), 1.6);
		assert!(edge_width(&edge(0.9)) > edge_width(&edge(0.8)));
		assert_eq!(edge_width(&edge(f64::INFINITY)), 0.5);
	}

	#[test]
	fn center_style_has_ring_and_outline() {
		let mut center = node(true, true);
		center.community_id = Some(1);
		let style = NodeStyle::of(&center);

		assert_eq!(style.fill, "#D94A4A");
		assert_eq!(style.stroke, "#fff");
		assert_eq!(
			style.ring,
			Some(RingStyle {
				radius: 20.0,
				stroke: "#D94A4A"
			})
		);
		assert_eq!(style.label_dy, 30.0);
	}

	#[test]
	fn plain_node_has_no_decoration() {
		let style = NodeStyle::of(&node(false, false));
		assert_eq!(style.fill, "#888");
		assert_eq!(style.stroke, "none");
		assert_eq!(style.ring, None);
	}
}
