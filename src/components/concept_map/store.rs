use std::collections::HashMap;
use std::f64::consts::TAU;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::LayoutConfig;
use super::types::{ConceptContextResult, EdgeKey, GraphEdge, GraphNode};

const SPAWN_ATTEMPTS: usize = 8;
/// Twice the default node radius.
const MIN_SPAWN_SEPARATION: f64 = 16.0;

/// What a merge added; existing nodes and edges are updated in place and not counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
	pub added_nodes: usize,
	pub added_edges: usize,
}

impl MergeOutcome {
	pub fn is_structural(&self) -> bool {
		self.added_nodes > 0 || self.added_edges > 0
	}
}

/// Arena of concept nodes keyed by name plus the undirected edges between them.
/// Grows monotonically for the life of a session.
pub struct GraphStore {
	nodes: Vec<GraphNode>,
	index: HashMap<String, usize>,
	edges: Vec<GraphEdge>,
	edge_index: HashMap<EdgeKey, usize>,
	viewport_center: (f64, f64),
	spawn_radius: f64,
	spawn_jitter: f64,
	rng: SmallRng,
}

impl GraphStore {
	pub fn new(layout: &LayoutConfig, seed: u64) -> Self {
		Self {
			nodes: Vec::new(),
			index: HashMap::new(),
			edges: Vec::new(),
			edge_index: HashMap::new(),
			viewport_center: (0.0, 0.0),
			spawn_radius: layout.spawn_radius.max(1.0),
			spawn_jitter: layout.spawn_jitter.max(0.0),
			rng: SmallRng::seed_from_u64(seed),
		}
	}

	pub fn set_viewport_center(&mut self, x: f64, y: f64) {
		self.viewport_center = (x, y);
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn nodes_mut(&mut self) -> &mut [GraphNode] {
		&mut self.nodes
	}

	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn node_index(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.node_index(id).map(|idx| &self.nodes[idx])
	}

	pub fn edge(&self, a: &str, b: &str) -> Option<&GraphEdge> {
		self.edge_index
			.get(&EdgeKey::new(a, b))
			.map(|&idx| &self.edges[idx])
	}

	/// The session anchor, if any concept has been expanded yet.
	pub fn center(&self) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.is_center)
	}

	/// Fold one retrieval result into the graph. Existing nodes keep their
	/// identity and position; shared fields take the latest values.
	pub fn merge(&mut self, result: &ConceptContextResult) -> MergeOutcome {
		let mut outcome = MergeOutcome::default();
		let center_name = result.concept_name.as_str();

		let center_idx = match self.node_index(center_name) {
			Some(idx) => idx,
			None => {
				let (x, y) = self.viewport_center;
				outcome.added_nodes += 1;
				self.insert_node(GraphNode::new(center_name, x, y))
			}
		};

		let has_center = self.center().is_some();
		let center = &mut self.nodes[center_idx];
		center.community_id = result.community_id;
		center.expanded = true;
		if !has_center {
			center.is_center = true;
		}
		let (px, py) = (center.x, center.y);

		for related in &result.direct_relations {
			match self.node_index(&related.name) {
				Some(idx) => {
					let node = &mut self.nodes[idx];
					node.community_id = related.community_id;
					node.weighted_score = related.weighted_score;
				}
				None => {
					let (x, y) = self.spawn_position(px, py);
					let mut node = GraphNode::new(related.name.clone(), x, y);
					node.community_id = related.community_id;
					node.weighted_score = related.weighted_score;
					self.insert_node(node);
					outcome.added_nodes += 1;
				}
			}

			if related.name == center_name {
				continue;
			}
			if self.upsert_edge(center_name, &related.name, related.weighted_score) {
				outcome.added_edges += 1;
			}
		}

		outcome
	}

	fn insert_node(&mut self, node: GraphNode) -> usize {
		let idx = self.nodes.len();
		self.index.insert(node.id.clone(), idx);
		self.nodes.push(node);
		idx
	}

	/// Returns true when the edge is new.
	fn upsert_edge(&mut self, a: &str, b: &str, weight: f64) -> bool {
		let key = EdgeKey::new(a, b);
		if let Some(&idx) = self.edge_index.get(&key) {
			self.edges[idx].weight = weight;
			return false;
		}
		self.edge_index.insert(key.clone(), self.edges.len());
		self.edges.push(GraphEdge { key, weight });
		true
	}

	/// Random point on a ring around the parent, retried until it clears every
	/// existing node.
	fn spawn_position(&mut self, px: f64, py: f64) -> (f64, f64) {
		let mut candidate = (px + self.spawn_radius, py);
		for _ in 0..SPAWN_ATTEMPTS {
			let angle = self.rng.gen_range(0.0..TAU);
			let dist = self.spawn_radius + self.rng.r#gen::<f64>() * self.spawn_jitter;
			candidate = (px + angle.cos() * dist, py + angle.sin() * dist);
			let clear = self.nodes.iter().all(|n| {
				let (dx, dy) = (n.x - candidate.0, n.y - candidate.1);
				dx * dx + dy * dy >= MIN_SPAWN_SEPARATION * MIN_SPAWN_SEPARATION
			});
			if clear {
				break;
			}
		}
		candidate
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::concept_map::types::RelatedConcept;

	fn related(name: &str, score: f64, community: Option<i64>) -> RelatedConcept {
		RelatedConcept {
			name: name.into(),
			weighted_score: score,
			community_id: community,
			..RelatedConcept::default()
		}
	}

	fn result(center: &str, relations: Vec<RelatedConcept>) -> ConceptContextResult {
		ConceptContextResult {
			concept_name: center.into(),
			depth: 1,
			direct_relations: relations,
			..ConceptContextResult::default()
		}
	}

	fn store() -> GraphStore {
		let mut store = GraphStore::new(&LayoutConfig::default(), 7);
		store.set_viewport_center(400.0, 300.0);
		store
	}

	fn auth_result() -> ConceptContextResult {
		result(
			"auth",
			vec![related("jwt", 0.8, Some(1)), related("oauth", 0.5, Some(1))],
		)
	}

	#[test]
	fn first_merge_builds_star_around_center() {
		let mut store = store();
		let outcome = store.merge(&auth_result());

		assert_eq!(outcome, MergeOutcome { added_nodes: 3, added_edges: 2 });
		assert_eq!(store.node_count(), 3);
		assert_eq!(store.edge_count(), 2);
		assert!(store.node("auth").unwrap().is_center);
		assert!(store.node("auth").unwrap().expanded);
		assert!(!store.node("jwt").unwrap().expanded);
		assert_eq!(store.edge("auth", "jwt").unwrap().weight, 0.8);
		assert_eq!(store.edge("oauth", "auth").unwrap().weight, 0.5);
		assert_eq!(store.node("jwt").unwrap().community_id, Some(1));
	}

	#[test]
	fn recentering_on_a_neighbour_overwrites_the_shared_edge() {
		let mut store = store();
		store.merge(&auth_result());
		let jwt_before = store.node("jwt").unwrap().clone();

		let outcome = store.merge(&result("jwt", vec![related("auth", 0.9, Some(1))]));

		assert_eq!(outcome, MergeOutcome::default());
		assert_eq!(store.node_count(), 3);
		assert_eq!(store.edge_count(), 2);
		assert_eq!(store.edge("auth", "jwt").unwrap().weight, 0.9);
		let jwt = store.node("jwt").unwrap();
		assert!(jwt.expanded);
		assert!(!jwt.is_center);
		assert_eq!((jwt.x, jwt.y), (jwt_before.x, jwt_before.y));
		let centers: Vec<_> = store.nodes().iter().filter(|n| n.is_center).collect();
		assert_eq!(centers.len(), 1);
		assert_eq!(centers[0].id, "auth");
	}

	#[test]
	fn empty_relations_still_create_the_center() {
		let mut store = store();
		store.merge(&auth_result());

		let outcome = store.merge(&result("oauth2", vec![]));

		assert_eq!(outcome, MergeOutcome { added_nodes: 1, added_edges: 0 });
		assert_eq!(store.node_count(), 4);
		assert_eq!(store.edge_count(), 2);
		let oauth2 = store.node("oauth2").unwrap();
		assert!(oauth2.expanded);
		assert!(!oauth2.is_center);
		assert_eq!((oauth2.x, oauth2.y), (400.0, 300.0));
	}

	#[test]
	fn merging_identical_input_is_idempotent() {
		let mut store = store();
		store.merge(&auth_result());
		let snapshot: Vec<_> = store
			.nodes()
			.iter()
			.map(|n| (n.id.clone(), n.community_id, n.weighted_score))
			.collect();

		store.merge(&auth_result());

		assert_eq!(store.node_count(), 3);
		assert_eq!(store.edge_count(), 2);
		let again: Vec<_> = store
			.nodes()
			.iter()
			.map(|n| (n.id.clone(), n.community_id, n.weighted_score))
			.collect();
		assert_eq!(again, snapshot);
		assert_eq!(store.edge("auth", "oauth").unwrap().weight, 0.5);
	}

	#[test]
	fn edges_are_symmetric() {
		let mut store = store();
		store.merge(&result("A", vec![related("B", 0.3, None)]));
		store.merge(&result("B", vec![related("A", 0.6, None)]));

		assert_eq!(store.edge_count(), 1);
		assert_eq!(store.edge("A", "B").unwrap().weight, 0.6);
	}

	#[test]
	fn only_the_first_expanded_node_becomes_center() {
		let mut store = store();
		for name in ["X", "Y", "Z", "Y", "X", "Z"] {
			store.merge(&result(name, vec![related("shared", 1.0, None)]));
		}

		let centers: Vec<_> = store
			.nodes()
			.iter()
			.filter(|n| n.is_center)
			.map(|n| n.id.as_str())
			.collect();
		assert_eq!(centers, vec!["X"]);
		assert!(store.nodes().iter().filter(|n| n.id != "shared").all(|n| n.expanded));
	}

	#[test]
	fn growth_is_monotonic() {
		let mut store = store();
		let sequence = vec![
			auth_result(),
			result("jwt", vec![related("auth", 0.9, Some(1)), related("rsa", 0.4, None)]),
			result("oauth2", vec![]),
			auth_result(),
			result("rsa", vec![related("jwt", 0.1, Some(3))]),
		];
		let (mut nodes, mut edges) = (0, 0);
		for r in &sequence {
			store.merge(r);
			assert!(store.node_count() >= nodes);
			assert!(store.edge_count() >= edges);
			nodes = store.node_count();
			edges = store.edge_count();
		}
		for edge in store.edges() {
			assert!(store.node(edge.source()).is_some());
			assert!(store.node(edge.target()).is_some());
		}
	}

	#[test]
	fn expanded_flag_survives_later_mentions() {
		let mut store = store();
		store.merge(&auth_result());
		store.merge(&result("jwt", vec![]));
		store.merge(&result("oauth", vec![related("jwt", 0.2, Some(4))]));

		let jwt = store.node("jwt").unwrap();
		assert!(jwt.expanded);
		assert_eq!(jwt.community_id, Some(4));
		assert_eq!(jwt.weighted_score, 0.2);
	}

	#[test]
	fn center_community_is_last_write_wins() {
		let mut store = store();
		let mut first = auth_result();
		first.community_id = Some(2);
		store.merge(&first);
		store.merge(&auth_result());

		assert_eq!(store.node("auth").unwrap().community_id, None);
	}

	#[test]
	fn self_relation_updates_center_without_self_edge() {
		let mut store = store();
		store.merge(&result("auth", vec![related("auth", 0.4, Some(9))]));

		assert_eq!(store.node_count(), 1);
		assert_eq!(store.edge_count(), 0);
		assert_eq!(store.node("auth").unwrap().weighted_score, 0.4);
	}

	#[test]
	fn new_neighbours_spawn_apart_near_their_parent() {
		let mut store = store();
		let relations = (0..12).map(|i| related(&format!("c{i}"), 0.1, None)).collect();
		store.merge(&result("hub", relations));

		let hub = store.node("hub").unwrap().clone();
		let spawned: Vec<_> = store.nodes().iter().filter(|n| n.id != "hub").collect();
		for node in &spawned {
			let dist = ((node.x - hub.x).powi(2) + (node.y - hub.y).powi(2)).sqrt();
			assert!((60.0..=120.0 + 1e-9).contains(&dist), "{} at {dist}", node.id);
		}
		for (i, a) in spawned.iter().enumerate() {
			for b in &spawned[i + 1..] {
				assert!((a.x, a.y) != (b.x, b.y));
			}
		}
	}

	#[test]
	fn names_are_case_preserving_keys() {
		let mut store = store();
		store.merge(&result("Auth", vec![related("auth", 0.5, None)]));

		assert_eq!(store.node_count(), 2);
		assert_eq!(store.edge_count(), 1);
	}
}
