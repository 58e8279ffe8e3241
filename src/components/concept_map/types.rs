use std::fmt;

use serde::{Deserialize, Serialize};

/// One reply of the knowledge-retrieval service: a center concept and its
/// direct neighbours.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptContextResult {
	pub concept_name: String,
	#[serde(default)]
	pub depth: u32,
	pub direct_relations: Vec<RelatedConcept>,
	#[serde(default)]
	pub expanded_relations: Vec<String>,
	#[serde(default)]
	pub community_id: Option<i64>,
	#[serde(default)]
	pub community_siblings: Vec<CommunitySibling>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedConcept {
	pub name: String,
	pub weighted_score: f64,
	#[serde(default)]
	pub community_id: Option<i64>,
	#[serde(default)]
	pub co_occurrence_count: u32,
	#[serde(default = "default_decay_weight")]
	pub decay_weight: f64,
	#[serde(default)]
	pub files: Vec<String>,
}

fn default_decay_weight() -> f64 {
	1.0
}

/// Informational only; the layout never reads siblings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySibling {
	pub name: String,
	pub community_id: i64,
	#[serde(default)]
	pub shared_neighbor_count: u32,
	#[serde(default)]
	pub normalized_overlap: f64,
}

/// A concept in the explored graph. Position and velocity live here so a
/// simulation restart keeps them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub community_id: Option<i64>,
	pub weighted_score: f64,
	pub expanded: bool,
	pub is_center: bool,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned coordinates while the node is dragged.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

impl GraphNode {
	pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
		Self {
			id: id.into(),
			weighted_score: 1.0,
			x,
			y,
			..Self::default()
		}
	}
}

/// Order-independent identity of an undirected edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
	low: String,
	high: String,
}

impl EdgeKey {
	pub fn new(a: &str, b: &str) -> Self {
		let (low, high) = if a <= b { (a, b) } else { (b, a) };
		Self {
			low: low.to_owned(),
			high: high.to_owned(),
		}
	}

	pub fn endpoints(&self) -> (&str, &str) {
		(&self.low, &self.high)
	}
}

impl fmt::Display for EdgeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}--{}", self.low, self.high)
	}
}

/// Undirected edge; endpoints are node ids, resolved to nodes only by the
/// simulation and the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub key: EdgeKey,
	pub weight: f64,
}

impl GraphEdge {
	pub fn source(&self) -> &str {
		self.key.endpoints().0
	}

	pub fn target(&self) -> &str {
		self.key.endpoints().1
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn edge_key_ignores_argument_order() {
		assert_eq!(EdgeKey::new("jwt", "auth"), EdgeKey::new("auth", "jwt"));
		assert_eq!(EdgeKey::new("jwt", "auth").endpoints(), ("auth", "jwt"));
		assert_eq!(EdgeKey::new("b", "a").to_string(), "a--b");
	}

	#[test]
	fn edge_key_is_case_preserving() {
		assert_ne!(EdgeKey::new("Auth", "jwt"), EdgeKey::new("auth", "jwt"));
	}

	#[test]
	fn result_parses_camel_case_payload() {
		let json = r#"{
			"conceptName": "auth",
			"depth": 1,
			"directRelations": [
				{"name": "jwt", "coOccurrenceCount": 4, "decayWeight": 0.2, "weightedScore": 0.8, "communityId": 1, "files": ["a.md"]}
			],
			"expandedRelations": [],
			"communityId": null,
			"communitySiblings": [{"name": "sso", "communityId": 1, "sharedNeighborCount": 2, "normalizedOverlap": 0.5}]
		}"#;
		let result: ConceptContextResult = serde_json::from_str(json).unwrap();
		assert_eq!(result.concept_name, "auth");
		assert_eq!(result.community_id, None);
		assert_eq!(result.direct_relations[0].community_id, Some(1));
		assert_eq!(result.direct_relations[0].files, vec!["a.md".to_string()]);
		assert_eq!(result.community_siblings[0].name, "sso");
	}

	#[test]
	fn result_without_relations_is_rejected() {
		let json = r#"{"conceptName": "auth"}"#;
		assert!(serde_json::from_str::<ConceptContextResult>(json).is_err());
	}
}
