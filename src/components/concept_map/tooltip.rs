use super::types::GraphNode;

const OFFSET_X: f64 = 12.0;
const OFFSET_Y: f64 = -12.0;

/// Hover card contents. Every field is plain text; the view inserts them as
/// text nodes, so concept names from the retrieval service are never parsed
/// as markup.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	pub title: String,
	pub community: String,
	pub score: String,
	pub expanded: bool,
	pub left: f64,
	pub top: f64,
}

impl Tooltip {
	/// Anchored at a pointer position in the explorer container's coordinates.
	pub fn for_node(node: &GraphNode, x: f64, y: f64) -> Self {
		let community = match node.community_id {
			Some(id) => format!("Community: {id}"),
			None => "Community: none".to_string(),
		};
		Self {
			title: node.id.clone(),
			community,
			score: format!("Score: {:.3}", node.weighted_score),
			expanded: node.expanded,
			left: x + OFFSET_X,
			top: y + OFFSET_Y,
		}
	}

	pub fn position_style(&self) -> String {
		format!("display: block; left: {}px; top: {}px;", self.left, self.top)
	}
}
