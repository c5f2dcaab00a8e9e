//! Wire format produced by the link-graph loader.

use serde::{Deserialize, Serialize};

use crate::error::MindGraphResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	pub id: String,
	pub title: String,
	/// Descendant or link count; drives the drawn radius.
	#[serde(default)]
	pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
}

/// Immutable input graph, read once at construction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
	pub nodes: Vec<GraphNode>,
	#[serde(default)]
	pub links: Vec<GraphLink>,
}

impl GraphPayload {
	pub fn from_json(json: &str) -> MindGraphResult<Self> {
		Ok(serde_json::from_str(json)?)
	}
}

#[cfg(test)]
impl GraphPayload {
	/// Unit-weight nodes titled `<id>.md` plus the given links.
	pub(crate) fn from_edges(nodes: &[&str], links: &[(&str, &str)]) -> Self {
		Self {
			nodes: nodes
				.iter()
				.map(|id| GraphNode {
					id: id.to_string(),
					title: format!("{id}.md"),
					weight: 1.0,
				})
				.collect(),
			links: links
				.iter()
				.map(|(s, t)| GraphLink {
					source: s.to_string(),
					target: t.to_string(),
				})
				.collect(),
		}
	}
}
