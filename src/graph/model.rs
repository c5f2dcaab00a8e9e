//! Flat node/link storage addressed by index handles.

use std::collections::HashMap;

use kurbo::{Point, Vec2};
use log::debug;

use super::types::GraphPayload;
use crate::error::{MindGraphError, MindGraphResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
	pub fn index(self) -> usize {
		self.0
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub(crate) usize);

impl LinkId {
	pub fn index(self) -> usize {
		self.0
	}
}

/// Simulation state of a placed node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
	pub position: Point,
	pub velocity: Vec2,
}

#[derive(Clone, Debug)]
pub struct Node {
	id: String,
	title: String,
	weight: f64,
	pub(in crate::graph) body: Option<Body>,
	pub(in crate::graph) fixed: Option<Point>,
}

impl Node {
	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn weight(&self) -> f64 {
		self.weight
	}

	/// `None` until the layout has placed the node.
	pub fn position(&self) -> Option<Point> {
		self.body.map(|b| b.position)
	}

	pub fn velocity(&self) -> Option<Vec2> {
		self.body.map(|b| b.velocity)
	}

	pub fn is_pinned(&self) -> bool {
		self.fixed.is_some()
	}

	/// Title as shown under the node, without a trailing `.md`.
	pub fn label(&self) -> &str {
		self.title.split(".md").next().unwrap_or(&self.title)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
	pub source: NodeId,
	pub target: NodeId,
}

/// Nodes and links resolved from a [`GraphPayload`].
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<Node>,
	links: Vec<Link>,
	index: HashMap<String, NodeId>,
}

impl Graph {
	/// Resolves link endpoints by id. Any dangling reference or duplicate id
	/// fails the whole build.
	pub fn from_payload(payload: &GraphPayload) -> MindGraphResult<Self> {
		let mut index = HashMap::with_capacity(payload.nodes.len());
		let mut nodes = Vec::with_capacity(payload.nodes.len());
		for (i, node) in payload.nodes.iter().enumerate() {
			if index.insert(node.id.clone(), NodeId(i)).is_some() {
				return Err(MindGraphError::DuplicateNode(node.id.clone()));
			}
			nodes.push(Node {
				id: node.id.clone(),
				title: node.title.clone(),
				weight: if node.weight.is_finite() { node.weight } else { 0.0 },
				body: None,
				fixed: None,
			});
		}

		let resolve = |link: usize, id: &str| {
			index.get(id).copied().ok_or_else(|| MindGraphError::UnknownNode {
				link,
				id: id.to_string(),
			})
		};
		let links = payload
			.links
			.iter()
			.enumerate()
			.map(|(i, link)| {
				Ok(Link {
					source: resolve(i, &link.source)?,
					target: resolve(i, &link.target)?,
				})
			})
			.collect::<MindGraphResult<Vec<_>>>()?;

		debug!("graph built: {} nodes, {} links", nodes.len(), links.len());
		Ok(Self {
			nodes,
			links,
			index,
		})
	}

	pub fn node(&self, id: NodeId) -> &Node {
		&self.nodes[id.0]
	}

	pub fn get_node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id.0)
	}

	pub fn link(&self, id: LinkId) -> &Link {
		&self.links[id.0]
	}

	pub fn lookup(&self, id: &str) -> Option<NodeId> {
		self.index.get(id).copied()
	}

	pub fn nodes(&self) -> impl ExactSizeIterator<Item = (NodeId, &Node)> {
		self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
	}

	pub fn links(&self) -> impl ExactSizeIterator<Item = (LinkId, &Link)> {
		self.links.iter().enumerate().map(|(i, l)| (LinkId(i), l))
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	/// Links incident to `id`, counting a self-link once.
	pub fn degree(&self, id: NodeId) -> usize {
		self.links
			.iter()
			.filter(|l| l.source == id || l.target == id)
			.count()
	}

	pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
		self.links.iter().filter_map(move |l| {
			if l.source == id && l.target != id {
				Some(l.target)
			} else if l.target == id && l.source != id {
				Some(l.source)
			} else {
				None
			}
		})
	}

	pub(in crate::graph) fn nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}
}
