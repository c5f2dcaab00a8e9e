//! Graph data and the force layout that positions it.

mod model;
mod simulation;
mod types;

pub use model::{Body, Graph, Link, LinkId, Node, NodeId};
pub use simulation::ForceLayout;
pub use types::{GraphLink, GraphNode, GraphPayload};
