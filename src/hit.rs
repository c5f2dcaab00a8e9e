//! Cursor-vs-node classification.

use kurbo::{Circle, Point};
use log::warn;

use crate::color::ColorKey;
use crate::graph::NodeId;
use crate::scene::SceneContext;
use crate::surface::RenderSurface;

/// Decides whether the cursor is over a node.
///
/// [`prepare`](HitTester::prepare) runs once per redistribution pass before
/// any [`node_hit`](HitTester::node_hit) query of that pass.
pub trait HitTester {
	fn prepare(&mut self, _cursor: Option<Point>, _ctx: &SceneContext<'_>) {}

	/// `cursor` is in screen pixels. Unplaced nodes are never hit.
	fn node_hit(&self, node: NodeId, cursor: Point, ctx: &SceneContext<'_>) -> bool;

	fn resize(&mut self, _width: f64, _height: f64) {}
}

/// Tests the cursor against each node's circle in screen space.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeometricHitTester;

impl HitTester for GeometricHitTester {
	fn node_hit(&self, node: NodeId, cursor: Point, ctx: &SceneContext<'_>) -> bool {
		let Some(node) = ctx.graph.get_node(node) else {
			return false;
		};
		let Some(position) = node.position() else {
			return false;
		};
		let center = ctx.view.to_screen(position);
		let r = ctx.style.node_radius(node.weight()) * ctx.view.k;
		let d = cursor - center;
		if d.x.abs() > r || d.y.abs() > r {
			return false;
		}
		d.hypot2() <= r * r
	}
}

/// Renders every node in a unique colour to an offscreen surface and reads
/// back the pixel under the cursor.
///
/// The offscreen surface must not anti-alias, otherwise edge pixels decode
/// to unrelated ids.
pub struct ColorMapHitTester {
	surface: Box<dyn RenderSurface>,
	hovered: Option<NodeId>,
}

impl ColorMapHitTester {
	pub fn new(surface: Box<dyn RenderSurface>) -> Self {
		Self {
			surface,
			hovered: None,
		}
	}

	/// Node found by the last [`prepare`](HitTester::prepare).
	pub fn hovered(&self) -> Option<NodeId> {
		self.hovered
	}

	fn render(&mut self, ctx: &SceneContext<'_>) {
		self.surface.clear(None);
		self.surface.begin_layer(&ctx.view, 1.0);
		for (id, node) in ctx.graph.nodes() {
			let Some(position) = node.position() else {
				continue;
			};
			let key = match u32::try_from(id.index() + 1).map(ColorKey::new) {
				Ok(Ok(key)) => key,
				_ => {
					warn!("node {} has no colour key; skipped in picking", node.id());
					continue;
				}
			};
			let circle = Circle::new(position, ctx.style.node_radius(node.weight()));
			self.surface.draw_circle(circle, key.to_color());
		}
		self.surface.end_layer();
	}
}

impl HitTester for ColorMapHitTester {
	fn prepare(&mut self, cursor: Option<Point>, ctx: &SceneContext<'_>) {
		self.hovered = None;
		let Some(cursor) = cursor else {
			return;
		};
		if !self.surface.is_ready() {
			return;
		}
		self.render(ctx);
		self.hovered = self
			.surface
			.read_pixel(cursor)
			.and_then(ColorKey::from_color)
			.map(|key| NodeId(key.get() as usize - 1));
	}

	fn node_hit(&self, node: NodeId, _cursor: Point, _ctx: &SceneContext<'_>) -> bool {
		self.hovered == Some(node)
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.surface.resize(width, height);
	}
}
