use std::rc::Rc;

use kurbo::{Circle, Point};

use super::SceneContext;
use crate::animation::{Animation, Easing, Timestamp};
use crate::color::Color;
use crate::graph::{Node, NodeId};
use crate::hit::HitTester;
use crate::layers::Focus;
use crate::surface::RenderSurface;

/// Callback receiving the node an event happened on.
pub type NodeCallback = Rc<dyn Fn(&Node)>;

/// Optional per-element event hooks.
#[derive(Clone, Default)]
pub struct ElementHooks {
	pub on_click: Option<NodeCallback>,
	pub on_hover: Option<NodeCallback>,
}

/// Something the composer can hit-test, move between layers and paint.
pub trait Drawable {
	fn draw(
		&mut self,
		surface: &mut dyn RenderSurface,
		focus: Focus,
		ctx: &SceneContext<'_>,
		now: Timestamp,
	);

	/// Hit-tests against `cursor`, recording `now` as the last active time on
	/// a hit.
	fn is_active(
		&mut self,
		cursor: Option<Point>,
		hit: &dyn HitTester,
		ctx: &SceneContext<'_>,
		now: Timestamp,
	) -> bool;

	fn z_index(&self) -> i32;

	fn last_active(&self) -> Option<Timestamp>;

	/// Clears per-activation state after migrating back to a resting layer.
	fn reset(&mut self);

	/// The node this element stands for, if any.
	fn node(&self) -> Option<NodeId> {
		None
	}

	fn hooks(&self) -> &ElementHooks;

	fn hooks_mut(&mut self) -> &mut ElementHooks;
}

/// Resting colour plus at most one running colour animation.
#[derive(Clone, Debug)]
struct FocusColor {
	resting: Color,
	animation: Option<Animation<Color>>,
}

impl FocusColor {
	fn new(resting: Color) -> Self {
		Self {
			resting,
			animation: None,
		}
	}

	fn sample(&mut self, target: Color, duration: f64, now: Timestamp) -> Color {
		match &mut self.animation {
			Some(anim) => {
				if anim.desired() != target {
					anim.retarget(target, now);
				}
				let color = anim.value(now);
				if anim.is_finished() {
					self.resting = color;
					self.animation = None;
				}
				color
			}
			None if self.resting != target => {
				let mut anim = Animation::new(self.resting, target, Easing::EaseOut, duration, now);
				let color = anim.value(now);
				if anim.is_finished() {
					self.resting = color;
				} else {
					self.animation = Some(anim);
				}
				color
			}
			None => self.resting,
		}
	}
}

pub struct NodeElement {
	id: NodeId,
	last_active: Option<Timestamp>,
	color: FocusColor,
	hooks: ElementHooks,
}

impl NodeElement {
	pub fn new(id: NodeId, color: Color) -> Self {
		Self {
			id,
			last_active: None,
			color: FocusColor::new(color),
			hooks: ElementHooks::default(),
		}
	}
}

impl Drawable for NodeElement {
	fn draw(
		&mut self,
		surface: &mut dyn RenderSurface,
		focus: Focus,
		ctx: &SceneContext<'_>,
		now: Timestamp,
	) {
		let Some(node) = ctx.graph.get_node(self.id) else {
			return;
		};
		let Some(center) = node.position() else {
			return;
		};
		let style = ctx.style;
		let mut radius = style.node_radius(node.weight());
		let (target, title_padding) = if focus == Focus::Active {
			radius += style.active_node_radius_padding;
			(style.active_node_color, style.active_node_title_padding)
		} else {
			(style.node_color, style.node_title_padding)
		};
		let color = self.color.sample(target, style.hover_animation_duration, now);
		surface.draw_circle(Circle::new(center, radius), color);
		let anchor = Point::new(center.x, center.y + radius + title_padding);
		surface.draw_text(node.label(), anchor, style.title_color);
	}

	fn is_active(
		&mut self,
		cursor: Option<Point>,
		hit: &dyn HitTester,
		ctx: &SceneContext<'_>,
		now: Timestamp,
	) -> bool {
		let active = cursor.is_some_and(|c| hit.node_hit(self.id, c, ctx));
		if active {
			self.last_active = Some(now);
		}
		active
	}

	fn z_index(&self) -> i32 {
		1
	}

	fn last_active(&self) -> Option<Timestamp> {
		self.last_active
	}

	fn reset(&mut self) {
		self.last_active = None;
	}

	fn node(&self) -> Option<NodeId> {
		Some(self.id)
	}

	fn hooks(&self) -> &ElementHooks {
		&self.hooks
	}

	fn hooks_mut(&mut self) -> &mut ElementHooks {
		&mut self.hooks
	}
}

/// A link, active whenever either endpoint is.
pub struct LinkElement {
	source: NodeId,
	target: NodeId,
	last_active: Option<Timestamp>,
	color: FocusColor,
	hooks: ElementHooks,
}

impl LinkElement {
	pub fn new(source: NodeId, target: NodeId, color: Color) -> Self {
		Self {
			source,
			target,
			last_active: None,
			color: FocusColor::new(color),
			hooks: ElementHooks::default(),
		}
	}
}

impl Drawable for LinkElement {
	fn draw(
		&mut self,
		surface: &mut dyn RenderSurface,
		focus: Focus,
		ctx: &SceneContext<'_>,
		now: Timestamp,
	) {
		let position = |id| ctx.graph.get_node(id).and_then(Node::position);
		let (Some(from), Some(to)) = (position(self.source), position(self.target)) else {
			return;
		};
		let style = ctx.style;
		let target = if focus == Focus::Active {
			style.active_link_color
		} else {
			style.link_color
		};
		let color = self.color.sample(target, style.hover_animation_duration, now);
		surface.draw_line(from, to, color, style.link_width);
	}

	fn is_active(
		&mut self,
		cursor: Option<Point>,
		hit: &dyn HitTester,
		ctx: &SceneContext<'_>,
		now: Timestamp,
	) -> bool {
		let active = cursor
			.is_some_and(|c| hit.node_hit(self.source, c, ctx) || hit.node_hit(self.target, c, ctx));
		if active {
			self.last_active = Some(now);
		}
		active
	}

	fn z_index(&self) -> i32 {
		0
	}

	fn last_active(&self) -> Option<Timestamp> {
		self.last_active
	}

	fn reset(&mut self) {
		self.last_active = None;
	}

	fn hooks(&self) -> &ElementHooks {
		&self.hooks
	}

	fn hooks_mut(&mut self) -> &mut ElementHooks {
		&mut self.hooks
	}
}
