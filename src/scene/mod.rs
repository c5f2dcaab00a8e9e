//! Per-frame wiring: layout, view, hit testing, layers and painting.

mod element;

use std::rc::Rc;

use kurbo::{Point, Vec2};
use log::{debug, info};

pub use element::{Drawable, ElementHooks, LinkElement, NodeCallback, NodeElement};

use crate::animation::Timestamp;
use crate::config::{HitStrategy, MindGraphConfig, StyleConfig};
use crate::error::MindGraphResult;
use crate::graph::{ForceLayout, Graph, GraphPayload, Node, NodeId};
use crate::hit::{ColorMapHitTester, GeometricHitTester, HitTester};
use crate::layers::{LayerTransitionManager, Membership};
use crate::surface::{CursorStyle, PixmapSurface, RenderSurface};
use crate::view::{ViewTransform, ViewTransformState};

/// Pointer travel, in screen pixels, below which a press counts as a click.
const CLICK_SLOP: f64 = 3.0;

/// Alpha a drag raises the layout to.
const DRAG_ALPHA: f64 = 0.3;

/// Read-only view of the scene handed to elements and hit testers.
#[derive(Clone, Copy)]
pub struct SceneContext<'a> {
	pub graph: &'a Graph,
	pub view: ViewTransformState,
	pub style: &'a StyleConfig,
}

#[derive(Clone, Copy, Debug)]
struct DragState {
	node: NodeId,
	/// World offset from the pointer to the node centre.
	grab: Vec2,
}

#[derive(Clone, Copy, Debug)]
struct Press {
	origin: Point,
	moved: bool,
}

/// Owns everything needed to lay out, hit-test and paint one graph.
///
/// Without a ready surface the composer runs layout-only: paint calls do
/// nothing while layout, view and hit testing keep working.
pub struct SceneComposer {
	layout: ForceLayout,
	view: ViewTransform,
	style: StyleConfig,
	elements: Vec<Box<dyn Drawable>>,
	layers: LayerTransitionManager,
	hit_tester: Box<dyn HitTester>,
	surface: Option<Box<dyn RenderSurface>>,
	cursor: Option<Point>,
	cursor_style: CursorStyle,
	drag: Option<DragState>,
	press: Option<Press>,
}

impl SceneComposer {
	pub fn new(
		payload: &GraphPayload,
		config: MindGraphConfig,
		surface: Option<Box<dyn RenderSurface>>,
	) -> MindGraphResult<Self> {
		Self::with_picking_surface(payload, config, surface, None)
	}

	/// Like [`new`](Self::new), with the offscreen surface colour-map hit
	/// testing renders into. Without one, a [`PixmapSurface`] the size of the
	/// drawing surface is used. Ignored under geometric hit testing.
	pub fn with_picking_surface(
		payload: &GraphPayload,
		config: MindGraphConfig,
		surface: Option<Box<dyn RenderSurface>>,
		picking: Option<Box<dyn RenderSurface>>,
	) -> MindGraphResult<Self> {
		config.validate()?;
		let MindGraphConfig {
			simulation,
			view,
			style,
		} = config;

		let graph = Graph::from_payload(payload)?;
		let layout = ForceLayout::new(graph, simulation)?;

		let mut elements: Vec<Box<dyn Drawable>> = Vec::new();
		for (_, link) in layout.graph().links() {
			elements.push(Box::new(LinkElement::new(
				link.source,
				link.target,
				style.link_color,
			)));
		}
		for (id, _) in layout.graph().nodes() {
			elements.push(Box::new(NodeElement::new(id, style.node_color)));
		}

		let surface = surface.filter(|s| s.is_ready());
		if surface.is_none() {
			info!("no drawing surface; running layout only");
		}

		let hit_tester: Box<dyn HitTester> = match view.hit_strategy {
			HitStrategy::Geometric => Box::new(GeometricHitTester),
			HitStrategy::ColorMap => {
				let picking = picking.unwrap_or_else(|| {
					let (w, h) = surface
						.as_ref()
						.map_or((layout.config().width, layout.config().height), |s| s.size());
					Box::new(PixmapSurface::new(w, h))
				});
				Box::new(ColorMapHitTester::new(picking))
			}
		};

		debug!(
			"scene composed: {} elements, {:?} hit testing",
			elements.len(),
			view.hit_strategy
		);
		Ok(Self {
			layers: LayerTransitionManager::new(elements.len(), &style),
			view: ViewTransform::new(&view),
			layout,
			style,
			elements,
			hit_tester,
			surface,
			cursor: None,
			cursor_style: CursorStyle::Default,
			drag: None,
			press: None,
		})
	}

	pub fn layout(&self) -> &ForceLayout {
		&self.layout
	}

	pub fn layout_mut(&mut self) -> &mut ForceLayout {
		&mut self.layout
	}

	pub fn view(&self) -> &ViewTransform {
		&self.view
	}

	pub fn view_mut(&mut self) -> &mut ViewTransform {
		&mut self.view
	}

	pub fn layers(&self) -> &LayerTransitionManager {
		&self.layers
	}

	pub fn style(&self) -> &StyleConfig {
		&self.style
	}

	pub fn elements(&self) -> &[Box<dyn Drawable>] {
		&self.elements
	}

	pub fn cursor(&self) -> Option<Point> {
		self.cursor
	}

	pub fn cursor_style(&self) -> CursorStyle {
		self.cursor_style
	}

	pub fn is_headless(&self) -> bool {
		self.surface.is_none()
	}

	pub fn is_dragging(&self) -> bool {
		self.drag.is_some()
	}

	/// One layout step. Returns whether the layout is still running.
	pub fn tick(&mut self) -> bool {
		self.layout.tick()
	}

	/// Redistributes against the current cursor, then paints.
	pub fn frame(&mut self, now: Timestamp) {
		self.redistribute(now);
		self.paint(now);
	}

	/// Hit-tests every element and moves it between layers.
	pub fn redistribute(&mut self, now: Timestamp) {
		let ctx = SceneContext {
			graph: self.layout.graph(),
			view: self.view.state(),
			style: &self.style,
		};
		self.hit_tester.prepare(self.cursor, &ctx);
		let hits: Vec<bool> = self
			.elements
			.iter_mut()
			.map(|e| e.is_active(self.cursor, self.hit_tester.as_ref(), &ctx, now))
			.collect();

		let outcome = self.layers.redistribute(now, &hits);
		for &i in &outcome.entered {
			let element = &self.elements[i];
			if let (Some(id), Some(hook)) = (element.node(), element.hooks().on_hover.as_ref()) {
				hook(ctx.graph.node(id));
			}
		}
		for &i in &outcome.migrated {
			self.elements[i].reset();
		}

		let wanted = if self.layers.has_active() {
			CursorStyle::Pointer
		} else {
			CursorStyle::Default
		};
		if wanted != self.cursor_style {
			self.cursor_style = wanted;
			if let Some(surface) = self.surface.as_mut() {
				surface.set_cursor_style(wanted);
			}
		}
	}

	fn paint(&mut self, now: Timestamp) {
		let Some(surface) = self.surface.as_mut() else {
			return;
		};
		let ctx = SceneContext {
			graph: self.layout.graph(),
			view: self.view.state(),
			style: &self.style,
		};
		let elements = &mut self.elements;
		let plan = self.layers.paint_plan(now, |i| elements[i].z_index());

		surface.clear(self.style.background_color);
		for segment in plan {
			surface.begin_layer(&ctx.view, segment.opacity);
			for i in segment.elements {
				elements[i].draw(surface.as_mut(), segment.focus, &ctx, now);
			}
			surface.end_layer();
		}
	}

	/// Topmost node currently in the active layer.
	fn active_node(&self) -> Option<NodeId> {
		self.layers
			.active()
			.elements()
			.iter()
			.rev()
			.find_map(|&i| self.elements[i].node())
	}

	pub fn pointer_move(&mut self, screen: Point, now: Timestamp) {
		self.cursor = Some(screen);
		if let Some(press) = self.press.as_mut() {
			if (screen - press.origin).hypot() >= CLICK_SLOP {
				press.moved = true;
			}
		}
		if let Some(drag) = self.drag {
			let at = self.view.state().to_world(screen) + drag.grab;
			self.layout.pin(drag.node, at);
			if self.press.is_some_and(|p| p.moved) {
				self.layout.reheat(DRAG_ALPHA);
			}
		} else {
			self.view.pan_move(screen);
		}
		self.redistribute(now);
	}

	/// Starts dragging the node under the pointer, or panning when there is
	/// none.
	pub fn pointer_down(&mut self, screen: Point, now: Timestamp) {
		self.cursor = Some(screen);
		self.redistribute(now);
		self.press = Some(Press {
			origin: screen,
			moved: false,
		});
		let grabbed = self.active_node().and_then(|id| {
			let position = self.layout.graph().node(id).position()?;
			Some((id, position))
		});
		match grabbed {
			Some((node, position)) => {
				let grab = position - self.view.state().to_world(screen);
				self.drag = Some(DragState { node, grab });
				self.layout.pin(node, position);
			}
			None => self.view.pan_start(screen),
		}
	}

	/// Ends a drag or pan. A press that barely moved is treated as a click.
	pub fn pointer_up(&mut self, screen: Point, now: Timestamp) {
		if let Some(drag) = self.drag.take() {
			self.layout.unpin(drag.node);
		}
		self.view.pan_end();
		let clicked = self.press.take().is_some_and(|p| !p.moved);
		if clicked {
			self.click(screen, now);
		} else {
			self.cursor = Some(screen);
			self.redistribute(now);
		}
	}

	/// Fires `on_click` for the topmost active node under `screen`.
	pub fn click(&mut self, screen: Point, now: Timestamp) {
		self.cursor = Some(screen);
		self.redistribute(now);
		let Some(id) = self.active_node() else {
			return;
		};
		let element = self.elements.iter().find(|e| e.node() == Some(id));
		if let Some(hook) = element.and_then(|e| e.hooks().on_click.as_ref()) {
			hook(self.layout.graph().node(id));
		}
	}

	pub fn pointer_leave(&mut self, now: Timestamp) {
		self.cursor = None;
		if let Some(drag) = self.drag.take() {
			self.layout.unpin(drag.node);
		}
		self.press = None;
		self.view.pan_end();
		self.redistribute(now);
	}

	pub fn wheel(&mut self, screen: Point, delta_y: f64, now: Timestamp) {
		self.cursor = Some(screen);
		self.view.wheel(screen, delta_y);
		self.redistribute(now);
	}

	/// Two-finger zoom by `factor` around `center`.
	pub fn pinch(&mut self, center: Point, factor: f64, now: Timestamp) {
		self.view.zoom_at(center, factor);
		self.redistribute(now);
	}

	/// New canvas size in CSS pixels. Also recentres the layout.
	pub fn resize(&mut self, width: f64, height: f64, now: Timestamp) {
		if let Some(surface) = self.surface.as_mut() {
			surface.resize(width, height);
		}
		self.hit_tester.resize(width, height);
		self.layout.resize(width, height);
		self.redistribute(now);
	}

	/// Device pixels per CSS pixel of the drawing surface.
	pub fn set_pixel_ratio(&mut self, ratio: f64) {
		if let Some(surface) = self.surface.as_mut() {
			surface.set_pixel_ratio(ratio);
		}
	}

	pub fn on_node_click(&mut self, callback: impl Fn(&Node) + 'static) {
		let callback: NodeCallback = Rc::new(callback);
		self.set_node_hooks(|hooks| hooks.on_click = Some(callback.clone()));
	}

	pub fn on_node_hover(&mut self, callback: impl Fn(&Node) + 'static) {
		let callback: NodeCallback = Rc::new(callback);
		self.set_node_hooks(|hooks| hooks.on_hover = Some(callback.clone()));
	}

	fn set_node_hooks(&mut self, mut apply: impl FnMut(&mut ElementHooks)) {
		for element in &mut self.elements {
			if element.node().is_some() {
				apply(element.hooks_mut());
			}
		}
	}

	/// Where element `index` currently lives.
	pub fn membership(&self, index: usize) -> Option<Membership> {
		self.layers.membership(index)
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use super::*;
	use crate::color::ColorKey;
	use crate::error::MindGraphError;
	use crate::layers::{Focus, RETURNING};
	use crate::surface::recording::{Op, Recording, RecordingSurface};

	// element order: links a-b (0), b-c (1), then nodes a (2), b (3), c (4)
	const A: usize = 2;
	const B: usize = 3;

	fn payload() -> GraphPayload {
		GraphPayload::from_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c")])
	}

	fn composer() -> (SceneComposer, Rc<RefCell<Recording>>) {
		let (surface, log) = RecordingSurface::new();
		let scene = SceneComposer::new(&payload(), MindGraphConfig::default(), Some(Box::new(surface)))
			.unwrap();
		(scene, log)
	}

	fn screen_of(scene: &SceneComposer, id: &str) -> Point {
		let graph = scene.layout().graph();
		let node = graph.node(graph.lookup(id).unwrap());
		scene.view().state().to_screen(node.position().unwrap())
	}

	#[test]
	fn hover_activates_node_and_its_links_then_dims_base() {
		let (mut scene, log) = composer();
		let hovered = Rc::new(RefCell::new(Vec::new()));
		let sink = hovered.clone();
		scene.on_node_hover(move |n| sink.borrow_mut().push(n.id().to_string()));

		let at = screen_of(&scene, "a");
		scene.pointer_move(at, 0.0);
		assert_eq!(scene.layers().active().elements(), [0, A]);
		assert_eq!(scene.layers().base().focus(), Focus::Inactive);
		assert_eq!(scene.cursor_style(), CursorStyle::Pointer);
		assert_eq!(scene.elements()[A].last_active(), Some(0.0));

		scene.frame(0.25);
		scene.pointer_move(at + (1.0, 0.0), 0.3);
		log.borrow_mut().ops.clear();
		scene.frame(0.5);
		assert_eq!(log.borrow().layer_opacities()[0], 0.2);
		assert_eq!(*hovered.borrow(), ["a"]);
		assert_eq!(log.borrow().cursors, [CursorStyle::Pointer]);
		assert!(scene.layers().check_distribution());
	}

	#[test]
	fn leaving_a_node_returns_it_through_a_transition() {
		let (mut scene, log) = composer();
		scene.pointer_move(screen_of(&scene, "a"), 0.0);
		scene.frame(0.5);

		scene.pointer_leave(1.0);
		let records = scene.layers().transitions();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].name(), RETURNING);
		assert_eq!(records[0].elements(), [0, A]);
		assert!(matches!(scene.membership(A), Some(Membership::Pending(_))));
		assert_eq!(scene.cursor_style(), CursorStyle::Default);
		assert_eq!(log.borrow().cursors, [CursorStyle::Pointer, CursorStyle::Default]);

		scene.frame(1.25);
		assert!(matches!(scene.membership(A), Some(Membership::Pending(_))));

		scene.frame(1.5);
		assert_eq!(scene.membership(A), Some(Membership::Base));
		assert_eq!(scene.elements()[A].last_active(), None);
		assert!(scene.layers().transitions().is_empty());
		assert!(scene.layers().check_distribution());
	}

	#[test]
	fn paint_draws_every_element_with_titles() {
		let (mut scene, log) = composer();
		scene.frame(0.0);
		let log = log.borrow();
		assert_eq!(log.ops[0], Op::Clear(None));
		assert_eq!(log.circles().len(), 3);
		assert_eq!(log.texts(), ["a", "b", "c"]);
		let lines = log.ops.iter().filter(|op| matches!(op, Op::Line(..))).count();
		assert_eq!(lines, 2);
		// links paint below nodes
		let first_line = log.ops.iter().position(|op| matches!(op, Op::Line(..)));
		let first_circle = log.ops.iter().position(|op| matches!(op, Op::Circle(..)));
		assert!(first_line < first_circle);
	}

	#[test]
	fn active_nodes_grow_and_recolour() {
		let (mut scene, log) = composer();
		scene.pointer_move(screen_of(&scene, "b"), 0.0);
		scene.frame(0.0);
		scene.frame(1.0);
		let style = scene.style().clone();
		let circles = log.borrow().circles();
		let (circle, color) = circles.last().copied().unwrap();
		assert_eq!(circle.radius, style.node_radius(1.0) + style.active_node_radius_padding);
		assert_eq!(color, style.active_node_color);
		assert_eq!(scene.layers().active().elements(), [0, 1, B]);
	}

	#[test]
	fn click_without_movement_fires_the_callback() {
		let (mut scene, _) = composer();
		let clicked = Rc::new(RefCell::new(Vec::new()));
		let sink = clicked.clone();
		scene.on_node_click(move |n| sink.borrow_mut().push(n.title().to_string()));

		let at = screen_of(&scene, "b");
		scene.pointer_down(at, 0.0);
		assert!(scene.is_dragging());
		scene.pointer_up(at + (1.0, 1.0), 0.1);
		assert!(!scene.is_dragging());
		assert_eq!(*clicked.borrow(), ["b.md"]);
		assert!(!scene.layout().graph().node(NodeId(1)).is_pinned());

		scene.click(Point::new(-50.0, -50.0), 0.2);
		assert_eq!(clicked.borrow().len(), 1);
	}

	#[test]
	fn click_on_stacked_nodes_fires_only_the_topmost() {
		let (mut scene, _) = composer();
		let clicked = Rc::new(RefCell::new(Vec::new()));
		let sink = clicked.clone();
		scene.on_node_click(move |n| sink.borrow_mut().push(n.id().to_string()));

		let at = Point::new(300.0, 300.0);
		scene.layout_mut().pin(NodeId(0), at);
		scene.layout_mut().pin(NodeId(1), at);
		scene.click(at, 0.0);
		assert_eq!(scene.layers().active().elements(), [0, 1, A, B]);
		// b is composed after a, so it paints on top
		assert_eq!(*clicked.borrow(), ["b"]);
	}

	#[test]
	fn dragging_moves_the_node_and_suppresses_the_click() {
		let (mut scene, _) = composer();
		let clicked = Rc::new(RefCell::new(0));
		let sink = clicked.clone();
		scene.on_node_click(move |_| *sink.borrow_mut() += 1);

		let start = screen_of(&scene, "c");
		scene.pointer_down(start + (2.0, 0.0), 0.0);
		scene.pointer_move(start + (52.0, 40.0), 0.1);
		let c = scene.layout().graph().node(NodeId(2));
		assert!(c.is_pinned());
		assert_eq!(c.position(), Some(start + (50.0, 40.0)));
		assert!(scene.layout().alpha() >= DRAG_ALPHA);

		scene.pointer_up(start + (52.0, 40.0), 0.2);
		assert!(!scene.layout().graph().node(NodeId(2)).is_pinned());
		assert_eq!(*clicked.borrow(), 0);
	}

	#[test]
	fn pressing_empty_space_pans() {
		let (mut scene, _) = composer();
		scene.pointer_down(Point::new(10.0, 10.0), 0.0);
		assert!(!scene.is_dragging());
		scene.pointer_move(Point::new(30.0, 5.0), 0.1);
		scene.pointer_up(Point::new(30.0, 5.0), 0.2);
		let state = scene.view().state();
		assert_eq!((state.x, state.y), (20.0, -5.0));
	}

	#[test]
	fn wheel_zoom_keeps_the_hovered_node_hit() {
		let (mut scene, _) = composer();
		let a = screen_of(&scene, "a");
		scene.pointer_move(a, 0.0);
		for i in 0..5 {
			scene.wheel(a, -1.0, 0.1 * f64::from(i));
			assert_eq!(scene.membership(A), Some(Membership::Active));
		}
		assert!(scene.view().state().k > 1.5);
	}

	#[test]
	fn pinch_zoom_can_bring_a_node_under_the_cursor() {
		let (mut scene, _) = composer();
		let a = screen_of(&scene, "a");
		// just outside the unzoomed radius
		let near = a + (scene.style().node_radius(1.0) + 1.0, 0.0);
		scene.pointer_move(near, 0.0);
		assert!(!scene.layers().has_active());
		// zooming about a point left of the node pushes it right by 10%
		scene.pinch(a - (60.0, 0.0), 1.1, 0.1);
		assert_eq!(scene.view().state().k, 1.1);
		assert_eq!(scene.membership(A), Some(Membership::Active));
	}

	#[test]
	fn missing_surface_runs_layout_only() {
		let mut scene = SceneComposer::new(&payload(), MindGraphConfig::default(), None).unwrap();
		assert!(scene.is_headless());
		let at = screen_of(&scene, "a");
		scene.frame(0.0);
		scene.pointer_move(at, 0.1);
		assert_eq!(scene.membership(A), Some(Membership::Active));
		while scene.tick() {}
		assert!(!scene.layout().is_running());

		let unready = SceneComposer::new(
			&payload(),
			MindGraphConfig::default(),
			Some(Box::new(RecordingSurface::unready())),
		)
		.unwrap();
		assert!(unready.is_headless());
	}

	#[test]
	fn color_map_strategy_hits_like_geometry() {
		let mut config = MindGraphConfig::default();
		config.view.hit_strategy = HitStrategy::ColorMap;
		let (surface, _) = RecordingSurface::new();
		let mut scene = SceneComposer::new(&payload(), config, Some(Box::new(surface))).unwrap();
		scene.pointer_move(screen_of(&scene, "c"), 0.0);
		assert_eq!(scene.layers().active().elements(), [1, 4]);
		scene.pointer_move(Point::new(5.0, 5.0), 0.1);
		assert!(!scene.layers().has_active());
	}

	#[test]
	fn color_map_renders_into_the_supplied_picking_surface() {
		let mut config = MindGraphConfig::default();
		config.view.hit_strategy = HitStrategy::ColorMap;
		let (surface, log) = RecordingSurface::new();
		let (picking, picked) = RecordingSurface::new();
		let mut scene = SceneComposer::with_picking_surface(
			&payload(),
			config,
			Some(Box::new(surface)),
			Some(Box::new(picking)),
		)
		.unwrap();
		scene.pointer_move(screen_of(&scene, "a"), 0.0);
		let keys: Vec<_> = picked.borrow().circles().into_iter().map(|(_, c)| c).collect();
		let expected: Vec<_> = (1..=3).map(|i| ColorKey::new(i).unwrap().to_color()).collect();
		assert_eq!(keys, expected);
		assert!(log.borrow().ops.is_empty());
		// the recording surface cannot read pixels back, so nothing is hit
		assert!(!scene.layers().has_active());

		// geometric hit testing never touches a picking surface
		let (picking, picked) = RecordingSurface::new();
		let mut scene = SceneComposer::with_picking_surface(
			&payload(),
			MindGraphConfig::default(),
			None,
			Some(Box::new(picking)),
		)
		.unwrap();
		scene.pointer_move(screen_of(&scene, "a"), 0.0);
		assert!(picked.borrow().ops.is_empty());
		assert!(scene.layers().has_active());
	}

	#[test]
	fn pixel_ratio_reaches_the_surface() {
		let (mut scene, log) = composer();
		scene.set_pixel_ratio(2.0);
		scene.resize(400.0, 300.0, 0.0);
		assert_eq!(log.borrow().pixel_ratios, [2.0]);

		let mut headless = SceneComposer::new(&payload(), MindGraphConfig::default(), None).unwrap();
		headless.set_pixel_ratio(2.0);
		assert!(headless.is_headless());
	}

	#[test]
	fn construction_errors_propagate() {
		let dangling = GraphPayload::from_edges(&["a"], &[("a", "nope")]);
		let err = SceneComposer::new(&dangling, MindGraphConfig::default(), None).err();
		assert!(matches!(err, Some(MindGraphError::UnknownNode { .. })));

		let mut config = MindGraphConfig::default();
		config.view.min_zoom = 20.0;
		let err = SceneComposer::new(&payload(), config, None).err();
		assert!(matches!(err, Some(MindGraphError::InvalidConfig(_))));
	}
}
