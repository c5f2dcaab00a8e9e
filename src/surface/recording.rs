use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Circle, Point};

use super::{CursorStyle, RenderSurface};
use crate::color::Color;
use crate::view::ViewTransformState;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
	Clear(Option<Color>),
	BeginLayer(ViewTransformState, f64),
	EndLayer,
	Line(Point, Point, Color),
	Circle(Circle, Color),
	Text(String, Point, Color),
}

#[derive(Debug, Default)]
pub(crate) struct Recording {
	pub ops: Vec<Op>,
	pub cursors: Vec<CursorStyle>,
	pub pixel_ratios: Vec<f64>,
}

impl Recording {
	/// Opacity of every `begin_layer` call, in order.
	pub fn layer_opacities(&self) -> Vec<f64> {
		self.ops
			.iter()
			.filter_map(|op| match op {
				Op::BeginLayer(_, opacity) => Some(*opacity),
				_ => None,
			})
			.collect()
	}

	pub fn circles(&self) -> Vec<(Circle, Color)> {
		self.ops
			.iter()
			.filter_map(|op| match op {
				Op::Circle(c, color) => Some((*c, *color)),
				_ => None,
			})
			.collect()
	}

	pub fn texts(&self) -> Vec<String> {
		self.ops
			.iter()
			.filter_map(|op| match op {
				Op::Text(t, _, _) => Some(t.clone()),
				_ => None,
			})
			.collect()
	}
}

/// Test double that records every call into a shared [`Recording`].
pub(crate) struct RecordingSurface {
	log: Rc<RefCell<Recording>>,
	ready: bool,
}

impl RecordingSurface {
	pub fn new() -> (Self, Rc<RefCell<Recording>>) {
		let log = Rc::new(RefCell::new(Recording::default()));
		(
			Self {
				log: log.clone(),
				ready: true,
			},
			log,
		)
	}

	pub fn unready() -> Self {
		Self {
			log: Rc::default(),
			ready: false,
		}
	}
}

impl RenderSurface for RecordingSurface {
	fn is_ready(&self) -> bool {
		self.ready
	}

	fn size(&self) -> (f64, f64) {
		(800.0, 600.0)
	}

	fn clear(&mut self, background: Option<Color>) {
		self.log.borrow_mut().ops.push(Op::Clear(background));
	}

	fn begin_layer(&mut self, transform: &ViewTransformState, opacity: f64) {
		self.log.borrow_mut().ops.push(Op::BeginLayer(*transform, opacity));
	}

	fn end_layer(&mut self) {
		self.log.borrow_mut().ops.push(Op::EndLayer);
	}

	fn draw_line(&mut self, from: Point, to: Point, color: Color, _width: f64) {
		self.log.borrow_mut().ops.push(Op::Line(from, to, color));
	}

	fn draw_circle(&mut self, circle: Circle, color: Color) {
		self.log.borrow_mut().ops.push(Op::Circle(circle, color));
	}

	fn draw_text(&mut self, text: &str, anchor: Point, color: Color) {
		self.log
			.borrow_mut()
			.ops
			.push(Op::Text(text.to_owned(), anchor, color));
	}

	fn set_cursor_style(&mut self, cursor: CursorStyle) {
		self.log.borrow_mut().cursors.push(cursor);
	}

	fn set_pixel_ratio(&mut self, ratio: f64) {
		self.log.borrow_mut().pixel_ratios.push(ratio);
	}
}
