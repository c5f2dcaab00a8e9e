use std::f64::consts::PI;

use kurbo::{Circle, Point};
use log::{error, warn};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::color::Color;
use crate::surface::{CursorStyle, RenderSurface};
use crate::view::ViewTransformState;

const TITLE_FONT: &str = "10px sans-serif";

/// [`RenderSurface`] over an HTML canvas 2D context.
///
/// Sizes are CSS pixels; the backing store is scaled by the device pixel
/// ratio so lines stay sharp on high-density displays.
pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	width: f64,
	height: f64,
	pixel_ratio: f64,
}

impl CanvasSurface {
	/// `None` when the canvas has no 2D context.
	pub fn new(canvas: HtmlCanvasElement, width: f64, height: f64, pixel_ratio: f64) -> Option<Self> {
		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>().ok()?,
			Ok(None) => {
				warn!("canvas has no 2d context");
				return None;
			}
			Err(e) => {
				error!("failed to get 2d context: {e:?}");
				return None;
			}
		};
		let mut surface = Self {
			canvas,
			ctx,
			width,
			height,
			pixel_ratio: if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 },
		};
		surface.apply_size();
		Some(surface)
	}

	/// Detached canvas for colour-map picking: one backing pixel per CSS
	/// pixel and no image smoothing.
	pub fn offscreen(width: f64, height: f64) -> Option<Self> {
		let document = web_sys::window()?.document()?;
		let canvas: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
		let surface = Self::new(canvas, width, height, 1.0)?;
		surface.ctx.set_image_smoothing_enabled(false);
		Some(surface)
	}

	fn apply_size(&mut self) {
		self.canvas.set_width((self.width * self.pixel_ratio) as u32);
		self.canvas.set_height((self.height * self.pixel_ratio) as u32);
		let style = self.canvas.style();
		let _ = style.set_property("width", &format!("{}px", self.width));
		let _ = style.set_property("height", &format!("{}px", self.height));
	}
}

impl RenderSurface for CanvasSurface {
	fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.apply_size();
	}

	fn set_pixel_ratio(&mut self, pixel_ratio: f64) {
		if pixel_ratio > 0.0 && pixel_ratio != self.pixel_ratio {
			self.pixel_ratio = pixel_ratio;
			self.apply_size();
		}
	}

	fn clear(&mut self, background: Option<Color>) {
		let r = self.pixel_ratio;
		let _ = self.ctx.set_transform(r, 0.0, 0.0, r, 0.0, 0.0);
		self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
		if let Some(bg) = background {
			self.ctx.set_fill_style_str(&bg.to_hex());
			self.ctx.fill_rect(0.0, 0.0, self.width, self.height);
		}
	}

	fn begin_layer(&mut self, transform: &ViewTransformState, opacity: f64) {
		self.ctx.save();
		self.ctx.set_global_alpha(opacity);
		let _ = self.ctx.translate(transform.x, transform.y);
		let _ = self.ctx.scale(transform.k, transform.k);
	}

	fn end_layer(&mut self) {
		self.ctx.restore();
	}

	fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f64) {
		self.ctx.begin_path();
		self.ctx.move_to(from.x, from.y);
		self.ctx.line_to(to.x, to.y);
		self.ctx.set_stroke_style_str(&color.to_hex());
		self.ctx.set_line_width(width);
		self.ctx.stroke();
	}

	fn draw_circle(&mut self, circle: Circle, color: Color) {
		self.ctx.begin_path();
		let _ = self
			.ctx
			.arc(circle.center.x, circle.center.y, circle.radius, 0.0, 2.0 * PI);
		self.ctx.set_fill_style_str(&color.to_hex());
		self.ctx.fill();
	}

	fn draw_text(&mut self, text: &str, anchor: Point, color: Color) {
		self.ctx.set_font(TITLE_FONT);
		self.ctx.set_fill_style_str(&color.to_hex());
		let width = self.ctx.measure_text(text).map_or(0.0, |m| m.width());
		let _ = self.ctx.fill_text(text, anchor.x - width / 2.0, anchor.y);
	}

	fn set_cursor_style(&mut self, cursor: CursorStyle) {
		let _ = self.canvas.style().set_property("cursor", cursor.as_css());
	}

	fn read_pixel(&self, at: Point) -> Option<Color> {
		let (x, y) = (at.x * self.pixel_ratio, at.y * self.pixel_ratio);
		if x < 0.0 || y < 0.0 || x >= f64::from(self.canvas.width()) || y >= f64::from(self.canvas.height()) {
			return None;
		}
		let data = self.ctx.get_image_data(x.floor(), y.floor(), 1.0, 1.0).ok()?.data();
		match data.0.as_slice() {
			[_, _, _, 0] => Some(Color::BLACK),
			[r, g, b, _] => Some(Color::rgb(*r, *g, *b)),
			_ => None,
		}
	}
}
