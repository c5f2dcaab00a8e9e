use kurbo::{Circle, Point};
use log::warn;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::RenderSurface;
use crate::color::Color;
use crate::view::ViewTransformState;

/// CPU raster surface backed by a `tiny_skia::Pixmap`.
///
/// Anti-aliasing is off so every covered pixel carries the exact paint
/// colour, which colour-map picking depends on. Text is not rasterized.
pub struct PixmapSurface {
	pixmap: Option<Pixmap>,
	transform: Transform,
	opacity: f64,
}

impl PixmapSurface {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			pixmap: allocate(width, height),
			transform: Transform::identity(),
			opacity: 1.0,
		}
	}

	pub fn pixmap(&self) -> Option<&Pixmap> {
		self.pixmap.as_ref()
	}

	fn paint(&self, color: Color) -> Paint<'static> {
		let mut paint = Paint::default();
		let alpha = (self.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
		paint.set_color_rgba8(color.r, color.g, color.b, alpha);
		paint.anti_alias = false;
		paint
	}
}

fn allocate(width: f64, height: f64) -> Option<Pixmap> {
	let pixmap = Pixmap::new(width.max(0.0).ceil() as u32, height.max(0.0).ceil() as u32);
	if pixmap.is_none() {
		warn!("cannot allocate {width}x{height} pixmap; surface disabled");
	}
	pixmap
}

impl RenderSurface for PixmapSurface {
	fn is_ready(&self) -> bool {
		self.pixmap.is_some()
	}

	fn size(&self) -> (f64, f64) {
		self.pixmap
			.as_ref()
			.map_or((0.0, 0.0), |p| (f64::from(p.width()), f64::from(p.height())))
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.pixmap = allocate(width, height);
	}

	fn clear(&mut self, background: Option<Color>) {
		if let Some(pixmap) = self.pixmap.as_mut() {
			let fill = background.map_or(tiny_skia::Color::TRANSPARENT, |c| {
				tiny_skia::Color::from_rgba8(c.r, c.g, c.b, 255)
			});
			pixmap.fill(fill);
		}
	}

	fn begin_layer(&mut self, transform: &ViewTransformState, opacity: f64) {
		self.transform = Transform::from_row(
			transform.k as f32,
			0.0,
			0.0,
			transform.k as f32,
			transform.x as f32,
			transform.y as f32,
		);
		self.opacity = opacity;
	}

	fn end_layer(&mut self) {
		self.transform = Transform::identity();
		self.opacity = 1.0;
	}

	fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f64) {
		let mut builder = PathBuilder::new();
		builder.move_to(from.x as f32, from.y as f32);
		builder.line_to(to.x as f32, to.y as f32);
		let Some(path) = builder.finish() else {
			return;
		};
		let paint = self.paint(color);
		let stroke = Stroke {
			width: width as f32,
			..Stroke::default()
		};
		let transform = self.transform;
		if let Some(pixmap) = self.pixmap.as_mut() {
			pixmap.stroke_path(&path, &paint, &stroke, transform, None);
		}
	}

	fn draw_circle(&mut self, circle: Circle, color: Color) {
		let Some(path) = PathBuilder::from_circle(
			circle.center.x as f32,
			circle.center.y as f32,
			circle.radius as f32,
		) else {
			return;
		};
		let paint = self.paint(color);
		let transform = self.transform;
		if let Some(pixmap) = self.pixmap.as_mut() {
			pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
		}
	}

	fn draw_text(&mut self, _text: &str, _anchor: Point, _color: Color) {}

	fn read_pixel(&self, at: Point) -> Option<Color> {
		let pixmap = self.pixmap.as_ref()?;
		// `Pixmap::pixel` indexes the flat buffer, so a column past the right
		// edge would read the next row
		let inside = |v: f64, len: u32| v >= 0.0 && v < f64::from(len);
		if !inside(at.x, pixmap.width()) || !inside(at.y, pixmap.height()) {
			return None;
		}
		let pixel = pixmap.pixel(at.x as u32, at.y as u32)?;
		if pixel.alpha() == 0 {
			return Some(Color::BLACK);
		}
		Some(Color::rgb(pixel.red(), pixel.green(), pixel.blue()))
	}
}
