//! The 2D drawing sink the scene paints into.
//!
//! Implementations: [`PixmapSurface`] for headless rasterizing, and the
//! browser canvas surface in the web shell.

mod pixmap;
#[cfg(test)]
pub(crate) mod recording;

use kurbo::{Circle, Point};

pub use pixmap::PixmapSurface;

use crate::color::Color;
use crate::view::ViewTransformState;

/// Pointer cursor shown over the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorStyle {
	#[default]
	Default,
	Pointer,
}

impl CursorStyle {
	pub fn as_css(self) -> &'static str {
		match self {
			Self::Default => "default",
			Self::Pointer => "pointer",
		}
	}
}

/// Drawing primitives, in world coordinates between
/// [`begin_layer`](RenderSurface::begin_layer) and
/// [`end_layer`](RenderSurface::end_layer).
///
/// Surfaces are single-threaded and only touched from the paint loop.
pub trait RenderSurface {
	/// A surface that reports `false` here is treated as absent and never
	/// painted.
	fn is_ready(&self) -> bool {
		true
	}

	/// Size in CSS pixels.
	fn size(&self) -> (f64, f64);

	fn resize(&mut self, _width: f64, _height: f64) {}

	/// Device pixels per CSS pixel. Surfaces without a backing store of their
	/// own ignore it.
	fn set_pixel_ratio(&mut self, _ratio: f64) {}

	/// Wipes the whole surface, optionally filling it.
	fn clear(&mut self, background: Option<Color>);

	/// Starts a group of draws sharing a transform and opacity.
	fn begin_layer(&mut self, transform: &ViewTransformState, opacity: f64);

	fn end_layer(&mut self);

	fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f64);

	fn draw_circle(&mut self, circle: Circle, color: Color);

	/// Draws `text` horizontally centred on `anchor`.
	fn draw_text(&mut self, text: &str, anchor: Point, color: Color);

	fn set_cursor_style(&mut self, _cursor: CursorStyle) {}

	/// Colour of the device pixel under the screen point `at`, if the surface
	/// supports read-back.
	fn read_pixel(&self, _at: Point) -> Option<Color> {
		None
	}
}
