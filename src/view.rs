//! Pan/zoom transform between screen pixels and layout (world) coordinates.

use kurbo::{Affine, Point, Vec2};

use crate::config::ViewConfig;

/// `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransformState {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransformState {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewTransformState {
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	pub fn to_world(&self, screen: Point) -> Point {
		Point::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
	}

	pub fn to_screen(&self, world: Point) -> Point {
		Point::new(world.x * self.k + self.x, world.y * self.k + self.y)
	}

	pub fn affine(&self) -> Affine {
		Affine::new([self.k, 0.0, 0.0, self.k, self.x, self.y])
	}
}

#[derive(Clone, Debug, Default)]
struct PanState {
	active: bool,
	start: Point,
	transform_start: Vec2,
}

/// Handle returned by [`ViewTransform::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&ViewTransformState)>;

/// Owns the live transform and applies pointer gestures to it.
///
/// Every change clamps the scale into the configured zoom extent and then
/// runs the observers synchronously, in subscription order.
pub struct ViewTransform {
	state: ViewTransformState,
	min_zoom: f64,
	max_zoom: f64,
	pan: PanState,
	observers: Vec<(ObserverId, Observer)>,
	next_observer: u64,
}

impl ViewTransform {
	/// Starts untranslated at scale 1, clamped into the zoom extent.
	pub fn new(config: &ViewConfig) -> Self {
		let mut view = Self {
			state: ViewTransformState::IDENTITY,
			min_zoom: config.min_zoom,
			max_zoom: config.max_zoom,
			pan: PanState::default(),
			observers: Vec::new(),
			next_observer: 0,
		};
		view.state.k = view.clamp_scale(1.0);
		view
	}

	pub fn state(&self) -> ViewTransformState {
		self.state
	}

	pub fn scale_extent(&self) -> (f64, f64) {
		(self.min_zoom, self.max_zoom)
	}

	pub fn subscribe(&mut self, observer: impl FnMut(&ViewTransformState) + 'static) -> ObserverId {
		let id = ObserverId(self.next_observer);
		self.next_observer += 1;
		self.observers.push((id, Box::new(observer)));
		id
	}

	pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
		let before = self.observers.len();
		self.observers.retain(|(o, _)| *o != id);
		self.observers.len() != before
	}

	/// Replaces the transform, clamping the scale. Observers run only if the
	/// clamped value differs from the current one.
	pub fn set(&mut self, state: ViewTransformState) {
		let clamped = ViewTransformState {
			k: self.clamp_scale(state.k),
			..state
		};
		if clamped != self.state {
			self.state = clamped;
			self.notify();
		}
	}

	pub fn reset(&mut self) {
		self.pan = PanState::default();
		self.set(ViewTransformState {
			k: self.clamp_scale(1.0),
			..ViewTransformState::IDENTITY
		});
	}

	pub fn pan_start(&mut self, screen: Point) {
		self.pan = PanState {
			active: true,
			start: screen,
			transform_start: Vec2::new(self.state.x, self.state.y),
		};
	}

	/// Continues a pan gesture. Returns `false` when no pan is in progress.
	pub fn pan_move(&mut self, screen: Point) -> bool {
		if !self.pan.active {
			return false;
		}
		let offset = self.pan.transform_start + (screen - self.pan.start);
		self.set(ViewTransformState {
			x: offset.x,
			y: offset.y,
			..self.state
		});
		true
	}

	pub fn pan_end(&mut self) {
		self.pan.active = false;
	}

	pub fn is_panning(&self) -> bool {
		self.pan.active
	}

	pub fn pan_by(&mut self, delta: Vec2) {
		self.set(ViewTransformState {
			x: self.state.x + delta.x,
			y: self.state.y + delta.y,
			..self.state
		});
	}

	/// Mouse wheel: one notch zooms by 10% around the pointer. A zero delta
	/// (horizontal-only scroll) leaves the view alone.
	pub fn wheel(&mut self, screen: Point, delta_y: f64) {
		if delta_y == 0.0 || !delta_y.is_finite() {
			return;
		}
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.zoom_at(screen, factor);
	}

	/// Scales by `factor` keeping the world point under `screen` fixed.
	pub fn zoom_at(&mut self, screen: Point, factor: f64) {
		if !factor.is_finite() || factor <= 0.0 {
			return;
		}
		self.set_scale_at(screen, self.state.k * factor);
	}

	pub fn set_scale_at(&mut self, screen: Point, k: f64) {
		let new_k = self.clamp_scale(k);
		let ratio = new_k / self.state.k;
		self.set(ViewTransformState {
			x: screen.x - (screen.x - self.state.x) * ratio,
			y: screen.y - (screen.y - self.state.y) * ratio,
			k: new_k,
		});
	}

	fn clamp_scale(&self, k: f64) -> f64 {
		if k.is_nan() {
			return self.state.k;
		}
		k.clamp(self.min_zoom, self.max_zoom)
	}

	fn notify(&mut self) {
		let state = self.state;
		for (_, observer) in &mut self.observers {
			observer(&state);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	fn view() -> ViewTransform {
		ViewTransform::new(&ViewConfig::default())
	}

	#[test]
	fn world_and_screen_are_inverse() {
		let state = ViewTransformState {
			x: 40.0,
			y: -10.0,
			k: 2.5,
		};
		let world = Point::new(12.0, 7.0);
		let screen = state.to_screen(world);
		assert_eq!(screen, Point::new(70.0, 7.5));
		assert_eq!(state.to_world(screen), world);
		assert_eq!(state.affine() * world, screen);
	}

	#[test]
	fn zoom_keeps_the_anchor_point_fixed() {
		let mut v = view();
		let anchor = Point::new(300.0, 200.0);
		let before = v.state().to_world(anchor);
		v.zoom_at(anchor, 2.0);
		assert_eq!(v.state().k, 2.0);
		let after = v.state().to_world(anchor);
		assert!((before - after).hypot() < 1e-9);
	}

	#[test]
	fn scale_is_clamped_to_the_extent() {
		let mut v = view();
		for _ in 0..100 {
			v.wheel(Point::ZERO, -1.0);
		}
		assert_eq!(v.state().k, 16.0);
		for _ in 0..200 {
			v.wheel(Point::ZERO, 1.0);
		}
		assert_eq!(v.state().k, 0.4);
		v.set(ViewTransformState { x: 0.0, y: 0.0, k: f64::NAN });
		assert_eq!(v.state().k, 0.4);
	}

	#[test]
	fn initial_scale_respects_the_extent() {
		let config = ViewConfig {
			min_zoom: 2.0,
			max_zoom: 8.0,
			..ViewConfig::default()
		};
		let v = ViewTransform::new(&config);
		assert_eq!(v.scale_extent(), (2.0, 8.0));
		assert_eq!(v.state().k, 2.0);
		assert_eq!((v.state().x, v.state().y), (0.0, 0.0));

		let v = ViewTransform::new(&ViewConfig {
			min_zoom: 0.1,
			max_zoom: 0.5,
			..ViewConfig::default()
		});
		assert_eq!(v.state().k, 0.5);
		assert_eq!(view().state(), ViewTransformState::IDENTITY);
	}

	#[test]
	fn wheel_without_vertical_delta_does_not_zoom() {
		let mut v = view();
		let calls = Rc::new(RefCell::new(0));
		let sink = calls.clone();
		v.subscribe(move |_| *sink.borrow_mut() += 1);
		v.wheel(Point::new(100.0, 100.0), 0.0);
		v.wheel(Point::new(100.0, 100.0), -0.0);
		v.wheel(Point::new(100.0, 100.0), f64::NAN);
		assert_eq!(v.state(), ViewTransformState::IDENTITY);
		assert_eq!(*calls.borrow(), 0);
		v.wheel(Point::new(100.0, 100.0), 3.0);
		assert_eq!(v.state().k, 0.9);
	}

	#[test]
	fn pan_gesture_moves_by_pointer_delta() {
		let mut v = view();
		assert!(!v.pan_move(Point::new(5.0, 5.0)));
		v.pan_start(Point::new(10.0, 10.0));
		assert!(v.pan_move(Point::new(25.0, 4.0)));
		assert_eq!((v.state().x, v.state().y), (15.0, -6.0));
		v.pan_end();
		assert!(!v.is_panning());
		v.pan_by(Vec2::new(1.0, 1.0));
		assert_eq!((v.state().x, v.state().y), (16.0, -5.0));
	}

	#[test]
	fn observers_run_after_each_change() {
		let mut v = view();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		let id = v.subscribe(move |s| sink.borrow_mut().push(s.k));
		v.zoom_at(Point::ZERO, 2.0);
		v.zoom_at(Point::ZERO, 100.0);
		// already at max: no change, no notification
		v.zoom_at(Point::ZERO, 2.0);
		assert_eq!(*seen.borrow(), [2.0, 16.0]);
		assert!(v.unsubscribe(id));
		v.reset();
		assert_eq!(seen.borrow().len(), 2);
		assert_eq!(v.state(), ViewTransformState::IDENTITY);
	}
}
