//! Wall-clock driven interpolation of scalars and colours.
//!
//! An [`Animation`] is a pure function of the timestamp it is sampled at, so
//! the result does not depend on how many frames were rendered in between.
//! Timestamps are seconds as `f64`.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Seconds, usually `Date.now() / 1000` in the browser.
pub type Timestamp = f64;

pub fn linear(p: f64) -> f64 {
	p
}

pub fn ease_in(p: f64) -> f64 {
	p * p
}

pub fn flip(p: f64) -> f64 {
	1.0 - p
}

pub fn ease_out(p: f64) -> f64 {
	flip(ease_in(flip(p)))
}

/// Shape of the progress curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
	#[default]
	Linear,
	EaseIn,
	EaseOut,
	/// Runs the curve backwards. The endpoints of an [`Animation`] are still
	/// pinned to `from` and `to`.
	Flip,
}

impl Easing {
	pub fn apply(self, p: f64) -> f64 {
		match self {
			Self::Linear => linear(p),
			Self::EaseIn => ease_in(p),
			Self::EaseOut => ease_out(p),
			Self::Flip => flip(p),
		}
	}
}

/// Values an [`Animation`] can interpolate.
pub trait Animatable: Copy + PartialEq {
	fn interpolate(from: Self, to: Self, t: f64) -> Self;
}

impl Animatable for f64 {
	fn interpolate(from: Self, to: Self, t: f64) -> Self {
		from + (to - from) * t
	}
}

impl Animatable for Color {
	fn interpolate(from: Self, to: Self, t: f64) -> Self {
		let channel = |a: u8, b: u8| {
			f64::interpolate(f64::from(a), f64::from(b), t)
				.round()
				.clamp(0.0, 255.0) as u8
		};
		Color::rgb(
			channel(from.r, to.r),
			channel(from.g, to.g),
			channel(from.b, to.b),
		)
	}
}

/// A single interpolation from `initial` to `desired`.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation<T> {
	initial: T,
	current: T,
	desired: T,
	easing: Easing,
	duration: f64,
	start: Timestamp,
}

impl<T: Animatable> Animation<T> {
	pub fn new(from: T, to: T, easing: Easing, duration: f64, start: Timestamp) -> Self {
		Self {
			initial: from,
			current: from,
			desired: to,
			easing,
			duration,
			start,
		}
	}

	pub fn initial(&self) -> T {
		self.initial
	}

	pub fn desired(&self) -> T {
		self.desired
	}

	/// Value recorded by the last call to [`Animation::value`].
	pub fn current(&self) -> T {
		self.current
	}

	pub fn start(&self) -> Timestamp {
		self.start
	}

	pub fn duration(&self) -> f64 {
		self.duration
	}

	pub fn easing(&self) -> Easing {
		self.easing
	}

	/// Raw time fraction in `[0, 1]`. Degenerate durations count as done.
	pub fn progress(&self, now: Timestamp) -> f64 {
		if !self.duration.is_finite() || self.duration <= 0.0 {
			return 1.0;
		}
		let p = (now - self.start) / self.duration;
		if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
	}

	/// Samples the animation without recording the result.
	pub fn value_at(&self, now: Timestamp) -> T {
		let p = self.progress(now);
		if p >= 1.0 {
			self.desired
		} else if p <= 0.0 {
			self.initial
		} else {
			T::interpolate(self.initial, self.desired, self.easing.apply(p))
		}
	}

	/// Samples the animation and stores the result as the current value.
	pub fn value(&mut self, now: Timestamp) -> T {
		self.current = self.value_at(now);
		self.current
	}

	pub fn is_finished(&self) -> bool {
		self.current == self.desired
	}

	/// Restarts from the value at `now` toward a new target, keeping easing and
	/// duration.
	pub fn retarget(&mut self, desired: T, now: Timestamp) {
		let from = self.value(now);
		*self = Self::new(from, desired, self.easing, self.duration, now);
	}
}
