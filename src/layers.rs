//! Highlight layers and the transitions that move elements between them.
//!
//! Every element is in exactly one place: the active layer, the base layer,
//! or one pending [`TransitionRecord`]. Elements are addressed by their index
//! in the composer's element list.

use log::debug;

use crate::animation::{Animation, Easing, Timestamp};
use crate::config::StyleConfig;

/// Name given to records of elements falling back to the base layer.
pub const RETURNING: &str = "returning";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
	Active,
	#[default]
	Neutral,
	Inactive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
	Base,
	Active,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(u64);

/// Where an element currently lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
	Base,
	Active,
	Pending(RecordId),
}

#[derive(Clone, Debug)]
pub struct Layer {
	kind: LayerKind,
	elements: Vec<usize>,
	focus: Focus,
	opacity: f64,
	fade: Option<Animation<f64>>,
}

impl Layer {
	fn new(kind: LayerKind, focus: Focus) -> Self {
		Self {
			kind,
			elements: Vec::new(),
			focus,
			opacity: 1.0,
			fade: None,
		}
	}

	pub fn kind(&self) -> LayerKind {
		self.kind
	}

	pub fn name(&self) -> &'static str {
		match self.kind {
			LayerKind::Base => "base",
			LayerKind::Active => "active",
		}
	}

	pub fn elements(&self) -> &[usize] {
		&self.elements
	}

	pub fn focus(&self) -> Focus {
		self.focus
	}

	pub fn is_fading(&self) -> bool {
		self.fade.is_some()
	}

	pub fn opacity_at(&self, now: Timestamp) -> f64 {
		self.fade.as_ref().map_or(self.opacity, |a| a.value_at(now))
	}

	/// Starts fading toward `target` from the opacity at `now`. A fade already
	/// heading to `target` is left running.
	fn fade_to(&mut self, target: f64, duration: f64, now: Timestamp) {
		if let Some(fade) = &self.fade {
			if fade.desired() == target {
				return;
			}
		} else if self.opacity == target {
			return;
		}
		let from = self.opacity_at(now);
		self.fade = Some(Animation::new(from, target, Easing::EaseOut, duration, now));
	}

	fn settle(&mut self, now: Timestamp) {
		if let Some(fade) = &mut self.fade {
			self.opacity = fade.value(now);
			if fade.is_finished() {
				self.fade = None;
			}
		}
	}
}

/// Elements in flight toward `target`, migrated once `animation` finishes.
#[derive(Clone, Debug)]
pub struct TransitionRecord {
	id: RecordId,
	name: &'static str,
	elements: Vec<usize>,
	target: LayerKind,
	animation: Animation<f64>,
}

impl TransitionRecord {
	pub fn id(&self) -> RecordId {
		self.id
	}

	pub fn name(&self) -> &str {
		self.name
	}

	pub fn elements(&self) -> &[usize] {
		&self.elements
	}

	pub fn target(&self) -> LayerKind {
		self.target
	}

	pub fn animation(&self) -> &Animation<f64> {
		&self.animation
	}
}

/// Membership changes made by one [`LayerTransitionManager::redistribute`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Redistribution {
	/// Elements that became active this pass.
	pub entered: Vec<usize>,
	/// Elements that finished a transition and landed in their target layer.
	pub migrated: Vec<usize>,
}

impl Redistribution {
	pub fn is_empty(&self) -> bool {
		self.entered.is_empty() && self.migrated.is_empty()
	}
}

/// Where a [`PaintSegment`] comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentSource {
	Layer(LayerKind),
	Transition(RecordId),
}

/// One group of same-depth elements painted at a shared opacity.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintSegment {
	pub source: SegmentSource,
	pub z_index: i32,
	pub focus: Focus,
	pub opacity: f64,
	pub elements: Vec<usize>,
}

pub struct LayerTransitionManager {
	base: Layer,
	active: Layer,
	transitions: Vec<TransitionRecord>,
	membership: Vec<Membership>,
	next_record: u64,
	dimmed_opacity: f64,
	dimming_duration: f64,
}

impl LayerTransitionManager {
	/// All `element_count` elements start in the base layer.
	pub fn new(element_count: usize, style: &StyleConfig) -> Self {
		let mut base = Layer::new(LayerKind::Base, Focus::Neutral);
		base.elements = (0..element_count).collect();
		Self {
			base,
			active: Layer::new(LayerKind::Active, Focus::Active),
			transitions: Vec::new(),
			membership: vec![Membership::Base; element_count],
			next_record: 0,
			dimmed_opacity: style.dimmed_layer_opacity,
			dimming_duration: style.dimming_layer_duration,
		}
	}

	pub fn base(&self) -> &Layer {
		&self.base
	}

	pub fn active(&self) -> &Layer {
		&self.active
	}

	pub fn layer(&self, kind: LayerKind) -> &Layer {
		match kind {
			LayerKind::Base => &self.base,
			LayerKind::Active => &self.active,
		}
	}

	pub fn transitions(&self) -> &[TransitionRecord] {
		&self.transitions
	}

	pub fn membership(&self, element: usize) -> Option<Membership> {
		self.membership.get(element).copied()
	}

	pub fn has_active(&self) -> bool {
		!self.active.elements.is_empty()
	}

	/// Moves elements according to this pass's hit results, advances every
	/// transition, and migrates the finished ones.
	///
	/// `hits[i]` says whether element `i` is under the cursor. Elements losing
	/// their hit in the same pass share one record starting at `now`.
	pub fn redistribute(&mut self, now: Timestamp, hits: &[bool]) -> Redistribution {
		let mut outcome = Redistribution::default();
		let mut returning: Option<RecordId> = None;

		for (i, &hit) in hits.iter().enumerate().take(self.membership.len()) {
			match (self.membership[i], hit) {
				(Membership::Active, true) | (Membership::Base, false) => {}
				(Membership::Pending(_), false) => {}
				(Membership::Base | Membership::Pending(_), true) => {
					self.membership[i] = Membership::Active;
					outcome.entered.push(i);
				}
				(Membership::Active, false) => {
					let id = *returning.get_or_insert_with(|| self.open_record(now));
					self.membership[i] = Membership::Pending(id);
				}
			}
		}

		self.rebuild();

		for record in &mut self.transitions {
			record.animation.value(now);
		}
		let (finished, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.transitions)
			.into_iter()
			.partition(|r| r.animation.is_finished());
		self.transitions = pending;
		for record in finished {
			for &i in &record.elements {
				self.membership[i] = match record.target {
					LayerKind::Base => Membership::Base,
					LayerKind::Active => Membership::Active,
				};
				outcome.migrated.push(i);
			}
		}
		if !outcome.migrated.is_empty() {
			self.rebuild();
		}

		if self.has_active() {
			if self.base.focus != Focus::Inactive {
				self.base.focus = Focus::Inactive;
				self.base.fade_to(self.dimmed_opacity, self.dimming_duration, now);
			}
		} else if self.base.focus == Focus::Inactive {
			self.base.focus = Focus::Neutral;
			self.base.fade_to(1.0, self.dimming_duration, now);
		}
		self.base.settle(now);

		if !outcome.is_empty() {
			debug!(
				"redistributed: {} entered, {} migrated, {} pending records",
				outcome.entered.len(),
				outcome.migrated.len(),
				self.transitions.len()
			);
		}
		outcome
	}

	fn open_record(&mut self, now: Timestamp) -> RecordId {
		let id = RecordId(self.next_record);
		self.next_record += 1;
		self.transitions.push(TransitionRecord {
			id,
			name: RETURNING,
			elements: Vec::new(),
			target: LayerKind::Base,
			animation: Animation::new(0.0, 1.0, Easing::Linear, self.dimming_duration, now),
		});
		id
	}

	/// Rebuilds layer and record contents from `membership`, dropping records
	/// left empty.
	fn rebuild(&mut self) {
		self.base.elements.clear();
		self.active.elements.clear();
		for record in &mut self.transitions {
			record.elements.clear();
		}
		for (i, m) in self.membership.iter().enumerate() {
			match m {
				Membership::Base => self.base.elements.push(i),
				Membership::Active => self.active.elements.push(i),
				Membership::Pending(id) => {
					if let Some(record) = self.transitions.iter_mut().find(|r| r.id == *id) {
						record.elements.push(i);
					}
				}
			}
		}
		self.transitions.retain(|r| !r.elements.is_empty());
	}

	/// Whether every element sits in exactly one layer or record, matching its
	/// recorded membership.
	pub fn check_distribution(&self) -> bool {
		let mut seen = vec![0usize; self.membership.len()];
		let mut place = |elements: &[usize], expect: &dyn Fn(Membership) -> bool| {
			elements.iter().all(|&i| match self.membership.get(i) {
				Some(&m) if expect(m) => {
					seen[i] += 1;
					true
				}
				_ => false,
			})
		};
		let consistent = place(&self.base.elements, &|m| m == Membership::Base)
			&& place(&self.active.elements, &|m| m == Membership::Active)
			&& self
				.transitions
				.iter()
				.all(|r| place(&r.elements, &|m| m == Membership::Pending(r.id)));
		consistent && seen.iter().all(|&n| n == 1)
	}

	/// Draw order for the frame at `now`.
	///
	/// Layers paint base then active. Within a layer each z-index group is
	/// followed by the same group of every transition headed for that layer,
	/// so in-flight elements sit at the depth they will land at. Transition
	/// segments fade from full opacity to the target layer's.
	pub fn paint_plan(&self, now: Timestamp, z_index: impl Fn(usize) -> i32) -> Vec<PaintSegment> {
		let mut plan = Vec::new();
		for layer in [&self.base, &self.active] {
			let layer_opacity = layer.opacity_at(now);
			let incoming: Vec<&TransitionRecord> = self
				.transitions
				.iter()
				.filter(|r| r.target == layer.kind)
				.collect();

			let mut depths: Vec<i32> = layer
				.elements
				.iter()
				.chain(incoming.iter().flat_map(|r| r.elements.iter()))
				.map(|&i| z_index(i))
				.collect();
			depths.sort_unstable();
			depths.dedup();

			let at_depth = |elements: &[usize], z: i32| -> Vec<usize> {
				elements.iter().copied().filter(|&i| z_index(i) == z).collect()
			};
			for z in depths {
				let own = at_depth(&layer.elements, z);
				if !own.is_empty() {
					plan.push(PaintSegment {
						source: SegmentSource::Layer(layer.kind),
						z_index: z,
						focus: layer.focus,
						opacity: layer_opacity,
						elements: own,
					});
				}
				for record in &incoming {
					let elements = at_depth(&record.elements, z);
					if elements.is_empty() {
						continue;
					}
					let t = record.animation.value_at(now);
					plan.push(PaintSegment {
						source: SegmentSource::Transition(record.id),
						z_index: z,
						focus: Focus::Neutral,
						opacity: 1.0 + (layer_opacity - 1.0) * t,
						elements,
					});
				}
			}
		}
		plan
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	// two links (z 0) then three nodes (z 1)
	const Z: [i32; 5] = [0, 0, 1, 1, 1];

	fn manager() -> LayerTransitionManager {
		LayerTransitionManager::new(Z.len(), &StyleConfig::default())
	}

	fn hits(active: &[usize]) -> Vec<bool> {
		(0..Z.len()).map(|i| active.contains(&i)).collect()
	}

	#[test]
	fn hit_moves_elements_to_active_immediately() {
		let mut m = manager();
		let out = m.redistribute(0.0, &hits(&[0, 2]));
		assert_eq!(out.entered, [0, 2]);
		assert_eq!(m.active().elements(), [0, 2]);
		assert_eq!(m.base().elements(), [1, 3, 4]);
		assert_eq!(m.base().focus(), Focus::Inactive);
		assert!(m.base().is_fading());
		assert!(m.check_distribution());

		// staying active is not a new entry
		let out = m.redistribute(0.1, &hits(&[0, 2]));
		assert!(out.entered.is_empty());
	}

	#[test]
	fn base_dims_then_recovers() {
		let mut m = manager();
		m.redistribute(0.0, &hits(&[2]));
		m.redistribute(0.5, &hits(&[2]));
		assert_eq!(m.base().opacity_at(0.5), 0.2);
		assert!(!m.base().is_fading());

		m.redistribute(1.0, &hits(&[]));
		assert_eq!(m.base().focus(), Focus::Neutral);
		m.redistribute(1.5, &hits(&[]));
		assert_eq!(m.base().opacity_at(1.5), 1.0);
	}

	#[test]
	fn lost_hit_waits_in_a_record_before_migrating() {
		let mut m = manager();
		m.redistribute(0.0, &hits(&[0, 2]));
		let out = m.redistribute(1.0, &hits(&[]));
		assert!(out.migrated.is_empty());
		assert_eq!(m.transitions().len(), 1);
		let record = &m.transitions()[0];
		assert_eq!(record.name(), RETURNING);
		assert_eq!(record.elements(), [0, 2]);
		assert_eq!(record.target(), LayerKind::Base);
		assert_eq!(record.animation().start(), 1.0);
		assert!(matches!(m.membership(2), Some(Membership::Pending(_))));
		assert!(m.check_distribution());

		m.redistribute(1.3, &hits(&[]));
		assert_eq!(m.transitions().len(), 1);

		let out = m.redistribute(1.5, &hits(&[]));
		assert_eq!(out.migrated, [0, 2]);
		assert!(m.transitions().is_empty());
		assert_eq!(m.base().elements(), [0, 1, 2, 3, 4]);
		assert!(m.check_distribution());
	}

	#[test]
	fn retrigger_pulls_an_element_out_of_its_record() {
		let mut m = manager();
		m.redistribute(0.0, &hits(&[0, 2]));
		m.redistribute(1.0, &hits(&[]));
		let out = m.redistribute(1.2, &hits(&[2]));
		assert_eq!(out.entered, [2]);
		assert_eq!(m.membership(2), Some(Membership::Active));
		assert_eq!(m.transitions()[0].elements(), [0]);
		assert!(m.check_distribution());

		// record empties when the last element leaves it
		m.redistribute(1.3, &hits(&[0, 2]));
		assert!(m.transitions().is_empty());
		assert!(m.check_distribution());
	}

	#[test]
	fn rapid_hover_changes_keep_one_home_per_element() {
		let mut m = manager();
		let script: [&[usize]; 8] = [&[0, 2], &[3], &[], &[0, 2], &[1, 4], &[3], &[], &[]];
		for (step, active) in script.iter().enumerate() {
			m.redistribute(step as f64 * 0.1, &hits(active));
			assert!(m.check_distribution(), "step {step}");
			assert_eq!(m.active().elements(), *active);
		}
		assert!(m.transitions().len() <= 5);
		m.redistribute(10.0, &hits(&[]));
		assert!(m.transitions().is_empty());
		assert_eq!(m.base().elements().len(), Z.len());
	}

	#[test]
	fn transitions_paint_at_their_landing_depth() {
		let mut m = manager();
		m.redistribute(0.0, &hits(&[0, 2]));
		m.redistribute(1.0, &hits(&[3]));
		let record = m.transitions()[0].id();

		let plan = m.paint_plan(1.1, |i| Z[i]);
		let order: Vec<_> = plan
			.iter()
			.map(|s| (s.source, s.z_index, s.elements.clone()))
			.collect();
		assert_eq!(
			order,
			[
				(SegmentSource::Layer(LayerKind::Base), 0, vec![1]),
				(SegmentSource::Transition(record), 0, vec![0]),
				(SegmentSource::Layer(LayerKind::Base), 1, vec![4]),
				(SegmentSource::Transition(record), 1, vec![2]),
				(SegmentSource::Layer(LayerKind::Active), 1, vec![3]),
			]
		);

		assert_eq!(plan[0].opacity, 0.2);
		assert!((plan[1].opacity - 0.84).abs() < 1e-9);
		assert_eq!(plan[4].opacity, 1.0);
		assert_eq!(plan[4].focus, Focus::Active);
	}

	#[test]
	fn zero_duration_migrates_in_the_same_pass() {
		let style = StyleConfig {
			dimming_layer_duration: 0.0,
			..StyleConfig::default()
		};
		let mut m = LayerTransitionManager::new(Z.len(), &style);
		m.redistribute(0.0, &hits(&[2]));
		assert_eq!(m.base().opacity_at(0.0), 0.2);
		let out = m.redistribute(0.0, &hits(&[]));
		assert_eq!(out.migrated, [2]);
		assert!(m.transitions().is_empty());
	}
}
