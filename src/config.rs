//! Tunable options for physics, view and visual style.
//!
//! Every field is optional in JSON; missing fields take the defaults below.
//! Keys are camelCase so configs written for the browser bundle load as-is.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{MindGraphError, MindGraphResult};

/// Physics parameters for [`ForceLayout`](crate::graph::ForceLayout).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
	/// Pairwise charge; negative repels.
	pub charge_strength: f64,
	pub center_strength: f64,
	pub link_strength: f64,
	/// Rest length of link springs.
	pub link_distance: f64,
	/// Starting temperature.
	pub alpha: f64,
	/// Fraction of alpha lost per tick.
	pub alpha_decay: f64,
	/// Ticking stops once alpha falls below this.
	pub alpha_min: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Nodes per revolution of the starting circle.
	pub initial_cluster_strength: f64,
	pub initial_radius: f64,
	pub randomize_starting_points: bool,
	pub random_seed: u64,
	pub width: f64,
	pub height: f64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			charge_strength: -400.0,
			center_strength: 0.28,
			link_strength: 0.06,
			link_distance: 30.0,
			alpha: 0.4,
			alpha_decay: 0.01,
			alpha_min: 1e-3,
			velocity_decay: 0.4,
			initial_cluster_strength: 8.0,
			initial_radius: 200.0,
			randomize_starting_points: false,
			random_seed: 0x5eed,
			width: 800.0,
			height: 600.0,
		}
	}
}

impl SimulationConfig {
	pub fn validate(&self) -> MindGraphResult<()> {
		let finite = [
			("chargeStrength", self.charge_strength),
			("centerStrength", self.center_strength),
			("linkStrength", self.link_strength),
			("linkDistance", self.link_distance),
			("alpha", self.alpha),
			("alphaMin", self.alpha_min),
			("initialRadius", self.initial_radius),
			("width", self.width),
			("height", self.height),
		];
		for (name, value) in finite {
			if !value.is_finite() {
				return Err(MindGraphError::invalid_config(format!(
					"{name} must be finite, got {value}"
				)));
			}
		}
		if !(self.alpha_decay > 0.0 && self.alpha_decay <= 1.0) {
			return Err(MindGraphError::invalid_config(format!(
				"alphaDecay must be in (0, 1], got {}",
				self.alpha_decay
			)));
		}
		if !(0.0..=1.0).contains(&self.velocity_decay) {
			return Err(MindGraphError::invalid_config(format!(
				"velocityDecay must be in [0, 1], got {}",
				self.velocity_decay
			)));
		}
		if !(self.initial_cluster_strength > 0.0 && self.initial_cluster_strength.is_finite()) {
			return Err(MindGraphError::invalid_config(
				"initialClusterStrength must be positive",
			));
		}
		if self.alpha < 0.0 || self.alpha_min <= 0.0 {
			return Err(MindGraphError::invalid_config(
				"alpha must be non-negative and alphaMin positive",
			));
		}
		Ok(())
	}
}

/// How the cursor is matched against nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HitStrategy {
	/// Circle test in world space.
	#[default]
	Geometric,
	/// Offscreen id render plus a single pixel read-back.
	ColorMap,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub hit_strategy: HitStrategy,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			min_zoom: 0.4,
			max_zoom: 16.0,
			hit_strategy: HitStrategy::Geometric,
		}
	}
}

impl ViewConfig {
	pub fn validate(&self) -> MindGraphResult<()> {
		if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom && self.max_zoom.is_finite()) {
			return Err(MindGraphError::invalid_config(format!(
				"zoom extent [{}, {}] is not a positive range",
				self.min_zoom, self.max_zoom
			)));
		}
		Ok(())
	}
}

/// Colours, sizes and timings used when painting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
	pub node_color: Color,
	pub active_node_color: Color,
	pub link_color: Color,
	pub active_link_color: Color,
	pub title_color: Color,
	/// Filled behind everything on clear; transparent when unset.
	pub background_color: Option<Color>,
	pub node_title_padding: f64,
	pub active_node_title_padding: f64,
	pub active_node_radius_padding: f64,
	pub minimum_node_size: f64,
	pub node_scale_factor: f64,
	pub link_width: f64,
	pub dimmed_layer_opacity: f64,
	/// Seconds.
	pub dimming_layer_duration: f64,
	/// Seconds.
	pub hover_animation_duration: f64,
}

impl Default for StyleConfig {
	fn default() -> Self {
		Self {
			node_color: Color::rgb(0x01, 0xb0, 0xd3),
			active_node_color: Color::WHITE,
			link_color: Color::rgb(0x01, 0x58, 0x6a),
			active_link_color: Color::WHITE,
			title_color: Color::WHITE,
			background_color: None,
			node_title_padding: 12.0,
			active_node_title_padding: 14.0,
			active_node_radius_padding: 1.0,
			minimum_node_size: 4.0,
			node_scale_factor: 0.96,
			link_width: 1.0,
			dimmed_layer_opacity: 0.2,
			dimming_layer_duration: 0.5,
			hover_animation_duration: 0.3,
		}
	}
}

impl StyleConfig {
	/// World-space radius of a node with the given weight. Weights below one
	/// count as one so leaf nodes still get a visible body.
	pub fn node_radius(&self, weight: f64) -> f64 {
		self.minimum_node_size + weight.max(1.0).powf(self.node_scale_factor)
	}

	pub fn validate(&self) -> MindGraphResult<()> {
		if !(0.0..=1.0).contains(&self.dimmed_layer_opacity) {
			return Err(MindGraphError::invalid_config(format!(
				"dimmedLayerOpacity must be in [0, 1], got {}",
				self.dimmed_layer_opacity
			)));
		}
		if !self.minimum_node_size.is_finite() || !self.node_scale_factor.is_finite() {
			return Err(MindGraphError::invalid_config("node sizing must be finite"));
		}
		Ok(())
	}
}

/// Everything the scene composer can be configured with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MindGraphConfig {
	pub simulation: SimulationConfig,
	pub view: ViewConfig,
	pub style: StyleConfig,
}

impl MindGraphConfig {
	pub fn from_json(json: &str) -> MindGraphResult<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> MindGraphResult<()> {
		self.simulation.validate()?;
		self.view.validate()?;
		self.style.validate()
	}
}
