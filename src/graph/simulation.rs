//! Velocity-Verlet style force layout with charge, centring and link springs.
//!
//! One [`ForceLayout::tick`] is one frame of work: O(n²) pairwise charge plus
//! O(m) springs. A geometric "alpha" temperature scales every force and decays
//! each tick; once it drops below `alpha_min` the layout reports convergence
//! and further ticks are no-ops.

use std::f64::consts::PI;

use kurbo::{Point, Vec2};
use log::{debug, info};

use super::model::{Body, Graph, NodeId};
use crate::config::SimulationConfig;
use crate::error::MindGraphResult;

/// Squared distance below which charge is softened, keeping near-coincident
/// pairs from producing huge impulses.
const DISTANCE_MIN2: f64 = 1.0;

/// Small deterministic pseudo-random source for start jitter and for
/// separating coincident nodes.
#[derive(Clone, Debug)]
struct Jitter(u64);

impl Jitter {
	fn new(seed: u64) -> Self {
		Self(seed % 233_280)
	}

	/// Next value in `[0, 1)`.
	fn next(&mut self) -> f64 {
		self.0 = (self.0 * 9301 + 49297) % 233_280;
		self.0 as f64 / 233_280.0
	}

	fn nudge(&mut self) -> f64 {
		(self.next() - 0.5) * 1e-6
	}
}

pub struct ForceLayout {
	graph: Graph,
	config: SimulationConfig,
	alpha: f64,
	/// Share of each link's correction applied to its target.
	link_bias: Vec<f64>,
	jitter: Jitter,
	ticks: u64,
}

impl ForceLayout {
	/// Validates `config` and places every node on the starting circle.
	pub fn new(graph: Graph, config: SimulationConfig) -> MindGraphResult<Self> {
		config.validate()?;

		let link_bias = graph
			.links()
			.map(|(_, link)| {
				let (s, t) = (graph.degree(link.source), graph.degree(link.target));
				s as f64 / (s + t).max(1) as f64
			})
			.collect();

		let mut layout = Self {
			alpha: config.alpha,
			jitter: Jitter::new(config.random_seed),
			graph,
			config,
			link_bias,
			ticks: 0,
		};
		layout.place_nodes();
		Ok(layout)
	}

	fn place_nodes(&mut self) {
		let SimulationConfig {
			initial_cluster_strength,
			initial_radius,
			randomize_starting_points,
			width,
			height,
			..
		} = self.config;
		let jitter = &mut self.jitter;

		for (i, node) in self.graph.nodes_mut().iter_mut().enumerate() {
			let angle = i as f64 / initial_cluster_strength * 2.0 * PI;
			let (rx, ry) = if randomize_starting_points {
				(jitter.next(), jitter.next())
			} else {
				(0.0, 0.0)
			};
			node.body = Some(Body {
				position: Point::new(
					angle.cos() * initial_radius + width / 2.0 + rx,
					angle.sin() * initial_radius + height / 2.0 + ry,
				),
				velocity: Vec2::ZERO,
			});
		}
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn config(&self) -> &SimulationConfig {
		&self.config
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	pub fn is_running(&self) -> bool {
		self.alpha >= self.config.alpha_min
	}

	/// Upper bound on the ticks left before convergence, from the current
	/// alpha and decay rate.
	pub fn ticks_to_converge(&self) -> u64 {
		let SimulationConfig {
			alpha_min,
			alpha_decay,
			..
		} = self.config;
		if self.alpha < alpha_min {
			return 0;
		}
		if alpha_decay >= 1.0 {
			return 1;
		}
		((alpha_min / self.alpha).ln() / (1.0 - alpha_decay).ln())
			.ceil()
			.max(1.0) as u64
	}

	/// Advances the simulation by one step. Returns whether it is still
	/// running afterwards.
	pub fn tick(&mut self) -> bool {
		if !self.is_running() {
			return false;
		}
		self.alpha += (0.0 - self.alpha) * self.config.alpha_decay;

		let mut bodies: Vec<Body> = self
			.graph
			.nodes()
			.map(|(_, n)| n.body.unwrap_or_default())
			.collect();

		self.apply_charge(&mut bodies);
		self.apply_center(&mut bodies);
		self.apply_links(&mut bodies);

		let retain = 1.0 - self.config.velocity_decay;
		for (node, mut body) in self.graph.nodes_mut().iter_mut().zip(bodies) {
			if let Some(fixed) = node.fixed {
				body.position = fixed;
				body.velocity = Vec2::ZERO;
			} else {
				body.velocity *= retain;
				body.position += body.velocity;
			}
			node.body = Some(body);
		}

		self.ticks += 1;
		let running = self.is_running();
		if !running {
			info!(
				"layout converged after {} ticks (alpha {:.5})",
				self.ticks, self.alpha
			);
		}
		running
	}

	/// Ticks until converged or `max_ticks` have run, for layout-only use.
	pub fn run_to_convergence(&mut self, max_ticks: u64) -> u64 {
		let mut n = 0;
		while n < max_ticks && self.tick() {
			n += 1;
		}
		n
	}

	fn separate(&mut self, mut d: Vec2) -> Vec2 {
		if d.x == 0.0 {
			d.x = self.jitter.nudge();
		}
		if d.y == 0.0 {
			d.y = self.jitter.nudge();
		}
		d
	}

	fn apply_charge(&mut self, bodies: &mut [Body]) {
		let strength = self.config.charge_strength * self.alpha;
		if strength == 0.0 {
			return;
		}
		for i in 0..bodies.len() {
			for j in (i + 1)..bodies.len() {
				let d = self.separate(bodies[j].position - bodies[i].position);
				let mut l = d.hypot2();
				if l < DISTANCE_MIN2 {
					l = (DISTANCE_MIN2 * l).sqrt();
				}
				let impulse = d * (strength / l);
				bodies[i].velocity += impulse;
				bodies[j].velocity -= impulse;
			}
		}
	}

	fn apply_center(&self, bodies: &mut [Body]) {
		if bodies.is_empty() {
			return;
		}
		let center = Point::new(self.config.width / 2.0, self.config.height / 2.0);
		let sum = bodies
			.iter()
			.fold(Vec2::ZERO, |acc, b| acc + b.position.to_vec2());
		let mean = (sum / bodies.len() as f64).to_point();
		let shift = (mean - center) * self.config.center_strength;
		for body in bodies {
			body.position -= shift;
		}
	}

	fn apply_links(&mut self, bodies: &mut [Body]) {
		let strength = self.config.link_strength * self.alpha;
		let distance = self.config.link_distance;
		let links: Vec<_> = self.graph.links().map(|(id, l)| (id, *l)).collect();
		for (id, link) in links {
			let (s, t) = (link.source.index(), link.target.index());
			if s == t {
				continue;
			}
			let ahead = |b: &Body| b.position + b.velocity;
			let d = self.separate(ahead(&bodies[t]) - ahead(&bodies[s]));
			let l = d.hypot();
			let correction = d * ((l - distance) / l * strength);
			let bias = self.link_bias[id.index()];
			bodies[t].velocity -= correction * bias;
			bodies[s].velocity += correction * (1.0 - bias);
		}
	}

	/// Holds a node at `at` until [`ForceLayout::unpin`]. Used while dragging.
	pub fn pin(&mut self, id: NodeId, at: Point) {
		if let Some(node) = self.graph.nodes_mut().get_mut(id.index()) {
			node.fixed = Some(at);
			node.body = Some(Body {
				position: at,
				velocity: Vec2::ZERO,
			});
		}
	}

	pub fn unpin(&mut self, id: NodeId) {
		if let Some(node) = self.graph.nodes_mut().get_mut(id.index()) {
			node.fixed = None;
		}
	}

	/// Raises alpha back to at least `alpha`, restarting a converged layout.
	pub fn reheat(&mut self, alpha: f64) {
		if alpha > self.alpha {
			debug!("layout reheated {:.4} -> {alpha:.4}", self.alpha);
			self.alpha = alpha;
		}
	}

	/// Moves the centring target. Positions are left alone.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.config.width = width;
		self.config.height = height;
	}
}
