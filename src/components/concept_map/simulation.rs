use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::LayoutConfig;
use super::render::node_radius;
use super::store::GraphStore;
use super::types::GraphNode;

/// Fixed physics step; `advance` converts wall-clock time into whole steps.
pub const TICK_SECONDS: f64 = 1.0 / 60.0;
const MAX_TICKS_PER_ADVANCE: usize = 4;
const DISTANCE_MIN_SQ: f64 = 1.0;

#[derive(Clone, Copy, Debug)]
struct Link {
	source: usize,
	target: usize,
	distance: f64,
	strength: f64,
	bias: f64,
}

/// Force-directed layout with an energy level (`alpha`) that decays toward
/// `alpha_target`. Node positions and velocities are stored on
/// the graph's nodes, so `restart` never loses them.
pub struct Simulation {
	params: LayoutConfig,
	alpha: f64,
	alpha_target: f64,
	center: (f64, f64),
	links: Vec<Link>,
	radii: Vec<f64>,
	pending: f64,
	rng: SmallRng,
}

impl Simulation {
	pub fn new(params: LayoutConfig, seed: u64) -> Self {
		Self {
			params,
			alpha: 0.0,
			alpha_target: 0.0,
			center: (0.0, 0.0),
			links: Vec::new(),
			radii: Vec::new(),
			pending: 0.0,
			rng: SmallRng::seed_from_u64(seed),
		}
	}

	#[cfg(test)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	#[cfg(test)]
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	pub fn set_center(&mut self, x: f64, y: f64) {
		self.center = (x, y);
	}

	pub fn is_active(&self) -> bool {
		self.alpha >= self.params.alpha_min || self.alpha_target >= self.params.alpha_min
	}

	/// Re-read membership from the store and inject energy.
	pub fn restart(&mut self, store: &GraphStore) {
		let nodes = store.nodes();
		self.radii = nodes
			.iter()
			.map(|n| node_radius(n) + self.params.collide_margin)
			.collect();

		let mut degree = vec![0usize; nodes.len()];
		let mut resolved = Vec::with_capacity(store.edge_count());
		for edge in store.edges() {
			let (Some(source), Some(target)) =
				(store.node_index(edge.source()), store.node_index(edge.target()))
			else {
				continue;
			};
			degree[source] += 1;
			degree[target] += 1;
			resolved.push((source, target, edge.weight));
		}

		self.links = resolved
			.into_iter()
			.map(|(source, target, weight)| {
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				Link {
					source,
					target,
					distance: self.params.link_distance_for(weight),
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();

		self.alpha = self.params.merge_alpha;
	}

	/// Advance the layout by `dt` seconds of wall-clock time. Returns true when
	/// any node moved.
	pub fn advance(&mut self, store: &mut GraphStore, dt: f64) -> bool {
		if !self.is_active() {
			self.pending = 0.0;
			return false;
		}
		if dt.is_finite() && dt > 0.0 {
			self.pending += dt;
		}

		let mut ticks = 0;
		while self.pending >= TICK_SECONDS && ticks < MAX_TICKS_PER_ADVANCE {
			self.pending -= TICK_SECONDS;
			self.tick(store.nodes_mut());
			ticks += 1;
			if !self.is_active() {
				break;
			}
		}
		if ticks == MAX_TICKS_PER_ADVANCE {
			self.pending = 0.0;
		}
		ticks > 0
	}

	fn tick(&mut self, nodes: &mut [GraphNode]) {
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;

		self.apply_links(nodes);
		self.apply_charge(nodes);
		self.apply_center(nodes);
		self.apply_collide(nodes);

		let keep = 1.0 - self.params.velocity_decay;
		for node in nodes.iter_mut() {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= keep;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= keep;
					node.y += node.vy;
				}
			}
		}
	}

	fn jiggle(&mut self) -> f64 {
		(self.rng.r#gen::<f64>() - 0.5) * 1e-6
	}

	fn apply_links(&mut self, nodes: &mut [GraphNode]) {
		for i in 0..self.links.len() {
			let Link {
				source: s,
				target: t,
				distance,
				strength,
				bias,
			} = self.links[i];
			if s >= nodes.len() || t >= nodes.len() {
				continue;
			}

			let mut x = nodes[t].x + nodes[t].vx - nodes[s].x - nodes[s].vx;
			let mut y = nodes[t].y + nodes[t].vy - nodes[s].y - nodes[s].vy;
			if x == 0.0 {
				x = self.jiggle();
			}
			if y == 0.0 {
				y = self.jiggle();
			}
			let len = (x * x + y * y).sqrt();
			let pull = (len - distance) / len * self.alpha * strength;
			x *= pull;
			y *= pull;

			nodes[t].vx -= x * bias;
			nodes[t].vy -= y * bias;
			nodes[s].vx += x * (1.0 - bias);
			nodes[s].vy += y * (1.0 - bias);
		}
	}

	fn apply_charge(&mut self, nodes: &mut [GraphNode]) {
		let scale = self.params.charge_strength * self.alpha;
		for i in 0..nodes.len() {
			for j in 0..nodes.len() {
				if i == j {
					continue;
				}
				let mut x = nodes[j].x - nodes[i].x;
				let mut y = nodes[j].y - nodes[i].y;
				if x == 0.0 {
					x = self.jiggle();
				}
				if y == 0.0 {
					y = self.jiggle();
				}
				let mut l = x * x + y * y;
				if l < DISTANCE_MIN_SQ {
					l = (DISTANCE_MIN_SQ * l).sqrt();
				}
				let w = scale / l;
				nodes[i].vx += x * w;
				nodes[i].vy += y * w;
			}
		}
	}

	fn apply_center(&self, nodes: &mut [GraphNode]) {
		if nodes.is_empty() {
			return;
		}
		let n = nodes.len() as f64;
		let (sx, sy) = nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let (dx, dy) = (sx / n - self.center.0, sy / n - self.center.1);
		for node in nodes.iter_mut() {
			node.x -= dx;
			node.y -= dy;
		}
	}

	fn apply_collide(&mut self, nodes: &mut [GraphNode]) {
		let count = nodes.len().min(self.radii.len());
		for i in 0..count {
			let ri = self.radii[i];
			let ri2 = ri * ri;
			let (xi, yi) = (nodes[i].x + nodes[i].vx, nodes[i].y + nodes[i].vy);
			for j in (i + 1)..count {
				let rj = self.radii[j];
				let r = ri + rj;
				let mut x = xi - nodes[j].x - nodes[j].vx;
				let mut y = yi - nodes[j].y - nodes[j].vy;
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = self.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.jiggle();
					l += y * y;
				}
				let dist = l.sqrt();
				let push = (r - dist) / dist;
				x *= push;
				y *= push;

				let share = (rj * rj) / (ri2 + rj * rj);
				nodes[i].vx += x * share;
				nodes[i].vy += y * share;
				nodes[j].vx -= x * (1.0 - share);
				nodes[j].vy -= y * (1.0 - share);
			}
		}
	}
}
