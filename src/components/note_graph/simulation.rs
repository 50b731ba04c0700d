//! Force-directed layout over the node slots of a [`KnowledgeGraph`].
//!
//! The simulation is the single owner of positions and velocities. Other
//! parts of the view never write positions directly; they pin or release a
//! slot and ask for a reheat, and the next tick applies it.

use std::f64::consts::TAU;

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::builder::KnowledgeGraph;
use super::config::GraphConfig;
use super::types::Vec2;

/// Half-width of the square new nodes are scattered in around the centre.
const INITIAL_SPREAD: f64 = 30.0;
/// Length of the random offset used when two points coincide.
const JIGGLE: f64 = 1e-3;
/// Repulsion stops growing below this squared distance.
const DISTANCE_MIN2: f64 = 100.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
	pub position: Vec2,
	pub velocity: Vec2,
	/// While set, forces are ignored and the body sits here.
	pub fixed: Option<Vec2>,
}

pub struct Simulation {
	bodies: Vec<Body>,
	links: Vec<(usize, usize)>,
	alpha: f64,
	alpha_target: f64,
	center: Vec2,
	config: GraphConfig,
	rng: SmallRng,
}

fn jiggle(rng: &mut SmallRng) -> Vec2 {
	let angle = rng.gen_range(0.0..TAU);
	Vec2::new(angle.cos(), angle.sin()) * JIGGLE
}

impl Simulation {
	pub fn new(config: &GraphConfig, center: Vec2) -> Self {
		Self {
			bodies: Vec::new(),
			links: Vec::new(),
			alpha: 1.0,
			alpha_target: 0.0,
			center,
			config: config.clone(),
			rng: SmallRng::seed_from_u64(config.seed),
		}
	}

	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	pub fn position(&self, slot: usize) -> Option<Vec2> {
		self.bodies.get(slot).map(|b| b.position)
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn center(&self) -> Vec2 {
		self.center
	}

	pub fn is_running(&self) -> bool {
		self.alpha >= self.config.alpha_min
	}

	/// Restart from full temperature.
	pub fn reheat(&mut self) {
		debug!("simulation reheated ({} bodies)", self.bodies.len());
		self.alpha = 1.0;
	}

	/// Make sure the simulation is at least warm enough for neighbours to
	/// react to a drag.
	pub fn warm(&mut self) {
		self.alpha = self.alpha.max(self.config.alpha_drag);
	}

	pub fn set_center(&mut self, center: Vec2) {
		self.center = center;
	}

	pub fn pin(&mut self, slot: usize, position: Vec2) {
		if let Some(body) = self.bodies.get_mut(slot) {
			body.fixed = Some(position);
			body.position = position;
			body.velocity = Vec2::ZERO;
		}
		self.update_alpha_target();
	}

	pub fn release(&mut self, slot: usize) {
		if let Some(body) = self.bodies.get_mut(slot) {
			body.fixed = None;
		}
		self.update_alpha_target();
	}

	fn update_alpha_target(&mut self) {
		self.alpha_target = if self.bodies.iter().any(|b| b.fixed.is_some()) {
			self.config.alpha_drag
		} else {
			0.0
		};
	}

	fn spawn(&mut self) -> Body {
		let offset = Vec2::new(
			self.rng.gen_range(-1.0..1.0),
			self.rng.gen_range(-1.0..1.0),
		) * INITIAL_SPREAD;
		Body {
			position: self.center + offset,
			..Default::default()
		}
	}

	/// Move bodies from `previous`'s slots to `next`'s by node identity.
	/// Nodes new to `next` spawn near the centre; the simulation reheats
	/// only if the structure changed.
	pub fn sync(&mut self, previous: &KnowledgeGraph, next: &KnowledgeGraph) {
		let mut bodies = Vec::with_capacity(next.nodes.len());
		for node in &next.nodes {
			let carried = previous
				.slot(&node.id)
				.and_then(|i| self.bodies.get(i).copied());
			let body = match carried {
				Some(body) => body,
				None => self.spawn(),
			};
			bodies.push(body);
		}
		self.bodies = bodies;
		self.links = next
			.links
			.iter()
			.filter_map(|l| Some((next.slot(&l.source)?, next.slot(&l.target)?)))
			.collect();
		self.update_alpha_target();
		if !previous.same_structure(next) {
			self.reheat();
		}
	}

	/// Advance one step. Returns false without touching anything once the
	/// temperature has dropped below `alpha_min`.
	pub fn tick(&mut self) -> bool {
		if !self.is_running() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

		self.apply_charge();
		self.apply_links();
		self.apply_center();
		self.apply_collision();
		self.integrate();

		if !self.is_running() {
			debug!("simulation converged");
		}
		true
	}

	/// Run until converged or `max_ticks` have elapsed.
	pub fn settle(&mut self, max_ticks: usize) -> usize {
		let mut ticks = 0;
		while ticks < max_ticks && self.tick() {
			ticks += 1;
		}
		ticks
	}

	/// Separation between two slots, jiggled when they coincide.
	fn separation(&mut self, i: usize, j: usize) -> (Vec2, f64) {
		let d = self.bodies[j].position - self.bodies[i].position;
		let l2 = d.x * d.x + d.y * d.y;
		if l2 > 0.0 {
			(d, l2)
		} else {
			let d = jiggle(&mut self.rng);
			(d, JIGGLE * JIGGLE)
		}
	}

	fn apply_charge(&mut self) {
		let strength = self.config.charge_strength * self.alpha;
		if strength == 0.0 {
			return;
		}
		let n = self.bodies.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let (d, l2) = self.separation(i, j);
				let unit = d * (1.0 / l2.sqrt());
				let push = unit * (strength / l2.max(DISTANCE_MIN2));
				self.bodies[i].velocity = self.bodies[i].velocity + push;
				self.bodies[j].velocity = self.bodies[j].velocity - push;
			}
		}
	}

	fn apply_links(&mut self) {
		let strength = self.config.link_strength * self.alpha;
		for k in 0..self.links.len() {
			let (s, t) = self.links[k];
			if s == t {
				continue;
			}
			let (d, l2) = self.separation(s, t);
			let l = l2.sqrt();
			let pull = d * ((l - self.config.link_distance) / l * strength * 0.5);
			self.bodies[s].velocity = self.bodies[s].velocity + pull;
			self.bodies[t].velocity = self.bodies[t].velocity - pull;
		}
	}

	fn apply_center(&mut self) {
		if self.bodies.is_empty() {
			return;
		}
		let n = self.bodies.len() as f64;
		let sum = self
			.bodies
			.iter()
			.fold(Vec2::ZERO, |acc, b| acc + b.position);
		let shift = (self.center - sum * (1.0 / n)) * (self.config.center_strength * self.alpha);
		for body in &mut self.bodies {
			body.velocity = body.velocity + shift;
		}
	}

	fn apply_collision(&mut self) {
		let min = self.config.min_separation;
		let strength = self.config.collision_strength * self.alpha;
		let n = self.bodies.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let (d, l2) = self.separation(i, j);
				if l2 >= min * min {
					continue;
				}
				let l = l2.sqrt();
				let nudge = d * ((min - l) / l * strength * 0.5);
				self.bodies[i].velocity = self.bodies[i].velocity - nudge;
				self.bodies[j].velocity = self.bodies[j].velocity + nudge;
			}
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.config.velocity_decay;
		for body in &mut self.bodies {
			if let Some(fixed) = body.fixed {
				body.position = fixed;
				body.velocity = Vec2::ZERO;
				continue;
			}
			body.velocity = body.velocity * keep;
			body.position = body.position + body.velocity;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::note_graph::builder::build_graph;
	use crate::components::note_graph::types::Note;

	fn sim_for(notes: &[Note]) -> (Simulation, KnowledgeGraph) {
		let graph = build_graph(notes);
		let mut sim = Simulation::new(&GraphConfig::default(), Vec2::new(400.0, 300.0));
		sim.sync(&KnowledgeGraph::default(), &graph);
		(sim, graph)
	}

	fn all_finite(sim: &Simulation) -> bool {
		sim.bodies()
			.iter()
			.all(|b| b.position.is_finite() && b.velocity.is_finite())
	}

	#[test]
	fn coincident_bodies_separate_without_nan() {
		let (mut sim, _) = sim_for(&[Note::new("a", "A", "", ""), Note::new("b", "B", "", "")]);
		let here = Vec2::new(10.0, 10.0);
		sim.bodies[0].position = here;
		sim.bodies[1].position = here;

		sim.tick();
		assert!(all_finite(&sim));
		assert!(sim.bodies[0].position.distance(sim.bodies[1].position) > 0.0);
	}

	#[test]
	fn self_loop_is_tolerated() {
		let (mut sim, graph) = sim_for(&[Note::new("a", "A", "[[A]]", "")]);
		assert_eq!(graph.links.len(), 1);
		sim.settle(500);
		assert!(all_finite(&sim));
	}

	#[test]
	fn converges_and_then_stays_put() {
		let (mut sim, _) = sim_for(&[
			Note::new("a", "A", "[[B]]", ""),
			Note::new("b", "B", "[[C]]", ""),
			Note::new("c", "C", "[[A]]", ""),
		]);
		let ticks = sim.settle(5_000);
		assert!(ticks < 5_000);
		assert!(!sim.is_running());
		assert!(all_finite(&sim));

		let before: Vec<Vec2> = sim.bodies().iter().map(|b| b.position).collect();
		assert!(!sim.tick());
		let after: Vec<Vec2> = sim.bodies().iter().map(|b| b.position).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn linked_pair_settles_near_rest_length() {
		let (mut sim, _) = sim_for(&[Note::new("a", "A", "[[B]]", ""), Note::new("b", "B", "", "")]);
		sim.bodies[0].position = Vec2::new(0.0, 300.0);
		sim.bodies[1].position = Vec2::new(800.0, 300.0);
		sim.settle(5_000);

		let d = sim.bodies[0].position.distance(sim.bodies[1].position);
		assert!(d < 200.0, "spring should pull the pair together, got {d}");
	}

	#[test]
	fn unlinked_neighbours_are_pushed_apart() {
		let (mut sim, _) = sim_for(&[Note::new("a", "A", "", ""), Note::new("b", "B", "", "")]);
		sim.bodies[0].position = Vec2::new(398.0, 300.0);
		sim.bodies[1].position = Vec2::new(402.0, 300.0);
		sim.settle(5_000);

		let d = sim.bodies[0].position.distance(sim.bodies[1].position);
		assert!(d > 4.0);
	}

	#[test]
	fn collision_nudges_overlapping_bodies() {
		let config = GraphConfig {
			charge_strength: 0.0,
			center_strength: 0.0,
			..Default::default()
		};
		let graph = build_graph(&[Note::new("a", "A", "", ""), Note::new("b", "B", "", "")]);
		let mut sim = Simulation::new(&config, Vec2::ZERO);
		sim.sync(&KnowledgeGraph::default(), &graph);
		sim.bodies[0].position = Vec2::new(0.0, 0.0);
		sim.bodies[1].position = Vec2::new(5.0, 0.0);

		sim.tick();
		assert!(sim.bodies[0].position.distance(sim.bodies[1].position) > 5.0);
	}

	#[test]
	fn centroid_drifts_toward_center() {
		let config = GraphConfig {
			charge_strength: 0.0,
			..Default::default()
		};
		let graph = build_graph(&[Note::new("a", "A", "", "")]);
		let mut sim = Simulation::new(&config, Vec2::new(100.0, 100.0));
		sim.sync(&KnowledgeGraph::default(), &graph);
		sim.bodies[0].position = Vec2::new(500.0, 500.0);
		let start = sim.bodies[0].position.distance(sim.center());
		sim.settle(5_000);
		assert!(sim.bodies[0].position.distance(sim.center()) < start);
	}

	#[test]
	fn pinned_body_ignores_forces() {
		let (mut sim, _) = sim_for(&[Note::new("a", "A", "[[B]]", ""), Note::new("b", "B", "", "")]);
		let spot = Vec2::new(-250.0, 75.0);
		sim.pin(0, spot);
		for _ in 0..50 {
			sim.tick();
		}
		assert_eq!(sim.bodies[0].position, spot);
		assert_eq!(sim.bodies[0].velocity, Vec2::ZERO);
		// still warm while something is pinned
		assert!(sim.is_running());
	}

	#[test]
	fn released_body_moves_again() {
		let (mut sim, _) = sim_for(&[Note::new("a", "A", "[[B]]", ""), Note::new("b", "B", "", "")]);
		let spot = Vec2::new(-250.0, 75.0);
		sim.pin(0, spot);
		sim.tick();
		sim.release(0);
		assert!(sim.bodies[0].fixed.is_none());

		sim.tick();
		assert_ne!(sim.bodies[0].position, spot);
	}

	#[test]
	fn converged_simulation_resumes_when_warmed() {
		let (mut sim, _) = sim_for(&[Note::new("a", "A", "", "")]);
		sim.settle(5_000);
		assert!(!sim.is_running());
		sim.warm();
		assert!(sim.is_running());
		assert!(sim.tick());
	}

	#[test]
	fn sync_keeps_positions_by_identity() {
		let first = vec![Note::new("a", "A", "[[B]]", ""), Note::new("b", "B", "", "")];
		let (mut sim, graph) = sim_for(&first);
		sim.settle(5_000);
		let a = sim.position(0).unwrap();
		let b = sim.position(1).unwrap();

		// reorder and append an unrelated note
		let second = vec![
			Note::new("z", "Z", "", ""),
			Note::new("b", "B", "", ""),
			Note::new("a", "A", "[[B]]", ""),
		];
		let next = build_graph(&second);
		sim.sync(&graph, &next);

		assert_eq!(sim.position(next.slot(&"a".into()).unwrap()), Some(a));
		assert_eq!(sim.position(next.slot(&"b".into()).unwrap()), Some(b));
		assert!(sim.is_running());
	}

	#[test]
	fn unchanged_structure_does_not_reheat() {
		let notes = vec![Note::new("a", "A", "[[B]] draft", ""), Note::new("b", "B", "", "")];
		let (mut sim, graph) = sim_for(&notes);
		sim.settle(5_000);

		let edited = vec![
			Note::new("a", "A", "[[B]] final wording", ""),
			Note::new("b", "B", "", ""),
		];
		sim.sync(&graph, &build_graph(&edited));
		assert!(!sim.is_running());
	}

	#[test]
	fn seeded_layouts_are_deterministic() {
		let notes = vec![
			Note::new("a", "A", "[[B]]", ""),
			Note::new("b", "B", "[[C]]", ""),
			Note::new("c", "C", "", ""),
		];
		let (mut one, _) = sim_for(&notes);
		let (mut two, _) = sim_for(&notes);
		one.settle(100);
		two.settle(100);
		assert_eq!(one.bodies(), two.bodies());
	}
}
