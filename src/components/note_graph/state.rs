//! The single owner behind the canvas: graph, layout, pointer controller
//! and highlight, kept consistent across rebuilds.

use log::{debug, info};

use super::builder::{KnowledgeGraph, build_graph};
use super::config::{ConfigError, GraphConfig};
use super::highlight::Highlight;
use super::interaction::{Action, InteractionController, ViewTransform};
use super::simulation::Simulation;
use super::types::{Note, NoteId, Vec2};

/// Owns the graph, the simulation and the controller. Every mutation
/// (rebuild, tick, pointer input) goes through `&mut self`, so readers
/// never see a half-replaced graph.
pub struct NoteGraphState {
	pub config: GraphConfig,
	pub graph: KnowledgeGraph,
	pub simulation: Simulation,
	pub controller: InteractionController,
	pub highlight: Highlight,
	pub hovered: Option<NoteId>,
	pub width: f64,
	pub height: f64,
}

impl NoteGraphState {
	pub fn new(config: GraphConfig, width: f64, height: f64) -> Result<Self, ConfigError> {
		config.validate()?;
		let viewport = Vec2::new(width, height);
		Ok(Self {
			simulation: Simulation::new(&config, viewport * 0.5),
			controller: InteractionController::new(&config, viewport),
			graph: KnowledgeGraph::default(),
			highlight: Highlight::default(),
			hovered: None,
			config,
			width,
			height,
		})
	}

	/// Replace the whole note set.
	pub fn rebuild(&mut self, notes: &[Note]) {
		let next = build_graph(notes);
		info!(
			"graph rebuilt: {} nodes, {} links",
			next.nodes.len(),
			next.links.len()
		);
		self.simulation.sync(&self.graph, &next);
		self.graph = next;
		self.controller.retain(&self.graph);
		if self.hovered.as_ref().is_some_and(|id| !self.graph.contains(id)) {
			self.hovered = None;
		}
		self.refresh_highlight();
	}

	fn refresh_highlight(&mut self) {
		self.highlight = Highlight::derive(
			&self.graph,
			self.controller.selection(),
			self.config.dimmed_opacity,
		);
	}

	pub fn transform(&self) -> &ViewTransform {
		self.controller.transform()
	}

	pub fn selection(&self) -> Option<&NoteId> {
		self.controller.selection()
	}

	pub fn position_of(&self, id: &NoteId) -> Option<Vec2> {
		self.graph
			.slot(id)
			.and_then(|slot| self.simulation.position(slot))
	}

	/// Nearest node within the hit radius of a screen point.
	pub fn node_at_position(&self, screen: Vec2) -> Option<usize> {
		let g = self.transform().screen_to_graph(screen);
		self.simulation
			.bodies()
			.iter()
			.enumerate()
			.map(|(i, b)| (i, b.position.distance(g)))
			.filter(|(_, d)| *d < self.config.hit_radius)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _)| i)
	}

	fn hit(&self, screen: Vec2) -> Option<(NoteId, Vec2)> {
		let slot = self.node_at_position(screen)?;
		let id = self.graph.nodes.get(slot)?.id.clone();
		Some((id, self.simulation.position(slot)?))
	}

	/// One animation frame: fire pending clicks, animate the view, step
	/// the layout. Returns whether anything may still be moving.
	pub fn frame(&mut self, now: f64) -> bool {
		let graph = &self.graph;
		let simulation = &self.simulation;
		self.controller.poll(now, |id| {
			graph
				.slot(id)
				.and_then(|slot| simulation.position(slot))
		});
		let animating = self.controller.advance(now);
		let ticked = self.simulation.tick();
		animating || ticked
	}

	/// Apply controller actions; returns notes the host should open.
	fn dispatch(&mut self, actions: Vec<Action>) -> Vec<NoteId> {
		let mut opened = Vec::new();
		for action in actions {
			match action {
				Action::Pin(id, position) => {
					if let Some(slot) = self.graph.slot(&id) {
						self.simulation.pin(slot, position);
					}
				}
				Action::Unpin(id) => {
					if let Some(slot) = self.graph.slot(&id) {
						self.simulation.release(slot);
					}
				}
				Action::Warm => self.simulation.warm(),
				Action::Open(id) => {
					info!("open requested for note {}", id);
					opened.push(id);
				}
			}
		}
		opened
	}

	fn with_selection_tracking(&mut self, f: impl FnOnce(&mut Self) -> Vec<Action>) -> Vec<NoteId> {
		let before = self.controller.selection().cloned();
		let actions = f(self);
		let opened = self.dispatch(actions);
		if self.controller.selection() != before.as_ref() {
			debug!("selection changed to {:?}", self.controller.selection());
			self.refresh_highlight();
		}
		opened
	}

	pub fn pointer_down(&mut self, screen: Vec2) -> Vec<NoteId> {
		let hit = self.hit(screen);
		self.with_selection_tracking(|s| s.controller.pointer_down(screen, hit))
	}

	pub fn pointer_move(&mut self, screen: Vec2) -> Vec<NoteId> {
		if self.controller.dragging().is_none() {
			self.hovered = self.hit(screen).map(|(id, _)| id);
		}
		self.with_selection_tracking(|s| s.controller.pointer_move(screen))
	}

	pub fn pointer_up(&mut self, now: f64) -> Vec<NoteId> {
		self.with_selection_tracking(|s| s.controller.pointer_up(now))
	}

	pub fn pointer_leave(&mut self) -> Vec<NoteId> {
		self.hovered = None;
		self.with_selection_tracking(|s| s.controller.pointer_leave())
	}

	pub fn wheel(&mut self, screen: Vec2, delta_y: f64) {
		self.controller.wheel(screen, delta_y);
	}

	pub fn pinch(&mut self, midpoint: Vec2, factor: f64) {
		self.controller.zoom_by(midpoint, factor);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		let viewport = Vec2::new(width, height);
		self.simulation.set_center(viewport * 0.5);
		self.controller.set_viewport(viewport);
	}
}
