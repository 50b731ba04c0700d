//! Pointer handling: panning, dragging, zoom, selection and the
//! single/double click split.
//!
//! The controller never touches node positions. Handlers return
//! [`Action`]s that the owner forwards to the simulation or the host app.
//! Every time-dependent call takes `now` in milliseconds so tests can
//! drive it with a virtual clock.

use super::builder::KnowledgeGraph;
use super::config::GraphConfig;
use super::types::{NoteId, Vec2};

pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Graph-to-screen mapping: `screen = graph * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, s: Vec2) -> Vec2 {
		Vec2::new((s.x - self.x) / self.k, (s.y - self.y) / self.k)
	}

	pub fn graph_to_screen(&self, g: Vec2) -> Vec2 {
		Vec2::new(g.x * self.k + self.x, g.y * self.k + self.y)
	}

	/// Zoom to `k` keeping the graph point under `anchor` fixed on screen.
	fn zoom_around(&mut self, anchor: Vec2, k: f64) {
		let ratio = k / self.k;
		self.x = anchor.x - (anchor.x - self.x) * ratio;
		self.y = anchor.y - (anchor.y - self.y) * ratio;
		self.k = k;
	}

	/// Transform that puts `target` in the middle of a `viewport` at zoom `k`.
	fn centered_on(target: Vec2, viewport: Vec2, k: f64) -> Self {
		Self {
			x: viewport.x / 2.0 - target.x * k,
			y: viewport.y / 2.0 - target.y * k,
			k,
		}
	}

	fn lerp(&self, to: &ViewTransform, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
	Idle,
	Panning {
		press: Vec2,
		origin: Vec2,
	},
	Dragging {
		id: NoteId,
		/// Pointer minus node position, in graph space.
		offset: Vec2,
		press: Vec2,
		moved: bool,
	},
}

/// What the owner must do in response to an input.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
	/// Install or move the fixed-position override of a node.
	Pin(NoteId, Vec2),
	Unpin(NoteId),
	/// Bring the simulation back to a running temperature.
	Warm,
	/// Ask the host application to open a note.
	Open(NoteId),
}

#[derive(Clone, Debug, Default, PartialEq)]
enum ClickState {
	#[default]
	Idle,
	Armed {
		id: NoteId,
		at: f64,
	},
}

/// Two-state click machine: a click arms a timer, a second click on the
/// same node inside the window upgrades it, expiry fires it as single.
#[derive(Clone, Debug, Default)]
pub struct ClickTracker {
	state: ClickState,
}

impl ClickTracker {
	/// Returns the node when this click completes a double click.
	pub fn click(&mut self, id: &NoteId, now: f64, window: f64) -> Option<NoteId> {
		if let ClickState::Armed { id: armed, at } = &self.state {
			if armed == id && now - at <= window {
				self.state = ClickState::Idle;
				return Some(id.clone());
			}
		}
		self.state = ClickState::Armed {
			id: id.clone(),
			at: now,
		};
		None
	}

	/// Returns the node once its pending click has outlived the window.
	pub fn poll(&mut self, now: f64, window: f64) -> Option<NoteId> {
		match &self.state {
			ClickState::Armed { id, at } if now - at > window => {
				let id = id.clone();
				self.state = ClickState::Idle;
				Some(id)
			}
			_ => None,
		}
	}

	pub fn is_armed(&self) -> bool {
		matches!(self.state, ClickState::Armed { .. })
	}

	fn forget(&mut self, keep: impl Fn(&NoteId) -> bool) {
		if let ClickState::Armed { id, .. } = &self.state {
			if !keep(id) {
				self.state = ClickState::Idle;
			}
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
struct Transition {
	from: ViewTransform,
	to: ViewTransform,
	start: f64,
	duration: f64,
}

pub struct InteractionController {
	config: GraphConfig,
	mode: Mode,
	selection: Option<NoteId>,
	transform: ViewTransform,
	transition: Option<Transition>,
	clicks: ClickTracker,
	viewport: Vec2,
}

impl InteractionController {
	pub fn new(config: &GraphConfig, viewport: Vec2) -> Self {
		Self {
			config: config.clone(),
			mode: Mode::Idle,
			selection: None,
			transform: ViewTransform::default(),
			transition: None,
			clicks: ClickTracker::default(),
			viewport,
		}
	}

	pub fn mode(&self) -> &Mode {
		&self.mode
	}

	pub fn selection(&self) -> Option<&NoteId> {
		self.selection.as_ref()
	}

	pub fn dragging(&self) -> Option<&NoteId> {
		match &self.mode {
			Mode::Dragging { id, .. } => Some(id),
			_ => None,
		}
	}

	pub fn transform(&self) -> &ViewTransform {
		&self.transform
	}

	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	pub fn set_viewport(&mut self, viewport: Vec2) {
		self.viewport = viewport;
	}

	/// `hit` is the node under the pointer with its current position.
	pub fn pointer_down(&mut self, screen: Vec2, hit: Option<(NoteId, Vec2)>) -> Vec<Action> {
		self.transition = None;
		match hit {
			Some((id, position)) => {
				let offset = self.transform.screen_to_graph(screen) - position;
				// a pending click on another node is superseded by this press
				self.clicks.forget(|armed| armed == &id);
				self.selection = Some(id.clone());
				self.mode = Mode::Dragging {
					id: id.clone(),
					offset,
					press: screen,
					moved: false,
				};
				vec![Action::Pin(id, position), Action::Warm]
			}
			None => {
				self.selection = None;
				self.clicks = ClickTracker::default();
				self.mode = Mode::Panning {
					press: screen,
					origin: Vec2::new(self.transform.x, self.transform.y),
				};
				Vec::new()
			}
		}
	}

	pub fn pointer_move(&mut self, screen: Vec2) -> Vec<Action> {
		let tolerance = self.config.click_tolerance;
		let pointer = self.transform.screen_to_graph(screen);
		match &mut self.mode {
			Mode::Idle => Vec::new(),
			Mode::Panning { press, origin } => {
				self.transform.x = origin.x + (screen.x - press.x);
				self.transform.y = origin.y + (screen.y - press.y);
				Vec::new()
			}
			Mode::Dragging {
				id,
				offset,
				press,
				moved,
			} => {
				if !*moved && screen.distance(*press) > tolerance {
					*moved = true;
					self.clicks = ClickTracker::default();
				}
				vec![Action::Pin(id.clone(), pointer - *offset)]
			}
		}
	}

	pub fn pointer_up(&mut self, now: f64) -> Vec<Action> {
		match std::mem::replace(&mut self.mode, Mode::Idle) {
			Mode::Dragging { id, moved, .. } => {
				let mut actions = vec![Action::Unpin(id.clone())];
				if !moved {
					if let Some(id) = self.clicks.click(&id, now, self.config.double_click_ms) {
						actions.push(Action::Open(id));
					}
				}
				actions
			}
			Mode::Idle | Mode::Panning { .. } => Vec::new(),
		}
	}

	/// Pointer left the surface: end any gesture without counting a click.
	pub fn pointer_leave(&mut self) -> Vec<Action> {
		match std::mem::replace(&mut self.mode, Mode::Idle) {
			Mode::Dragging { id, .. } => vec![Action::Unpin(id)],
			Mode::Idle | Mode::Panning { .. } => Vec::new(),
		}
	}

	pub fn wheel(&mut self, anchor: Vec2, delta_y: f64) {
		let step = self.config.wheel_zoom_step;
		let factor = if delta_y > 0.0 { 1.0 / step } else { step };
		self.zoom_by(anchor, factor);
	}

	pub fn zoom_by(&mut self, anchor: Vec2, factor: f64) {
		self.set_zoom(anchor, self.transform.k * factor);
	}

	/// Clamped to the configured zoom range.
	pub fn set_zoom(&mut self, anchor: Vec2, k: f64) {
		self.transition = None;
		let k = self.config.clamp_zoom(k);
		self.transform.zoom_around(anchor, k);
	}

	/// Fire an expired single click: recentre on its node. Held off while a
	/// node is pressed so the view never moves under the pointer.
	pub fn poll(&mut self, now: f64, position_of: impl Fn(&NoteId) -> Option<Vec2>) {
		if self.dragging().is_some() {
			return;
		}
		let Some(id) = self.clicks.poll(now, self.config.double_click_ms) else {
			return;
		};
		let Some(target) = position_of(&id) else {
			return;
		};
		self.transition = Some(Transition {
			from: self.transform,
			to: ViewTransform::centered_on(target, self.viewport, self.config.recenter_zoom),
			start: now,
			duration: self.config.transition_ms,
		});
	}

	/// Step the recentre animation. Returns true while it is still running.
	pub fn advance(&mut self, now: f64) -> bool {
		let Some(tr) = &self.transition else {
			return false;
		};
		let t = ((now - tr.start) / tr.duration).clamp(0.0, 1.0);
		self.transform = tr.from.lerp(&tr.to, ease_out_cubic(t));
		if t >= 1.0 {
			self.transition = None;
		}
		self.transition.is_some()
	}

	/// Drop selection, drag and pending click for nodes `graph` no longer has.
	pub fn retain(&mut self, graph: &KnowledgeGraph) {
		if self.selection.as_ref().is_some_and(|id| !graph.contains(id)) {
			self.selection = None;
		}
		if self.dragging().is_some_and(|id| !graph.contains(id)) {
			self.mode = Mode::Idle;
		}
		self.clicks.forget(|id| graph.contains(id));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::note_graph::builder::build_graph;
	use crate::components::note_graph::types::Note;

	fn controller() -> InteractionController {
		InteractionController::new(&GraphConfig::default(), Vec2::new(800.0, 600.0))
	}

	fn node(id: &str, x: f64, y: f64) -> Option<(NoteId, Vec2)> {
		Some((NoteId::from(id), Vec2::new(x, y)))
	}

	#[test]
	fn background_press_pans_and_clears_selection() {
		let mut c = controller();
		c.pointer_down(Vec2::new(10.0, 10.0), node("a", 10.0, 10.0));
		c.pointer_up(0.0);
		assert_eq!(c.selection(), Some(&NoteId::from("a")));

		let actions = c.pointer_down(Vec2::new(100.0, 100.0), None);
		assert!(actions.is_empty());
		assert_eq!(c.selection(), None);
		assert!(matches!(c.mode(), Mode::Panning { .. }));

		c.pointer_move(Vec2::new(130.0, 90.0));
		assert_eq!(c.transform().x, 30.0);
		assert_eq!(c.transform().y, -10.0);

		c.pointer_up(10.0);
		assert_eq!(c.mode(), &Mode::Idle);
	}

	#[test]
	fn drag_pins_tracks_and_unpins() {
		let mut c = controller();
		let actions = c.pointer_down(Vec2::new(105.0, 100.0), node("a", 100.0, 100.0));
		assert_eq!(
			actions,
			vec![
				Action::Pin("a".into(), Vec2::new(100.0, 100.0)),
				Action::Warm
			]
		);
		assert_eq!(c.dragging(), Some(&NoteId::from("a")));
		assert_eq!(c.selection(), Some(&NoteId::from("a")));

		// the press offset is kept while tracking
		let actions = c.pointer_move(Vec2::new(205.0, 150.0));
		assert_eq!(actions, vec![Action::Pin("a".into(), Vec2::new(200.0, 150.0))]);

		let actions = c.pointer_up(50.0);
		assert_eq!(actions, vec![Action::Unpin("a".into())]);
		assert_eq!(c.dragging(), None);
		assert_eq!(c.selection(), Some(&NoteId::from("a")));
	}

	#[test]
	fn drag_respects_zoom_and_pan() {
		let mut c = controller();
		c.set_zoom(Vec2::ZERO, 2.0);
		c.pointer_down(Vec2::new(0.0, 0.0), None);
		c.pointer_move(Vec2::new(50.0, 0.0));
		c.pointer_up(0.0);

		// graph (10, 10) sits at screen (70, 20)
		c.pointer_down(Vec2::new(70.0, 20.0), node("a", 10.0, 10.0));
		let actions = c.pointer_move(Vec2::new(90.0, 40.0));
		assert_eq!(actions, vec![Action::Pin("a".into(), Vec2::new(20.0, 20.0))]);
	}

	#[test]
	fn single_click_recenters_after_window() {
		let mut c = controller();
		let at = |_: &NoteId| Some(Vec2::new(100.0, 50.0));

		c.pointer_down(Vec2::new(100.0, 50.0), node("a", 100.0, 50.0));
		c.pointer_up(1_000.0);

		c.poll(1_100.0, at);
		assert!(!c.is_animating());

		c.poll(1_300.0, at);
		assert!(c.is_animating());

		assert!(c.advance(1_600.0));
		assert!(!c.advance(1_900.0));
		let t = c.transform();
		assert_eq!(t.k, 1.5);
		assert_eq!(t.graph_to_screen(Vec2::new(100.0, 50.0)), Vec2::new(400.0, 300.0));
	}

	#[test]
	fn double_click_opens_without_recentering() {
		let mut c = controller();
		let at = |_: &NoteId| Some(Vec2::new(0.0, 0.0));

		c.pointer_down(Vec2::ZERO, node("a", 0.0, 0.0));
		assert_eq!(c.pointer_up(1_000.0), vec![Action::Unpin("a".into())]);
		c.pointer_down(Vec2::ZERO, node("a", 0.0, 0.0));
		assert_eq!(
			c.pointer_up(1_200.0),
			vec![Action::Unpin("a".into()), Action::Open("a".into())]
		);

		c.poll(2_000.0, at);
		assert!(!c.is_animating());
	}

	#[test]
	fn slow_second_click_is_two_singles() {
		let mut tracker = ClickTracker::default();
		let a = NoteId::from("a");
		assert_eq!(tracker.click(&a, 0.0, 250.0), None);
		assert_eq!(tracker.poll(300.0, 250.0), Some(a.clone()));
		assert_eq!(tracker.click(&a, 310.0, 250.0), None);
		assert!(tracker.is_armed());
	}

	#[test]
	fn clicks_on_different_nodes_do_not_pair() {
		let mut tracker = ClickTracker::default();
		assert_eq!(tracker.click(&"a".into(), 0.0, 250.0), None);
		assert_eq!(tracker.click(&"b".into(), 100.0, 250.0), None);
		assert_eq!(tracker.poll(400.0, 250.0), Some(NoteId::from("b")));
	}

	#[test]
	fn moved_press_is_not_a_click() {
		let mut c = controller();
		c.pointer_down(Vec2::ZERO, node("a", 0.0, 0.0));
		c.pointer_move(Vec2::new(40.0, 0.0));
		c.pointer_up(0.0);
		c.pointer_down(Vec2::new(40.0, 0.0), node("a", 40.0, 0.0));
		let actions = c.pointer_up(100.0);
		assert!(!actions.contains(&Action::Open("a".into())));
	}

	#[test]
	fn new_interaction_interrupts_transition() {
		let mut c = controller();
		let at = |_: &NoteId| Some(Vec2::new(300.0, 300.0));
		c.pointer_down(Vec2::ZERO, node("a", 0.0, 0.0));
		c.pointer_up(0.0);
		c.poll(500.0, at);
		assert!(c.is_animating());
		c.advance(600.0);

		let mid = *c.transform();
		c.pointer_down(Vec2::new(5.0, 5.0), None);
		assert!(!c.is_animating());
		assert!(!c.advance(2_000.0));
		assert_eq!(*c.transform(), mid);
	}

	#[test]
	fn pending_click_does_not_recenter_during_later_drag() {
		let mut c = controller();
		let at = |_: &NoteId| Some(Vec2::new(300.0, 300.0));
		c.pointer_down(Vec2::ZERO, node("a", 0.0, 0.0));
		c.pointer_up(0.0);

		c.pointer_down(Vec2::new(50.0, 50.0), node("b", 50.0, 50.0));
		c.pointer_move(Vec2::new(150.0, 50.0));
		c.poll(300.0, at);
		assert!(!c.is_animating());
		assert!(!c.advance(600.0));
		assert_eq!(*c.transform(), ViewTransform::default());

		c.pointer_up(700.0);
		c.poll(2_000.0, at);
		assert!(!c.is_animating());
	}

	#[test]
	fn held_press_defers_the_pending_click() {
		let mut c = controller();
		let at = |_: &NoteId| Some(Vec2::new(300.0, 300.0));
		c.pointer_down(Vec2::ZERO, node("a", 0.0, 0.0));
		c.pointer_up(0.0);

		// second press on the same node, held past the window without moving
		c.pointer_down(Vec2::ZERO, node("a", 0.0, 0.0));
		c.poll(400.0, at);
		assert!(!c.is_animating());
		assert_eq!(c.dragging(), Some(&NoteId::from("a")));
	}

	#[test]
	fn zoom_is_clamped() {
		let mut c = controller();
		c.set_zoom(Vec2::ZERO, 0.001);
		assert_eq!(c.transform().k, 0.1);
		c.set_zoom(Vec2::ZERO, 1_000.0);
		assert_eq!(c.transform().k, 8.0);

		for _ in 0..100 {
			c.wheel(Vec2::new(10.0, 10.0), 1.0);
		}
		assert_eq!(c.transform().k, 0.1);
	}

	#[test]
	fn zoom_keeps_anchor_fixed() {
		let mut c = controller();
		let anchor = Vec2::new(200.0, 120.0);
		let under = c.transform().screen_to_graph(anchor);
		c.wheel(anchor, -1.0);
		let after = c.transform().graph_to_screen(under);
		assert!((after.x - anchor.x).abs() < 1e-9);
		assert!((after.y - anchor.y).abs() < 1e-9);
	}

	#[test]
	fn leaving_mid_drag_unpins_without_click() {
		let mut c = controller();
		c.pointer_down(Vec2::ZERO, node("a", 0.0, 0.0));
		assert_eq!(c.pointer_leave(), vec![Action::Unpin("a".into())]);
		assert_eq!(c.mode(), &Mode::Idle);
		c.poll(10_000.0, |_| Some(Vec2::ZERO));
		assert!(!c.is_animating());
	}

	#[test]
	fn retain_forgets_removed_nodes() {
		let mut c = controller();
		c.pointer_down(Vec2::ZERO, node("gone", 0.0, 0.0));
		let graph = build_graph(&[Note::new("kept", "Kept", "", "")]);
		c.retain(&graph);
		assert_eq!(c.selection(), None);
		assert_eq!(c.dragging(), None);
	}
}
