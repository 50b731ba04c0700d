use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::either::Either;
use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent, Window};

use super::config::GraphConfig;
use super::render;
use super::state::NoteGraphState;
use super::types::{Note, NoteId, Vec2};

type SharedState = Rc<RefCell<Option<NoteGraphState>>>;

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: i32, client_y: i32) -> Option<Vec2> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Vec2::new(
		client_x as f64 - rect.left(),
		client_y as f64 - rect.top(),
	))
}

fn touch_points(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &TouchEvent) -> Vec<Vec2> {
	let touches = ev.touches();
	(0..touches.length())
		.filter_map(|i| touches.get(i))
		.filter_map(|t| local_point(canvas_ref, t.client_x(), t.client_y()))
		.collect()
}

fn set_cursor(canvas_ref: NodeRef<leptos::html::Canvas>, s: &NoteGraphState) {
	let Some(canvas) = canvas_ref.get() else {
		return;
	};
	let canvas: HtmlCanvasElement = canvas.into();
	let cursor = if s.controller.dragging().is_some() {
		"grabbing"
	} else if s.hovered.is_some() {
		"pointer"
	} else {
		"grab"
	};
	let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
}

/// Run `f` against the live state, then report any open requests once the
/// borrow has been released.
fn with_state(
	state: &SharedState,
	on_open: Option<Callback<NoteId>>,
	f: impl FnOnce(&mut NoteGraphState) -> Vec<NoteId>,
) {
	let opened = match state.borrow_mut().as_mut() {
		Some(s) => f(s),
		None => return,
	};
	if let Some(cb) = on_open {
		for id in opened {
			cb.run(id);
		}
	}
}

#[component]
pub fn NoteGraphCanvas(
	#[prop(into)] notes: Signal<Vec<Note>>,
	#[prop(optional)] config: Option<GraphConfig>,
	/// Partial JSON config; takes precedence over `config`.
	#[prop(optional, into)] config_json: Option<String>,
	#[prop(optional)] on_open: Option<Callback<NoteId>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let config = match GraphConfig::resolve(config, config_json.as_deref()) {
		Ok(config) => config,
		Err(err) => {
			error!("note graph disabled: {}", err);
			return Either::Left(view! { <p class="graph-error">{err.to_string()}</p> });
		}
	};

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("canvas 2d context unavailable");
			return;
		};
		let mut graph_state = match NoteGraphState::new(config.clone(), w, h) {
			Ok(s) => s,
			Err(err) => {
				error!("note graph disabled: {}", err);
				return;
			}
		};
		graph_state.rebuild(&notes.get_untracked());
		*state_init.borrow_mut() = Some(graph_state);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.frame(js_sys::Date::now());
				render::render(s, &ctx);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(win) = web_sys::window() {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_rebuild = state.clone();
	Effect::new(move |_| {
		let notes = notes.get();
		if let Some(ref mut s) = *state_rebuild.borrow_mut() {
			s.rebuild(&notes);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		with_state(&state_md, on_open, |s| s.pointer_down(p));
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		with_state(&state_mm, on_open, |s| {
			let opened = s.pointer_move(p);
			set_cursor(canvas_ref, s);
			opened
		});
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		with_state(&state_mu, on_open, |s| s.pointer_up(js_sys::Date::now()));
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		with_state(&state_ml, on_open, |s| s.pointer_leave());
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(p) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(p, ev.delta_y());
		}
	};

	// distance between the two fingers of an active pinch
	let pinch: Rc<Cell<Option<f64>>> = Rc::new(Cell::new(None));

	let (state_ts, pinch_ts) = (state.clone(), pinch.clone());
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		match touch_points(canvas_ref, &ev).as_slice() {
			[p] => with_state(&state_ts, on_open, |s| s.pointer_down(*p)),
			[a, b, ..] => {
				pinch_ts.set(Some(a.distance(*b)));
				with_state(&state_ts, on_open, |s| s.pointer_leave());
			}
			[] => {}
		}
	};

	let (state_tm, pinch_tm) = (state.clone(), pinch.clone());
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		match touch_points(canvas_ref, &ev).as_slice() {
			[p] => with_state(&state_tm, on_open, |s| s.pointer_move(*p)),
			[a, b, ..] => {
				let d = a.distance(*b);
				if let (Some(last), Some(s)) = (pinch_tm.get(), state_tm.borrow_mut().as_mut()) {
					if last > 0.0 {
						s.pinch(a.lerp(*b, 0.5), d / last);
					}
				}
				pinch_tm.set(Some(d));
			}
			[] => {}
		}
	};

	let (state_te, pinch_te) = (state.clone(), pinch.clone());
	let on_touchend = move |ev: TouchEvent| {
		ev.prevent_default();
		let remaining = ev.touches().length();
		if pinch_te.take().is_some() {
			return;
		}
		if remaining == 0 {
			with_state(&state_te, on_open, |s| s.pointer_up(js_sys::Date::now()));
		}
	};

	Either::Right(view! {
		<canvas
			node_ref=canvas_ref
			class="note-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			style="display: block; cursor: grab; touch-action: none;"
		/>
	})
}
