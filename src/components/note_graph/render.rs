use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::NoteGraphState;
use super::types::Vec2;

const EDGE_RGB: &str = "100, 180, 255";
const ACCENT_RGB: &str = "255, 200, 80";

pub fn render(state: &NoteGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let t = state.transform();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_links(state: &NoteGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform().k;
	let r = state.config.node_radius;
	let arrow_size = 8.0 / k;
	let bodies = state.simulation.bodies();

	for i in state.highlight.link_order() {
		let link = &state.graph.links[i];
		let style = state.highlight.links.get(i).copied();
		let (Some(s), Some(t)) = (state.graph.slot(&link.source), state.graph.slot(&link.target)) else {
			continue;
		};
		let (Some(a), Some(b)) = (bodies.get(s), bodies.get(t)) else {
			continue;
		};
		let (opacity, accent) = style.map(|st| (st.opacity, st.accent)).unwrap_or((1.0, false));
		let (rgb, width) = if accent {
			(ACCENT_RGB, 2.5 / k)
		} else {
			(EDGE_RGB, 1.5 / k)
		};
		ctx.set_stroke_style_str(&format!("rgba({}, {})", rgb, 0.6 * opacity));
		ctx.set_fill_style_str(&format!("rgba({}, {})", rgb, 0.8 * opacity));
		ctx.set_line_width(width);

		if s == t {
			draw_self_loop(ctx, a.position, r);
			continue;
		}

		let (p1, p2) = (a.position, b.position);
		let d = p2 - p1;
		let dist = d.length();
		if dist < 0.001 {
			continue;
		}
		let u = d * (1.0 / dist);
		ctx.begin_path();
		ctx.move_to(p1.x + u.x * r, p1.y + u.y * r);
		ctx.line_to(p2.x - u.x * (r + arrow_size), p2.y - u.y * (r + arrow_size));
		ctx.stroke();

		let tip = p2 - u * r;
		let back = tip - u * arrow_size;
		let (px, py) = (-u.y * arrow_size * 0.5, u.x * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip.x, tip.y);
		ctx.line_to(back.x + px, back.y + py);
		ctx.line_to(back.x - px, back.y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_self_loop(ctx: &CanvasRenderingContext2d, at: Vec2, r: f64) {
	ctx.begin_path();
	let _ = ctx.arc(at.x + r, at.y - r, r, 0.0, 2.0 * PI);
	ctx.stroke();
}

fn draw_nodes(state: &NoteGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform().k;
	let r = state.config.node_radius;
	let active = state.highlight.is_active();
	let bodies = state.simulation.bodies();
	let font = format!("{}px sans-serif", 10.0 / k.max(0.5));

	for i in state.highlight.node_order() {
		let (Some(node), Some(body)) = (state.graph.nodes.get(i), bodies.get(i)) else {
			continue;
		};
		let style = state.highlight.nodes.get(i).copied();
		let (opacity, raised) = style.map(|st| (st.opacity, st.raised)).unwrap_or((1.0, false));
		let p = body.position;
		let selected = state.selection() == Some(&node.id);
		let hovered = state.hovered.as_ref() == Some(&node.id);

		ctx.set_global_alpha(opacity);
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, r, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.category.color());
		ctx.fill();

		if selected || hovered {
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, r + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str("white");
		ctx.set_font(&font);
		let _ = ctx.fill_text(&node.label, p.x + r + 3.0, p.y + 3.0);
		if active && raised && !node.tags.is_empty() {
			let tags: Vec<String> = node.tags.iter().map(|t| format!("#{t}")).collect();
			ctx.set_fill_style_str("rgba(200, 220, 255, 0.8)");
			let _ = ctx.fill_text(&tags.join(" "), p.x + r + 3.0, p.y + 3.0 + 12.0 / k.max(0.5));
		}
		ctx.set_global_alpha(1.0);
	}
}
