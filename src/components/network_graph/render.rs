//! Canvas rendering for the network view.
//!
//! Passes, back to front:
//! 1. Background (screen space)
//! 2. Structural links, then the link being dragged out
//! 3. Broadcast overlays with their labels
//! 4. Peers and peer labels

use std::collections::HashMap;
use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scale::{ScaleConfig, ScaledValues};
use super::state::{NetworkGraphState, NodeInfo};
use super::theme::{Color, Theme};
use crate::sync::protocol::PeerId;
use crate::sync::store::{GraphStore, OverlayEdge};

/// Renders the complete view to the canvas.
pub fn render(
	state: &NetworkGraphState,
	store: &GraphStore,
	ctx: &CanvasRenderingContext2d,
	config: &ScaleConfig,
	theme: &Theme,
) {
	let scale = ScaledValues::new(config, state.transform.k);

	draw_background(state, ctx, theme);

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	draw_links(state, ctx, &scale, theme);
	draw_draft(state, ctx, &scale, theme);
	draw_overlays(state, store, ctx, &scale, theme);
	draw_nodes(state, ctx, &scale, theme);

	ctx.restore();
}

fn draw_background(state: &NetworkGraphState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let (cx, cy) = (state.width / 2.0, state.height / 2.0);
	let gradient = theme
		.background
		.use_gradient
		.then(|| ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, state.width.max(state.height) * 0.8))
		.and_then(Result::ok);

	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &theme.background.color_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &theme.background.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&theme.background.color.to_css()),
	}

	ctx.fill_rect(0.0, 0.0, state.width, state.height);
}

fn draw_links(
	state: &NetworkGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	state.graph.visit_edges(|n1, n2, _| {
		let hot = state
			.hovered
			.as_ref()
			.is_some_and(|p| n1.data.user_data.peer == *p || n2.data.user_data.peer == *p);
		let (color, width) = if hot {
			(theme.link.highlight_color, scale.line_width * 1.6)
		} else {
			(theme.link.color, scale.line_width)
		};
		ctx.set_stroke_style_str(&color.to_css());
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(n1.x() as f64, n1.y() as f64);
		ctx.line_to(n2.x() as f64, n2.y() as f64);
		ctx.stroke();
	});
}

fn draw_draft(
	state: &NetworkGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let Some(draft) = &state.draft else {
		return;
	};
	let Some((x, y)) = state.position_of(&draft.from) else {
		return;
	};

	ctx.set_stroke_style_str(&theme.link.draft_color.to_css());
	ctx.set_line_width(scale.line_width);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(6.0 * scale.px),
		&JsValue::from_f64(4.0 * scale.px),
	));
	ctx.begin_path();
	ctx.move_to(x, y);
	ctx.line_to(draft.x, draft.y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

/// Stable per-pair slot for each overlay, so overlays sharing a pair fan out
/// instead of drawing on top of each other.
fn overlay_slots<'a>(store: &'a GraphStore) -> Vec<(&'a OverlayEdge, usize)> {
	let mut seen: HashMap<(&PeerId, &PeerId), usize> = HashMap::new();
	store
		.overlays()
		.map(|overlay| {
			let link = &overlay.link;
			let key = if link.from <= link.to {
				(&link.from, &link.to)
			} else {
				(&link.to, &link.from)
			};
			let slot = seen.entry(key).or_insert(0);
			*slot += 1;
			(overlay, *slot)
		})
		.collect()
}

fn draw_overlays(
	state: &NetworkGraphState,
	store: &GraphStore,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
) {
	ctx.set_font(&scale.overlay_font);
	for (overlay, slot) in overlay_slots(store) {
		let (Some(from), Some(to)) = (
			state.position_of(&overlay.link.from),
			state.position_of(&overlay.link.to),
		) else {
			continue;
		};
		let color = theme.overlay.color(overlay.color);
		draw_overlay(ctx, scale, theme, from, to, slot, color, &overlay.label, overlay.width);
	}
}

#[allow(clippy::too_many_arguments)]
fn draw_overlay(
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	(x1, y1): (f64, f64),
	(x2, y2): (f64, f64),
	slot: usize,
	color: Color,
	label: &str,
	max_width: f64,
) {
	let (dx, dy) = (x2 - x1, y2 - y1);
	let dist = dx.hypot(dy);
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);

	// Alternate sides of the straight line: slot 1 bends left, 2 right, 3 further left...
	let side = if slot % 2 == 1 { 1.0 } else { -1.0 };
	let bend = side * dist * theme.overlay.spread * slot.div_ceil(2) as f64;
	let (mid_x, mid_y) = ((x1 + x2) / 2.0 - uy * bend, (y1 + y2) / 2.0 + ux * bend);

	let inset = scale.node_radius;
	let (start_x, start_y) = (x1 + ux * inset, y1 + uy * inset);
	let (tip_x, tip_y) = (x2 - ux * inset, y2 - uy * inset);

	ctx.set_stroke_style_str(&color.to_css());
	ctx.set_line_width(scale.overlay_width);
	ctx.begin_path();
	ctx.move_to(start_x, start_y);
	let _ = ctx.quadratic_curve_to(mid_x, mid_y, tip_x, tip_y);
	ctx.stroke();

	// Arrow head along the curve's final tangent.
	let (tx, ty) = (tip_x - mid_x, tip_y - mid_y);
	let tangent = tx.hypot(ty).max(0.001);
	let (ax, ay) = (tx / tangent, ty / tangent);
	let (back_x, back_y) = (tip_x - ax * scale.arrow_size, tip_y - ay * scale.arrow_size);
	let (px, py) = (-ay * scale.arrow_size * 0.5, ax * scale.arrow_size * 0.5);
	ctx.set_fill_style_str(&color.to_css());
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();

	if label.is_empty() {
		return;
	}
	// The curve's apex sits halfway between the chord midpoint and the control point.
	let (lx, ly) = (
		((x1 + x2) / 2.0 + mid_x) / 2.0,
		((y1 + y2) / 2.0 + mid_y) / 2.0,
	);
	ctx.set_fill_style_str(&color.lighten(0.5).to_css());
	let _ = ctx.fill_text_with_max_width(label, lx + 4.0 * scale.px, ly, max_width * scale.px);
}

fn draw_nodes(
	state: &NetworkGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
) {
	ctx.set_font(&scale.label_font);
	state.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		let hovered = state.hovered.as_ref() == Some(&info.peer);
		draw_node(ctx, node.x() as f64, node.y() as f64, info, scale, theme, hovered);
	});
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	x: f64,
	y: f64,
	info: &NodeInfo,
	scale: &ScaledValues,
	theme: &Theme,
	hovered: bool,
) {
	let radius = scale.node_radius * info.size * if hovered { 1.25 } else { 1.0 };

	let gradient = theme
		.node
		.use_gradient
		.then(|| ctx.create_radial_gradient(x - radius * 0.3, y - radius * 0.3, 0.0, x, y, radius))
		.and_then(Result::ok);

	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &info.color.lighten(0.4).to_css());
			let _ = gradient.add_color_stop(0.7, &info.color.to_css());
			let _ = gradient.add_color_stop(1.0, &info.color.darken(0.2).to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&info.color.to_css()),
	}
	ctx.fill();

	if hovered {
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius + 2.0 * scale.px, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str(&theme.node.hover_ring_color.to_css());
		ctx.set_line_width(1.5 * scale.px);
		ctx.stroke();
	}

	ctx.set_fill_style_str(&theme.node.label_color.to_css());
	let _ = ctx.fill_text(&info.label, x + radius + 4.0 * scale.px, y + 3.0 * scale.px);
}
