//! Leptos component wrapping the network canvas.
//!
//! The component creates a canvas and wires mouse and wheel handlers for
//! dragging peers, drawing links, panning and zooming. An animation loop on
//! `requestAnimationFrame` replays the store's change journal into the
//! layout, steps the physics and redraws.
//!
//! Drawing a link with shift held only sends a request. The link shows up
//! once the server echoes it back through the session.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::scale::ScaleConfig;
use super::state::{LinkDraft, NetworkGraphState};
use super::theme::Theme;
use crate::sync::LiveSession;
use crate::sync::protocol::PeerId;

/// Layout state plus the visual configuration it is drawn with.
struct GraphContext {
	state: NetworkGraphState,
	scale: ScaleConfig,
	theme: Theme,
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Renders the live network on a canvas element.
///
/// Sizes itself to its parent container by default; `fullscreen = true` fills
/// the viewport and follows window resizes. Explicit `width`/`height`
/// override automatic sizing.
#[component]
pub fn NetworkCanvas(
	session: LiveSession,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<GraphContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init, session_anim) =
		(context.clone(), animate.clone(), resize_cb.clone(), session.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = match (fullscreen, window_size(&window)) {
			(true, Some(size)) => size,
			_ => (
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
			),
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				warn!("canvas: 2d context unavailable");
				return;
			}
		};

		*context_init.borrow_mut() = Some(GraphContext {
			state: NetworkGraphState::new(w, h),
			scale: ScaleConfig::default(),
			theme: Theme::default(),
		});

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.state.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner, session_anim) =
			(context_init.clone(), animate_init.clone(), session_anim.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				session_anim.with_engine(|engine| {
					let changes = engine.store_mut().drain_changes();
					c.state.apply_changes(&changes, engine.store(), &c.theme, &c.scale);
					c.state.tick(0.016);
					render::render(&c.state, engine.store(), &ctx, &c.scale, &c.theme);
				});
			}
			if let (Some(cb), Some(window)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_md.borrow_mut() {
			match c.state.peer_at_position(x, y, &c.scale) {
				Some(peer) if ev.shift_key() => {
					let (gx, gy) = c.state.screen_to_graph(x, y);
					c.state.draft = Some(LinkDraft {
						from: peer,
						x: gx,
						y: gy,
					});
				}
				Some(peer) => c.state.begin_drag(peer, x, y),
				None => {
					c.state.pan.active = true;
					c.state.pan.start_x = x;
					c.state.pan.start_y = y;
					c.state.pan.transform_start_x = c.state.transform.x;
					c.state.pan.transform_start_y = c.state.transform.y;
				}
			}
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_mm.borrow_mut() {
			if c.state.drag.peer.is_none() {
				c.state.hovered = c.state.peer_at_position(x, y, &c.scale);
			}

			let (gx, gy) = c.state.screen_to_graph(x, y);
			if let Some(draft) = c.state.draft.as_mut() {
				draft.x = gx;
				draft.y = gy;
			} else if c.state.drag.peer.is_some() {
				c.state.drag_to(x, y);
			} else if c.state.pan.active {
				c.state.transform.x = c.state.pan.transform_start_x + (x - c.state.pan.start_x);
				c.state.transform.y = c.state.pan.transform_start_y + (y - c.state.pan.start_y);
			}
		}
	};

	let (context_mu, session_mu) = (context.clone(), session.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let point = canvas_point(canvas_ref, &ev);
		let gesture: Option<(PeerId, PeerId)> = {
			let mut guard = context_mu.borrow_mut();
			let Some(c) = guard.as_mut() else {
				return;
			};
			let target = point.and_then(|(x, y)| c.state.peer_at_position(x, y, &c.scale));
			let draft = c.state.draft.take();
			c.state.drag.peer = None;
			c.state.pan.active = false;
			match (draft, target) {
				(Some(draft), Some(target)) if draft.from != target => Some((draft.from, target)),
				_ => None,
			}
		};
		// Send only after the layout borrow is released.
		if let Some((from, to)) = gesture {
			session_mu.request_link_toggle(&from, &to);
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.state.drag.peer = None;
			c.state.draft = None;
			c.state.pan.active = false;
			c.state.hovered = None;
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (c.state.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / c.state.transform.k;
			c.state.transform.x = x - (x - c.state.transform.x) * ratio;
			c.state.transform.y = y - (y - c.state.transform.y) * ratio;
			c.state.transform.k = new_k;
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="network-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
