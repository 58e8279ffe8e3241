use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::StreamExt;
use leptos::prelude::*;
use leptos::reactive::owner::LocalStorage;
use leptos::task::spawn_local;
use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{MouseEvent, WheelEvent, Window};

use super::config::ConceptMapConfig;
use super::expansion::{ExpansionController, click_channel};
use super::host::{HostBridge, HostEvent, parse_context_result};
use super::render;
use super::simulation::TICK_SECONDS;
use super::state::ConceptMapState;
use super::theme::apply_host_context;
use super::tooltip::Tooltip;
use super::types::{ConceptContextResult, EdgeKey};

/// Longest frame gap fed to the simulation, in seconds.
const MAX_FRAME_GAP: f64 = 0.25;

/// Reactive handles shared by the scene's element components.
#[derive(Clone, Copy)]
struct Scene {
	state: StoredValue<ConceptMapState, LocalStorage>,
	/// Bumped whenever positions or the view transform change.
	frame: RwSignal<u64>,
	/// Bumped on every merge.
	revision: RwSignal<u64>,
}

impl Scene {
	fn redraw(&self) {
		self.frame.update(|f| *f = f.wrapping_add(1));
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn request_frame(cb: &Closure<dyn FnMut(f64)>) {
	if let Some(window) = web_sys::window() {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
}

/// Interactive concept graph. Clicking a node asks the host for that concept's
/// neighbourhood and merges the answer into the scene.
#[component]
pub fn ConceptMap(
	host: HostBridge,
	#[prop(optional)] config: ConceptMapConfig,
	#[prop(default = true)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let config = config.sanitized();
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let (w, h) = match web_sys::window().and_then(|win| window_size(&win)) {
		Some(size) if fullscreen => size,
		_ => (width.unwrap_or(800.0), height.unwrap_or(600.0)),
	};
	let scene = Scene {
		state: StoredValue::new_local(ConceptMapState::new(
			&config,
			js_sys::Date::now() as u64,
			w,
			h,
		)),
		frame: RwSignal::new(0),
		revision: RwSignal::new(0),
	};
	let tooltip = RwSignal::new(None::<Tooltip>);

	let merge = move |result: ConceptContextResult| {
		if scene.state.try_update_value(|s| s.merge_result(&result)).is_some() {
			scene.revision.try_update(|r| *r = r.wrapping_add(1));
		}
	};

	let (clicks, click_rx) = click_channel(config.expansion.queue_capacity);
	let clicks = StoredValue::new_local(clicks);
	let controller = ExpansionController::new(host.tools(), config.expansion.clone());
	spawn_local(controller.run(click_rx, merge));

	if let Some(mut events) = host.take_events() {
		spawn_local(async move {
			while let Some(event) = events.next().await {
				match event {
					HostEvent::ToolResult(result) => match parse_context_result(&result) {
						Ok(result) => merge(result),
						Err(err) => debug!("ignoring pushed tool result: {err}"),
					},
					HostEvent::ContextChanged(ctx) => apply_host_context(&ctx),
				}
			}
		});
	}

	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	Effect::new(move |_| {
		let Some(container) = container_ref.get() else {
			return;
		};
		if animate.borrow().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};

		if !fullscreen {
			let (cw, ch) = (
				width.unwrap_or_else(|| container.client_width() as f64),
				height.unwrap_or_else(|| container.client_height() as f64),
			);
			if cw > 0.0 && ch > 0.0 {
				scene.state.update_value(|s| s.resize(cw, ch));
			}
		} else {
			*resize_cb.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().and_then(|win| window_size(&win)) else {
					return;
				};
				scene.state.update_value(|s| s.resize(nw, nh));
				scene.redraw();
			}));
			if let Some(cb) = resize_cb.borrow().as_ref() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (animate_inner, last) = (animate.clone(), Rc::new(Cell::new(None::<f64>)));
		*animate.borrow_mut() = Some(Closure::new(move |now: f64| {
			let dt = last
				.replace(Some(now))
				.map_or(TICK_SECONDS, |prev| ((now - prev) / 1000.0).clamp(0.0, MAX_FRAME_GAP));
			if scene.state.try_update_value(|s| s.tick(dt)).unwrap_or(false) {
				scene.redraw();
			}
			if let Some(cb) = animate_inner.borrow().as_ref() {
				request_frame(cb);
			}
		}));
		if let Some(cb) = animate.borrow().as_ref() {
			request_frame(cb);
		}
	});

	let local_point = move |ev: &MouseEvent| -> Option<(f64, f64)> {
		let rect = container_ref.get_untracked()?.get_bounding_client_rect();
		Some((
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		))
	};

	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(&ev) {
			scene.state.update_value(|s| s.pointer_down(x, y));
		}
	};

	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(&ev) else {
			return;
		};
		let Some((tip, panning)) = scene.state.try_update_value(|s| {
			s.pointer_move(x, y);
			(s.tooltip(), s.pan.active)
		}) else {
			return;
		};
		tooltip.set(tip);
		if panning {
			scene.redraw();
		}
	};

	let on_mouseup = move |_: MouseEvent| {
		if let Some(concept_name) = scene.state.try_update_value(|s| s.pointer_up()).flatten() {
			clicks.update_value(|tx| {
				tx.send(concept_name);
			});
		}
	};

	let on_mouseleave = move |_: MouseEvent| {
		scene.state.update_value(|s| s.pointer_leave());
		tooltip.set(None);
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(&ev) {
			scene.state.update_value(|s| s.zoom_at(x, y, ev.delta_y()));
			scene.redraw();
		}
	};

	let container_style = if fullscreen {
		"position: fixed; inset: 0; overflow: hidden;".to_string()
	} else {
		format!(
			"position: relative; overflow: hidden; width: {}; height: {};",
			width.map_or("100%".to_string(), |w| format!("{w}px")),
			height.map_or("100%".to_string(), |h| format!("{h}px")),
		)
	};

	view! {
		<div node_ref=container_ref class="concept-map" style=container_style>
			<svg
				width="100%"
				height="100%"
				style="display: block; cursor: grab;"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
			>
				<g
					class="root"
					transform=move || {
						scene.frame.track();
						scene.state.with_value(|s| render::scene_transform(&s.transform))
					}
				>
					<g class="edges">
						<For
							each=move || {
								scene.revision.track();
								scene.state.with_value(|s| s.edge_keys())
							}
							key=|edge| edge.clone()
							children=move |edge| view! { <EdgeLine edge scene /> }
						/>
					</g>
					<g class="nodes">
						<For
							each=move || {
								scene.revision.track();
								scene.state.with_value(|s| s.node_ids())
							}
							key=|id| id.clone()
							children=move |id| view! { <NodeGlyph id scene /> }
						/>
					</g>
				</g>
			</svg>
			<TooltipCard tooltip />
		</div>
	}
}

#[component]
fn EdgeLine(edge: EdgeKey, scene: Scene) -> impl IntoView {
	let line = {
		let edge = edge.clone();
		Memo::new(move |_| {
			scene.frame.track();
			scene.revision.track();
			scene.state.with_value(|s| s.edge_line(&edge))
		})
	};
	let width = Memo::new(move |_| {
		scene.revision.track();
		scene.state.with_value(|s| s.edge_width(&edge))
	});

	view! {
		<line
			class="edge"
			x1=move || line.get().0.to_string()
			y1=move || line.get().1.to_string()
			x2=move || line.get().2.to_string()
			y2=move || line.get().3.to_string()
			stroke="var(--color-border-primary, #999)"
			stroke-opacity="0.6"
			stroke-width=move || width.get().to_string()
		/>
	}
}

#[component]
fn NodeGlyph(id: String, scene: Scene) -> impl IntoView {
	let position = {
		let id = id.clone();
		Memo::new(move |_| {
			scene.frame.track();
			scene.revision.track();
			scene.state.with_value(|s| s.node_position(&id))
		})
	};
	let style = {
		let id = id.clone();
		Memo::new(move |_| {
			scene.revision.track();
			scene.state.with_value(|s| s.node_style(&id))
		})
	};
	let field = move |f: fn(&render::NodeStyle) -> String| {
		move || style.with(|style| style.as_ref().map(f).unwrap_or_default())
	};

	view! {
		<g
			class="node"
			transform=move || {
				let (x, y) = position.get();
				render::translate(x, y)
			}
		>
			<circle
				r=field(|s| s.radius.to_string())
				fill=field(|s| s.fill.to_string())
				stroke=field(|s| s.stroke.to_string())
				stroke-width=field(|s| s.stroke_width.to_string())
			/>
			<Show when=move || style.with(|s| s.as_ref().is_some_and(|s| s.ring.is_some()))>
				<circle
					class="center-ring"
					r=field(|s| s.ring.as_ref().map(|r| r.radius.to_string()).unwrap_or_default())
					fill="none"
					stroke=field(|s| s.ring.as_ref().map(|r| r.stroke.to_string()).unwrap_or_default())
					stroke-width="2.5"
					stroke-opacity="0.7"
				/>
			</Show>
			<text
				class="node-label"
				text-anchor="middle"
				font-size="11"
				fill="var(--color-text-primary, #333)"
				pointer-events="none"
				dy=field(|s| s.label_dy.to_string())
			>
				{id}
			</text>
		</g>
	}
}

/// Hover card. Concept names are rendered as text nodes only.
#[component]
fn TooltipCard(tooltip: RwSignal<Option<Tooltip>>) -> impl IntoView {
	move || {
		tooltip.get().map(|tip| {
			let style = format!(
				"position: absolute; pointer-events: none; {}",
				tip.position_style()
			);
			view! {
				<div class="tooltip" style=style>
					<strong>{tip.title}</strong>
					<br />
					{tip.community}
					<br />
					{tip.score}
					{tip.expanded.then(|| view! {
						<br />
						<em>"Expanded"</em>
					})}
				</div>
			}
		})
	}
}
