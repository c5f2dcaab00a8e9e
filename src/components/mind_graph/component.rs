use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::Point;
use leptos::prelude::*;
use log::{error, info};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent, Window};

use super::canvas::CanvasSurface;
use crate::animation::Timestamp;
use crate::config::{HitStrategy, MindGraphConfig};
use crate::graph::GraphPayload;
use crate::scene::SceneComposer;
use crate::surface::RenderSurface;

type Shared<T> = Rc<RefCell<Option<T>>>;

fn now() -> Timestamp {
	js_sys::Date::now() / 1000.0
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn canvas_size(
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		if let Some(size) = web_sys::window().as_ref().and_then(window_size) {
			return size;
		}
	}
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| f64::from(p.client_width()))),
		height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| f64::from(p.client_height()))),
	)
}

/// Position of a client-space point relative to the canvas.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: f64, client_y: f64) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(client_x - rect.left(), client_y - rect.top()))
}

fn touch_points(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &TouchEvent) -> Vec<Point> {
	let touches = ev.touches();
	(0..touches.length())
		.filter_map(|i| touches.get(i))
		.filter_map(|t| local_point(canvas_ref, f64::from(t.client_x()), f64::from(t.client_y())))
		.collect()
}

/// Builds a composer painting into `canvas`, falling back to layout-only
/// when the canvas cannot be drawn to.
fn build_scene(
	canvas: HtmlCanvasElement,
	payload: &GraphPayload,
	mut config: MindGraphConfig,
	(w, h): (f64, f64),
	pixel_ratio: f64,
) -> Option<SceneComposer> {
	config.simulation.width = w;
	config.simulation.height = h;
	let surface = CanvasSurface::new(canvas, w, h, pixel_ratio)
		.map(|s| Box::new(s) as Box<dyn RenderSurface>);
	let picking = (config.view.hit_strategy == HitStrategy::ColorMap)
		.then(|| CanvasSurface::offscreen(w, h))
		.flatten()
		.map(|s| Box::new(s) as Box<dyn RenderSurface>);
	let scene = match SceneComposer::with_picking_surface(payload, config, surface, picking) {
		Ok(scene) => scene,
		Err(e) => {
			error!("cannot build graph scene: {e}");
			return None;
		}
	};
	info!(
		"graph scene ready: {} nodes, {} links",
		scene.layout().graph().node_count(),
		scene.layout().graph().link_count()
	);
	Some(scene)
}

/// Interactive mind-graph canvas.
///
/// Drag a node to move it, drag the background to pan, scroll or pinch to
/// zoom. `on_node_click` receives the clicked node's id.
#[component]
pub fn MindGraphCanvas(
	#[prop(into)] data: Signal<GraphPayload>,
	#[prop(optional)] config: MindGraphConfig,
	#[prop(optional, into)] on_node_click: Option<Callback<String>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let scene: Shared<SceneComposer> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let (scene_init, animate_init, resize_cb_init) =
		(scene.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let payload = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("no window; graph canvas disabled");
			return;
		};

		let size = canvas_size(&canvas, fullscreen, width, height);
		let pixel_ratio = window.device_pixel_ratio();
		let Some(mut built) = build_scene(canvas, &payload, config.clone(), size, pixel_ratio) else {
			return;
		};
		if let Some(cb) = on_node_click {
			built.on_node_click(move |node| cb.run(node.id().to_string()));
		}
		*scene_init.borrow_mut() = Some(built);

		if fullscreen && resize_cb_init.borrow().is_none() {
			let scene_resize = scene_init.clone();
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(window) = web_sys::window() else {
					return;
				};
				let Some((w, h)) = window_size(&window) else {
					return;
				};
				if let Some(s) = scene_resize.borrow_mut().as_mut() {
					// moving to another monitor changes the ratio too
					s.set_pixel_ratio(window.device_pixel_ratio());
					s.resize(w, h, now());
				}
			}));
			if let Some(cb) = resize_cb_init.borrow().as_ref() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if animate_init.borrow().is_some() {
			return;
		}
		let (scene_anim, animate_inner) = (scene_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(s) = scene_anim.borrow_mut().as_mut() {
				if s.layout().is_running() {
					s.tick();
				}
				s.frame(now());
			}
			if let (Some(cb), Some(window)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(cb) = animate_init.borrow().as_ref() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let with_scene = {
		let scene = scene.clone();
		move |f: &mut dyn FnMut(&mut SceneComposer)| {
			if let Some(s) = scene.borrow_mut().as_mut() {
				f(s);
			}
		}
	};

	let scene_md = with_scene.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some(at) = local_point(canvas_ref, f64::from(ev.client_x()), f64::from(ev.client_y())) {
			scene_md(&mut |s| s.pointer_down(at, now()));
		}
	};

	let scene_mm = with_scene.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(at) = local_point(canvas_ref, f64::from(ev.client_x()), f64::from(ev.client_y())) {
			scene_mm(&mut |s| s.pointer_move(at, now()));
		}
	};

	let scene_mu = with_scene.clone();
	let on_mouseup = move |ev: MouseEvent| {
		if let Some(at) = local_point(canvas_ref, f64::from(ev.client_x()), f64::from(ev.client_y())) {
			scene_mu(&mut |s| s.pointer_up(at, now()));
		}
	};

	let scene_ml = with_scene.clone();
	let on_mouseleave = move |_: MouseEvent| {
		scene_ml(&mut |s| s.pointer_leave(now()));
	};

	let scene_wh = with_scene.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(at) = local_point(canvas_ref, f64::from(ev.client_x()), f64::from(ev.client_y())) {
			let delta = ev.delta_y();
			scene_wh(&mut |s| s.wheel(at, delta, now()));
		}
	};

	// distance between the two fingers of an ongoing pinch
	let pinch = Rc::new(Cell::new(None::<f64>));

	let (scene_ts, pinch_ts) = (with_scene.clone(), pinch.clone());
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		match touch_points(canvas_ref, &ev).as_slice() {
			[at] => scene_ts(&mut |s| s.pointer_down(*at, now())),
			[a, b, ..] => {
				pinch_ts.set(Some((*a - *b).hypot()));
				scene_ts(&mut |s| s.pointer_leave(now()));
			}
			[] => {}
		}
	};

	let (scene_tm, pinch_tm) = (with_scene.clone(), pinch.clone());
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		match touch_points(canvas_ref, &ev).as_slice() {
			[at] => scene_tm(&mut |s| s.pointer_move(*at, now())),
			[a, b, ..] => {
				let distance = (*a - *b).hypot();
				if let Some(previous) = pinch_tm.get().filter(|d| *d > 0.0) {
					let center = a.midpoint(*b);
					scene_tm(&mut |s| s.pinch(center, distance / previous, now()));
				}
				pinch_tm.set(Some(distance));
			}
			[] => {}
		}
	};

	let (scene_te, pinch_te) = (with_scene, pinch);
	let on_touchend = move |ev: TouchEvent| {
		if ev.touches().length() < 2 {
			pinch_te.set(None);
		}
		if ev.touches().length() > 0 {
			return;
		}
		let released = ev.changed_touches().get(0).and_then(|t| {
			local_point(canvas_ref, f64::from(t.client_x()), f64::from(t.client_y()))
		});
		match released {
			Some(at) => scene_te(&mut |s| {
				s.pointer_up(at, now());
				s.pointer_leave(now());
			}),
			None => scene_te(&mut |s| s.pointer_leave(now())),
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="mind-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			style="display: block; touch-action: none;"
		/>
	}
}
