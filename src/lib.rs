//! Interactive mind-graph canvas: a force-directed layout of linked notes with
//! pan/zoom, hover highlighting and animated layer transitions.
//!
//! The engine ([`scene::SceneComposer`] and everything under it) is platform
//! independent and paints through [`surface::RenderSurface`]. The Leptos
//! client-side app wires it to an HTML canvas.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

pub mod animation;
pub mod color;
pub mod config;
pub mod error;
pub mod graph;
pub mod hit;
pub mod layers;
pub mod scene;
pub mod surface;
pub mod view;

// Modules
pub mod components;
mod pages;

pub use config::MindGraphConfig;
pub use error::{MindGraphError, MindGraphResult};
pub use graph::{GraphLink, GraphNode, GraphPayload};
pub use scene::SceneComposer;

// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the graph demo and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		// sets the document title
		<Title text="Mind Graph" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
