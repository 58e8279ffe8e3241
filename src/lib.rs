//! Leptos client-side concept graph explorer hosted as an MCP app.

use std::rc::Rc;

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::prelude::*;

// Modules
mod components;
mod pages;

use crate::components::concept_map::{ConceptMapConfig, HostBridge, JsHost, McpApp};
use crate::pages::home::Home;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Read the optional JSON configuration handed over by the host page.
pub fn parse_config(raw: Option<&str>) -> ConceptMapConfig {
	let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
		return ConceptMapConfig::default();
	};
	ConceptMapConfig::from_json(raw).unwrap_or_else(|err| {
		warn!("invalid concept map config, using defaults: {err}");
		ConceptMapConfig::default()
	})
}

/// Entry point called by the host page once it has created the MCP `App`.
#[wasm_bindgen]
pub fn mount_concept_map(app: McpApp, config: Option<String>) {
	init_logging();
	let config = parse_config(config.as_deref());
	let host = Rc::new(JsHost::new(app));
	let events = host.subscribe();
	let bridge = HostBridge::new(host, events);
	info!("mounting concept map explorer");
	leptos::mount::mount_to_body(move || view! { <App host=bridge config /> });
}

/// Document shell around the explorer page.
#[component]
pub fn App(
	/// Tool access and host notifications for the explorer.
	host: HostBridge,
	/// Layout, zoom and expansion tunables.
	config: ConceptMapConfig,
) -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Concept Map Explorer" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Home host config />
	}
}
