use leptos::prelude::*;

use crate::components::concept_map::{ConceptMap, ConceptMapConfig, HostBridge};

/// Full-viewport explorer with a short usage overlay.
#[component]
pub fn Home(host: HostBridge, config: ConceptMapConfig) -> impl IntoView {
	view! {
		<div class="fullscreen-graph">
			<ConceptMap host config fullscreen=true />
			<div class="graph-overlay" style="position: fixed; top: 12px; left: 16px; pointer-events: none;">
				<h1>"Concept Map Explorer"</h1>
				<p class="subtitle">
					"Click a concept to expand it. Drag nodes to reposition. Scroll to zoom. Drag background to pan."
				</p>
			</div>
		</div>
	}
}
