use leptos::prelude::*;
use log::info;

use crate::components::mind_graph::MindGraphCanvas;
use crate::graph::{GraphLink, GraphNode, GraphPayload};

/// Sample vault: a random tree of notes, each weighted by its link count.
fn generate_sample_data(n: usize) -> GraphPayload {
	let links: Vec<GraphLink> = (1..n)
		.map(|i| {
			let target = (rand_simple(i) * (i as f64)) as usize;
			GraphLink {
				source: format!("note-{i}"),
				target: format!("note-{target}"),
			}
		})
		.collect();

	let mut degree = vec![0.0; n];
	for i in 1..n {
		degree[i] += 1.0;
		degree[(rand_simple(i) * (i as f64)) as usize] += 1.0;
	}

	let nodes = (0..n)
		.map(|i| GraphNode {
			id: format!("note-{i}"),
			title: format!("Note {i}.md"),
			weight: degree[i],
		})
		.collect();

	GraphPayload { nodes, links }
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = Signal::derive(move || generate_sample_data(60));
	let on_node_click = Callback::new(|id: String| info!("clicked {id}"));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<MindGraphCanvas data=graph_data on_node_click=on_node_click fullscreen=true />
				<div class="graph-overlay">
					<h1>"Mind Graph"</h1>
					<p class="subtitle">"Hover a note to highlight its links. Drag notes, pan, scroll to zoom."</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::Graph;

	#[test]
	fn sample_data_is_a_valid_tree() {
		let payload = generate_sample_data(60);
		let graph = Graph::from_payload(&payload).unwrap();
		assert_eq!(graph.node_count(), 60);
		assert_eq!(graph.link_count(), 59);
		let total: f64 = payload.nodes.iter().map(|n| n.weight).sum();
		assert_eq!(total, 118.0);
	}
}
