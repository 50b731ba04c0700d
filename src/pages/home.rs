use leptos::prelude::*;
use log::info;

use crate::components::note_graph::{Note, NoteGraphCanvas, NoteId};

/// A small corpus exercising every kind of link the graph understands.
fn sample_notes() -> Vec<Note> {
	vec![
		Note::new(
			"n1",
			"Reading list",
			"Pull ideas into [[Graph layout]] and [[Note taking]]. #inbox",
			"Inbox",
		),
		Note::new(
			"n2",
			"Graph layout",
			"Forces: repulsion, springs, centering. See [[Force tuning]] and [[d3-force]]. #graphs #layout",
			"Projects",
		),
		Note::new(
			"n3",
			"Force tuning",
			"Alpha decay drives convergence. Back to [[graph layout]]. #layout",
			"Projects",
		),
		Note::new(
			"n4",
			"Note taking",
			"Zettelkasten style [[Linking]] beats folders. #method",
			"Archive",
		),
		Note::new(
			"n5",
			"Linking",
			"A link is `[[Title]]`; this note links [[Linking]] itself and [[Missing note]]. #method",
			"Archive",
		),
		Note::new(
			"n6",
			"Weekly review",
			"Check [[Reading list]], [[Note taking]], [[Ideas]] and [[Graph layout]]. #routine",
			"Inbox",
		),
		Note::new(
			"n7",
			"Ideas",
			"Loose thoughts on [[Linking]] and [[Weekly review]].",
			"",
		),
		Note::new(
			"n8",
			"ideas",
			"A second page with a clashing title; links to it resolve here. #dup",
			"Projects",
		),
		Note::new("n9", "Orphan", "Nothing points here.", "Archive"),
	]
}

const GRAPH_CONFIG: &str = r#"{ "link_distance": 80, "recenter_zoom": 1.8 }"#;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let notes = RwSignal::new(sample_notes());
	let (opened, set_opened) = signal(None::<String>);

	let on_open = Callback::new(move |id: NoteId| {
		let title = notes.with_untracked(|ns| {
			ns.iter()
				.find(|n| n.id == id)
				.map(|n| n.title.clone())
		});
		info!("opening note {} ({:?})", id, title);
		set_opened.set(title);
	});

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
				<NoteGraphCanvas
					notes=notes
					on_open=on_open
					config_json=GRAPH_CONFIG
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Note Graph"</h1>
					<p class="subtitle">
						"Click a note to focus it, double-click to open. Drag nodes, scroll to zoom, drag background to pan."
					</p>
					{move || {
						opened
							.get()
							.map(|title| view! { <p class="opened">"Opened: " {title}</p> })
					}}
				</div>
			</div>
		</ErrorBoundary>
	}
}
