//! Derives the reference graph from the current note set.
//!
//! Titles resolve case-insensitively. When two notes share a folded title
//! the later note in iteration order wins. Repeated references from one
//! note to the same target collapse into a single link, and references to
//! unknown titles are dropped rather than turned into placeholder nodes.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::debug;

use super::extract::{extract_links, extract_tags};
use super::types::{Category, GraphLink, GraphNode, Note, NoteId};

/// Undirected neighbour lookup used for highlighting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdjacencyIndex {
	neighbors: HashMap<NoteId, BTreeSet<NoteId>>,
}

impl AdjacencyIndex {
	fn from_links<'a>(nodes: &[GraphNode], links: impl IntoIterator<Item = &'a GraphLink>) -> Self {
		let mut neighbors: HashMap<NoteId, BTreeSet<NoteId>> = nodes
			.iter()
			.map(|n| (n.id.clone(), BTreeSet::new()))
			.collect();
		for link in links {
			neighbors
				.entry(link.source.clone())
				.or_default()
				.insert(link.target.clone());
			neighbors
				.entry(link.target.clone())
				.or_default()
				.insert(link.source.clone());
		}
		Self { neighbors }
	}

	pub fn neighbors(&self, id: &NoteId) -> Option<&BTreeSet<NoteId>> {
		self.neighbors.get(id)
	}

	pub fn are_neighbors(&self, a: &NoteId, b: &NoteId) -> bool {
		self.neighbors.get(a).is_some_and(|set| set.contains(b))
	}

	/// `id` plus its neighbours; empty when `id` is unknown.
	pub fn closed_neighborhood(&self, id: &NoteId) -> HashSet<NoteId> {
		let Some(set) = self.neighbors.get(id) else {
			return HashSet::new();
		};
		let mut out: HashSet<NoteId> = set.iter().cloned().collect();
		out.insert(id.clone());
		out
	}
}

/// Node set, link set and adjacency derived from one note snapshot.
#[derive(Clone, Debug, Default)]
pub struct KnowledgeGraph {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
	pub adjacency: AdjacencyIndex,
	index: HashMap<NoteId, usize>,
}

impl KnowledgeGraph {
	pub fn slot(&self, id: &NoteId) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn node(&self, id: &NoteId) -> Option<&GraphNode> {
		self.slot(id).map(|i| &self.nodes[i])
	}

	pub fn contains(&self, id: &NoteId) -> bool {
		self.index.contains_key(id)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// True when node ids (in order) and links both match `other`.
	pub fn same_structure(&self, other: &KnowledgeGraph) -> bool {
		self.nodes.len() == other.nodes.len()
			&& self.nodes.iter().zip(&other.nodes).all(|(a, b)| a.id == b.id)
			&& self.links == other.links
	}
}

fn fold(title: &str) -> String {
	title.to_lowercase()
}

pub fn build_graph(notes: &[Note]) -> KnowledgeGraph {
	let mut titles: HashMap<String, NoteId> = HashMap::new();
	for note in notes {
		if let Some(prev) = titles.insert(fold(&note.title), note.id.clone()) {
			debug!(
				"duplicate title {:?}: {} replaces {}",
				note.title, note.id, prev
			);
		}
	}

	let mut nodes = Vec::with_capacity(notes.len());
	let mut index = HashMap::with_capacity(notes.len());
	for note in notes {
		// A repeated note id keeps its first occurrence.
		if index.contains_key(&note.id) {
			debug!("skipping repeated note id {}", note.id);
			continue;
		}
		index.insert(note.id.clone(), nodes.len());
		nodes.push(GraphNode {
			id: note.id.clone(),
			label: note.title.clone(),
			category: Category::from_folder(&note.folder),
			tags: unique_tags(&note.body),
		});
	}

	let mut seen: HashSet<(NoteId, NoteId)> = HashSet::new();
	let mut links = Vec::new();
	let mut dangling = 0usize;
	for note in notes {
		for reference in extract_links(&note.body) {
			let Some(target) = titles.get(&fold(&reference)) else {
				dangling += 1;
				continue;
			};
			if seen.insert((note.id.clone(), target.clone())) {
				links.push(GraphLink {
					source: note.id.clone(),
					target: target.clone(),
				});
			}
		}
	}
	if dangling > 0 {
		debug!("dropped {} dangling reference(s)", dangling);
	}

	let adjacency = AdjacencyIndex::from_links(&nodes, &links);
	KnowledgeGraph {
		nodes,
		links,
		adjacency,
		index,
	}
}

fn unique_tags(body: &str) -> Vec<String> {
	let mut seen = HashSet::new();
	extract_tags(body)
		.into_iter()
		.filter(|t| seen.insert(t.to_lowercase()))
		.collect()
}
