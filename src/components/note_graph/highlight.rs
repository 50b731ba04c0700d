//! Styling derived from the current selection and the adjacency index.
//!
//! Pure: the same selection over the same graph always yields the same
//! [`Highlight`], and nothing here touches the simulation.

use super::builder::KnowledgeGraph;
use super::types::NoteId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub opacity: f64,
	/// Drawn after every non-raised node.
	pub raised: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkStyle {
	pub opacity: f64,
	pub raised: bool,
	/// Accent colour and wider stroke.
	pub accent: bool,
}

const FULL_NODE: NodeStyle = NodeStyle {
	opacity: 1.0,
	raised: false,
};
const FULL_LINK: LinkStyle = LinkStyle {
	opacity: 1.0,
	raised: false,
	accent: false,
};

/// Per-slot styles, indexed like `KnowledgeGraph::nodes` / `links`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Highlight {
	pub nodes: Vec<NodeStyle>,
	pub links: Vec<LinkStyle>,
}

impl Highlight {
	pub fn derive(graph: &KnowledgeGraph, selection: Option<&NoteId>, dimmed: f64) -> Self {
		let Some(selected) = selection.filter(|id| graph.contains(id)) else {
			return Self {
				nodes: vec![FULL_NODE; graph.nodes.len()],
				links: vec![FULL_LINK; graph.links.len()],
			};
		};

		let lit = graph.adjacency.closed_neighborhood(selected);
		let nodes = graph
			.nodes
			.iter()
			.map(|n| {
				if lit.contains(&n.id) {
					NodeStyle {
						opacity: 1.0,
						raised: true,
					}
				} else {
					NodeStyle {
						opacity: dimmed,
						raised: false,
					}
				}
			})
			.collect();
		let links = graph
			.links
			.iter()
			.map(|l| {
				if lit.contains(&l.source) && lit.contains(&l.target) {
					LinkStyle {
						opacity: 1.0,
						raised: true,
						accent: true,
					}
				} else {
					LinkStyle {
						opacity: dimmed,
						raised: false,
						accent: false,
					}
				}
			})
			.collect();
		Self { nodes, links }
	}

	pub fn is_active(&self) -> bool {
		self.nodes.iter().any(|s| s.raised)
	}

	/// Slots in draw order: dimmed first, raised last, stable otherwise.
	pub fn node_order(&self) -> Vec<usize> {
		draw_order(self.nodes.iter().map(|s| s.raised))
	}

	pub fn link_order(&self) -> Vec<usize> {
		draw_order(self.links.iter().map(|s| s.raised))
	}
}

fn draw_order(raised: impl Iterator<Item = bool>) -> Vec<usize> {
	let (mut low, mut high) = (Vec::new(), Vec::new());
	for (i, r) in raised.enumerate() {
		if r { high.push(i) } else { low.push(i) }
	}
	low.extend(high);
	low
}
