//! Knowledge-graph view over a set of wiki-linked notes.

mod builder;
mod component;
mod config;
mod extract;
mod highlight;
mod interaction;
mod render;
mod simulation;
mod state;
mod types;

pub use builder::{AdjacencyIndex, KnowledgeGraph, build_graph};
pub use component::NoteGraphCanvas;
pub use config::{ConfigError, GraphConfig};
pub use extract::{extract_links, extract_tags};
pub use highlight::{Highlight, LinkStyle, NodeStyle};
pub use interaction::{Action, ClickTracker, InteractionController, Mode, ViewTransform};
pub use simulation::{Body, Simulation};
pub use state::NoteGraphState;
pub use types::{Category, GraphLink, GraphNode, Note, NoteId, Vec2};
