pub mod note_graph;
