pub mod mind_graph;
