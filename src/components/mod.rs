pub mod controls;
pub mod network_graph;
