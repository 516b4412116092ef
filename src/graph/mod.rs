pub mod components;
pub mod demo;
pub mod edge;
pub mod gnp;
pub mod partition;
pub mod superpixel;
pub mod traversal;

pub type Node = u32;
pub type NumNodes = Node;
pub type NumEdges = u64;

use std::ops::Range;

pub use components::*;
pub use demo::*;
pub use edge::*;
pub use gnp::*;
pub use partition::*;
pub use superpixel::*;
pub use traversal::*;

/// Provides getters pertaining to the size of a graph
pub trait GraphNodeOrder {
    /// Returns the number of nodes of the graph
    fn number_of_nodes(&self) -> NumNodes;

    /// Return the number of nodes as usize
    fn len(&self) -> usize {
        self.number_of_nodes() as usize
    }

    /// Returns a range over V. The range does not borrow self and hence may be
    /// used where additional mutable references of self are needed
    fn vertices_range(&self) -> Range<Node> {
        0..self.number_of_nodes()
    }

    /// Returns true if the graph has no nodes (and thus no edges)
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait GraphEdgeOrder {
    /// Returns the number of (undirected) edges of the graph
    fn number_of_edges(&self) -> NumEdges;
}

pub trait AdjacencyList: GraphNodeOrder + Sized {
    /// Returns a slice of neighbors of a given vertex.
    /// ** Panics if the v >= n **
    fn neighbors_of(&self, u: Node) -> &[Node];

    /// Returns the number of neighbors of from [`u`]
    fn degree_of(&self, u: Node) -> NumNodes {
        self.neighbors_of(u).len() as NumNodes
    }

    /// Returns a BFS iterator starting at `start`
    fn bfs(&self, start: Node) -> Bfs<'_, Self> {
        Bfs::new(self, start)
    }
}

/// Provides efficient tests whether an edge exists
pub trait AdjacencyTest {
    /// Returns *true* exactly if the graph contains the edge {u, v}
    fn has_edge(&self, u: Node, v: Node) -> bool;
}

/// Graphs whose nodes carry a scalar color (e.g. the average intensity of a superpixel)
pub trait ColoredNodes: GraphNodeOrder {
    fn color_of(&self, u: Node) -> f64;

    /// Absolute color deviation between two nodes
    fn deviation(&self, u: Node, v: Node) -> f64 {
        (self.color_of(u) - self.color_of(v)).abs()
    }
}
