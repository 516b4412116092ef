//! Connectivity enforcement for the selection of a pricing subproblem.
//!
//! Two mechanisms are available: a single-commodity [`flow`] formulation that is part of the
//! model from the start, and the [`separator`] which adds cutting planes on demand whenever a
//! (relaxed or integral) solution selects nodes that are not connected to the root.

pub mod flow;
pub mod separator;

pub use flow::*;
pub use separator::*;

use crate::graph::Node;

/// The inequality `sum(x_v for v in neighbors) >= x_node`: the node cannot be selected
/// unless one of the nodes separating its component from the root is selected as well.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectivityCut {
    node: Node,
    neighbors: Vec<Node>,
}

impl ConnectivityCut {
    pub fn new(node: Node, neighbors: Vec<Node>) -> Self {
        debug_assert!(!neighbors.contains(&node));
        Self { node, neighbors }
    }

    /// The node on the right-hand side
    pub fn node(&self) -> Node {
        self.node
    }

    /// The nodes on the left-hand side in increasing order
    pub fn neighbors(&self) -> &[Node] {
        &self.neighbors
    }

    /// Coefficients of the cut in the form `sum(coef * x) >= 0`
    pub fn terms(&self) -> impl Iterator<Item = (Node, f64)> + '_ {
        self.neighbors
            .iter()
            .map(|&v| (v, 1.0))
            .chain(std::iter::once((self.node, -1.0)))
    }

    /// Amount by which `values` (indexed by node) violates the cut; positive iff violated
    pub fn violation(&self, values: &[f64]) -> f64 {
        values[self.node as usize]
            - self
                .neighbors
                .iter()
                .map(|&v| values[v as usize])
                .sum::<f64>()
    }

    pub fn is_violated_by(&self, values: &[f64], tolerance: f64) -> bool {
        self.violation(values) > tolerance
    }
}

/// Result of separating a solution
#[derive(Clone, Debug, PartialEq)]
pub enum Separation {
    /// The selected nodes induce at most one connected component
    Feasible,

    /// The selection is disconnected; contains all cuts violated by the solution
    /// (may be empty for fractional solutions)
    Cuts(Vec<ConnectivityCut>),
}

impl Separation {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible)
    }

    pub fn into_cuts(self) -> Vec<ConnectivityCut> {
        match self {
            Self::Feasible => Vec::new(),
            Self::Cuts(cuts) => cuts,
        }
    }
}
