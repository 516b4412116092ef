use itertools::Itertools;
use log::trace;

use super::*;
use crate::graph::*;

/// Separates selections of a rooted subproblem that are not connected.
///
/// A node counts as selected if its value exceeds the selection threshold. For each
/// connected component `C` of the selected nodes that does not contain the root, every
/// `s in C` yields the cut `sum(x_v for v in N(C) \ C) >= x_s`. Forbidden nodes (e.g. other
/// master nodes, which are fixed to zero) are left out of the sum.
pub struct ConnectivitySeparator<'a, G: AdjacencyList> {
    graph: &'a G,
    root: Node,
    forbidden: Vec<bool>,
    threshold: f64,
}

impl<'a, G: AdjacencyList> ConnectivitySeparator<'a, G> {
    pub fn new(graph: &'a G, root: Node, threshold: f64) -> Self {
        Self {
            graph,
            root,
            forbidden: vec![false; graph.len()],
            threshold,
        }
    }

    pub fn with_forbidden_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        for u in nodes {
            if u != self.root {
                self.forbidden[u as usize] = true;
            }
        }
        self
    }

    pub fn root(&self) -> Node {
        self.root
    }

    /// Separates a (possibly fractional) solution given by one value per node
    pub fn separate(&self, values: &[f64]) -> Separation {
        assert_eq!(values.len(), self.graph.len());

        let selected = values.iter().map(|&x| x > self.threshold).collect_vec();
        let components = self.graph.partition_induced_subgraph(&selected);
        if components.number_of_classes() <= 1 {
            return Separation::Feasible;
        }

        let root_class = components.class_of_node(self.root);
        let mut in_component = vec![false; self.graph.len()];
        let mut cuts = Vec::new();

        for component in components.classes_as_lists() {
            if components.class_of_node(component[0]) == root_class {
                continue;
            }

            for &u in &component {
                in_component[u as usize] = true;
            }

            let boundary = component
                .iter()
                .flat_map(|&u| self.graph.neighbors_of(u).iter().copied())
                .filter(|&v| !in_component[v as usize] && !self.forbidden[v as usize])
                .sorted_unstable()
                .dedup()
                .collect_vec();

            for &u in &component {
                in_component[u as usize] = false;
            }

            cuts.extend(
                component
                    .iter()
                    .map(|&s| ConnectivityCut::new(s, boundary.clone()))
                    .filter(|cut| cut.is_violated_by(values, self.threshold)),
            );
        }

        trace!(
            "Root {}: {} components, {} violated cuts",
            self.root,
            components.number_of_classes(),
            cuts.len()
        );

        Separation::Cuts(cuts)
    }

    /// Separates the integral solution selecting exactly `nodes`
    pub fn separate_selection(&self, nodes: &[Node]) -> Separation {
        let mut values = vec![0.0; self.graph.len()];
        for &u in nodes {
            values[u as usize] = 1.0;
        }
        self.separate(&values)
    }
}
