use std::fmt;

use itertools::Itertools;

use crate::{
    errors::{InvariantCheck, SegmentationDefect},
    graph::*,
    master::DualSnapshot,
};

/// Absolute tolerance when comparing declared and recomputed segment costs
pub const COST_TOLERANCE: f64 = 1e-6;

/// A candidate segment (a column of the master problem): a set of nodes bound to
/// exactly one master node.
///
/// The node set is kept sorted and free of duplicates; the cost is computed from the
/// graph at construction and never changes afterwards.
#[derive(Clone, PartialEq)]
pub struct Segment {
    master: Node,
    nodes: Vec<Node>,
    cost: f64,
}

impl Segment {
    /// Creates the segment of `master` with the given members. The master node is added
    /// to the members if it is missing.
    pub fn new<G: ColoredNodes>(
        graph: &G,
        master: Node,
        nodes: impl IntoIterator<Item = Node>,
    ) -> Self {
        let mut nodes = nodes.into_iter().collect_vec();
        nodes.push(master);
        nodes.sort_unstable();
        nodes.dedup();

        let cost = nodes.iter().map(|&u| graph.deviation(master, u)).sum();

        Self {
            master,
            nodes,
            cost,
        }
    }

    /// Creates a segment with an explicit cost, e.g. a placeholder column or a segment read
    /// from a file. The cost is not validated here; see [`InvariantCheck`].
    pub fn with_cost(master: Node, nodes: impl IntoIterator<Item = Node>, cost: f64) -> Self {
        let mut nodes = nodes.into_iter().collect_vec();
        nodes.sort_unstable();
        nodes.dedup();

        Self {
            master,
            nodes,
            cost,
        }
    }

    pub fn master(&self) -> Node {
        self.master
    }

    /// Members in increasing order (including the master node)
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, u: Node) -> bool {
        self.nodes.binary_search(&u).is_ok()
    }

    /// Sum of the absolute color deviations of all members from the master node
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Returns `cost - sum of μ_s over all members`. The column improves the master
    /// relaxation iff this value is below λ.
    pub fn reduced_cost(&self, duals: &DualSnapshot) -> f64 {
        self.cost - self.nodes.iter().map(|&u| duals.node_dual(u)).sum::<f64>()
    }

    /// Checks the properties every column has to satisfy on its own: the master node is a
    /// member, no other master node is, the members are connected and the cost is exact.
    pub fn check<G>(&self, graph: &G, masters: &[Node]) -> Result<(), SegmentationDefect>
    where
        G: AdjacencyList + ColoredNodes,
    {
        if !self.contains(self.master) {
            return Err(SegmentationDefect::MissingMaster(self.master));
        }

        if let Some(&other) = masters
            .iter()
            .find(|&&t| t != self.master && self.contains(t))
        {
            return Err(SegmentationDefect::ForeignMaster {
                master: self.master,
                other,
            });
        }

        if !graph.is_connected_subset(&self.nodes) {
            return Err(SegmentationDefect::Disconnected(self.master));
        }

        let expected: f64 = self.nodes.iter().map(|&u| graph.deviation(self.master, u)).sum();
        if (expected - self.cost).abs() > COST_TOLERANCE * (1.0 + expected.abs()) {
            return Err(SegmentationDefect::CostMismatch {
                master: self.master,
                declared: self.cost,
                expected,
            });
        }

        Ok(())
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Segment[t={}, cost={}, {:?}]", self.master, self.cost, self.nodes)
    }
}

/// A complete answer: one segment per master node, in the order of the master nodes
#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    masters: Vec<Node>,
    segments: Vec<Segment>,
}

impl Segmentation {
    /// Orders `segments` by the position of their master node in `masters`; segments of
    /// unknown master nodes are kept at the end
    pub fn new(masters: Vec<Node>, mut segments: Vec<Segment>) -> Self {
        segments.sort_by_key(|s| {
            masters
                .iter()
                .position(|&t| t == s.master())
                .unwrap_or(masters.len())
        });

        Self { masters, segments }
    }

    pub fn masters(&self) -> &[Node] {
        &self.masters
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn number_of_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn total_cost(&self) -> f64 {
        self.segments.iter().map(|s| s.cost()).sum()
    }

    /// Segment of a given master node, if present
    pub fn segment_of(&self, master: Node) -> Option<&Segment> {
        self.segments.iter().find(|s| s.master() == master)
    }

    /// Returns for every node the master node of the segment covering it
    pub fn assignment(&self, number_of_nodes: NumNodes) -> Vec<Option<Node>> {
        let mut assignment = vec![None; number_of_nodes as usize];
        for segment in &self.segments {
            for &u in segment.nodes() {
                assignment[u as usize] = Some(segment.master());
            }
        }
        assignment
    }
}

impl InvariantCheck<SegmentationDefect> for Segmentation {
    fn is_correct(&self, graph: &SuperpixelGraph) -> Result<(), SegmentationDefect> {
        if self.segments.len() != self.masters.len() {
            return Err(SegmentationDefect::Cardinality {
                expected: self.masters.len(),
                found: self.segments.len(),
            });
        }

        let mut covered_by: Vec<Option<Node>> = vec![None; graph.len()];
        for segment in &self.segments {
            segment.check(graph, &self.masters)?;

            for &u in segment.nodes() {
                if let Some(first) = covered_by[u as usize].replace(segment.master()) {
                    return Err(SegmentationDefect::Overlap {
                        node: u,
                        first,
                        second: segment.master(),
                    });
                }
            }
        }

        if let Some(u) = covered_by.iter().position(|c| c.is_none()) {
            return Err(SegmentationDefect::Uncovered(u as Node));
        }

        Ok(())
    }
}
