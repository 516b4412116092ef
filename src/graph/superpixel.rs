use super::*;
use crate::errors::{Result, SegmentationError};
use fxhash::FxHashMap;
use itertools::Itertools;
use std::fmt;

/// Immutable graph of superpixels. Every node carries a finite color value; every
/// undirected edge may carry the length of the boundary shared by its endpoints.
///
/// Neighborhoods are sorted and free of duplicates and self-loops. After construction the
/// graph cannot be modified, so it can be shared freely between pricing subproblems.
#[derive(Clone)]
pub struct SuperpixelGraph {
    colors: Vec<f64>,
    adj: Vec<Vec<Node>>,
    weights: FxHashMap<Edge, f64>,
    number_of_edges: NumEdges,
}

impl GraphNodeOrder for SuperpixelGraph {
    fn number_of_nodes(&self) -> NumNodes {
        self.adj.len() as NumNodes
    }
}

impl GraphEdgeOrder for SuperpixelGraph {
    fn number_of_edges(&self) -> NumEdges {
        self.number_of_edges
    }
}

impl AdjacencyList for SuperpixelGraph {
    fn neighbors_of(&self, u: Node) -> &[Node] {
        &self.adj[u as usize]
    }
}

impl AdjacencyTest for SuperpixelGraph {
    fn has_edge(&self, u: Node, v: Node) -> bool {
        self.adj[u as usize].binary_search(&v).is_ok()
    }
}

impl ColoredNodes for SuperpixelGraph {
    fn color_of(&self, u: Node) -> f64 {
        self.colors[u as usize]
    }
}

impl SuperpixelGraph {
    /// Builds the graph from per-node colors and an edge list. Self-loops are dropped and
    /// parallel edges are merged (the first weight seen wins).
    ///
    /// Fails if a color is not finite, or an edge refers to a missing node.
    pub fn try_new(
        colors: Vec<f64>,
        edges: impl IntoIterator<Item = impl Into<WeightedEdge>>,
    ) -> Result<Self> {
        if let Some((u, c)) = colors
            .iter()
            .enumerate()
            .find(|(_, c)| !c.is_finite())
        {
            return Err(SegmentationError::InvalidInstance(format!(
                "node {u} has invalid color {c}"
            )));
        }

        let n = colors.len() as NumNodes;
        let mut adj = vec![Vec::new(); n as usize];
        let mut weights = FxHashMap::default();

        for edge in edges.into_iter().map(|e| e.into()) {
            let Edge(u, v) = edge.edge().normalized();
            if v >= n {
                return Err(SegmentationError::InvalidInstance(format!(
                    "edge ({u}, {v}) exceeds the number of nodes {n}"
                )));
            }
            if u == v {
                continue;
            }

            adj[u as usize].push(v);
            adj[v as usize].push(u);
            if let Some(w) = edge.weight() {
                weights.entry(Edge(u, v)).or_insert(w);
            }
        }

        let mut number_of_edges = 0;
        for neighbors in adj.iter_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
            number_of_edges += neighbors.len() as NumEdges;
        }

        Ok(Self {
            colors,
            adj,
            weights,
            number_of_edges: number_of_edges / 2,
        })
    }

    /// Shortcut for tests; panics on invalid input
    pub fn test_only_from(
        colors: impl IntoIterator<Item = f64>,
        edges: impl IntoIterator<Item = (Node, Node)>,
    ) -> Self {
        Self::try_new(colors.into_iter().collect(), edges).unwrap()
    }

    /// Returns the colors of all nodes indexed by node id
    pub fn colors(&self) -> &[f64] {
        &self.colors
    }

    /// Returns the boundary length of edge {u, v} if the edge exists and a weight was provided
    pub fn edge_weight(&self, u: Node, v: Node) -> Option<f64> {
        self.weights.get(&Edge(u, v).normalized()).copied()
    }

    /// Returns each undirected edge exactly once as `Edge(u, v)` with `u < v`, in
    /// lexicographic order
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.vertices_range().flat_map(move |u| {
            self.neighbors_of(u)
                .iter()
                .filter(move |&&v| u < v)
                .map(move |&v| Edge(u, v))
        })
    }

    pub fn weighted_edges(&self) -> impl Iterator<Item = WeightedEdge> + '_ {
        self.edges()
            .map(|Edge(u, v)| WeightedEdge(u, v, self.edge_weight(u, v)))
    }

    /// The BigM of the pricing formulation: the spread `max - min` of the color values.
    /// It bounds every deviation `|color(u) - color(v)|`; it is 0 for an empty graph.
    pub fn big_m(&self) -> f64 {
        let (min, max) = self
            .colors
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| {
                (lo.min(c), hi.max(c))
            });
        if self.colors.is_empty() { 0.0 } else { max - min }
    }

    /// Sum of absolute deviations of `nodes` from the color of `master`
    pub fn deviation_sum(&self, master: Node, nodes: &[Node]) -> f64 {
        nodes.iter().map(|&u| self.deviation(master, u)).sum()
    }
}

impl fmt::Debug for SuperpixelGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SuperpixelGraph {{ colors: {:?}, edges: {:?} }}",
            self.colors,
            self.edges().map(|Edge(u, v)| (u, v)).collect_vec()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn construction() {
        let graph = SuperpixelGraph::try_new(
            vec![0.0, 10.0, 10.0, 100.0],
            [
                WeightedEdge(0, 1, Some(3.0)),
                WeightedEdge(2, 1, None),
                WeightedEdge(1, 2, Some(5.0)),
                WeightedEdge(3, 3, None),
                WeightedEdge(2, 3, Some(1.0)),
            ],
        )
        .unwrap();

        assert_eq!(graph.number_of_nodes(), 4);
        assert_eq!(graph.number_of_edges(), 3);
        assert_eq!(graph.neighbors_of(1), &[0, 2]);
        assert_eq!(graph.neighbors_of(3), &[2]);
        assert!(graph.has_edge(2, 1));
        assert!(!graph.has_edge(0, 3));
        assert_eq!(graph.edge_weight(1, 0), Some(3.0));
        assert_eq!(graph.edge_weight(1, 2), Some(5.0));
        assert_eq!(graph.edge_weight(0, 3), None);
        assert_eq!(
            graph.edges().collect_vec(),
            vec![Edge(0, 1), Edge(1, 2), Edge(2, 3)]
        );
    }

    #[test]
    fn colors_and_deviation() {
        let graph = SuperpixelGraph::test_only_from([0.0, 10.0, 10.0, 100.0], [(0, 1), (1, 2)]);
        assert_eq!(graph.big_m(), 100.0);
        assert_eq!(graph.deviation(3, 1), 90.0);
        assert_eq!(graph.deviation_sum(0, &[0, 1, 2]), 20.0);
    }

    #[test]
    fn negative_colors() {
        let graph = SuperpixelGraph::try_new(vec![-40.0, 5.0, -2.5], [Edge(0, 1), Edge(1, 2)])
            .unwrap();
        assert_eq!(graph.big_m(), 45.0);
        assert_eq!(graph.deviation(0, 1), 45.0);
        for u in graph.vertices_range() {
            for v in graph.vertices_range() {
                assert!(graph.deviation(u, v) <= graph.big_m());
            }
        }

        let shifted = SuperpixelGraph::test_only_from([-110.0, -100.0], [(0, 1)]);
        assert_eq!(shifted.big_m(), 10.0);

        let empty = SuperpixelGraph::try_new(vec![], Vec::<Edge>::new()).unwrap();
        assert_eq!(empty.big_m(), 0.0);
    }

    #[test]
    fn reject_invalid() {
        assert!(matches!(
            SuperpixelGraph::try_new(vec![1.0, f64::NEG_INFINITY], [Edge(0, 1)]),
            Err(SegmentationError::InvalidInstance(_))
        ));
        assert!(matches!(
            SuperpixelGraph::try_new(vec![1.0, f64::NAN], [Edge(0, 1)]),
            Err(SegmentationError::InvalidInstance(_))
        ));
        assert!(matches!(
            SuperpixelGraph::try_new(vec![1.0, 2.0], [Edge(0, 2)]),
            Err(SegmentationError::InvalidInstance(_))
        ));
    }
}
