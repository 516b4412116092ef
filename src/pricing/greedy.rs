use std::{cmp::Ordering, cmp::Reverse, collections::BinaryHeap};

use crate::graph::*;

#[derive(Clone, Copy, Debug)]
struct Candidate {
    weight: f64,
    node: Node,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then(self.node.cmp(&other.node))
    }
}

/// Connected node set grown by [`greedy_segment`] together with its summed weight
#[derive(Clone, Debug, PartialEq)]
pub struct GreedySegment {
    pub nodes: Vec<Node>,
    pub value: f64,
}

/// Grows a connected set from `root` by repeatedly adding the frontier node of least weight.
///
/// Nodes with `excluded[u]` are never added. A candidate is added while its weight is negative
/// or the running value has not yet dropped below `lambda`. The prefix of the insertion order
/// with the least value is returned. Ties between candidates of equal weight are broken
/// towards smaller node ids.
pub fn greedy_segment<G: AdjacencyList>(
    graph: &G,
    root: Node,
    excluded: &[bool],
    weights: &[f64],
    lambda: f64,
) -> GreedySegment {
    let mut seen = vec![false; graph.len()];
    let mut heap = BinaryHeap::new();

    let mut order = vec![root];
    let mut value = weights[root as usize];
    let mut best = (1, value);
    seen[root as usize] = true;

    let mut u = root;
    loop {
        for &v in graph.neighbors_of(u) {
            if !seen[v as usize] && !excluded[v as usize] {
                seen[v as usize] = true;
                heap.push(Reverse(Candidate {
                    weight: weights[v as usize],
                    node: v,
                }));
            }
        }

        let Some(&Reverse(Candidate { weight, node })) = heap.peek() else {
            break;
        };

        if weight >= 0.0 && value < lambda {
            break;
        }

        heap.pop();
        order.push(node);
        value += weight;
        if value < best.1 {
            best = (order.len(), value);
        }

        u = node;
    }

    order.truncate(best.0);
    GreedySegment {
        nodes: order,
        value: best.1,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::path_graph;

    #[test]
    fn stops_at_expensive_node() {
        let graph = path_graph(&[0.0; 4]);
        let excluded = [false, false, false, true];

        let seg = greedy_segment(&graph, 0, &excluded, &[0.0, -5.0, -3.0, -100.0], 0.0);
        assert_eq!(seg.nodes, vec![0, 1, 2]);
        assert_eq!(seg.value, -8.0);

        let seg = greedy_segment(&graph, 0, &excluded, &[0.0, -5.0, 1.0, 0.0], 0.0);
        assert_eq!(seg.nodes, vec![0, 1]);
        assert_eq!(seg.value, -5.0);
    }

    #[test]
    fn crosses_positive_node_until_below_lambda() {
        // a positive node is accepted while the value is at least λ; the best prefix
        // includes the cheap node behind it
        let graph = path_graph(&[0.0; 4]);
        let excluded = [false; 4];
        let seg = greedy_segment(&graph, 0, &excluded, &[1.0, 2.0, -10.0, 5.0], 0.0);
        assert_eq!(seg.nodes, vec![0, 1, 2]);
        assert_eq!(seg.value, -7.0);
    }

    #[test]
    fn returns_best_prefix() {
        // the greedy walks into node 2 (value still >= λ) which turns out to be worse
        let graph = path_graph(&[0.0; 3]);
        let excluded = [false; 3];
        let seg = greedy_segment(&graph, 0, &excluded, &[-1.0, 3.0, 4.0], -5.0);
        assert_eq!(seg.nodes, vec![0]);
        assert_eq!(seg.value, -1.0);
    }

    #[test]
    fn picks_cheapest_frontier_node() {
        // star around 0 with leaves 1, 2, 3
        let graph = SuperpixelGraph::test_only_from([0.0; 4], [(0, 1), (0, 2), (0, 3)]);
        let excluded = [false; 4];
        let seg = greedy_segment(&graph, 0, &excluded, &[0.0, -1.0, -3.0, 2.0], 0.0);
        assert_eq!(seg.nodes, vec![0, 2, 1]);
        assert_eq!(seg.value, -4.0);
    }

    #[test]
    fn result_is_connected() {
        let graph = SuperpixelGraph::test_only_from(
            [0.0; 7],
            [(0, 1), (1, 2), (2, 3), (0, 4), (4, 5), (5, 6)],
        );
        let excluded = [false, false, false, false, false, true, false];
        let weights = [0.0, -1.0, 2.0, -4.0, -0.5, 0.0, -10.0];
        let seg = greedy_segment(&graph, 0, &excluded, &weights, 0.0);
        assert!(graph.is_connected_subset(&seg.nodes));
        assert!(!seg.nodes.contains(&5));
        assert!(!seg.nodes.contains(&6));
    }
}
