use super::graph::*;
use itertools::Itertools as _;
use rand::Rng;

pub use super::graph::demo_instance;

/// Path `0 - 1 - ... - (n-1)` with the given colors
pub fn path_graph(colors: &[f64]) -> SuperpixelGraph {
    let n = colors.len() as Node;
    SuperpixelGraph::test_only_from(colors.iter().copied(), (1..n).map(|u| (u - 1, u)))
}

/// Random connected instances with at most `max_n` nodes and one to three master nodes
pub fn random_instances(
    rng: &mut impl Rng,
    count: usize,
    max_n: NumNodes,
) -> Vec<(SuperpixelGraph, Vec<Node>)> {
    (0..count)
        .map(|_| {
            let n = rng.gen_range(4..=max_n);
            let p = rng.gen_range(0.05..0.4);
            let graph = random_connected_superpixels(rng, n, p, &[0.0, 50.0, 100.0, 200.0], 10.0);
            let k = rng.gen_range(1..=3);
            let masters = random_master_nodes(rng, n, k);
            (graph, masters)
        })
        .collect()
}

/// All connected node sets containing `root` and none of `forbidden`, each sorted.
/// Exponential in the number of nodes; only meant for small graphs.
pub fn connected_subsets_containing(
    graph: &SuperpixelGraph,
    root: Node,
    forbidden: &[Node],
) -> Vec<Vec<Node>> {
    let candidates = graph
        .vertices_range()
        .filter(|&u| u != root && !forbidden.contains(&u))
        .collect_vec();
    assert!(candidates.len() < 24);

    (0u32..(1 << candidates.len()))
        .filter_map(|mask| {
            let nodes = candidates
                .iter()
                .enumerate()
                .filter(|&(i, _)| mask & (1 << i) != 0)
                .map(|(_, &u)| u)
                .chain(std::iter::once(root))
                .sorted()
                .collect_vec();
            graph.is_connected_subset(&nodes).then_some(nodes)
        })
        .collect()
}

/// Cost of an optimal segmentation found by trying every assignment of the non-master
/// nodes to master nodes. Returns `None` if no assignment yields connected segments.
pub fn brute_force_optimum(graph: &SuperpixelGraph, masters: &[Node]) -> Option<f64> {
    let others = graph
        .vertices_range()
        .filter(|u| !masters.contains(u))
        .collect_vec();
    let k = masters.len();

    let mut assignment = vec![0usize; others.len()];
    let mut best: Option<f64> = None;

    loop {
        let mut segments = masters.iter().map(|&t| vec![t]).collect_vec();
        for (&u, &i) in others.iter().zip(&assignment) {
            segments[i].push(u);
        }

        if segments.iter().all(|s| graph.is_connected_subset(s)) {
            let cost: f64 = masters
                .iter()
                .zip(&segments)
                .map(|(&t, s)| graph.deviation_sum(t, s))
                .sum();
            best = Some(best.map_or(cost, |b| b.min(cost)));
        }

        // next assignment in lexicographic order
        let Some(pos) = assignment.iter().position(|&i| i + 1 < k) else {
            break;
        };
        for i in assignment.iter_mut().take(pos) {
            *i = 0;
        }
        assignment[pos] += 1;
    }

    best
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn connected_subsets_of_path() {
        let graph = path_graph(&[0.0; 4]);
        let subsets = connected_subsets_containing(&graph, 1, &[3]);
        assert_eq!(
            subsets.into_iter().sorted().collect_vec(),
            vec![vec![0, 1], vec![0, 1, 2], vec![1], vec![1, 2]]
        );
    }

    #[test]
    fn brute_force_on_path() {
        let graph = path_graph(&[0.0, 10.0, 10.0, 100.0]);
        assert_eq!(brute_force_optimum(&graph, &[0, 3]), Some(20.0));
        assert_eq!(brute_force_optimum(&graph, &[3]), Some(280.0));

        let disconnected = SuperpixelGraph::test_only_from([0.0; 3], [(0, 1)]);
        assert_eq!(brute_force_optimum(&disconnected, &[0]), None);
    }
}
