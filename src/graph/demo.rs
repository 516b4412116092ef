use super::*;

/// A small hand-made instance: twelve superpixels in three color groups (about 0, 100 and
/// 200) with the master nodes 4, 11, 10 and 7.
pub fn demo_instance() -> (SuperpixelGraph, Vec<Node>) {
    let colors = vec![
        0.0, 100.0, 1.0, 200.0, 2.0, 200.0, 100.0, 100.0, 202.0, 100.0, 202.0, 100.0,
    ];
    let edges = [
        (0, 1),
        (0, 2),
        (1, 6),
        (2, 3),
        (2, 4),
        (3, 5),
        (5, 10),
        (6, 7),
        (6, 8),
        (8, 9),
        (8, 10),
        (9, 11),
    ];

    let graph = SuperpixelGraph::try_new(colors, edges.map(|(u, v)| Edge(u, v)))
        .expect("demo instance is valid");

    (graph, vec![4, 11, 10, 7])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn demo_is_connected() {
        let (graph, masters) = demo_instance();
        assert_eq!(graph.number_of_nodes(), 12);
        assert_eq!(graph.number_of_edges(), 12);
        assert_eq!(graph.partition_into_connected_components().number_of_classes(), 1);
        assert_eq!(graph.big_m(), 202.0);
        assert!(masters.iter().all(|&t| t < 12));
    }
}
