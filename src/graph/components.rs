use super::*;

pub trait Connectivity {
    /// Partitions the nodes with `selected[u] == true` into the connected components of the
    /// subgraph they induce. Unselected nodes remain unassigned.
    fn partition_induced_subgraph(&self, selected: &[bool]) -> Partition;

    /// Partitions all nodes into connected components
    fn partition_into_connected_components(&self) -> Partition;

    /// Returns true iff `nodes` is non-empty and induces a connected subgraph
    fn is_connected_subset(&self, nodes: &[Node]) -> bool;
}

impl<G> Connectivity for G
where
    G: AdjacencyList,
{
    fn partition_induced_subgraph(&self, selected: &[bool]) -> Partition {
        assert_eq!(selected.len(), self.len());
        let mut partition = Partition::new(self.number_of_nodes());

        let Some(start_node) = selected.iter().position(|&x| x) else {
            return partition;
        };

        let mut bfs = self.bfs(start_node as Node);
        bfs.exclude_nodes(self.vertices_range().filter(|&u| !selected[u as usize]));

        loop {
            partition.add_class(bfs.by_ref());

            if !bfs.try_restart_at_unvisited() {
                break;
            }
        }

        partition
    }

    fn partition_into_connected_components(&self) -> Partition {
        self.partition_induced_subgraph(&vec![true; self.len()])
    }

    fn is_connected_subset(&self, nodes: &[Node]) -> bool {
        let mut selected = vec![false; self.len()];
        for &u in nodes {
            selected[u as usize] = true;
        }

        !nodes.is_empty() && self.partition_induced_subgraph(&selected).number_of_classes() == 1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partition_into_connected_components() {
        let graph = SuperpixelGraph::test_only_from([0.0; 7], [(1, 2), (2, 3), (4, 5)]);

        let part = graph.partition_into_connected_components();
        assert_eq!(part.number_of_classes(), 4);
        assert_eq!(part.number_of_unassigned(), 0);
        assert_eq!(part.class_of_node(1), part.class_of_node(2));
        assert_eq!(part.class_of_node(1), part.class_of_node(3));
        assert_eq!(part.class_of_node(4), part.class_of_node(5));
        assert_ne!(part.class_of_node(1), part.class_of_node(5));
        assert_ne!(part.class_of_node(0), part.class_of_node(6));
    }

    #[test]
    fn induced_subgraph() {
        // path 0 - 1 - 2 - 3
        let graph = SuperpixelGraph::test_only_from([0.0; 4], [(0, 1), (1, 2), (2, 3)]);

        let part = graph.partition_induced_subgraph(&[true, false, true, true]);
        assert_eq!(part.number_of_classes(), 2);
        assert_eq!(part.number_of_unassigned(), 1);
        assert!(part.class_of_node(1).is_none());
        assert_eq!(part.class_of_node(2), part.class_of_node(3));
        assert_ne!(part.class_of_node(0), part.class_of_node(2));

        let part = graph.partition_induced_subgraph(&[false; 4]);
        assert_eq!(part.number_of_classes(), 0);

        assert!(graph.is_connected_subset(&[1, 2, 0]));
        assert!(!graph.is_connected_subset(&[0, 2]));
        assert!(!graph.is_connected_subset(&[]));
    }
}
