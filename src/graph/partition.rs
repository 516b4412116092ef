use super::*;

pub type PartitionClass = Node;

/// A partition splits the nodes of a graph into disjoint classes (e.g. connected components of
/// a selection, or the segments of a segmentation). Nodes may stay unassigned.
#[derive(Clone, Debug)]
pub struct Partition {
    // Class 0 encodes "unassigned" and is hidden from the user; partition class `i` is stored
    // as `i + 1`. This keeps `classes` at 4 bytes per node and lets `class_sizes[0]` count
    // the unassigned nodes.
    classes: Vec<PartitionClass>,
    class_sizes: Vec<Node>,
}

impl Partition {
    /// Creates a partition for `nodes` nodes which are initially all unassigned
    ///
    /// # Example
    /// ```
    /// use spseg::graph::partition::*;
    /// let partition = Partition::new(10);
    /// assert_eq!(partition.number_of_unassigned(), 10);
    /// ```
    pub fn new(nodes: NumNodes) -> Self {
        Self {
            classes: vec![0; nodes as usize],
            class_sizes: vec![nodes],
        }
    }

    /// Creates a new partition class and assigns all provided nodes to it; we require that these
    /// nodes were previously unassigned.
    ///
    /// # Example
    /// ```
    /// use spseg::graph::partition::*;
    /// let mut partition = Partition::new(10);
    /// let class_id = partition.add_class([2,4]);
    /// assert_eq!(partition.number_of_unassigned(), 8);
    /// assert_eq!(partition.number_in_class(class_id), 2);
    /// ```
    pub fn add_class<I: IntoIterator<Item = Node>>(&mut self, nodes: I) -> PartitionClass {
        let class_id = self.class_sizes.len() as PartitionClass;
        self.class_sizes.push(0);

        let mut size = 0;
        for u in nodes {
            assert_eq!(self.classes[u as usize], 0); // check that node is unassigned
            self.classes[u as usize] = class_id;
            size += 1;
        }

        self.class_sizes[class_id as usize] = size;
        self.class_sizes[0] -= size;

        class_id - 1
    }

    /// Moves node into an existing partition class. The node may or may not have been previously assigned.
    pub fn move_node(&mut self, node: Node, new_class: PartitionClass) {
        self.class_sizes[self.classes[node as usize] as usize] -= 1;
        self.classes[node as usize] = new_class + 1;
        self.class_sizes[self.classes[node as usize] as usize] += 1;
    }

    /// Returns the class identifier of node `node` or `None` if `node` is unassigned
    ///
    /// # Example
    /// ```
    /// use spseg::graph::partition::*;
    /// let mut partition = Partition::new(10);
    /// let class_id = partition.add_class([2,4]);
    /// assert_eq!(partition.class_of_node(1), None);
    /// assert_eq!(partition.class_of_node(2), Some(class_id));
    /// ```
    pub fn class_of_node(&self, node: Node) -> Option<PartitionClass> {
        let class_id = self.classes[node as usize];
        if class_id == 0 {
            None
        } else {
            Some(class_id - 1)
        }
    }

    /// Returns the number of unassigned nodes
    pub fn number_of_unassigned(&self) -> Node {
        self.class_sizes[0]
    }

    /// Returns the number of nodes in class `class_id`
    pub fn number_in_class(&self, class_id: PartitionClass) -> Node {
        self.class_sizes[class_id as usize + 1]
    }

    /// Returns the number of partition classes (0 if all nodes are unassigned)
    pub fn number_of_classes(&self) -> Node {
        self.class_sizes.len() as Node - 1
    }

    /// Returns the members of a partition class in increasing order.
    ///
    /// # Warning
    /// This operation requires time linear in the total number of nodes. Use
    /// [`Partition::classes_as_lists`] to obtain all classes at once.
    ///
    /// # Example
    /// ```
    /// use spseg::graph::partition::*;
    /// use itertools::Itertools;
    /// let mut partition = Partition::new(10);
    /// let class_id = partition.add_class([2,5,4]);
    /// assert_eq!(partition.members_of_class(class_id).collect_vec(), vec![2,4,5]);
    /// ```
    pub fn members_of_class(&self, class_id: PartitionClass) -> impl Iterator<Item = Node> + '_ {
        let class_id = class_id + 1;
        assert!(self.class_sizes.len() > class_id as usize);
        self.classes
            .iter()
            .enumerate()
            .filter_map(move |(i, &c)| (c == class_id).then_some(i as Node))
    }

    /// Returns the members of every class; `result[i]` lists class `i` in increasing order.
    pub fn classes_as_lists(&self) -> Vec<Vec<Node>> {
        let mut result: Vec<Vec<Node>> = self.class_sizes[1..]
            .iter()
            .map(|&s| Vec::with_capacity(s as usize))
            .collect();

        for (u, &c) in self.classes.iter().enumerate() {
            if c > 0 {
                result[c as usize - 1].push(u as Node);
            }
        }

        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn move_and_list() {
        let mut partition = Partition::new(6);
        let a = partition.add_class([0, 3]);
        let b = partition.add_class([5]);
        partition.move_node(1, b);
        partition.move_node(3, b);

        assert_eq!(partition.number_of_classes(), 2);
        assert_eq!(partition.number_of_unassigned(), 2);
        assert_eq!(partition.number_in_class(a), 1);
        assert_eq!(partition.number_in_class(b), 3);
        assert_eq!(partition.classes_as_lists(), vec![vec![0], vec![1, 3, 5]]);
    }
}
