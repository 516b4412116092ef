use super::*;
use std::collections::VecDeque;

/// Breadth-first search over an [`AdjacencyList`]. Nodes may be excluded from the search
/// (they are treated as if they were already visited), which allows traversals of induced
/// subgraphs without materializing them.
pub struct Bfs<'a, G: AdjacencyList> {
    graph: &'a G,
    visited: Vec<bool>,
    queue: VecDeque<Node>,
}

impl<'a, G: AdjacencyList> Iterator for Bfs<'a, G> {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        let u = self.queue.pop_front()?;

        for &v in self.graph.neighbors_of(u) {
            if !self.visited[v as usize] {
                self.visited[v as usize] = true;
                self.queue.push_back(v);
            }
        }

        Some(u)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (
            self.queue.len(),
            Some(self.visited.iter().filter(|&&x| !x).count() + self.queue.len()),
        )
    }
}

impl<'a, G: AdjacencyList> Bfs<'a, G> {
    pub fn new(graph: &'a G, start: Node) -> Self {
        let mut visited = vec![false; graph.len()];
        visited[start as usize] = true;
        Self {
            graph,
            visited,
            queue: VecDeque::from(vec![start]),
        }
    }

    /// Excludes a node from the search. It will be treated as if it was already visited,
    /// i.e. no edges to or from that node will be taken. If the node was already visited,
    /// this is a non-op.
    ///
    /// # Warning
    /// Calling this method has no effect if the node is already queued. It is therefore highly
    /// recommended to call this method directly after the constructor.
    ///
    /// # Example
    /// ```
    /// use spseg::graph::*;
    /// let graph = SuperpixelGraph::test_only_from([0.0; 3], [(0, 1), (1, 2)]);
    /// let bfs : Vec<_> = graph.bfs(0).exclude_node(1).collect();
    /// assert_eq!(bfs, vec![0]);
    /// ```
    pub fn exclude_node(&mut self, u: Node) -> &mut Self {
        self.visited[u as usize] = true;
        self
    }

    /// Exclude multiple nodes from traversal. It is functionally equivalent to repeatedly
    /// calling [`Bfs::exclude_node`].
    pub fn exclude_nodes(&mut self, us: impl IntoIterator<Item = Node>) -> &mut Self {
        for u in us {
            self.exclude_node(u);
        }
        self
    }

    /// Returns true iff the node was visited (or excluded) so far
    pub fn did_visit_node(&self, u: Node) -> bool {
        self.visited[u as usize]
    }

    /// Tries to restart the search at an yet unvisited node and returns
    /// true iff successful. Requires that search came to a hold earlier,
    /// i.e. self.next() returned None
    pub fn try_restart_at_unvisited(&mut self) -> bool {
        assert!(self.queue.is_empty());
        match self.visited.iter().position(|&x| !x) {
            None => false,
            Some(x) => {
                self.visited[x] = true;
                self.queue.push_back(x as Node);
                true
            }
        }
    }
}

/// Assigns every node to the closest of several sources (ties are resolved towards the source
/// that reaches the node first in a simultaneous BFS, i.e. towards the earlier source in
/// `sources`). Nodes in `blocked` are never entered unless they are a source themselves.
///
/// Returns for each node the index into `sources` of its owner, or `None` if the node is not
/// reachable from any source.
pub fn multi_source_bfs<G: AdjacencyList>(
    graph: &G,
    sources: &[Node],
    blocked: &[bool],
) -> Vec<Option<usize>> {
    let mut owner = vec![None; graph.len()];
    let mut queue = VecDeque::with_capacity(graph.len());

    for (i, &s) in sources.iter().enumerate() {
        if owner[s as usize].is_none() {
            owner[s as usize] = Some(i);
            queue.push_back(s);
        }
    }

    while let Some(u) = queue.pop_front() {
        let o = owner[u as usize];
        for &v in graph.neighbors_of(u) {
            if owner[v as usize].is_none() && !blocked[v as usize] {
                owner[v as usize] = o;
                queue.push_back(v);
            }
        }
    }

    owner
}
