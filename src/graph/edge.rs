use super::*;

pub trait EdgeOps {
    fn normalized(&self) -> Self;
    fn is_normalized(&self) -> bool;
    fn is_loop(&self) -> bool;
    fn reverse(&self) -> Self;
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Edge(pub Node, pub Node);

/// An undirected adjacency between two superpixels together with the length
/// of their shared boundary (if known).
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug)]
pub struct WeightedEdge(pub Node, pub Node, pub Option<f64>);

impl EdgeOps for Edge {
    fn normalized(&self) -> Self {
        Edge(self.0.min(self.1), self.0.max(self.1))
    }

    fn is_normalized(&self) -> bool {
        self.0 <= self.1
    }

    fn is_loop(&self) -> bool {
        self.0 == self.1
    }

    fn reverse(&self) -> Self {
        Edge(self.1, self.0)
    }
}

impl WeightedEdge {
    pub fn edge(&self) -> Edge {
        Edge(self.0, self.1)
    }

    pub fn weight(&self) -> Option<f64> {
        self.2
    }
}

impl From<(Node, Node)> for Edge {
    fn from(value: (Node, Node)) -> Self {
        Edge(value.0, value.1)
    }
}

impl From<&(Node, Node)> for Edge {
    fn from(value: &(Node, Node)) -> Self {
        Edge(value.0, value.1)
    }
}

impl From<&Edge> for Edge {
    fn from(value: &Edge) -> Self {
        *value
    }
}

impl From<Edge> for WeightedEdge {
    fn from(value: Edge) -> Self {
        WeightedEdge(value.0, value.1, None)
    }
}

impl From<(Node, Node)> for WeightedEdge {
    fn from(value: (Node, Node)) -> Self {
        WeightedEdge(value.0, value.1, None)
    }
}

impl From<(Node, Node, f64)> for WeightedEdge {
    fn from(value: (Node, Node, f64)) -> Self {
        WeightedEdge(value.0, value.1, Some(value.2))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalize() {
        assert_eq!(Edge(3, 1).normalized(), Edge(1, 3));
        assert_eq!(Edge(1, 3).normalized(), Edge(1, 3));
        assert!(!Edge(3, 1).is_normalized());
        assert!(Edge(2, 2).is_loop());
        assert_eq!(Edge(3, 1).reverse(), Edge(1, 3));
    }

    #[test]
    fn weighted_conversion() {
        let e: WeightedEdge = (4, 2, 7.5).into();
        assert_eq!(e.edge(), Edge(4, 2));
        assert_eq!(e.weight(), Some(7.5));

        let e: WeightedEdge = Edge(1, 2).into();
        assert_eq!(e.weight(), None);
    }
}
