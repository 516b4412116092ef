use std::{
    fs::File,
    io::{BufRead, BufReader, ErrorKind, Lines},
    path::Path,
};

use fxhash::FxHashMap;

use crate::graph::{Node, NumEdges, NumNodes, SuperpixelGraph, WeightedEdge};

pub type Result<T> = std::io::Result<T>;

/// A superpixel graph together with its master nodes
#[derive(Clone, Debug)]
pub struct Instance {
    pub graph: SuperpixelGraph,
    pub masters: Vec<Node>,
}

impl Instance {
    /// Parses an instance in the text format
    ///
    /// ```text
    /// c comment
    /// p seg <nodes> <edges> <masters>
    /// v <node> <color>
    /// e <u> <v> [boundary length]
    /// m <node>
    /// ```
    ///
    /// Nodes are numbered from 1. Every node needs exactly one `v` line; the numbers of `e`
    /// and `m` lines have to match the header.
    ///
    /// # Example
    /// ```
    /// use spseg::io::Instance;
    /// use spseg::graph::*;
    ///
    /// let text = "p seg 3 2 1\nv 1 0\nv 2 10\nv 3 12.5\ne 1 2\ne 2 3 4\nm 1\n";
    /// let instance = Instance::try_read(text.as_bytes()).unwrap();
    /// assert_eq!(instance.graph.number_of_nodes(), 3);
    /// assert_eq!(instance.graph.edge_weight(1, 2), Some(4.0));
    /// assert_eq!(instance.masters, vec![0]);
    /// ```
    pub fn try_read<R: BufRead>(reader: R) -> Result<Self> {
        InstanceReader::try_new(reader)?.read()
    }

    pub fn try_read_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = File::open(path)?;
        Self::try_read(BufReader::new(reader))
    }
}

macro_rules! raise_error_unless {
    ($cond : expr, $kind : expr, $info : expr) => {
        if !($cond) {
            return Err(std::io::Error::new($kind, $info));
        }
    };
}

macro_rules! parse_next_value {
    ($iterator : expr, $name : expr) => {{
        let next = $iterator.next();
        raise_error_unless!(
            next.is_some(),
            ErrorKind::InvalidData,
            format!("Premature end of line when parsing {}.", $name)
        );

        let parsed = next.unwrap().parse();
        raise_error_unless!(
            parsed.is_ok(),
            ErrorKind::InvalidData,
            format!("Invalid value found. Cannot parse {}.", $name)
        );

        parsed.unwrap()
    }};
}

pub struct InstanceReader<R> {
    lines: Lines<R>,
    number_of_nodes: NumNodes,
    number_of_edges: NumEdges,
    number_of_masters: NumNodes,
}

impl<R: BufRead> InstanceReader<R> {
    pub fn try_new(reader: R) -> Result<Self> {
        let mut instance_reader = Self {
            lines: reader.lines(),
            number_of_nodes: 0,
            number_of_edges: 0,
            number_of_masters: 0,
        };

        instance_reader.parse_header()?;
        Ok(instance_reader)
    }

    fn next_non_comment_line(&mut self) -> Result<Option<String>> {
        loop {
            let line = self.lines.next();
            match line {
                None => return Ok(None),
                Some(Err(x)) => return Err(x),
                Some(Ok(line)) if line.starts_with('c') || line.trim().is_empty() => continue,
                Some(Ok(line)) => return Ok(Some(line)),
            }
        }
    }

    fn parse_header(&mut self) -> Result<()> {
        let line = self.next_non_comment_line()?;

        raise_error_unless!(line.is_some(), ErrorKind::InvalidData, "No header found");
        let line = line.unwrap();

        let mut parts = line.split_whitespace();

        raise_error_unless!(
            parts.next() == Some("p"),
            ErrorKind::InvalidData,
            "Invalid header found; line should start with p"
        );

        raise_error_unless!(
            parts.next() == Some("seg"),
            ErrorKind::InvalidData,
            "Invalid header found; file type should be \"seg\""
        );

        self.number_of_nodes = parse_next_value!(parts, "Header>Number of nodes");
        self.number_of_edges = parse_next_value!(parts, "Header>Number of edges");
        self.number_of_masters = parse_next_value!(parts, "Header>Number of master nodes");

        raise_error_unless!(
            parts.next().is_none(),
            ErrorKind::InvalidData,
            "Invalid header found; expected end of line"
        );

        Ok(())
    }

    /// Parses a 1-based node id and converts it to the internal 0-based id
    fn parse_node<'a>(&self, parts: &mut impl Iterator<Item = &'a str>, name: &str) -> Result<Node> {
        let u: Node = parse_next_value!(parts, name);
        raise_error_unless!(
            u >= 1 && u <= self.number_of_nodes,
            ErrorKind::InvalidData,
            format!("{name} {u} is out of range 1..={}", self.number_of_nodes)
        );
        Ok(u - 1)
    }

    pub fn read(mut self) -> Result<Instance> {
        // sizes in the header are untrusted; storage only grows with the lines read
        let mut colors: FxHashMap<Node, f64> = FxHashMap::default();
        let mut edges = Vec::new();
        let mut masters = Vec::new();

        while let Some(line) = self.next_non_comment_line()? {
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("v") => {
                    let u = self.parse_node(&mut parts, "Node")?;
                    let color: f64 = parse_next_value!(parts, "Color");
                    raise_error_unless!(
                        colors.insert(u, color).is_none(),
                        ErrorKind::InvalidData,
                        format!("Color of node {} given twice", u + 1)
                    );
                }
                Some("e") => {
                    let u = self.parse_node(&mut parts, "Edge>Source")?;
                    let v = self.parse_node(&mut parts, "Edge>Target")?;
                    let weight = match parts.next() {
                        None => None,
                        Some(w) => {
                            let w = w.parse::<f64>();
                            raise_error_unless!(
                                w.is_ok(),
                                ErrorKind::InvalidData,
                                "Invalid value found. Cannot parse Edge>Weight."
                            );
                            w.ok()
                        }
                    };
                    edges.push(WeightedEdge(u, v, weight));
                }
                Some("m") => {
                    let u = self.parse_node(&mut parts, "Master node")?;
                    masters.push(u);
                }
                _ => {
                    return Err(std::io::Error::new(
                        ErrorKind::InvalidData,
                        format!("Unknown line: {line}"),
                    ));
                }
            }

            raise_error_unless!(
                parts.next().is_none(),
                ErrorKind::InvalidData,
                format!("Expected end of line: {line}")
            );
        }

        raise_error_unless!(
            edges.len() as NumEdges == self.number_of_edges,
            ErrorKind::InvalidData,
            format!(
                "Header announces {} edges, found {}",
                self.number_of_edges,
                edges.len()
            )
        );

        raise_error_unless!(
            masters.len() as NumNodes == self.number_of_masters,
            ErrorKind::InvalidData,
            format!(
                "Header announces {} master nodes, found {}",
                self.number_of_masters,
                masters.len()
            )
        );

        // ids are range checked and unique, so a full map covers every node
        if colors.len() as NumNodes != self.number_of_nodes {
            let missing = (0..self.number_of_nodes)
                .find(|u| !colors.contains_key(u))
                .unwrap_or_default();
            return Err(std::io::Error::new(
                ErrorKind::InvalidData,
                format!("Missing color of node {}", missing + 1),
            ));
        }
        let colors = (0..self.number_of_nodes).map(|u| colors[&u]).collect();

        let graph = SuperpixelGraph::try_new(colors, edges)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        Ok(Instance { graph, masters })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::*;

    const DEMO: &str = "c twelve superpixels\n\
        p seg 4 3 2\n\
        v 1 0\n\
        v 2 10\n\
        c interleaved comment\n\
        v 3 10\n\
        v 4 100\n\
        e 1 2 3.5\n\
        e 2 3\n\
        e 3 4\n\
        m 1\n\
        m 4\n";

    #[test]
    fn read_instance() {
        let instance = Instance::try_read(DEMO.as_bytes()).unwrap();
        let graph = &instance.graph;
        assert_eq!(graph.number_of_nodes(), 4);
        assert_eq!(graph.number_of_edges(), 3);
        assert_eq!(graph.colors(), &[0.0, 10.0, 10.0, 100.0]);
        assert_eq!(graph.edge_weight(0, 1), Some(3.5));
        assert_eq!(graph.edge_weight(1, 2), None);
        assert!(graph.has_edge(2, 3));
        assert_eq!(instance.masters, vec![0, 3]);
    }

    #[test]
    fn reject_malformed() {
        let cases = [
            "",
            "p ds 2 1 1\nv 1 0\nv 2 0\ne 1 2\nm 1\n",
            "p seg 2 1\n",
            "p seg 2 1 1\nv 1 0\ne 1 2\nm 1\n",
            "p seg 2 1 1\nv 1 0\nv 2 0\ne 1 3\nm 1\n",
            "p seg 2 1 1\nv 1 0\nv 2 0\ne 1 2 x\nm 1\n",
            "p seg 2 2 1\nv 1 0\nv 2 0\ne 1 2\nm 1\n",
            "p seg 2 1 2\nv 1 0\nv 2 0\ne 1 2\nm 1\n",
            "p seg 2 1 1\nv 1 0\nv 2 inf\ne 1 2\nm 1\n",
            "p seg 2 1 1\nv 1 0\nv 1 0\ne 1 2\nm 1\n",
            "p seg 2 1 1\nv 1 0\nv 2 0\ne 1 2\nm 0\n",
            "p seg 2 1 1\nv 1 0\nv 2 0\ne 1 2\nx 1\n",
            "p seg 2 1 1\nv 1 0 3\nv 2 0\ne 1 2\nm 1\n",
        ];

        for case in cases {
            let err = Instance::try_read(case.as_bytes()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidData, "{case}");
        }
    }

    #[test]
    fn negative_colors() {
        let text = "p seg 3 2 1\nv 1 -20\nv 2 5\nv 3 -2.5\ne 1 2\ne 2 3\nm 2\n";
        let instance = Instance::try_read(text.as_bytes()).unwrap();
        assert_eq!(instance.graph.colors(), &[-20.0, 5.0, -2.5]);
        assert_eq!(instance.graph.big_m(), 25.0);
    }

    #[test]
    fn oversized_header() {
        let cases = [
            "p seg 4294967295 1 1\nv 1 0\nv 2 0\ne 1 2\nm 1\n",
            "p seg 2 18446744073709551615 1\nv 1 0\nv 2 0\ne 1 2\nm 1\n",
            "p seg 2 1 4294967295\nv 1 0\nv 2 0\ne 1 2\nm 1\n",
            "p seg 4294967295 4294967295 4294967295\nv 4294967295 1\n",
        ];

        for case in cases {
            let err = Instance::try_read(case.as_bytes()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidData, "{case}");
        }
    }
}
