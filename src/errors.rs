use std::{error::Error, fmt};

use thiserror::Error;

use crate::graph::{Node, SuperpixelGraph};

/// Trait for checking invariants of results against the graph they were computed on
pub trait InvariantCheck<E: Error> {
    fn is_correct(&self, graph: &SuperpixelGraph) -> std::result::Result<(), E>;
}

pub type Result<T> = std::result::Result<T, SegmentationError>;

/// The stage of the column generation in which the LP/MIP engine was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MasterRelaxation,
    MasterIntegral,
    Pricing { master: Node },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::MasterRelaxation => write!(f, "master relaxation"),
            Stage::MasterIntegral => write!(f, "integral master"),
            Stage::Pricing { master } => write!(f, "pricing of master node {master}"),
        }
    }
}

/// Errors surfaced to the caller of a segmentation
#[derive(Debug, Error)]
pub enum SegmentationError {
    /// No assignment of exactly k disjoint, covering and connected segments exists
    #[error("master problem infeasible: {0}")]
    InfeasibleMaster(String),

    /// The pricing subproblem of a master node has no feasible connected selection
    #[error("pricing subproblem of master node {master} is infeasible")]
    PricingInfeasible { master: Node },

    /// The LP/MIP engine reported an error status
    #[error("solver failure during {stage}: {source}")]
    SolverFailure {
        stage: Stage,
        #[source]
        source: crate::lp::LpError,
    },

    /// The input does not describe a valid instance
    #[error("invalid instance: {0}")]
    InvalidInstance(String),
}

/// Violations of the properties every accepted segmentation has to satisfy
#[derive(Debug, Error, PartialEq)]
pub enum SegmentationDefect {
    #[error("node {0} is not covered by any segment")]
    Uncovered(Node),

    #[error("node {node} is covered by the segments of master nodes {first} and {second}")]
    Overlap { node: Node, first: Node, second: Node },

    #[error("expected {expected} segments, found {found}")]
    Cardinality { expected: usize, found: usize },

    #[error("segment of master node {0} does not contain its master node")]
    MissingMaster(Node),

    #[error("segment of master node {master} contains the master node {other}")]
    ForeignMaster { master: Node, other: Node },

    #[error("segment of master node {0} is not connected")]
    Disconnected(Node),

    #[error("segment of master node {master} declares cost {declared}, expected {expected}")]
    CostMismatch {
        master: Node,
        declared: f64,
        expected: f64,
    },
}
