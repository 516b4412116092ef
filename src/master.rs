//! The restricted master problem of the column generation.
//!
//! ```text
//! min  sum_j cost_j * y_j
//! s.t. sum_{j : s in S_j} y_j = 1    for every node s   (partitioning rows, duals μ_s)
//!      sum_j y_j                = k                     (cardinality row, dual λ)
//!      y_j in {0, 1}
//! ```
//!
//! The reduced cost of a column `S` is `cost(S) - sum_{s in S} μ_s - λ`.

use std::sync::Arc;

use fxhash::FxHashSet;
use itertools::Itertools;
use log::{debug, info};

use crate::{
    config::SolverOptions,
    errors::{Result, SegmentationError, Stage},
    graph::*,
    lp::*,
    segment::Segment,
};

/// Immutable copy of the dual values of one master relaxation. Cloning is cheap as the
/// node duals are shared.
#[derive(Clone, Debug, PartialEq)]
pub struct DualSnapshot {
    node_duals: Arc<[f64]>,
    cardinality_dual: f64,
}

impl DualSnapshot {
    pub fn new(node_duals: Vec<f64>, cardinality_dual: f64) -> Self {
        Self {
            node_duals: node_duals.into(),
            cardinality_dual,
        }
    }

    /// μ_u: dual of the partitioning row of node `u`
    pub fn node_dual(&self, u: Node) -> f64 {
        self.node_duals[u as usize]
    }

    pub fn node_duals(&self) -> &[f64] {
        &self.node_duals
    }

    /// λ: dual of the cardinality row
    pub fn cardinality_dual(&self) -> f64 {
        self.cardinality_dual
    }
}

#[derive(Clone, Debug)]
struct MasterColumn {
    segment: Segment,
    var: VarId,
    placeholder: bool,
}

pub struct MasterProblem<M: LinearModel = HighsModel> {
    model: M,
    masters: Vec<Node>,
    partition_rows: Vec<RowId>,
    cardinality_row: RowId,
    columns: Vec<MasterColumn>,
    known_columns: FxHashSet<(Node, Vec<Node>)>,
    placeholder_cost: f64,
    duals: Option<DualSnapshot>,
}

impl<M: LinearModel> MasterProblem<M> {
    /// Builds the partitioning and cardinality rows for `masters` (so `k = masters.len()`)
    /// and registers `initial_segments` as placeholder columns. Placeholders cost more than
    /// any partition into real segments, so they only keep the relaxation feasible until
    /// real columns exist.
    pub fn initialize(
        graph: &SuperpixelGraph,
        masters: &[Node],
        initial_segments: &[Segment],
        options: &SolverOptions,
    ) -> Self {
        let mut model = M::with_options(options);

        let partition_rows = graph
            .vertices_range()
            .map(|_| model.add_constraint(1.0, 1.0, &mut std::iter::empty()))
            .collect_vec();

        let k = masters.len() as f64;
        let cardinality_row = model.add_constraint(k, k, &mut std::iter::empty());

        let placeholder_cost = Self::placeholder_cost_for(graph);

        let mut master = Self {
            model,
            masters: masters.to_vec(),
            partition_rows,
            cardinality_row,
            columns: Vec::with_capacity(initial_segments.len()),
            known_columns: FxHashSet::default(),
            placeholder_cost,
            duals: None,
        };

        for segment in initial_segments {
            master.push_column(segment.clone(), placeholder_cost, true);
        }

        debug!(
            "Master problem with {} nodes, k={} and {} placeholder columns of cost {placeholder_cost}",
            graph.number_of_nodes(),
            masters.len(),
            initial_segments.len()
        );

        master
    }

    /// Strictly larger than the cost of any segment and hence of any partition
    pub fn placeholder_cost_for(graph: &SuperpixelGraph) -> f64 {
        (graph.number_of_nodes() as f64 + 1.0) * (graph.big_m() + 1.0)
    }

    pub fn placeholder_cost(&self) -> f64 {
        self.placeholder_cost
    }

    pub fn masters(&self) -> &[Node] {
        &self.masters
    }

    /// Registers a priced segment as a regular column with its own cost. Returns false (and
    /// leaves the model untouched) if a column with the same master and node set exists.
    pub fn add_column(&mut self, segment: Segment) -> bool {
        let key = (segment.master(), segment.nodes().to_vec());
        if !self.known_columns.insert(key) {
            return false;
        }

        let cost = segment.cost();
        self.push_column(segment, cost, false);
        true
    }

    fn push_column(&mut self, segment: Segment, objective: f64, placeholder: bool) {
        let entries = segment
            .nodes()
            .iter()
            .map(|&u| (self.partition_rows[u as usize], 1.0))
            .chain(std::iter::once((self.cardinality_row, 1.0)))
            .collect_vec();

        // no upper bound; y <= 1 is implied by the partitioning rows
        let var = self.model.add_column(
            VarKind::Integer,
            0.0,
            f64::INFINITY,
            objective,
            &mut entries.into_iter(),
        );

        self.columns.push(MasterColumn {
            segment,
            var,
            placeholder,
        });
        self.duals = None;
    }

    /// Number of columns including placeholders
    pub fn number_of_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of columns generated by pricing (or otherwise added via [`Self::add_column`])
    pub fn number_of_real_columns(&self) -> usize {
        self.known_columns.len()
    }

    /// Solves the LP relaxation and stores its duals. Returns the objective value.
    pub fn solve_relaxation(&mut self) -> Result<f64> {
        let stage = Stage::MasterRelaxation;
        self.solve(SolveMode::Relaxed, stage)?;

        let node_duals = self
            .partition_rows
            .iter()
            .map(|&row| self.model.dual(row))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|source| SegmentationError::SolverFailure { stage, source })?;
        let cardinality_dual = self
            .model
            .dual(self.cardinality_row)
            .map_err(|source| SegmentationError::SolverFailure { stage, source })?;

        self.duals = Some(DualSnapshot::new(node_duals, cardinality_dual));
        self.objective_value(stage)
    }

    /// Solves the master problem with integral columns. Returns the objective value.
    pub fn solve_integral(&mut self) -> Result<f64> {
        let stage = Stage::MasterIntegral;
        self.solve(SolveMode::Integral, stage)?;
        self.objective_value(stage)
    }

    fn solve(&mut self, mode: SolveMode, stage: Stage) -> Result<()> {
        self.duals = None;
        match self.model.solve(mode) {
            Ok(LpStatus::Optimal) => Ok(()),
            Ok(LpStatus::Infeasible) => Err(SegmentationError::InfeasibleMaster(format!(
                "{stage} is infeasible with {} columns",
                self.columns.len()
            ))),
            Err(source) => Err(SegmentationError::SolverFailure { stage, source }),
        }
    }

    fn objective_value(&self, stage: Stage) -> Result<f64> {
        self.model
            .objective_value()
            .map_err(|source| SegmentationError::SolverFailure { stage, source })
    }

    /// Duals of the most recent relaxation; `None` if the model changed since
    pub fn current_duals(&self) -> Option<DualSnapshot> {
        self.duals.clone()
    }

    /// Reduced cost `cost - sum(μ) - λ` of every column w.r.t. the current duals
    pub fn column_reduced_costs(&self) -> Option<Vec<f64>> {
        let duals = self.duals.as_ref()?;
        Some(
            self.columns
                .iter()
                .map(|col| {
                    let objective = if col.placeholder {
                        self.placeholder_cost
                    } else {
                        col.segment.cost()
                    };
                    objective
                        - col
                            .segment
                            .nodes()
                            .iter()
                            .map(|&u| duals.node_dual(u))
                            .sum::<f64>()
                        - duals.cardinality_dual()
                })
                .collect(),
        )
    }

    /// Returns the segments of all columns with value 1 in the last (integral) solution.
    /// Placeholder columns are reported with the cost of their segment.
    pub fn extract_solution(&self) -> Result<Vec<Segment>> {
        let mut segments = Vec::with_capacity(self.masters.len());
        for col in &self.columns {
            let value = self
                .model
                .value(col.var)
                .map_err(|source| SegmentationError::SolverFailure {
                    stage: Stage::MasterIntegral,
                    source,
                })?;

            if value > 0.5 {
                if col.placeholder {
                    info!(
                        "Placeholder column of master node {} is part of the solution",
                        col.segment.master()
                    );
                }
                segments.push(col.segment.clone());
            }
        }

        Ok(segments)
    }
}

/// Warm start: assigns every node to the master node that reaches it first in a
/// simultaneous BFS from all master nodes. Master nodes are never entered from another
/// master node, so each segment contains exactly one of them and is connected.
///
/// Fails with [`SegmentationError::InfeasibleMaster`] if a node is unreachable.
pub fn initial_partition(graph: &SuperpixelGraph, masters: &[Node]) -> Result<Vec<Segment>> {
    let mut blocked = vec![false; graph.len()];
    for &t in masters {
        blocked[t as usize] = true;
    }

    let owner = multi_source_bfs(graph, masters, &blocked);

    if let Some(u) = owner.iter().position(|o| o.is_none()) {
        return Err(SegmentationError::InfeasibleMaster(format!(
            "node {u} is not reachable from any master node"
        )));
    }

    let mut members = vec![Vec::new(); masters.len()];
    for (u, o) in owner.iter().enumerate() {
        if let Some(i) = *o {
            members[i].push(u as Node);
        }
    }

    Ok(masters
        .iter()
        .zip(members)
        .map(|(&t, nodes)| Segment::new(graph, t, nodes))
        .collect())
}
