//! Pricing: for every master node `t` find a connected node set `S` containing `t` and no
//! other master node that minimizes `sum_{s in S} (|color(t) - color(s)| - μ_s)`. The set
//! yields an improving column iff this value is below the cardinality dual λ.

pub mod exact;
pub mod greedy;

pub use exact::*;
pub use greedy::*;

use itertools::Itertools;
use log::{debug, warn};
#[cfg(feature = "par")]
use rayon::prelude::*;

use crate::{
    config::{ColumnGenerationConfig, PricingStrategy},
    errors::Result,
    graph::*,
    lp::*,
    master::DualSnapshot,
    segment::Segment,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnOrigin {
    Heuristic,
    Exact,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PricingOutcome {
    /// An improving segment; `reduced_cost` is `cost - sum(μ)` recomputed from the segment
    Column {
        segment: Segment,
        reduced_cost: f64,
        origin: ColumnOrigin,
    },

    /// The best segment does not beat λ; `near_tie` is set if it misses only by the tolerance
    NoImprovingColumn { near_tie: bool },

    /// No connected selection containing the master node exists
    Infeasible,
}

/// Pricing state of a single master node. The exact subproblem is built on first use and
/// reused afterwards.
pub struct MasterPricer<M: LinearModel = HighsModel> {
    index: usize,
    master: Node,
    exact: Option<ExactPricer<M>>,
}

impl<M: LinearModel> MasterPricer<M> {
    pub fn new(masters: &[Node], index: usize) -> Self {
        Self {
            index,
            master: masters[index],
            exact: None,
        }
    }

    pub fn master(&self) -> Node {
        self.master
    }

    pub fn number_of_cuts(&self) -> usize {
        self.exact.as_ref().map_or(0, |e| e.number_of_cuts())
    }

    /// Weight `w_s = |color(t) - color(s)| - μ_s` of every node
    pub fn weights(&self, graph: &SuperpixelGraph, duals: &DualSnapshot) -> Vec<f64> {
        graph
            .vertices_range()
            .map(|s| graph.deviation(self.master, s) - duals.node_dual(s))
            .collect()
    }

    pub fn price(
        &mut self,
        graph: &SuperpixelGraph,
        masters: &[Node],
        is_master: &[bool],
        duals: &DualSnapshot,
        config: &ColumnGenerationConfig,
    ) -> Result<PricingOutcome> {
        let lambda = duals.cardinality_dual();
        let weights = self.weights(graph, duals);

        if config.strategy == PricingStrategy::HeuristicThenExact {
            let greedy = greedy_segment(graph, self.master, is_master, &weights, lambda);
            let segment = Segment::new(graph, self.master, greedy.nodes);
            let reduced_cost = segment.reduced_cost(duals);
            debug_assert!((reduced_cost - greedy.value).abs() < 1e-6 * (1.0 + greedy.value.abs()));

            if config.is_improving(reduced_cost, lambda) {
                return Ok(PricingOutcome::Column {
                    segment,
                    reduced_cost,
                    origin: ColumnOrigin::Heuristic,
                });
            }
        }

        let index = self.index;
        let exact = self
            .exact
            .get_or_insert_with(|| ExactPricer::new(graph, masters, index, config));

        let nodes = match exact.solve(graph, &weights)? {
            ExactOutcome::Optimal { nodes, .. } => nodes,
            ExactOutcome::Infeasible => return Ok(PricingOutcome::Infeasible),
        };

        let segment = Segment::new(graph, self.master, nodes);
        let reduced_cost = segment.reduced_cost(duals);

        if config.is_improving(reduced_cost, lambda) {
            Ok(PricingOutcome::Column {
                segment,
                reduced_cost,
                origin: ColumnOrigin::Exact,
            })
        } else {
            Ok(PricingOutcome::NoImprovingColumn {
                near_tie: config.is_near_tie(reduced_cost, lambda),
            })
        }
    }
}

/// Prices all master nodes against one dual snapshot
pub struct PricingEngine<M: LinearModel = HighsModel> {
    masters: Vec<Node>,
    is_master: Vec<bool>,
    pricers: Vec<MasterPricer<M>>,
    config: ColumnGenerationConfig,
}

impl<M: LinearModel> PricingEngine<M> {
    pub fn new(graph: &SuperpixelGraph, masters: &[Node], config: &ColumnGenerationConfig) -> Self {
        let mut is_master = vec![false; graph.len()];
        for &t in masters {
            is_master[t as usize] = true;
        }

        Self {
            masters: masters.to_vec(),
            is_master,
            pricers: (0..masters.len()).map(|i| MasterPricer::new(masters, i)).collect(),
            config: config.clone(),
        }
    }

    /// Total number of connectivity cuts added by all exact pricers
    pub fn number_of_cuts(&self) -> usize {
        self.pricers.iter().map(|p| p.number_of_cuts()).sum()
    }

    /// Runs the pricing of every master node; `result[i]` belongs to `masters[i]`.
    /// The subproblems only share the read-only snapshot and are solved in parallel if the
    /// `par` feature is enabled. Solver failures abort the round.
    pub fn price_one_round(
        &mut self,
        graph: &SuperpixelGraph,
        duals: DualSnapshot,
    ) -> Result<Vec<PricingOutcome>> {
        let masters = &self.masters;
        let is_master = &self.is_master;
        let config = &self.config;

        #[cfg(feature = "par")]
        let pricers = self.pricers.par_iter_mut();
        #[cfg(not(feature = "par"))]
        let pricers = self.pricers.iter_mut();

        let outcomes: Vec<PricingOutcome> = pricers
            .map(|pricer| pricer.price(graph, masters, is_master, &duals, config))
            .collect::<Result<_>>()?;

        let columns = outcomes
            .iter()
            .filter(|o| matches!(o, PricingOutcome::Column { .. }))
            .count();
        debug!(
            "Pricing round with λ={:.4}: {columns} improving columns out of {}",
            duals.cardinality_dual(),
            outcomes.len()
        );

        for (t, outcome) in masters.iter().zip_eq(&outcomes) {
            if *outcome == PricingOutcome::Infeasible {
                warn!("Pricing subproblem of master node {t} is infeasible");
            }
        }

        Ok(outcomes)
    }
}
