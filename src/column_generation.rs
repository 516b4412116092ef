//! The column generation driver.
//!
//! Each step of [`ColumnGeneration`] is one pricing round: solve the master relaxation, hand
//! the frozen duals to the pricing engine and register all improving columns. Once a round
//! yields no new column (or the round limit is reached) the master problem is solved with
//! integral columns.

use fxhash::FxHashSet;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    algorithm::{IterativeAlgorithm, TerminatingIterativeAlgorithm},
    config::ColumnGenerationConfig,
    errors::{InvariantCheck, Result, SegmentationError, Stage},
    graph::*,
    lp::{HighsModel, LinearModel, LpError},
    master::{DualSnapshot, MasterProblem, initial_partition},
    pricing::{ColumnOrigin, PricingEngine, PricingOutcome},
    segment::{Segment, Segmentation},
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveStatistics {
    /// Number of pricing rounds (master relaxations)
    pub rounds: usize,
    pub heuristic_columns: usize,
    pub exact_columns: usize,
    /// Improving columns that were already part of the master problem
    pub duplicate_columns: usize,
    /// Pricing results that missed λ by less than the tolerance
    pub near_ties: usize,
    /// Connectivity cuts added to all pricing subproblems
    pub cuts: usize,
    /// Objective of the last master relaxation
    pub lp_bound: f64,
    pub integral_cost: f64,
    /// False if the round limit stopped the pricing
    pub converged: bool,
}

impl SolveStatistics {
    pub fn generated_columns(&self) -> usize {
        self.heuristic_columns + self.exact_columns
    }
}

#[derive(Clone, Debug)]
pub struct SegmentationResult {
    pub segmentation: Segmentation,
    pub statistics: SolveStatistics,
    /// Duals of the last master relaxation if the pricing converged; no connected segment
    /// has a reduced cost below their λ (up to the tolerance)
    pub final_duals: Option<DualSnapshot>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Pricing,
    Integral,
    Done,
}

pub struct ColumnGeneration<'a, M: LinearModel = HighsModel> {
    graph: &'a SuperpixelGraph,
    masters: Vec<Node>,
    config: ColumnGenerationConfig,
    master: MasterProblem<M>,
    engine: PricingEngine<M>,
    initial_segments: Vec<Segment>,
    phase: Phase,
    statistics: SolveStatistics,
    final_duals: Option<DualSnapshot>,
    result: Option<SegmentationResult>,
}

impl<'a, M: LinearModel> ColumnGeneration<'a, M> {
    /// Validates the instance and sets up master problem and pricing. `k` is the number of
    /// requested segments which has to match the number of master nodes.
    pub fn new(
        graph: &'a SuperpixelGraph,
        masters: &[Node],
        k: usize,
        config: ColumnGenerationConfig,
    ) -> Result<Self> {
        if let Some(&t) = masters.iter().find(|&&t| t >= graph.number_of_nodes()) {
            return Err(SegmentationError::InvalidInstance(format!(
                "master node {t} exceeds the number of nodes {}",
                graph.number_of_nodes()
            )));
        }

        if k != masters.len() {
            return Err(SegmentationError::InfeasibleMaster(format!(
                "{k} segments requested, but {} master nodes given",
                masters.len()
            )));
        }

        if masters.is_empty() {
            return Err(SegmentationError::InfeasibleMaster(
                "at least one master node is required".into(),
            ));
        }

        let mut seen = FxHashSet::default();
        if let Some(&t) = masters.iter().find(|&&t| !seen.insert(t)) {
            return Err(SegmentationError::PricingInfeasible { master: t });
        }

        let initial_segments = initial_partition(graph, masters)?;
        let master = MasterProblem::initialize(graph, masters, &initial_segments, &config.solver);
        let engine = PricingEngine::new(graph, masters, &config);

        info!(
            "Column generation on n={} m={} with k={k}",
            graph.number_of_nodes(),
            graph.number_of_edges()
        );

        Ok(Self {
            graph,
            masters: masters.to_vec(),
            config,
            master,
            engine,
            initial_segments,
            phase: Phase::Pricing,
            statistics: SolveStatistics::default(),
            final_duals: None,
            result: None,
        })
    }

    pub fn statistics(&self) -> &SolveStatistics {
        &self.statistics
    }

    /// Ends the pricing phase; the next step solves the integral master on the columns
    /// generated so far
    pub fn stop_pricing(&mut self) {
        if self.phase == Phase::Pricing {
            info!("Pricing stopped after {} rounds", self.statistics.rounds);
            self.phase = Phase::Integral;
        }
    }

    fn pricing_round(&mut self) -> Result<()> {
        self.statistics.rounds += 1;
        self.statistics.lp_bound = self.master.solve_relaxation()?;

        let duals = self
            .master
            .current_duals()
            .ok_or(SegmentationError::SolverFailure {
                stage: Stage::MasterRelaxation,
                source: LpError::NotSolved,
            })?;

        let outcomes = self.engine.price_one_round(self.graph, duals.clone())?;
        self.statistics.cuts = self.engine.number_of_cuts();

        let mut added = 0;
        let mut infeasible = None;
        for (&t, outcome) in self.masters.iter().zip(outcomes) {
            match outcome {
                PricingOutcome::Column {
                    segment,
                    reduced_cost,
                    origin,
                } => {
                    if self.master.add_column(segment) {
                        added += 1;
                        match origin {
                            ColumnOrigin::Heuristic => self.statistics.heuristic_columns += 1,
                            ColumnOrigin::Exact => self.statistics.exact_columns += 1,
                        }
                    } else {
                        debug!("Master node {t}: improving column ({reduced_cost}) is known");
                        self.statistics.duplicate_columns += 1;
                    }
                }
                PricingOutcome::NoImprovingColumn { near_tie } => {
                    self.statistics.near_ties += near_tie as usize;
                }
                PricingOutcome::Infeasible => {
                    infeasible.get_or_insert(t);
                }
            }
        }

        info!(
            "Round {:>4}: lp={:.4} λ={:.4} added={added} columns={} cuts={}",
            self.statistics.rounds,
            self.statistics.lp_bound,
            duals.cardinality_dual(),
            self.master.number_of_real_columns(),
            self.statistics.cuts
        );

        if let Some(master) = infeasible {
            return Err(if self.statistics.generated_columns() == 0 {
                SegmentationError::InfeasibleMaster(format!(
                    "no column was generated; pricing of master node {master} is infeasible"
                ))
            } else {
                SegmentationError::PricingInfeasible { master }
            });
        }

        if added == 0 {
            if self.statistics.generated_columns() == 0 {
                return Err(SegmentationError::InfeasibleMaster(
                    "pricing did not produce any column".into(),
                ));
            }

            info!("Pricing converged after {} rounds", self.statistics.rounds);
            self.statistics.converged = true;
            self.final_duals = Some(duals);
            self.phase = Phase::Integral;
        } else if self
            .config
            .max_rounds
            .is_some_and(|max| self.statistics.rounds >= max)
        {
            warn!(
                "Round limit of {} reached before the pricing converged",
                self.statistics.rounds
            );
            self.phase = Phase::Integral;
        }

        Ok(())
    }

    fn integral_solve(&mut self) -> Result<()> {
        // the warm start is a feasible partition; as regular columns they guarantee an
        // integral solution without placeholders
        for segment in &self.initial_segments {
            self.master.add_column(segment.clone());
        }

        self.statistics.integral_cost = self.master.solve_integral()?;
        let segmentation = Segmentation::new(self.masters.clone(), self.master.extract_solution()?);

        if let Err(defect) = segmentation.is_correct(self.graph) {
            return Err(SegmentationError::InfeasibleMaster(format!(
                "integral master returned an invalid segmentation: {defect}"
            )));
        }

        info!(
            "Integral master: cost={:.4}, lp bound={:.4}, columns={}",
            self.statistics.integral_cost,
            self.statistics.lp_bound,
            self.master.number_of_real_columns()
        );

        self.result = Some(SegmentationResult {
            segmentation,
            statistics: self.statistics.clone(),
            final_duals: self.final_duals.take(),
        });
        self.phase = Phase::Done;
        Ok(())
    }
}

impl<M: LinearModel> IterativeAlgorithm<SegmentationResult> for ColumnGeneration<'_, M> {
    fn execute_step(&mut self) -> Result<()> {
        match self.phase {
            Phase::Pricing => self.pricing_round(),
            Phase::Integral => self.integral_solve(),
            Phase::Done => Ok(()),
        }
    }

    fn is_completed(&self) -> bool {
        self.phase == Phase::Done
    }

    fn best_known_solution(&mut self) -> Option<SegmentationResult> {
        self.result.clone()
    }
}

impl<M: LinearModel> TerminatingIterativeAlgorithm<SegmentationResult>
    for ColumnGeneration<'_, M>
{
}

/// Partitions `graph` into `k` connected segments, one per master node, minimizing the
/// total color deviation from the master nodes
pub fn segment(
    graph: &SuperpixelGraph,
    masters: &[Node],
    k: usize,
    config: ColumnGenerationConfig,
) -> Result<SegmentationResult> {
    let mut algo: ColumnGeneration = ColumnGeneration::new(graph, masters, k, config)?;
    algo.run_to_completion()?.ok_or_else(|| {
        SegmentationError::InfeasibleMaster("column generation ended without a solution".into())
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::{ConnectivityMode, PricingStrategy},
        testing::*,
    };
    use itertools::Itertools;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;
    use std::time::Duration;

    const EPS: f64 = 1e-6;

    fn configs() -> Vec<ColumnGenerationConfig> {
        [
            (PricingStrategy::HeuristicThenExact, ConnectivityMode::Cuts),
            (PricingStrategy::ExactOnly, ConnectivityMode::Cuts),
            (PricingStrategy::HeuristicThenExact, ConnectivityMode::Flow),
            (PricingStrategy::ExactOnly, ConnectivityMode::FlowAndCuts),
        ]
        .into_iter()
        .map(|(strategy, connectivity)| ColumnGenerationConfig {
            strategy,
            connectivity,
            ..Default::default()
        })
        .collect()
    }

    #[test]
    fn path_scenario() {
        let graph = path_graph(&[0.0, 10.0, 10.0, 100.0]);
        for config in configs() {
            let result = segment(&graph, &[0, 3], 2, config).unwrap();
            let segmentation = &result.segmentation;

            assert_eq!(segmentation.number_of_segments(), 2);
            assert_eq!(segmentation.segment_of(0).unwrap().nodes(), &[0, 1, 2]);
            assert_eq!(segmentation.segment_of(0).unwrap().cost(), 20.0);
            assert_eq!(segmentation.segment_of(3).unwrap().nodes(), &[3]);
            assert_eq!(segmentation.segment_of(3).unwrap().cost(), 0.0);
            assert!((segmentation.total_cost() - 20.0).abs() < EPS);
            assert!((result.statistics.lp_bound - 20.0).abs() < EPS);
            assert!(result.statistics.converged);
        }
    }

    #[test]
    fn more_segments_than_master_nodes() {
        let graph = path_graph(&[0.0, 10.0, 10.0, 100.0]);
        assert!(matches!(
            segment(&graph, &[0, 3], 3, Default::default()),
            Err(SegmentationError::InfeasibleMaster(_))
        ));
    }

    #[test]
    fn invalid_master_lists() {
        let graph = path_graph(&[0.0, 10.0, 10.0, 100.0]);
        assert!(matches!(
            segment(&graph, &[0, 0], 2, Default::default()),
            Err(SegmentationError::PricingInfeasible { master: 0 })
        ));
        assert!(matches!(
            segment(&graph, &[0, 4], 2, Default::default()),
            Err(SegmentationError::InvalidInstance(_))
        ));
        assert!(matches!(
            segment(&graph, &[], 0, Default::default()),
            Err(SegmentationError::InfeasibleMaster(_))
        ));
    }

    #[test]
    fn disconnected_graph() {
        let graph = SuperpixelGraph::test_only_from([0.0; 4], [(0, 1), (2, 3)]);
        assert!(matches!(
            segment(&graph, &[0], 1, Default::default()),
            Err(SegmentationError::InfeasibleMaster(_))
        ));
        assert!(segment(&graph, &[0, 3], 2, Default::default()).is_ok());
    }

    #[test]
    fn invalid_solver_options_are_reported() {
        let graph = path_graph(&[0.0, 10.0, 10.0, 100.0]);
        let config: ColumnGenerationConfig =
            serde_json::from_str(r#"{"solver": {"time_limit": -1}}"#).unwrap();

        assert!(matches!(
            segment(&graph, &[0, 3], 2, config),
            Err(SegmentationError::SolverFailure {
                stage: Stage::MasterRelaxation,
                source: LpError::InvalidOption(_),
            })
        ));
    }

    #[test]
    fn single_master_takes_everything() {
        let graph = path_graph(&[5.0, 1.0, 7.0]);
        let result = segment(&graph, &[1], 1, Default::default()).unwrap();
        assert_eq!(result.segmentation.segments()[0].nodes(), &[0, 1, 2]);
        assert!((result.segmentation.total_cost() - 10.0).abs() < EPS);
    }

    #[test]
    fn demo_instance_is_solved() {
        let (graph, masters) = demo_instance();
        for config in configs() {
            let result = segment(&graph, &masters, masters.len(), config.clone()).unwrap();
            let segmentation = &result.segmentation;
            assert!(segmentation.is_correct(&graph).is_ok());

            let optimum = brute_force_optimum(&graph, &masters).unwrap();
            let stats = &result.statistics;
            assert!(stats.lp_bound <= optimum + EPS, "{config:?}");
            assert!(optimum <= segmentation.total_cost() + EPS, "{config:?}");
            assert!((stats.integral_cost - segmentation.total_cost()).abs() < EPS);
        }
    }

    #[test]
    fn random_instances_against_brute_force() {
        let rng = &mut Pcg64Mcg::seed_from_u64(0xdead_beef);
        for (graph, masters) in random_instances(rng, 12, 9) {
            let config = ColumnGenerationConfig {
                strategy: if rng.gen_bool(0.5) {
                    PricingStrategy::HeuristicThenExact
                } else {
                    PricingStrategy::ExactOnly
                },
                ..Default::default()
            };

            let result = segment(&graph, &masters, masters.len(), config.clone()).unwrap();
            let segmentation = &result.segmentation;

            // partition, cardinality, connectivity and cost consistency
            assert!(segmentation.is_correct(&graph).is_ok(), "{graph:?}");
            assert_eq!(segmentation.number_of_segments(), masters.len());
            for s in segmentation.segments() {
                let recomputed = s
                    .nodes()
                    .iter()
                    .map(|&u| (graph.color_of(u) - graph.color_of(s.master())).abs())
                    .sum::<f64>();
                assert!((s.cost() - recomputed).abs() < EPS);
            }

            let optimum = brute_force_optimum(&graph, &masters).unwrap();
            assert!(result.statistics.lp_bound <= optimum + 1e-4, "{graph:?}");
            assert!(optimum <= segmentation.total_cost() + EPS, "{graph:?}");

            // reduced-cost optimality at termination
            let duals = result.final_duals.as_ref().unwrap();
            for (i, &t) in masters.iter().enumerate() {
                let others = masters
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, &u)| u)
                    .collect_vec();

                for nodes in connected_subsets_containing(&graph, t, &others) {
                    let rc = Segment::new(&graph, t, nodes).reduced_cost(duals);
                    assert!(
                        !config.is_improving(rc, duals.cardinality_dual() - 1e-4),
                        "{graph:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn paths_are_solved_to_optimality() {
        // on paths the master LP is integral, so the bound is tight
        let rng = &mut Pcg64Mcg::seed_from_u64(0x5eed);
        for _ in 0..10 {
            let n = rng.gen_range(3..10);
            let colors = (0..n).map(|_| rng.gen_range(0..5) as f64 * 10.0).collect_vec();
            let graph = path_graph(&colors);
            let k = rng.gen_range(1..=3.min(n));
            let masters = random_master_nodes(rng, n as NumNodes, k as NumNodes);

            let result = segment(&graph, &masters, k, Default::default()).unwrap();
            let optimum = brute_force_optimum(&graph, &masters).unwrap();
            assert!((result.segmentation.total_cost() - optimum).abs() < 1e-4);
            assert!((result.statistics.lp_bound - optimum).abs() < 1e-4);
        }
    }

    #[test]
    fn round_limit() {
        let (graph, masters) = demo_instance();
        let config = ColumnGenerationConfig {
            max_rounds: Some(1),
            ..Default::default()
        };

        let result = segment(&graph, &masters, masters.len(), config).unwrap();
        assert_eq!(result.statistics.rounds, 1);
        assert!(!result.statistics.converged);
        assert!(result.final_duals.is_none());
        assert!(result.segmentation.is_correct(&graph).is_ok());
    }

    #[test]
    fn stepwise_execution() {
        let (graph, masters) = demo_instance();
        let mut algo: ColumnGeneration =
            ColumnGeneration::new(&graph, &masters, masters.len(), Default::default()).unwrap();

        algo.execute_step().unwrap();
        assert_eq!(algo.statistics().rounds, 1);
        assert!(algo.best_known_solution().is_none());

        algo.run_until_timeout(Duration::ZERO).unwrap();
        assert_eq!(algo.statistics().rounds, 2);

        algo.stop_pricing();
        let result = algo.run_to_completion().unwrap().unwrap();
        assert!(algo.is_completed());
        assert!(result.segmentation.is_correct(&graph).is_ok());
    }
}
