use itertools::Itertools;
use log::{debug, trace};

use crate::{
    config::{ColumnGenerationConfig, ConnectivityMode},
    connectivity::*,
    errors::{Result, SegmentationError, Stage},
    graph::*,
    lp::*,
};

#[derive(Clone, Debug, PartialEq)]
pub enum ExactOutcome {
    /// Connected optimal selection (containing the root) and its objective value
    Optimal { nodes: Vec<Node>, objective: f64 },
    /// Not even the root can be selected
    Infeasible,
}

/// Exact pricing subproblem of one master node:
///
/// ```text
/// min  sum_s w_s x_s
/// s.t. x_root = 1, x_t = 0 for every other master node t
///      x induces a subgraph connected to the root
///      x in {0, 1}^n
/// ```
///
/// The model is built once. Each call to [`ExactPricer::solve`] only replaces the objective;
/// connectivity cuts found in earlier calls stay in the model as they are valid for every
/// objective.
pub struct ExactPricer<M: LinearModel = HighsModel> {
    model: M,
    root: Node,
    x: Vec<VarId>,
    forbidden: Vec<Node>,
    connectivity: ConnectivityMode,
    selection_threshold: f64,
    max_relaxed_cut_rounds: usize,
    number_of_cuts: usize,
    number_of_solves: usize,
}

impl<M: LinearModel> ExactPricer<M> {
    /// Builds the subproblem of `masters[index]`. A node listed twice in `masters` is
    /// both fixed to one and to zero, which renders the subproblem infeasible.
    pub fn new(
        graph: &SuperpixelGraph,
        masters: &[Node],
        index: usize,
        config: &ColumnGenerationConfig,
    ) -> Self {
        let root = masters[index];
        let mut model = M::with_options(&config.solver);

        let x = graph
            .vertices_range()
            .map(|_| model.add_variable(VarKind::Binary, 0.0, 1.0, 0.0))
            .collect_vec();

        model.set_bounds(x[root as usize], 1.0, 1.0);
        let forbidden = masters
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != index)
            .map(|(_, &t)| t)
            .collect_vec();
        for &t in &forbidden {
            let lower = if t == root { 1.0 } else { 0.0 };
            model.set_bounds(x[t as usize], lower, 0.0);
        }

        if config.connectivity.uses_flow() {
            let capacity = graph.len().saturating_sub(masters.len()) as f64;
            add_flow_formulation(&mut model, graph, root, &x, capacity);
        }

        trace!(
            "Exact pricer of master node {root}: {} variables, {} rows",
            model.number_of_variables(),
            model.number_of_constraints()
        );

        Self {
            model,
            root,
            x,
            forbidden,
            connectivity: config.connectivity,
            selection_threshold: config.selection_threshold,
            max_relaxed_cut_rounds: config.max_relaxed_cut_rounds,
            number_of_cuts: 0,
            number_of_solves: 0,
        }
    }

    pub fn root(&self) -> Node {
        self.root
    }

    /// Total number of connectivity cuts added to the model so far
    pub fn number_of_cuts(&self) -> usize {
        self.number_of_cuts
    }

    /// Total number of LP/MIP solves so far
    pub fn number_of_solves(&self) -> usize {
        self.number_of_solves
    }

    /// Minimizes `sum_s weights[s] x_s` over connected selections containing the root.
    ///
    /// Proceeds in two phases: the relaxation is separated for a bounded number of rounds
    /// (cut modes only), then the integral model is solved and re-solved until its
    /// selection is connected.
    pub fn solve<G: AdjacencyList>(&mut self, graph: &G, weights: &[f64]) -> Result<ExactOutcome> {
        for (&var, &w) in self.x.iter().zip(weights) {
            self.model.set_objective(var, w);
        }

        let separator = ConnectivitySeparator::new(graph, self.root, self.selection_threshold)
            .with_forbidden_nodes(self.forbidden.iter().copied());

        if self.connectivity.separates_relaxation() {
            for _ in 0..self.max_relaxed_cut_rounds {
                if self.solve_model(SolveMode::Relaxed)? == LpStatus::Infeasible {
                    return Ok(ExactOutcome::Infeasible);
                }

                let values = self.values()?;
                let cuts = separator.separate(&values).into_cuts();
                if cuts.is_empty() {
                    break;
                }
                self.add_cuts(&cuts);
            }
        }

        loop {
            if self.solve_model(SolveMode::Integral)? == LpStatus::Infeasible {
                return Ok(ExactOutcome::Infeasible);
            }

            let values = self.values()?;
            let nodes = graph
                .vertices_range()
                .filter(|&u| values[u as usize] > 0.5)
                .collect_vec();

            match separator.separate_selection(&nodes) {
                Separation::Feasible => {
                    let objective = self.model.objective_value().map_err(|source| {
                        SegmentationError::SolverFailure {
                            stage: Stage::Pricing { master: self.root },
                            source,
                        }
                    })?;
                    return Ok(ExactOutcome::Optimal { nodes, objective });
                }
                Separation::Cuts(cuts) => {
                    debug_assert!(!cuts.is_empty());
                    self.add_cuts(&cuts);
                }
            }
        }
    }

    fn solve_model(&mut self, mode: SolveMode) -> Result<LpStatus> {
        self.number_of_solves += 1;
        self.model
            .solve(mode)
            .map_err(|source| SegmentationError::SolverFailure {
                stage: Stage::Pricing { master: self.root },
                source,
            })
    }

    fn values(&self) -> Result<Vec<f64>> {
        self.x
            .iter()
            .map(|&var| self.model.value(var))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|source| SegmentationError::SolverFailure {
                stage: Stage::Pricing { master: self.root },
                source,
            })
    }

    fn add_cuts(&mut self, cuts: &[ConnectivityCut]) {
        debug!("Master node {}: add {} connectivity cuts", self.root, cuts.len());
        for cut in cuts {
            trace!("Cut {:?} >= x_{}", cut.neighbors(), cut.node());
            let x = &self.x;
            self.model.add_constraint(
                0.0,
                f64::INFINITY,
                &mut cut.terms().map(|(u, coef)| (x[u as usize], coef)),
            );
        }
        self.number_of_cuts += cuts.len();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{connected_subsets_containing, path_graph};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    fn pricer(
        graph: &SuperpixelGraph,
        masters: &[Node],
        index: usize,
        connectivity: ConnectivityMode,
    ) -> ExactPricer {
        let config = ColumnGenerationConfig {
            connectivity,
            ..Default::default()
        };
        ExactPricer::new(graph, masters, index, &config)
    }

    const MODES: [ConnectivityMode; 3] = [
        ConnectivityMode::Cuts,
        ConnectivityMode::Flow,
        ConnectivityMode::FlowAndCuts,
    ];

    #[test]
    fn bridge_node() {
        let graph = path_graph(&[0.0; 4]);
        for mode in MODES {
            let mut pricer = pricer(&graph, &[0, 3], 0, mode);
            let outcome = pricer.solve(&graph, &[0.0, 3.0, -10.0, -50.0]).unwrap();
            assert_eq!(
                outcome,
                ExactOutcome::Optimal {
                    nodes: vec![0, 1, 2],
                    objective: -7.0
                },
                "{mode:?}"
            );

            // reuse with another objective
            let outcome = pricer.solve(&graph, &[1.0, 12.0, -10.0, -50.0]).unwrap();
            assert_eq!(
                outcome,
                ExactOutcome::Optimal {
                    nodes: vec![0],
                    objective: 1.0
                },
                "{mode:?}"
            );
        }
    }

    #[test]
    fn cut_mode_adds_cuts() {
        let graph = path_graph(&[0.0; 4]);
        let mut pricer = pricer(&graph, &[0, 3], 0, ConnectivityMode::Cuts);
        pricer.solve(&graph, &[0.0, 3.0, -10.0, 0.0]).unwrap();
        assert!(pricer.number_of_cuts() > 0);
        assert!(pricer.number_of_solves() >= 2);
    }

    #[test]
    fn duplicate_master_is_infeasible() {
        let graph = path_graph(&[0.0; 3]);
        let mut pricer = pricer(&graph, &[1, 1], 0, ConnectivityMode::Cuts);
        assert_eq!(
            pricer.solve(&graph, &[0.0; 3]).unwrap(),
            ExactOutcome::Infeasible
        );
    }

    #[test]
    fn matches_brute_force() {
        let rng = &mut Pcg64Mcg::seed_from_u64(0x1234_5678);
        for _ in 0..6 {
            let graph = random_connected_superpixels(rng, 9, 0.2, &[0.0, 100.0], 20.0);
            let masters = random_master_nodes(rng, 9, 2);
            let weights = (0..9).map(|_| rng.gen_range(-20.0..10.0)).collect_vec();

            let best = connected_subsets_containing(&graph, masters[0], &masters[1..])
                .iter()
                .map(|s| s.iter().map(|&u| weights[u as usize]).sum::<f64>())
                .fold(f64::INFINITY, f64::min);

            for mode in MODES {
                let mut pricer = pricer(&graph, &masters, 0, mode);
                let ExactOutcome::Optimal { nodes, objective } =
                    pricer.solve(&graph, &weights).unwrap()
                else {
                    panic!("pricing must be feasible");
                };

                assert!((objective - best).abs() < 1e-6, "{mode:?}");
                assert!(graph.is_connected_subset(&nodes));
                assert!(nodes.contains(&masters[0]));
                assert!(!nodes.contains(&masters[1]));
            }
        }
    }
}
