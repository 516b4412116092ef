use std::{fs::File, io::BufReader, path::Path, str::FromStr};

use anyhow::anyhow;

use serde::{Deserialize, Serialize};

/// How the pricing step searches for improving columns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingStrategy {
    /// Run the greedy heuristic first and fall back to the exact pricer only if it
    /// does not find an improving column
    #[default]
    HeuristicThenExact,

    /// Always solve the exact pricing subproblem
    ExactOnly,
}

impl FromStr for PricingStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "heuristic" | "heuristic-then-exact" => Ok(Self::HeuristicThenExact),
            "exact" | "exact-only" => Ok(Self::ExactOnly),
            _ => Err(anyhow!("unknown pricing strategy \"{s}\"")),
        }
    }
}

/// Which mechanism keeps the selection of the exact pricer connected
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityMode {
    /// Cutting planes from the component separator only
    #[default]
    Cuts,

    /// Single-commodity flow formulation only
    Flow,

    /// Flow formulation, additionally tightened by separated cuts
    FlowAndCuts,
}

impl ConnectivityMode {
    pub fn uses_flow(self) -> bool {
        matches!(self, Self::Flow | Self::FlowAndCuts)
    }

    pub fn separates_relaxation(self) -> bool {
        matches!(self, Self::Cuts | Self::FlowAndCuts)
    }
}

impl FromStr for ConnectivityMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "cuts" => Ok(Self::Cuts),
            "flow" => Ok(Self::Flow),
            "flow-and-cuts" => Ok(Self::FlowAndCuts),
            _ => Err(anyhow!("unknown connectivity mode \"{s}\"")),
        }
    }
}

/// Options handed to every LP/MIP model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Wall clock limit per solve in seconds
    pub time_limit: Option<f64>,

    /// Number of threads a single solve may use
    pub threads: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            time_limit: None,
            threads: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnGenerationConfig {
    /// Relative tolerance of the improvement test `reduced cost < λ - ε (1 + |λ|)`
    pub epsilon: f64,

    pub strategy: PricingStrategy,

    pub connectivity: ConnectivityMode,

    /// Variables with a value above this threshold count as selected in a fractional solution
    pub selection_threshold: f64,

    /// Upper bound on the number of pricing rounds; the integral master is solved on the
    /// columns generated so far once it is reached
    pub max_rounds: Option<usize>,

    /// Number of separation rounds on the relaxed pricing model before the integral solve
    pub max_relaxed_cut_rounds: usize,

    pub solver: SolverOptions,
}

impl Default for ColumnGenerationConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            strategy: PricingStrategy::default(),
            connectivity: ConnectivityMode::default(),
            selection_threshold: 1e-6,
            max_rounds: None,
            max_relaxed_cut_rounds: 50,
            solver: SolverOptions::default(),
        }
    }
}

impl ColumnGenerationConfig {
    /// Reads a (possibly partial) configuration from a JSON file; missing keys keep their defaults
    pub fn try_read_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Returns true if `reduced_cost` beats the cardinality dual `lambda` by more than the tolerance
    pub fn is_improving(&self, reduced_cost: f64, lambda: f64) -> bool {
        reduced_cost < lambda - self.tolerance(lambda)
    }

    /// Returns true if `reduced_cost` is below `lambda` but within the tolerance
    pub fn is_near_tie(&self, reduced_cost: f64, lambda: f64) -> bool {
        !self.is_improving(reduced_cost, lambda) && reduced_cost < lambda
    }

    fn tolerance(&self, lambda: f64) -> f64 {
        self.epsilon * (1.0 + lambda.abs())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_json() {
        let config: ColumnGenerationConfig =
            serde_json::from_str(r#"{"strategy": "ExactOnly", "solver": {"threads": 4}}"#).unwrap();
        assert_eq!(config.strategy, PricingStrategy::ExactOnly);
        assert_eq!(config.solver.threads, 4);
        assert_eq!(config.solver.time_limit, None);
        assert_eq!(config.connectivity, ConnectivityMode::Cuts);
        assert_eq!(config.max_relaxed_cut_rounds, 50);
    }

    #[test]
    fn json_file() {
        let config = ColumnGenerationConfig {
            connectivity: ConnectivityMode::FlowAndCuts,
            max_rounds: Some(7),
            ..Default::default()
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        serde_json::to_writer(&mut file, &config).unwrap();
        let read = ColumnGenerationConfig::try_read_json_file(file.path()).unwrap();
        assert_eq!(read, config);
    }

    #[test]
    fn improvement_test() {
        let config = ColumnGenerationConfig::default();
        assert!(config.is_improving(-1.0, 0.0));
        assert!(!config.is_improving(0.0, 0.0));
        assert!(!config.is_improving(-1e-9, 0.0));
        assert!(config.is_near_tie(-1e-9, 0.0));
        assert!(!config.is_near_tie(1e-9, 0.0));

        // tolerance scales with |λ|
        assert!(!config.is_improving(1e6 - 0.5, 1e6));
        assert!(config.is_improving(1e6 - 2.0, 1e6));
    }

    #[test]
    fn parse_from_command_line() {
        assert_eq!(
            "exact".parse::<PricingStrategy>().unwrap(),
            PricingStrategy::ExactOnly
        );
        assert_eq!(
            "heuristic-then-exact".parse::<PricingStrategy>().unwrap(),
            PricingStrategy::HeuristicThenExact
        );
        assert_eq!(
            "flow-and-cuts".parse::<ConnectivityMode>().unwrap(),
            ConnectivityMode::FlowAndCuts
        );
        assert!("Flow".parse::<ConnectivityMode>().is_err());
    }
}
