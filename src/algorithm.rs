//! Long running solvers implement the [`IterativeAlgorithm`] trait.
//!
//! An algorithm does a bounded amount of work per step (e.g. one pricing round) and then
//! returns to its caller, which decides whether to continue, e.g. depending on a time budget.

use std::time::{Duration, Instant};

use crate::errors::Result;

/// [`IterativeAlgorithm`] provides a consistent interface to execute our algorithms. It does
/// not prescribe a constructor as each algorithm has specific parameters; construction
/// should only involve little computation.
///
/// As an adopter of [`IterativeAlgorithm`], you have to implement
///   [`IterativeAlgorithm::execute_step`],
///   [`IterativeAlgorithm::is_completed`] and [`IterativeAlgorithm::best_known_solution`].
///
/// If your algorithm is known to eventually terminate please also implement the marker trait
/// [`TerminatingIterativeAlgorithm`].
///
/// # Example
/// ```
/// use spseg::algorithm::IterativeAlgorithm;
/// use spseg::errors::Result;
///
/// struct Countdown {
///     remaining: u32,
/// }
///
/// impl IterativeAlgorithm<u32> for Countdown {
///     fn execute_step(&mut self) -> Result<()> {
///         self.remaining -= 1;
///         Ok(())
///     }
///
///     fn is_completed(&self) -> bool {
///         self.remaining == 0
///     }
///
///     fn best_known_solution(&mut self) -> Option<u32> {
///         self.is_completed().then_some(42)
///     }
/// }
///
/// let mut algo = Countdown { remaining: 3 };
/// algo.run_while(|_| true).unwrap();
/// assert_eq!(algo.best_known_solution(), Some(42));
/// ```
pub trait IterativeAlgorithm<T> {
    /// Advances the computation. Errors are fatal; the algorithm must not be stepped again.
    fn execute_step(&mut self) -> Result<()>;

    /// Returns true iff the algorithm is completed and [`IterativeAlgorithm::execute_step`] may not
    /// be called again.
    fn is_completed(&self) -> bool;

    /// Returns the currently best known solution or None if no solution is known yet.
    fn best_known_solution(&mut self) -> Option<T>;

    /// Keeps calling [`IterativeAlgorithm::execute_step`] until the `predicate` becomes false
    /// or [`IterativeAlgorithm::is_completed`] becomes true. The `predicate` is evaluated after
    /// each step, i.e. a step is carried out even if the predicate always returns false.
    fn run_while<F: FnMut(&mut Self) -> bool>(&mut self, mut predicate: F) -> Result<()> {
        while !self.is_completed() {
            self.execute_step()?;

            if !predicate(self) {
                break;
            }
        }
        Ok(())
    }

    /// Keeps calling [`IterativeAlgorithm::execute_step`] until either the timeout elapsed or
    /// [`IterativeAlgorithm::is_completed`] is true. A step that is already running is not
    /// interrupted.
    fn run_until_timeout(&mut self, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        self.run_while(|_| start.elapsed() < timeout)
    }
}

/// Marker trait for algorithms that eventually terminate
pub trait TerminatingIterativeAlgorithm<T>: IterativeAlgorithm<T> {
    /// Executes the algorithm until it completed and returns the solution
    fn run_to_completion(&mut self) -> Result<Option<T>> {
        while !self.is_completed() {
            self.execute_step()?;
        }
        Ok(self.best_known_solution())
    }
}
