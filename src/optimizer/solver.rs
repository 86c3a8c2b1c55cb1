//! Linear program representation and the solver capability
//!
//! The allocation model is written against [`LinearProgram`], a plain
//! index-addressed maximisation problem. Any backend that implements
//! [`LinearProgramSolver`] can solve it; [`MicroLpSolver`] is the default,
//! and [`DeadlineSolver`] adds a time limit around another solver.

use microlp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem};
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Index of a variable in a [`LinearProgram`]
pub type VarId = usize;

/// Slack allowed when checking a constraint that has no terms
const EMPTY_ROW_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Le,
    Ge,
}

impl Comparison {
    /// Whether `lhs <cmp> rhs` holds within `tolerance`
    pub fn holds(&self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Comparison::Eq => (lhs - rhs).abs() <= tolerance,
            Comparison::Le => lhs <= rhs + tolerance,
            Comparison::Ge => lhs + tolerance >= rhs,
        }
    }
}

/// A continuous decision variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name: String,
    /// Coefficient in the maximised objective
    pub objective: f64,
    pub lower: f64,
    /// May be infinite
    pub upper: f64,
}

/// `Σ coeff·x  <cmp>  rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub label: String,
    pub terms: Vec<(VarId, f64)>,
    pub comparison: Comparison,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(var, coeff)| coeff * values[var]).sum()
    }
}

/// Continuous maximisation problem
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearProgram {
    variables: Vec<VariableDef>,
    constraints: Vec<LinearConstraint>,
    objective_constant: f64,
}

impl LinearProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        objective: f64,
        (lower, upper): (f64, f64),
    ) -> VarId {
        self.variables.push(VariableDef {
            name: name.into(),
            objective,
            lower,
            upper,
        });
        self.variables.len() - 1
    }

    pub fn add_constraint(
        &mut self,
        label: impl Into<String>,
        terms: Vec<(VarId, f64)>,
        comparison: Comparison,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            label: label.into(),
            terms,
            comparison,
            rhs,
        });
    }

    /// Constant added to the objective; does not affect the optimum
    pub fn set_objective_constant(&mut self, constant: f64) {
        self.objective_constant = constant;
    }

    pub fn objective_constant(&self) -> f64 {
        self.objective_constant
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn constraint(&self, label: &str) -> Option<&LinearConstraint> {
        self.constraints.iter().find(|c| c.label == label)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Objective value of an assignment, constant included
    pub fn evaluate_objective(&self, values: &[f64]) -> f64 {
        self.objective_constant
            + self
                .variables
                .iter()
                .zip(values)
                .map(|(var, value)| var.objective * value)
                .sum::<f64>()
    }

    /// Whether an assignment satisfies every bound and constraint
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let within_bounds = self
            .variables
            .iter()
            .zip(values)
            .all(|(var, &v)| v + tolerance >= var.lower && v <= var.upper + tolerance);

        within_bounds
            && self
                .constraints
                .iter()
                .all(|c| c.comparison.holds(c.lhs(values), c.rhs, tolerance))
    }
}

/// Solver verdict on a solve attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Anything else: solver error, time limit, ...
    Other(String),
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationStatus::Optimal => f.write_str("optimal"),
            TerminationStatus::Infeasible => f.write_str("infeasible"),
            TerminationStatus::Unbounded => f.write_str("unbounded"),
            TerminationStatus::Other(reason) => f.write_str(reason),
        }
    }
}

/// Status plus variable values, indexed like the program's variables
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: TerminationStatus,
    pub values: Vec<f64>,
    /// Objective including the program's constant, when optimal
    pub objective: Option<f64>,
}

impl SolveOutcome {
    pub fn optimal(values: Vec<f64>, objective: f64) -> Self {
        Self {
            status: TerminationStatus::Optimal,
            values,
            objective: Some(objective),
        }
    }

    pub fn terminated(status: TerminationStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == TerminationStatus::Optimal
    }
}

/// Anything that can solve a continuous linear program
pub trait LinearProgramSolver {
    fn solve(&self, program: &LinearProgram) -> SolveOutcome;
}

/// Pure-Rust simplex backend
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl LinearProgramSolver for MicroLpSolver {
    fn solve(&self, program: &LinearProgram) -> SolveOutcome {
        let mut problem = Problem::new(OptimizationDirection::Maximize);

        let vars: Vec<_> = program
            .variables()
            .iter()
            .map(|v| problem.add_var(v.objective, (v.lower, v.upper)))
            .collect();

        for constraint in program.constraints() {
            // A row with no terms is just a check on its right-hand side
            if constraint.terms.is_empty() {
                if !constraint
                    .comparison
                    .holds(0.0, constraint.rhs, EMPTY_ROW_TOLERANCE)
                {
                    log::debug!("Empty constraint '{}' cannot hold", constraint.label);
                    return SolveOutcome::terminated(TerminationStatus::Infeasible);
                }
                continue;
            }

            let mut expr = LinearExpr::empty();
            for &(var, coeff) in &constraint.terms {
                expr.add(vars[var], coeff);
            }
            let op = match constraint.comparison {
                Comparison::Eq => ComparisonOp::Eq,
                Comparison::Le => ComparisonOp::Le,
                Comparison::Ge => ComparisonOp::Ge,
            };
            problem.add_constraint(expr, op, constraint.rhs);
        }

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = vars.iter().map(|&var| solution[var]).collect();
                let objective = solution.objective() + program.objective_constant();
                SolveOutcome::optimal(values, objective)
            }
            Err(microlp::Error::Infeasible) => {
                SolveOutcome::terminated(TerminationStatus::Infeasible)
            }
            Err(microlp::Error::Unbounded) => {
                SolveOutcome::terminated(TerminationStatus::Unbounded)
            }
            #[allow(unreachable_patterns)]
            Err(err) => SolveOutcome::terminated(TerminationStatus::Other(err.to_string())),
        }
    }
}

/// Reason reported when the deadline passes
pub const TIME_LIMIT_REASON: &str = "time limit exceeded";

/// Runs another solver on a worker thread and stops waiting after `timeout`.
///
/// The worker is not cancelled; its late result is discarded.
#[derive(Clone)]
pub struct DeadlineSolver {
    inner: Arc<dyn LinearProgramSolver + Send + Sync>,
    timeout: Duration,
}

impl DeadlineSolver {
    pub fn new(inner: Arc<dyn LinearProgramSolver + Send + Sync>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for DeadlineSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineSolver")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LinearProgramSolver for DeadlineSolver {
    fn solve(&self, program: &LinearProgram) -> SolveOutcome {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let program = program.clone();

        let spawned = thread::Builder::new()
            .name("lp-solve".to_string())
            .spawn(move || {
                // Receiver may be gone after a timeout
                let _ = tx.send(inner.solve(&program));
            });
        if let Err(err) = spawned {
            return SolveOutcome::terminated(TerminationStatus::Other(format!(
                "could not start solver thread: {}",
                err
            )));
        }

        match rx.recv_timeout(self.timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("Solver did not finish within {:?}", self.timeout);
                SolveOutcome::terminated(TerminationStatus::Other(TIME_LIMIT_REASON.to_string()))
            }
            Err(RecvTimeoutError::Disconnected) => SolveOutcome::terminated(
                TerminationStatus::Other("solver stopped without a result".to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// max 3x + 2y  s.t.  x + y <= 4,  x + 3y <= 6,  x <= 3
    fn small_program() -> LinearProgram {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 3.0, (0.0, 3.0));
        let y = lp.add_variable("y", 2.0, (0.0, f64::INFINITY));
        lp.add_constraint("a", vec![(x, 1.0), (y, 1.0)], Comparison::Le, 4.0);
        lp.add_constraint("b", vec![(x, 1.0), (y, 3.0)], Comparison::Le, 6.0);
        lp
    }

    #[test]
    fn test_microlp_solves_small_program() {
        let mut lp = small_program();
        lp.set_objective_constant(0.5);

        let outcome = MicroLpSolver.solve(&lp);
        assert!(outcome.is_optimal());
        assert_abs_diff_eq!(outcome.values[0], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.values[1], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.objective.unwrap(), 11.5, epsilon = 1e-9);
        assert!(lp.is_feasible(&outcome.values, 1e-9));
        assert_abs_diff_eq!(lp.evaluate_objective(&outcome.values), 11.5, epsilon = 1e-9);
    }

    #[test]
    fn test_microlp_reports_infeasible() {
        let mut lp = small_program();
        lp.add_constraint("c", vec![(0, 1.0), (1, 1.0)], Comparison::Ge, 10.0);
        let outcome = MicroLpSolver.solve(&lp);
        assert_eq!(outcome.status, TerminationStatus::Infeasible);
        assert!(outcome.values.is_empty());
    }

    #[test]
    fn test_microlp_reports_unbounded() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x", 1.0, (0.0, f64::INFINITY));
        lp.add_constraint("floor", vec![(x, 1.0)], Comparison::Ge, 1.0);
        let outcome = MicroLpSolver.solve(&lp);
        assert_eq!(outcome.status, TerminationStatus::Unbounded);
    }

    #[test]
    fn test_empty_row_checked_without_solver() {
        let mut lp = small_program();
        lp.add_constraint("nothing", vec![], Comparison::Eq, 0.0);
        assert!(MicroLpSolver.solve(&lp).is_optimal());

        lp.add_constraint("unfundable", vec![], Comparison::Eq, 500.0);
        assert_eq!(MicroLpSolver.solve(&lp).status, TerminationStatus::Infeasible);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TerminationStatus::Optimal.to_string(), "optimal");
        assert_eq!(TerminationStatus::Infeasible.to_string(), "infeasible");
        assert_eq!(TerminationStatus::Unbounded.to_string(), "unbounded");
        assert_eq!(
            TerminationStatus::Other("iteration limit".to_string()).to_string(),
            "iteration limit"
        );
    }

    struct SlowSolver(Duration);

    impl LinearProgramSolver for SlowSolver {
        fn solve(&self, program: &LinearProgram) -> SolveOutcome {
            thread::sleep(self.0);
            MicroLpSolver.solve(program)
        }
    }

    #[test]
    fn test_deadline_maps_timeout_to_other() {
        let solver = DeadlineSolver::new(
            Arc::new(SlowSolver(Duration::from_millis(500))),
            Duration::from_millis(20),
        );
        let outcome = solver.solve(&small_program());
        assert_eq!(
            outcome.status,
            TerminationStatus::Other(TIME_LIMIT_REASON.to_string())
        );
    }

    #[test]
    fn test_deadline_passes_through_fast_result() {
        let solver = DeadlineSolver::new(Arc::new(MicroLpSolver), Duration::from_secs(10));
        let outcome = solver.solve(&small_program());
        assert!(outcome.is_optimal());
    }
}
