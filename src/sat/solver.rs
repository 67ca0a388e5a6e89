//! SAT solver integration using CaDiCaL

use super::{Clause, CnfFormula};
use crate::error::{DesignError, DesignResult};
use cadical::{Callbacks, Solver};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag a caller can raise to stop an in-flight solve
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Limits applied to a single solve call
#[derive(Debug, Clone, Default)]
pub struct SolveBudget {
    pub timeout: Option<Duration>,
    pub cancel: CancelToken,
}

impl SolveBudget {
    pub fn new(timeout: Option<Duration>, cancel: CancelToken) -> Self {
        Self { timeout, cancel }
    }

    /// Budget with a timeout in seconds, where zero means unlimited
    pub fn from_seconds(timeout_seconds: u64, cancel: CancelToken) -> Self {
        let timeout = (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds));
        Self { timeout, cancel }
    }

    pub(crate) fn deadline_from(&self, start: Instant) -> Option<Instant> {
        self.timeout.map(|t| start + t)
    }
}

/// Why a solve ended without a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownReason {
    Timeout,
    Cancelled,
}

/// Result of SAT solving
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Satisfiable(SolverSolution),
    Unsatisfiable,
    Unknown(UnknownReason),
}

impl SolveOutcome {
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, SolveOutcome::Satisfiable(_))
    }

    pub fn solution(&self) -> Option<&SolverSolution> {
        match self {
            SolveOutcome::Satisfiable(solution) => Some(solution),
            _ => None,
        }
    }
}

/// A satisfying assignment and how long it took to find
#[derive(Debug, Clone)]
pub struct SolverSolution {
    pub assignment: HashMap<i32, bool>,
    pub solve_time: Duration,
}

/// Terminate hook polled by CaDiCaL during search
struct BudgetCallbacks {
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl Callbacks for BudgetCallbacks {
    fn started(&mut self) {
        self.deadline = self.timeout.map(|t| Instant::now() + t);
    }

    fn terminate(&mut self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// SAT solver wrapper for CaDiCaL
pub struct SatSolver {
    solver: Solver<BudgetCallbacks>,
    variable_count: usize,
    clause_count: usize,
}

impl SatSolver {
    /// Create a new SAT solver instance
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            variable_count: 0,
            clause_count: 0,
        }
    }

    /// Add a single clause to the solver. An empty clause makes the formula unsatisfiable.
    pub fn add_clause(&mut self, clause: &Clause) {
        self.variable_count = self.variable_count.max(clause.max_variable() as usize);
        self.solver.add_clause(clause.literals.iter().copied());
        self.clause_count += 1;
    }

    /// Add clauses to the solver
    pub fn add_clauses(&mut self, clauses: &[Clause]) {
        for clause in clauses {
            self.add_clause(clause);
        }
    }

    /// Load a whole formula, keeping its declared variable count
    pub fn add_formula(&mut self, formula: &CnfFormula) {
        self.add_clauses(formula.clauses());
        self.variable_count = self.variable_count.max(formula.num_vars());
    }

    /// Solve under `budget`; the cancel flag and deadline are polled from
    /// CaDiCaL's terminate callback.
    pub fn solve(&mut self, budget: &SolveBudget) -> DesignResult<SolveOutcome> {
        if budget.cancel.is_cancelled() {
            return Ok(SolveOutcome::Unknown(UnknownReason::Cancelled));
        }

        self.solver.set_callbacks(Some(BudgetCallbacks {
            timeout: budget.timeout,
            deadline: None,
            cancel: budget.cancel.clone(),
        }));

        log::debug!(
            "CaDiCaL solving {} variables, {} clauses",
            self.variable_count,
            self.clause_count
        );
        let start_time = Instant::now();
        let result = self.solver.solve();
        let solve_time = start_time.elapsed();

        match result {
            Some(true) => Ok(SolveOutcome::Satisfiable(SolverSolution {
                assignment: self.extract_assignment(),
                solve_time,
            })),
            Some(false) => Ok(SolveOutcome::Unsatisfiable),
            None if budget.cancel.is_cancelled() => {
                Ok(SolveOutcome::Unknown(UnknownReason::Cancelled))
            }
            None if budget.timeout.is_some() => Ok(SolveOutcome::Unknown(UnknownReason::Timeout)),
            None => Err(DesignError::protocol(
                "CaDiCaL stopped without a result and no budget was exhausted",
                "",
            )),
        }
    }

    /// Extract variable assignment from the solver; unassigned variables read as false
    fn extract_assignment(&self) -> HashMap<i32, bool> {
        (1..=self.variable_count as i32)
            .map(|var| (var, self.solver.value(var).unwrap_or(false)))
            .collect()
    }

    /// Get the number of variables
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// Get the number of clauses
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }
}

impl Default for SatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SolverSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Solution:")?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        writeln!(f, "  Variables assigned: {}", self.assignment.len())?;

        let mut vars: Vec<_> = self.assignment.keys().collect();
        vars.sort();

        write!(f, "  Sample assignments: ")?;
        for (i, &var) in vars.iter().take(10).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let value = self.assignment[var];
            write!(f, "{}={}", var, if value { "T" } else { "F" })?;
        }
        if vars.len() > 10 {
            write!(f, ", ...")?;
        }
        writeln!(f)?;

        Ok(())
    }
}
