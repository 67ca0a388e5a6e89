//! Factory for creating SAT solver instances based on configuration

use super::external_solver::ExternalSatSolver;
use super::solver::{SatSolver, SolveBudget, SolveOutcome};
use super::CnfFormula;
use crate::config::{SolverBackend, SolverConfig};
use crate::error::DesignResult;
use std::path::Path;

/// Unified SAT solver interface that can use different backends.
///
/// Every solve gets a formula of its own: CaDiCaL instances are created per
/// call, and the external solver rewrites its formula file each time.
pub enum UnifiedSatSolver {
    Cadical,
    External(ExternalSatSolver),
}

impl UnifiedSatSolver {
    /// Create a new solver instance based on the configured backend
    pub fn new(config: &SolverConfig, cnf_path: &Path) -> Self {
        match config.backend {
            SolverBackend::Cadical => UnifiedSatSolver::Cadical,
            SolverBackend::External => UnifiedSatSolver::External(ExternalSatSolver::new(
                &config.executable,
                config.verbosity,
                cnf_path,
            )),
        }
    }

    /// Solve one formula under `budget`
    pub fn solve(&self, formula: &CnfFormula, budget: &SolveBudget) -> DesignResult<SolveOutcome> {
        match self {
            UnifiedSatSolver::Cadical => {
                let mut solver = SatSolver::new();
                solver.add_formula(formula);
                solver.solve(budget)
            }
            UnifiedSatSolver::External(solver) => solver.solve(formula, budget),
        }
    }

    /// Get the backend type being used
    pub fn backend(&self) -> SolverBackend {
        match self {
            UnifiedSatSolver::Cadical => SolverBackend::Cadical,
            UnifiedSatSolver::External(_) => SolverBackend::External,
        }
    }
}

impl Default for UnifiedSatSolver {
    fn default() -> Self {
        UnifiedSatSolver::Cadical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::Clause;
    use std::path::PathBuf;

    fn config(backend: SolverBackend) -> SolverConfig {
        SolverConfig {
            backend,
            ..crate::config::Settings::default().solver
        }
    }

    #[test]
    fn test_backend_selection() {
        let cnf = PathBuf::from("formula.cnf");
        let solver = UnifiedSatSolver::new(&config(SolverBackend::Cadical), &cnf);
        assert_eq!(solver.backend(), SolverBackend::Cadical);

        let solver = UnifiedSatSolver::new(&config(SolverBackend::External), &cnf);
        assert_eq!(solver.backend(), SolverBackend::External);
        match solver {
            UnifiedSatSolver::External(external) => {
                assert_eq!(external.formula_path(), cnf.as_path());
                assert_eq!(external.executable(), Path::new("glucose-syrup"));
            }
            UnifiedSatSolver::Cadical => panic!("expected the external backend"),
        }
    }

    #[test]
    fn test_simple_satisfiable_cadical() {
        let solver = UnifiedSatSolver::default();
        let formula = CnfFormula::with_clauses(2, vec![Clause::unit(1), Clause::new(vec![-1, -2])]);

        let outcome = solver.solve(&formula, &SolveBudget::default()).unwrap();
        let solution = outcome.solution().unwrap();
        assert_eq!(solution.assignment.get(&1), Some(&true));
        assert_eq!(solution.assignment.get(&2), Some(&false));
    }

    #[test]
    fn test_unsatisfiable_cadical() {
        let solver = UnifiedSatSolver::default();
        let formula = CnfFormula::with_clauses(1, vec![Clause::unit(1), Clause::unit(-1)]);

        let outcome = solver.solve(&formula, &SolveBudget::default()).unwrap();
        assert!(matches!(outcome, SolveOutcome::Unsatisfiable));
    }

    #[test]
    fn test_solves_are_independent() {
        let solver = UnifiedSatSolver::default();
        let unsat = CnfFormula::with_clauses(1, vec![Clause::unit(1), Clause::unit(-1)]);
        let sat = CnfFormula::with_clauses(1, vec![Clause::unit(1)]);

        assert!(!solver.solve(&unsat, &SolveBudget::default()).unwrap().is_satisfiable());
        assert!(solver.solve(&sat, &SolveBudget::default()).unwrap().is_satisfiable());
    }
}
