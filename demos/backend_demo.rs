//! Demonstration of the solver backends
//!
//! Runs small formulas through the in-process CaDiCaL backend and, when a
//! solver executable is given as the first argument, through the external
//! backend as well.

use dna_word_design::config::{Settings, SolverBackend, SolverConfig};
use dna_word_design::sat::{Clause, CnfFormula, SolveBudget, SolveOutcome, UnifiedSatSolver};
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== SAT Solver Backend Demonstration ===\n");

    let cnf_path = std::env::temp_dir().join("dna_word_design_demo.cnf");
    let defaults = Settings::default().solver;

    test_solver_backend(
        &SolverConfig {
            backend: SolverBackend::Cadical,
            ..defaults.clone()
        },
        &cnf_path,
    )?;

    if let Some(executable) = std::env::args().nth(1) {
        test_solver_backend(
            &SolverConfig {
                backend: SolverBackend::External,
                executable: PathBuf::from(executable),
                verbosity: 0,
                ..defaults
            },
            &cnf_path,
        )?;
    } else {
        println!("Pass a DIMACS solver executable to also exercise the external backend.\n");
    }

    println!("All solver backends working correctly!");
    Ok(())
}

fn test_solver_backend(config: &SolverConfig, cnf_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing {:?} solver backend:", config.backend);
    let solver = UnifiedSatSolver::new(config, cnf_path);
    let budget = SolveBudget::from_seconds(10, Default::default());

    // Test 1: x1
    println!("  Test 1: Simple satisfiable problem (x1)");
    let formula = CnfFormula::with_clauses(1, vec![Clause::unit(1)]);
    match solver.solve(&formula, &budget)? {
        SolveOutcome::Satisfiable(solution) => {
            println!("    SAT - Variable 1 = {:?}", solution.assignment.get(&1));
            println!("    Solve time: {:.3}ms", solution.solve_time.as_secs_f64() * 1000.0);
        }
        other => return Err(format!("Expected SAT but got {:?}", other).into()),
    }

    // Test 2: x1 and not x1
    println!("  Test 2: Unsatisfiable problem (x1, -x1)");
    let formula = CnfFormula::with_clauses(1, vec![Clause::unit(1), Clause::unit(-1)]);
    match solver.solve(&formula, &budget)? {
        SolveOutcome::Unsatisfiable => println!("    UNSAT - Correctly detected contradiction"),
        other => return Err(format!("Expected UNSAT but got {:?}", other).into()),
    }

    // Test 3: enumerate models of x1 or x2 with blocking clauses
    println!("  Test 3: Enumerating models of (x1 or x2)");
    let mut formula = CnfFormula::with_clauses(2, vec![Clause::new(vec![1, 2])]);
    let mut models = 0;
    while let SolveOutcome::Satisfiable(solution) = solver.solve(&formula, &budget)? {
        models += 1;
        let x1 = solution.assignment.get(&1).copied().unwrap_or(false);
        let x2 = solution.assignment.get(&2).copied().unwrap_or(false);
        println!("      Model {}: x1={}, x2={}", models, x1, x2);
        formula.add_clause(Clause::new(vec![if x1 { -1 } else { 1 }, if x2 { -2 } else { 2 }]));
    }
    if models != 3 {
        return Err(format!("Expected 3 models, found {}", models).into());
    }

    println!();
    Ok(())
}
