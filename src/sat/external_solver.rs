//! External DIMACS solver run as a child process

use super::solver::{SolveBudget, SolveOutcome, SolverSolution, UnknownReason};
use super::CnfFormula;
use crate::error::{DesignError, DesignResult};
use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const SAT_EXIT_CODE: i32 = 10;
const UNSAT_EXIT_CODE: i32 = 20;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs `<executable> -model -verb=<verbosity> <formula file>` and reads back its verdict
#[derive(Debug, Clone)]
pub struct ExternalSatSolver {
    executable: PathBuf,
    verbosity: u32,
    formula_path: PathBuf,
}

/// How the child process ended
enum ChildEnd {
    Exited(ExitStatus),
    Stopped(UnknownReason),
}

impl ExternalSatSolver {
    pub fn new(executable: impl Into<PathBuf>, verbosity: u32, formula_path: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            verbosity,
            formula_path: formula_path.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn formula_path(&self) -> &Path {
        &self.formula_path
    }

    /// Write `formula` to the configured path and run the solver on it
    pub fn solve(&self, formula: &CnfFormula, budget: &SolveBudget) -> DesignResult<SolveOutcome> {
        if budget.cancel.is_cancelled() {
            return Ok(SolveOutcome::Unknown(UnknownReason::Cancelled));
        }

        formula
            .write_to_file(&self.formula_path)
            .map_err(|e| std::io::Error::other(format!("{:#}", e)))?;

        log::info!(
            "Running {} on {} ({} variables, {} clauses)",
            self.executable.display(),
            self.formula_path.display(),
            formula.num_vars(),
            formula.num_clauses()
        );

        let start_time = Instant::now();
        let mut child = self.spawn()?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let end = wait_with_budget(&mut child, budget, start_time)?;
        let solve_time = start_time.elapsed();

        let status = match end {
            ChildEnd::Exited(status) => status,
            ChildEnd::Stopped(reason) => {
                // Processes forked by the solver may still hold the pipes open,
                // so the readers are detached instead of joined
                drop(stdout);
                drop(stderr);
                log::warn!("Solver stopped after {:.1}s: {:?}", solve_time.as_secs_f64(), reason);
                return Ok(SolveOutcome::Unknown(reason));
            }
        };

        let stdout = join_output(stdout);
        let stderr = join_output(stderr);

        if !stderr.trim().is_empty() {
            log::debug!("solver stderr:\n{}", stderr);
        }

        let Some(code) = status.code() else {
            return Err(DesignError::protocol(
                format!("solver terminated without an exit code ({})", status),
                stdout,
            ));
        };

        log::debug!("solver exited with code {} after {:.3}s", code, solve_time.as_secs_f64());
        match parse_solver_output(code, &stdout, formula.num_vars())? {
            Some(assignment) => Ok(SolveOutcome::Satisfiable(SolverSolution {
                assignment,
                solve_time,
            })),
            None => Ok(SolveOutcome::Unsatisfiable),
        }
    }

    fn spawn(&self) -> DesignResult<Child> {
        Command::new(&self.executable)
            .arg("-model")
            .arg(format!("-verb={}", self.verbosity))
            .arg(&self.formula_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DesignError::SolverNotFound {
                    executable: self.executable.clone(),
                },
                _ => DesignError::Io(e),
            })
    }
}

/// Read a pipe to the end on its own thread so the child never blocks on a full buffer
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            String::from_utf8_lossy(&buffer).into_owned()
        })
    })
}

fn join_output(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Poll the child until it exits, the deadline passes or the cancel flag is raised
fn wait_with_budget(child: &mut Child, budget: &SolveBudget, start: Instant) -> DesignResult<ChildEnd> {
    let deadline = budget.deadline_from(start);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(ChildEnd::Exited(status));
        }

        let reason = if budget.cancel.is_cancelled() {
            Some(UnknownReason::Cancelled)
        } else if deadline.is_some_and(|d| Instant::now() >= d) {
            Some(UnknownReason::Timeout)
        } else {
            None
        };

        if let Some(reason) = reason {
            // The child may have exited between the poll and the kill
            let _ = child.kill();
            let _ = child.wait();
            return Ok(ChildEnd::Stopped(reason));
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Interpret a DIMACS solver's exit code and standard output.
///
/// Returns the model for a satisfiable answer (variables the solver did not
/// mention read as false) and `None` for an unsatisfiable one. Anything that
/// does not follow the competition output format is a protocol error carrying
/// the raw output.
pub fn parse_solver_output(
    exit_code: i32,
    stdout: &str,
    num_vars: usize,
) -> DesignResult<Option<HashMap<i32, bool>>> {
    let fail = |reason: String| DesignError::protocol(reason, stdout);

    let satisfiable = match exit_code {
        SAT_EXIT_CODE => true,
        UNSAT_EXIT_CODE => false,
        other => return Err(fail(format!("unexpected solver exit code {}", other))),
    };

    let mut status: Option<bool> = None;
    let mut literals: Vec<i32> = Vec::new();
    let mut saw_values = false;
    let mut terminated = false;

    for (number, line) in stdout.lines().enumerate() {
        let number = number + 1;
        let line = line.trim();
        if line.is_empty() || line == "c" || line.starts_with("c ") {
            continue;
        }

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("s") => {
                let verdict = match tokens.collect::<Vec<_>>().as_slice() {
                    ["SATISFIABLE"] => true,
                    ["UNSATISFIABLE"] => false,
                    _ => return Err(fail(format!("line {}: unknown status line '{}'", number, line))),
                };
                if status.replace(verdict).is_some() {
                    return Err(fail(format!("line {}: duplicate status line", number)));
                }
            }
            Some("v") => {
                if terminated {
                    return Err(fail(format!("line {}: value line after the 0 terminator", number)));
                }
                saw_values = true;
                for token in tokens {
                    if terminated {
                        return Err(fail(format!("line {}: token '{}' after the 0 terminator", number, token)));
                    }
                    let literal: i32 = token
                        .parse()
                        .map_err(|_| fail(format!("line {}: invalid literal '{}'", number, token)))?;
                    if literal == 0 {
                        terminated = true;
                    } else if literal.unsigned_abs() as usize > num_vars {
                        return Err(fail(format!(
                            "line {}: literal {} outside the {} declared variables",
                            number, literal, num_vars
                        )));
                    } else {
                        literals.push(literal);
                    }
                }
            }
            _ => return Err(fail(format!("line {}: unrecognised output '{}'", number, line))),
        }
    }

    if let Some(verdict) = status {
        if verdict != satisfiable {
            return Err(fail(format!(
                "status line disagrees with exit code {}",
                exit_code
            )));
        }
    }

    if !satisfiable {
        if saw_values {
            return Err(fail("value lines in an unsatisfiable answer".to_string()));
        }
        return Ok(None);
    }

    if !saw_values {
        return Err(fail("satisfiable answer without value lines".to_string()));
    }
    if !terminated {
        return Err(fail("value lines are missing the 0 terminator".to_string()));
    }

    let mut assignment: HashMap<i32, bool> = (1..=num_vars as i32).map(|v| (v, false)).collect();
    let mut mentioned = HashMap::new();
    for literal in literals {
        let var = literal.abs();
        let value = literal > 0;
        if let Some(previous) = mentioned.insert(var, value) {
            if previous != value {
                return Err(fail(format!("variable {} assigned both values", var)));
            }
        }
        assignment.insert(var, value);
    }

    Ok(Some(assignment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::solver::CancelToken;
    use crate::sat::Clause;
    use tempfile::tempdir;

    #[test]
    fn test_parse_satisfiable_output() {
        let stdout = "c glucose\n\ns SATISFIABLE\nv 1 -2\nv 3 0\n";
        let model = parse_solver_output(10, stdout, 4).unwrap().unwrap();
        assert_eq!(model.get(&1), Some(&true));
        assert_eq!(model.get(&2), Some(&false));
        assert_eq!(model.get(&3), Some(&true));
        // not mentioned
        assert_eq!(model.get(&4), Some(&false));
    }

    #[test]
    fn test_parse_unsatisfiable_output() {
        assert!(parse_solver_output(20, "c done\ns UNSATISFIABLE\n", 3).unwrap().is_none());
        assert!(parse_solver_output(20, "", 3).unwrap().is_none());
    }

    #[test]
    fn test_status_line_is_optional() {
        let model = parse_solver_output(10, "v -1 2 0\n", 2).unwrap().unwrap();
        assert_eq!(model[&2], true);
    }

    #[test]
    fn test_unexpected_exit_code_keeps_raw_output() {
        let err = parse_solver_output(1, "c crashed\n", 3).unwrap_err();
        assert!(matches!(err, DesignError::SolverProtocol { .. }));
        assert_eq!(err.raw_output(), Some("c crashed\n"));
    }

    #[test]
    fn test_rejects_malformed_output() {
        let cases = [
            (10, "s SATISFIABLE\n"),
            (10, "s SATISFIABLE\nv 1 2\n"),
            (10, "v 1 0\nv 2 0\n"),
            (10, "v 1 0 2\n"),
            (10, "v 1 x 0\n"),
            (10, "v 1 -1 0\n"),
            (10, "v 5 0\n"),
            (10, "s SATISFIABLE\ns SATISFIABLE\nv 1 0\n"),
            (10, "s UNSATISFIABLE\nv 1 0\n"),
            (20, "s SATISFIABLE\n"),
            (20, "v 1 0\n"),
            (10, "s MAYBE\nv 1 0\n"),
            (10, "garbage\nv 1 0\n"),
        ];
        for (code, stdout) in cases {
            let result = parse_solver_output(code, stdout, 3);
            assert!(
                matches!(result, Err(DesignError::SolverProtocol { .. })),
                "accepted {:?}",
                stdout
            );
        }
    }

    #[test]
    fn test_repeated_consistent_literal_is_accepted() {
        let model = parse_solver_output(10, "v 1 1 -2 0\n", 2).unwrap().unwrap();
        assert_eq!(model[&1], true);
        assert_eq!(model[&2], false);
    }

    #[test]
    fn test_missing_executable() {
        let dir = tempdir().unwrap();
        let solver = ExternalSatSolver::new(
            dir.path().join("no-such-solver"),
            0,
            dir.path().join("formula.cnf"),
        );
        let formula = CnfFormula::with_clauses(1, vec![Clause::unit(1)]);
        let err = solver.solve(&formula, &SolveBudget::default()).unwrap_err();
        assert!(matches!(err, DesignError::SolverNotFound { .. }));
        // the formula is written before the launch attempt
        assert!(dir.path().join("formula.cnf").exists());
    }

    #[test]
    fn test_cancelled_before_launch() {
        let dir = tempdir().unwrap();
        let solver = ExternalSatSolver::new("no-such-solver", 0, dir.path().join("formula.cnf"));
        let cancel = CancelToken::new();
        cancel.cancel();
        let formula = CnfFormula::with_clauses(1, vec![Clause::unit(1)]);
        let outcome = solver.solve(&formula, &SolveBudget::new(None, cancel)).unwrap();
        assert!(matches!(outcome, SolveOutcome::Unknown(UnknownReason::Cancelled)));
    }

    /// Write an executable shell script standing in for a DIMACS solver
    #[cfg(unix)]
    fn fake_solver(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-solver.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_fake_solver_model_is_read_back() {
        let dir = tempdir().unwrap();
        let script = fake_solver(
            dir.path(),
            "echo 'c fake solver'\necho 's SATISFIABLE'\necho 'v -1 2 -3'\necho 'v 4 0'\nexit 10",
        );
        let solver = ExternalSatSolver::new(script, 0, dir.path().join("formula.cnf"));
        let formula = CnfFormula::with_clauses(
            4,
            vec![Clause::unit(2), Clause::unit(4), Clause::new(vec![-1, -3])],
        );

        let outcome = solver.solve(&formula, &SolveBudget::from_seconds(10, CancelToken::new())).unwrap();
        let solution = outcome.solution().unwrap();
        assert_eq!(solution.assignment[&1], false);
        assert_eq!(solution.assignment[&2], true);
        assert_eq!(solution.assignment[&3], false);
        assert_eq!(solution.assignment[&4], true);
        assert!(formula.is_satisfied_by(&solution.assignment));

        let written = std::fs::read_to_string(dir.path().join("formula.cnf")).unwrap();
        assert!(written.starts_with("p cnf 4 3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_fake_solver_unsatisfiable_and_bad_exit_code() {
        let dir = tempdir().unwrap();
        let formula = CnfFormula::with_clauses(1, vec![Clause::unit(1), Clause::unit(-1)]);
        let budget = SolveBudget::default();

        let unsat = fake_solver(dir.path(), "echo 's UNSATISFIABLE'\nexit 20");
        let solver = ExternalSatSolver::new(unsat, 0, dir.path().join("formula.cnf"));
        assert!(matches!(solver.solve(&formula, &budget).unwrap(), SolveOutcome::Unsatisfiable));

        let crashed = fake_solver(dir.path(), "echo 'c out of memory'\nexit 3");
        let solver = ExternalSatSolver::new(crashed, 0, dir.path().join("formula.cnf"));
        let err = solver.solve(&formula, &budget).unwrap_err();
        assert_eq!(err.raw_output(), Some("c out of memory\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_returns_while_forked_process_holds_the_pipes() {
        let dir = tempdir().unwrap();
        // `sleep` runs as a child of the shell and keeps stdout open after the shell is killed
        let script = fake_solver(dir.path(), "sleep 5\nexit 10");
        let solver = ExternalSatSolver::new(script, 0, dir.path().join("formula.cnf"));
        let formula = CnfFormula::with_clauses(1, vec![Clause::unit(1)]);

        let start = Instant::now();
        let outcome = solver.solve(&formula, &SolveBudget::from_seconds(1, CancelToken::new())).unwrap();
        let elapsed = start.elapsed();

        assert!(matches!(outcome, SolveOutcome::Unknown(UnknownReason::Timeout)));
        assert!(elapsed < Duration::from_secs(3), "returned after {:?}", elapsed);
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_stops_a_running_solver() {
        let dir = tempdir().unwrap();
        let script = fake_solver(dir.path(), "sleep 5\nexit 10");
        let solver = ExternalSatSolver::new(script, 0, dir.path().join("formula.cnf"));
        let formula = CnfFormula::with_clauses(1, vec![Clause::unit(1)]);

        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            trigger.cancel();
        });

        let start = Instant::now();
        let outcome = solver.solve(&formula, &SolveBudget::new(None, cancel)).unwrap();
        canceller.join().unwrap();

        assert!(matches!(outcome, SolveOutcome::Unknown(UnknownReason::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}
