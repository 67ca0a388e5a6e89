//! Word design problem definition and the word-count search

use super::{DesignParameters, DesignSolution, ModelDecoder, WordSetValidator};
use crate::config::{Settings, SolverBackend};
use crate::sat::{
    CancelToken, Clause, ComplexityEstimate, EncodingStatistics, SolveBudget, SolveOutcome,
    UnifiedSatSolver, UnknownReason, WordSetEncoder,
};
use anyhow::{Context, Result};
use std::time::{Duration, Instant};

/// Represents a word design problem: fixed parameters, variable word count
pub struct WordDesignProblem {
    settings: Settings,
    params: DesignParameters,
    encoder: WordSetEncoder,
    solver: UnifiedSatSolver,
    validator: WordSetValidator,
    cancel: CancelToken,
}

/// Verdict for one word count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Satisfiable,
    Unsatisfiable,
    Unknown(UnknownReason),
}

/// One encode-and-solve round
#[derive(Debug, Clone)]
pub struct SearchStep {
    pub word_count: usize,
    pub status: StepStatus,
    pub variables: usize,
    pub clauses: usize,
    pub encode_time: Duration,
    pub solve_time: Duration,
    pub solution: Option<DesignSolution>,
}

/// Why a search stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTermination {
    /// The first word count with no design; the one before it is the maximum
    Unsatisfiable { word_count: usize },
    /// Stopped by a timeout or cancellation; the best count is only a lower bound
    Inconclusive {
        word_count: usize,
        reason: UnknownReason,
    },
    /// Every count up to `max_k` was satisfiable
    ReachedLimit { max_k: usize },
}

/// Outcome of an upward search over word counts
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub steps: Vec<SearchStep>,
    pub max_satisfiable_k: Option<usize>,
    pub best: Option<DesignSolution>,
    pub termination: SearchTermination,
}

impl SearchReport {
    /// Whether `max_satisfiable_k` is the true maximum rather than a lower bound.
    ///
    /// An unsatisfiable count settles the maximum only when the count right
    /// below it was shown satisfiable (or there is none, at K=1). A search that
    /// starts above the maximum learns nothing about the smaller counts.
    pub fn is_conclusive(&self) -> bool {
        match self.termination {
            SearchTermination::Unsatisfiable { word_count } => {
                word_count == 1 || self.max_satisfiable_k == Some(word_count - 1)
            }
            _ => false,
        }
    }

    pub fn total_solve_time(&self) -> Duration {
        self.steps.iter().map(|s| s.solve_time).sum()
    }
}

impl WordDesignProblem {
    /// Create a new problem from settings
    pub fn new(settings: Settings) -> Result<Self> {
        let params = DesignParameters::from_config(&settings.design)
            .context("Invalid design parameters")?;
        let encoder = WordSetEncoder::new(params.clone(), &settings.encoding);
        let solver = UnifiedSatSolver::new(&settings.solver, &settings.output.cnf_path);
        let validator = WordSetValidator::new(params.clone());

        Ok(Self {
            settings,
            params,
            encoder,
            solver,
            validator,
            cancel: CancelToken::new(),
        })
    }

    /// Share a cancellation flag with the caller
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Encode and solve for exactly `word_count` words
    pub fn solve_fixed(&self, word_count: usize) -> Result<SearchStep> {
        self.solve_formula_with(word_count, &[])
    }

    /// Like [`solve_fixed`](Self::solve_fixed), with extra clauses appended to the build.
    ///
    /// Base variable ids follow the [`VariableIndexer`](crate::sat::VariableIndexer)
    /// layout for `word_count` words.
    pub fn solve_formula_with(&self, word_count: usize, extra_clauses: &[Clause]) -> Result<SearchStep> {
        let mut encoded = self
            .encoder
            .encode(word_count)
            .with_context(|| format!("Failed to encode {} words", word_count))?;
        encoded.formula.extend(extra_clauses.iter().cloned());

        if self.settings.output.save_formula && self.solver.backend() == SolverBackend::Cadical {
            encoded.formula.write_to_file(&self.settings.output.cnf_path)?;
        }

        log::info!(
            "K={}: solving {} variables, {} clauses",
            word_count,
            encoded.formula.num_vars(),
            encoded.formula.num_clauses()
        );

        let budget = SolveBudget::from_seconds(self.settings.solver.timeout_seconds, self.cancel.clone());
        let solve_start = Instant::now();
        let outcome = self
            .solver
            .solve(&encoded.formula, &budget)
            .with_context(|| format!("Solver failed for K={}", word_count))?;
        let solve_time = solve_start.elapsed();

        let mut step = SearchStep {
            word_count,
            status: StepStatus::Unsatisfiable,
            variables: encoded.formula.num_vars(),
            clauses: encoded.formula.num_clauses(),
            encode_time: encoded.statistics.encode_time,
            solve_time,
            solution: None,
        };

        match outcome {
            SolveOutcome::Satisfiable(model) => {
                let words = ModelDecoder::new(&encoded.indexer, &self.params.alphabet)
                    .decode(&model.assignment)
                    .with_context(|| format!("Failed to decode the model for K={}", word_count))?;

                let validation = self.validator.validate(&words);
                if !validation.is_valid {
                    anyhow::bail!(
                        "decoded word set for K={} breaks the design constraints:\n{}",
                        word_count,
                        validation
                    );
                }

                step.status = StepStatus::Satisfiable;
                step.solution = Some(DesignSolution::new(
                    words,
                    &self.params,
                    step.variables,
                    step.clauses,
                    model.solve_time,
                ));
            }
            SolveOutcome::Unsatisfiable => {}
            SolveOutcome::Unknown(reason) => step.status = StepStatus::Unknown(reason),
        }

        Ok(step)
    }

    /// Search upward from `search.start_k` until a word count is unsatisfiable
    pub fn search(&self) -> Result<SearchReport> {
        self.search_with(|_| {})
    }

    /// [`search`](Self::search), reporting every finished step to `on_step`
    pub fn search_with<F: FnMut(&SearchStep)>(&self, mut on_step: F) -> Result<SearchReport> {
        let start_k = self.settings.search.start_k;
        let max_k = self.settings.search.max_k;

        let mut steps = Vec::new();
        let mut best: Option<DesignSolution> = None;
        let mut max_satisfiable_k = None;
        let mut word_count = start_k;

        let termination = loop {
            if let Some(max_k) = max_k {
                if word_count > max_k {
                    break SearchTermination::ReachedLimit { max_k };
                }
            }

            let step = self.solve_fixed(word_count)?;
            on_step(&step);

            let status = step.status;
            match status {
                StepStatus::Satisfiable => {
                    log::info!("K={}: SAT in {:.3}s", word_count, step.solve_time.as_secs_f64());
                    max_satisfiable_k = Some(word_count);
                    best = step.solution.clone();
                }
                StepStatus::Unsatisfiable => {
                    log::info!("K={}: UNSAT", word_count);
                }
                StepStatus::Unknown(reason) => {
                    log::warn!("K={}: no verdict ({:?})", word_count, reason);
                }
            }
            steps.push(step);

            match status {
                StepStatus::Satisfiable => word_count += 1,
                StepStatus::Unsatisfiable => break SearchTermination::Unsatisfiable { word_count },
                StepStatus::Unknown(reason) => {
                    break SearchTermination::Inconclusive { word_count, reason }
                }
            }
        };

        Ok(SearchReport {
            steps,
            max_satisfiable_k,
            best,
            termination,
        })
    }

    /// Write the formula for `word_count` words to `output.cnf_path` without solving
    pub fn encode_to_file(&self, word_count: usize) -> Result<EncodingStatistics> {
        let encoded = self
            .encoder
            .encode(word_count)
            .with_context(|| format!("Failed to encode {} words", word_count))?;
        encoded.formula.write_to_file(&self.settings.output.cnf_path)?;
        log::info!("Wrote {}", self.settings.output.cnf_path.display());
        Ok(encoded.statistics)
    }

    /// Exact formula size for `word_count` words
    pub fn estimate(&self, word_count: usize) -> Result<ComplexityEstimate> {
        Ok(self.encoder.estimate(word_count)?)
    }

    pub fn params(&self) -> &DesignParameters {
        &self.params
    }

    /// Get the problem settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn validator(&self) -> &WordSetValidator {
        &self.validator
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Satisfiable => write!(f, "SAT"),
            StepStatus::Unsatisfiable => write!(f, "UNSAT"),
            StepStatus::Unknown(UnknownReason::Timeout) => write!(f, "UNKNOWN (timeout)"),
            StepStatus::Unknown(UnknownReason::Cancelled) => write!(f, "UNKNOWN (cancelled)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DesignConfig;
    use crate::error::DesignError;
    use tempfile::tempdir;

    fn small_settings() -> Settings {
        let mut settings = Settings::default();
        settings.design = DesignConfig {
            word_length: 2,
            gc_target: Some(1),
            min_hamming_distance: 2,
            min_reverse_pairing_distance: 1,
            ..DesignConfig::default()
        };
        settings
    }

    #[test]
    fn test_single_default_word() {
        let problem = WordDesignProblem::new(Settings::default()).unwrap();
        let step = problem.solve_fixed(1).unwrap();

        assert_eq!(step.status, StepStatus::Satisfiable);
        let solution = step.solution.unwrap();
        assert_eq!(solution.words.len(), 1);
        let word = &solution.words[0];
        assert_eq!(word.len(), 8);
        assert_eq!(word.chars().filter(|c| *c == 'C' || *c == 'G').count(), 4);
    }

    #[test]
    fn test_zero_words_is_rejected() {
        let problem = WordDesignProblem::new(Settings::default()).unwrap();
        let err = problem.solve_fixed(0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DesignError>(),
            Some(DesignError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_design_rejected_up_front() {
        let mut settings = Settings::default();
        settings.design.min_hamming_distance = 9;
        assert!(WordDesignProblem::new(settings).is_err());
    }

    #[test]
    fn test_search_stops_at_limit() {
        let mut settings = small_settings();
        settings.search.max_k = Some(2);
        let problem = WordDesignProblem::new(settings).unwrap();

        let report = problem.search().unwrap();
        assert_eq!(report.termination, SearchTermination::ReachedLimit { max_k: 2 });
        assert_eq!(report.max_satisfiable_k, Some(2));
        assert!(!report.is_conclusive());
        assert_eq!(report.steps.len(), 2);
    }

    #[test]
    fn test_unsatisfiable_start_is_not_a_maximum() {
        let report = |max_satisfiable_k, word_count| SearchReport {
            steps: Vec::new(),
            max_satisfiable_k,
            best: None,
            termination: SearchTermination::Unsatisfiable { word_count },
        };
        assert!(report(Some(4), 5).is_conclusive());
        assert!(report(None, 1).is_conclusive());
        // started at K=6 and failed immediately: nothing is known below it
        assert!(!report(None, 6).is_conclusive());
    }

    #[test]
    fn test_cancelled_search_is_inconclusive() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let problem = WordDesignProblem::new(small_settings())
            .unwrap()
            .with_cancel_token(cancel);

        let report = problem.search().unwrap();
        assert_eq!(
            report.termination,
            SearchTermination::Inconclusive {
                word_count: 1,
                reason: UnknownReason::Cancelled
            }
        );
        assert_eq!(report.max_satisfiable_k, None);
        assert!(report.best.is_none());
    }

    #[test]
    fn test_encode_to_file() {
        let dir = tempdir().unwrap();
        let mut settings = small_settings();
        settings.output.cnf_path = dir.path().join("k2.cnf");
        let problem = WordDesignProblem::new(settings).unwrap();

        let statistics = problem.encode_to_file(2).unwrap();
        let content = std::fs::read_to_string(dir.path().join("k2.cnf")).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(
            header,
            format!("p cnf {} {}", statistics.total_variables, statistics.total_clauses)
        );
        assert_eq!(content.lines().count(), statistics.total_clauses + 1);
    }

    #[test]
    fn test_estimate_agrees_with_encoding() {
        let problem = WordDesignProblem::new(small_settings()).unwrap();
        let dir = tempdir().unwrap();
        let mut settings = small_settings();
        settings.output.cnf_path = dir.path().join("k3.cnf");
        let writer = WordDesignProblem::new(settings).unwrap();

        let estimate = problem.estimate(3).unwrap();
        let statistics = writer.encode_to_file(3).unwrap();
        assert_eq!(estimate.total_clauses, statistics.total_clauses);
        assert_eq!(estimate.total_variables, statistics.total_variables);
    }
}
