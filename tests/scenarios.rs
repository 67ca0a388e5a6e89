//! End-to-end runs through the in-process solver

use dna_word_design::config::{CardinalityEncoding, DesignConfig, Settings};
use dna_word_design::design::{SearchTermination, StepStatus, WordDesignProblem};
use dna_word_design::sat::{Clause, VariableIndexer};

/// Length-2 words with one strong symbol, differing everywhere, no full reverse pairing.
/// By hand the largest such set has 4 words, e.g. {CA, GT, AG, TC}.
fn tiny_settings() -> Settings {
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
fn single_word_of_default_length_is_satisfiable() {
    let problem = WordDesignProblem::new(Settings::default()).unwrap();
    let step = problem.solve_fixed(1).unwrap();

    assert_eq!(step.status, StepStatus::Satisfiable);
    let words = step.solution.unwrap().words;
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].len(), 8);
    assert_eq!(words[0].chars().filter(|c| matches!(c, 'C' | 'G')).count(), 4);
}

#[test]
fn words_forced_without_strong_symbols_are_unsatisfiable() {
    let problem = WordDesignProblem::new(Settings::default()).unwrap();
    let indexer = VariableIndexer::new(2, 8, 4).unwrap();

    // Pin both words to A/T only: forbid C (1) and G (2) everywhere
    let mut forced = Vec::new();
    for word in 0..2 {
        for position in 0..8 {
            forced.push(Clause::unit(-indexer.id(word, position, 1)));
            forced.push(Clause::unit(-indexer.id(word, position, 2)));
        }
    }

    let step = problem.solve_formula_with(2, &forced).unwrap();
    assert_eq!(step.status, StepStatus::Unsatisfiable);
    assert!(step.solution.is_none());
}

#[test]
fn search_reports_previous_count_as_maximum() {
    let problem = WordDesignProblem::new(tiny_settings()).unwrap();
    let report = problem.search().unwrap();

    assert_eq!(report.max_satisfiable_k, Some(4));
    assert_eq!(report.termination, SearchTermination::Unsatisfiable { word_count: 5 });
    assert!(report.is_conclusive());
    assert_eq!(report.steps.len(), 5);

    let best = report.best.unwrap();
    assert_eq!(best.words.len(), 4);
    let validation = problem.validator().validate(&best.words);
    assert!(validation.is_valid, "{}", validation);
}

#[test]
fn sequential_counter_finds_the_same_maximum() {
    let mut settings = tiny_settings();
    settings.encoding.cardinality = CardinalityEncoding::SequentialCounter;
    settings.encoding.parallel = true;
    let problem = WordDesignProblem::new(settings).unwrap();

    let report = problem.search().unwrap();
    assert_eq!(report.max_satisfiable_k, Some(4));
    assert_eq!(report.termination, SearchTermination::Unsatisfiable { word_count: 5 });
}

#[test]
fn search_can_start_above_one() {
    let mut settings = tiny_settings();
    settings.search.start_k = 3;
    let problem = WordDesignProblem::new(settings).unwrap();

    let report = problem.search().unwrap();
    assert_eq!(report.steps.first().map(|s| s.word_count), Some(3));
    assert_eq!(report.max_satisfiable_k, Some(4));
}

#[test]
fn search_starting_above_the_maximum_is_only_a_bound() {
    let mut settings = tiny_settings();
    settings.search.start_k = 6;
    let problem = WordDesignProblem::new(settings).unwrap();

    let report = problem.search().unwrap();
    assert_eq!(report.termination, SearchTermination::Unsatisfiable { word_count: 6 });
    assert_eq!(report.max_satisfiable_k, None);
    assert!(!report.is_conclusive());
}
