//! DNA Word Design SAT Encoder
//!
//! This library finds large sets of fixed-length words over a small alphabet
//! (DNA by default) that satisfy composition, minimum Hamming distance and
//! reverse-complement pairing constraints, by encoding "there are K such
//! words" as CNF and handing it to a SAT solver.

pub mod config;
pub mod design;
pub mod error;
pub mod sat;
pub mod utils;

pub use config::Settings;
pub use design::{DesignSolution, SearchReport, WordDesignProblem};
pub use error::{DesignError, DesignResult};

use anyhow::Result;

/// Main entry point: search upward for the largest satisfiable word count
pub fn search_word_sets(settings: Settings) -> Result<SearchReport> {
    let problem = WordDesignProblem::new(settings)?;
    problem.search()
}
