//! Display and output formatting utilities

use crate::config::OutputFormat;
use crate::design::{DesignSolution, SearchReport, SearchStep, SearchTermination, StepStatus};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Format word sets and search progress for display
pub struct SolutionFormatter;

impl SolutionFormatter {
    /// Numbered word list
    pub fn format_words(words: &[String]) -> String {
        let width = words.len().to_string().len();
        let mut output = String::new();
        for (i, word) in words.iter().enumerate() {
            output.push_str(&format!("{:>width$}: {}\n", i + 1, word, width = width));
        }
        output
    }

    /// Header plus numbered words
    pub fn format_solution(solution: &DesignSolution) -> String {
        let meta = &solution.metadata;
        let mut output = String::new();

        output.push_str(&format!("=== {} words ===\n", solution.word_count()));
        output.push_str(&format!(
            "Length {} over {}, {} strong symbols, Hamming >= {}, reverse pairing >= {}\n",
            meta.word_length,
            meta.alphabet,
            meta.gc_target,
            meta.min_hamming_distance,
            meta.min_reverse_pairing_distance
        ));
        output.push_str(&format!(
            "Formula: {} variables, {} clauses, solved in {:.3}s\n\n",
            meta.variables,
            meta.clauses,
            solution.solve_time.as_secs_f64()
        ));
        output.push_str(&Self::format_words(&solution.words));

        output
    }

    /// One line per word count, as printed during a search
    pub fn format_step(step: &SearchStep) -> String {
        let status = step.status.to_string();
        let status = match step.status {
            StepStatus::Satisfiable => ColorOutput::success(&status),
            StepStatus::Unsatisfiable => ColorOutput::error(&status),
            StepStatus::Unknown(_) => ColorOutput::warning(&status),
        };
        format!(
            "K={:<3} {:<20} vars={:<8} clauses={:<10} encode={:.3}s solve={:.3}s",
            step.word_count,
            status,
            step.variables,
            step.clauses,
            step.encode_time.as_secs_f64(),
            step.solve_time.as_secs_f64()
        )
    }

    /// Table of every step followed by the conclusion of the search
    pub fn format_search_summary(report: &SearchReport) -> String {
        let mut output = String::new();

        output.push_str("Search Summary:\n");
        output.push_str("K    | Result   | Variables | Clauses    | Time(ms)\n");
        output.push_str("-----|----------|-----------|------------|---------\n");
        for step in &report.steps {
            let result = match step.status {
                StepStatus::Satisfiable => "SAT",
                StepStatus::Unsatisfiable => "UNSAT",
                StepStatus::Unknown(_) => "UNKNOWN",
            };
            output.push_str(&format!(
                "{:4} | {:8} | {:9} | {:10} | {}\n",
                step.word_count,
                result,
                step.variables,
                step.clauses,
                step.solve_time.as_millis()
            ));
        }
        output.push('\n');

        let conclusion = match (report.termination, report.max_satisfiable_k) {
            (SearchTermination::Unsatisfiable { word_count }, Some(best)) => {
                format!("Maximum word set size: {} (K={} is unsatisfiable)", best, word_count)
            }
            (SearchTermination::Unsatisfiable { word_count: 1 }, None) => {
                "No word set exists at K=1".to_string()
            }
            (SearchTermination::Unsatisfiable { word_count }, None) => format!(
                "No word set exists at K={}; smaller counts were not searched",
                word_count
            ),
            (SearchTermination::Inconclusive { word_count, reason }, best) => format!(
                "Inconclusive at K={} ({:?}); best so far: {}",
                word_count,
                reason,
                best.map_or("none".to_string(), |k| k.to_string())
            ),
            (SearchTermination::ReachedLimit { max_k }, _) => {
                format!("All word counts up to {} are satisfiable (lower bound)", max_k)
            }
        };
        output.push_str(&conclusion);
        output.push('\n');

        output
    }

    /// Save a word set under `output_dir` and return the file written
    pub fn save_solution<P: AsRef<Path>>(
        solution: &DesignSolution,
        output_dir: P,
        format: OutputFormat,
    ) -> Result<PathBuf> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

        let extension = match format {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        };
        let path = output_dir.join(format!(
            "words_l{}_k{:03}.{}",
            solution.metadata.word_length,
            solution.word_count(),
            extension
        ));
        solution.save_to_file(&path)?;
        Ok(path)
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    /// Check if terminal supports color
    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err()
            && (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    /// Format success message
    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    /// Format error message
    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    /// Format warning message
    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    /// Format info message
    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }

    pub fn highlight(text: &str) -> String {
        Self::colored(text, Color::Cyan)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
            Color::Cyan => 36,
        }
    }
}
