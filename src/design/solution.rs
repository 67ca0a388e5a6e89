//! Serializable word sets

use super::DesignParameters;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A decoded and validated word set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignSolution {
    pub words: Vec<String>,
    pub metadata: SolutionMetadata,
    /// Time taken by the solver for this word count
    #[serde(skip)]
    pub solve_time: Duration,
}

/// The parameters a word set was designed for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SolutionMetadata {
    pub word_length: usize,
    pub alphabet: String,
    pub gc_target: usize,
    pub min_hamming_distance: usize,
    pub min_reverse_pairing_distance: usize,
    pub variables: usize,
    pub clauses: usize,
}

impl DesignSolution {
    pub fn new(
        words: Vec<String>,
        params: &DesignParameters,
        variables: usize,
        clauses: usize,
        solve_time: Duration,
    ) -> Self {
        Self {
            words,
            metadata: SolutionMetadata {
                word_length: params.word_length,
                alphabet: params.alphabet.symbols().iter().collect(),
                gc_target: params.gc_target,
                min_hamming_distance: params.min_hamming_distance,
                min_reverse_pairing_distance: params.min_reverse_pairing_distance,
                variables,
                clauses,
            },
            solve_time,
        }
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Create from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// One word per line
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for word in &self.words {
            text.push_str(word);
            text.push('\n');
        }
        text
    }

    /// Save as JSON when the extension is `.json`, as a word list otherwise
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let content = if path.extension().is_some_and(|e| e == "json") {
            self.to_json()?
        } else {
            self.to_text()
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write solution: {}", path.display()))?;
        Ok(())
    }

    /// Load from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read solution: {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid solution file: {}", path.display()))
    }
}

/// Parse a word list: one word per line, blank lines and `#` comments skipped
pub fn parse_word_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_word_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read word list: {}", path.display()))?;
    Ok(parse_word_list(&content))
}
