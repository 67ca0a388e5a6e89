//! Validated design parameters

use crate::config::DesignConfig;
use crate::error::{DesignError, DesignResult};

/// Symbol alphabet with its complementary pairing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
    complement: Vec<usize>,
    strong: Vec<bool>,
}

impl Alphabet {
    /// Build an alphabet from its symbols, the complement of each symbol (same order)
    /// and the subset of "strong" symbols counted by the composition constraint.
    pub fn new(symbols: &str, complements: &str, strong_symbols: &str) -> DesignResult<Self> {
        let symbols: Vec<char> = symbols.chars().collect();
        if symbols.is_empty() {
            return Err(DesignError::config("alphabet must not be empty"));
        }
        for (i, c) in symbols.iter().enumerate() {
            if symbols[..i].contains(c) {
                return Err(DesignError::config(format!(
                    "alphabet symbol '{}' appears more than once",
                    c
                )));
            }
        }

        let complements: Vec<char> = complements.chars().collect();
        if complements.len() != symbols.len() {
            return Err(DesignError::config(format!(
                "complement table has {} entries but the alphabet has {} symbols",
                complements.len(),
                symbols.len()
            )));
        }

        let mut complement = Vec::with_capacity(symbols.len());
        for c in &complements {
            let index = symbols.iter().position(|s| s == c).ok_or_else(|| {
                DesignError::config(format!("complement symbol '{}' is not in the alphabet", c))
            })?;
            complement.push(index);
        }
        for (i, &j) in complement.iter().enumerate() {
            if complement[j] != i {
                return Err(DesignError::config(format!(
                    "complement table is not symmetric: {} pairs with {} but {} pairs with {}",
                    symbols[i], symbols[j], symbols[j], symbols[complement[j]]
                )));
            }
        }

        let mut strong = vec![false; symbols.len()];
        for c in strong_symbols.chars() {
            let index = symbols.iter().position(|s| *s == c).ok_or_else(|| {
                DesignError::config(format!("strong symbol '{}' is not in the alphabet", c))
            })?;
            strong[index] = true;
        }
        let strong_count = strong.iter().filter(|&&s| s).count();
        if strong_count == 0 || strong_count == symbols.len() {
            return Err(DesignError::config(
                "strong symbols must be a non-empty proper subset of the alphabet",
            ));
        }

        Ok(Self {
            symbols,
            complement,
            strong,
        })
    }

    /// The DNA alphabet: A-T and C-G pairs, C/G strong
    pub fn dna() -> Self {
        Self {
            symbols: vec!['A', 'C', 'G', 'T'],
            complement: vec![3, 2, 1, 0],
            strong: vec![false, true, true, false],
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbol(&self, index: usize) -> char {
        self.symbols[index]
    }

    pub fn index_of(&self, symbol: char) -> Option<usize> {
        self.symbols.iter().position(|&s| s == symbol)
    }

    pub fn complement(&self, index: usize) -> usize {
        self.complement[index]
    }

    pub fn is_strong(&self, index: usize) -> bool {
        self.strong[index]
    }

    /// Indices of the strong symbols, then of the remaining ones
    pub fn partition(&self) -> (Vec<usize>, Vec<usize>) {
        (0..self.len()).partition(|&c| self.strong[c])
    }

    /// Every (first, second) symbol pair related by the complement table
    pub fn complementary_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.complement.iter().copied().enumerate()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::dna()
    }
}

/// Everything the encoders need to know about a design, checked up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignParameters {
    pub word_length: usize,
    pub alphabet: Alphabet,
    pub gc_target: usize,
    pub min_hamming_distance: usize,
    pub min_reverse_pairing_distance: usize,
}

impl DesignParameters {
    pub fn from_config(config: &DesignConfig) -> DesignResult<Self> {
        let alphabet = Alphabet::new(
            &config.alphabet,
            &config.complements,
            &config.strong_symbols,
        )?;
        Self::new(
            config.word_length,
            alphabet,
            config.gc_target,
            config.min_hamming_distance,
            config.min_reverse_pairing_distance,
        )
    }

    pub fn new(
        word_length: usize,
        alphabet: Alphabet,
        gc_target: Option<usize>,
        min_hamming_distance: usize,
        min_reverse_pairing_distance: usize,
    ) -> DesignResult<Self> {
        if word_length == 0 {
            return Err(DesignError::config("word length must be positive"));
        }
        if alphabet.is_empty() {
            return Err(DesignError::config("alphabet must not be empty"));
        }

        let gc_target = gc_target.unwrap_or(word_length / 2);
        if gc_target > word_length {
            return Err(DesignError::config(format!(
                "gc_target {} exceeds word length {}",
                gc_target, word_length
            )));
        }
        if min_hamming_distance > word_length {
            return Err(DesignError::config(format!(
                "min_hamming_distance {} exceeds word length {}",
                min_hamming_distance, word_length
            )));
        }
        if min_reverse_pairing_distance > word_length {
            return Err(DesignError::config(format!(
                "min_reverse_pairing_distance {} exceeds word length {}",
                min_reverse_pairing_distance, word_length
            )));
        }

        Ok(Self {
            word_length,
            alphabet,
            gc_target,
            min_hamming_distance,
            min_reverse_pairing_distance,
        })
    }

    /// Largest number of positions two distinct words may share
    pub fn max_matches(&self) -> usize {
        self.word_length - self.min_hamming_distance
    }

    /// Largest number of complementary-aligned positions allowed for any ordered pair
    pub fn max_pairings(&self) -> usize {
        self.word_length - self.min_reverse_pairing_distance
    }
}

impl Default for DesignParameters {
    fn default() -> Self {
        Self {
            word_length: 8,
            alphabet: Alphabet::dna(),
            gc_target: 4,
            min_hamming_distance: 4,
            min_reverse_pairing_distance: 4,
        }
    }
}
