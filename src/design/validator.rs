//! Direct checking of word sets against the design constraints

use super::{Alphabet, DesignParameters};
use std::time::Instant;

/// Checks word sets without going through SAT
pub struct WordSetValidator {
    params: DesignParameters,
}

/// Result of word set validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    pub words_checked: usize,
    pub pairs_checked: usize,
    pub validation_time_ms: u64,
}

/// A single broken constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    WrongLength {
        word: usize,
        length: usize,
    },
    UnknownSymbol {
        word: usize,
        position: usize,
        symbol: char,
    },
    Composition {
        word: usize,
        strong_count: usize,
    },
    Hamming {
        first: usize,
        second: usize,
        distance: usize,
    },
    ReversePairing {
        first: usize,
        second: usize,
        distance: usize,
    },
}

impl WordSetValidator {
    pub fn new(params: DesignParameters) -> Self {
        Self { params }
    }

    /// Validate every word on its own, then every pair
    pub fn validate<S: AsRef<str>>(&self, words: &[S]) -> ValidationResult {
        let start_time = Instant::now();
        let mut violations = Vec::new();

        let mut encoded: Vec<Option<Vec<usize>>> = Vec::with_capacity(words.len());
        for (index, word) in words.iter().enumerate() {
            encoded.push(self.check_word(index, word.as_ref(), &mut violations));
        }

        // Pair checks only make sense between well-formed words
        let mut pairs_checked = 0;
        for (first, a) in encoded.iter().enumerate() {
            let Some(a) = a else { continue };
            for (second, b) in encoded.iter().enumerate() {
                let Some(b) = b else { continue };
                pairs_checked += 1;

                if first < second {
                    let distance = hamming_distance(a, b);
                    if distance < self.params.min_hamming_distance {
                        violations.push(Violation::Hamming {
                            first,
                            second,
                            distance,
                        });
                    }
                }

                let distance = reverse_pairing_distance(a, b, &self.params.alphabet);
                if distance < self.params.min_reverse_pairing_distance {
                    violations.push(Violation::ReversePairing {
                        first,
                        second,
                        distance,
                    });
                }
            }
        }

        ValidationResult {
            is_valid: violations.is_empty(),
            violations,
            words_checked: words.len(),
            pairs_checked,
            validation_time_ms: start_time.elapsed().as_millis() as u64,
        }
    }

    /// Symbol indices of a well-formed word, recording what is wrong otherwise
    fn check_word(&self, index: usize, word: &str, violations: &mut Vec<Violation>) -> Option<Vec<usize>> {
        let alphabet = &self.params.alphabet;
        let length = word.chars().count();
        if length != self.params.word_length {
            violations.push(Violation::WrongLength { word: index, length });
            return None;
        }

        let mut symbols = Vec::with_capacity(length);
        for (position, symbol) in word.chars().enumerate() {
            match alphabet.index_of(symbol) {
                Some(c) => symbols.push(c),
                None => {
                    violations.push(Violation::UnknownSymbol {
                        word: index,
                        position,
                        symbol,
                    });
                    return None;
                }
            }
        }

        let strong_count = symbols.iter().filter(|&&c| alphabet.is_strong(c)).count();
        if strong_count != self.params.gc_target {
            violations.push(Violation::Composition {
                word: index,
                strong_count,
            });
        }

        Some(symbols)
    }

    pub fn params(&self) -> &DesignParameters {
        &self.params
    }
}

/// Positions at which two equal-length words differ
pub fn hamming_distance(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Offsets that do not pair when `a`, read backwards, is aligned against `b`.
///
/// Offset `i` pairs when `b[i]` is the complement of `a[L-1-i]`.
pub fn reverse_pairing_distance(a: &[usize], b: &[usize], alphabet: &Alphabet) -> usize {
    let paired = a
        .iter()
        .rev()
        .zip(b)
        .filter(|(&x, &y)| alphabet.complement(x) == y)
        .count();
    a.len() - paired
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::WrongLength { word, length } => {
                write!(f, "word {} has length {}", word, length)
            }
            Violation::UnknownSymbol {
                word,
                position,
                symbol,
            } => write!(f, "word {} has unknown symbol '{}' at position {}", word, symbol, position),
            Violation::Composition { word, strong_count } => {
                write!(f, "word {} has {} strong symbols", word, strong_count)
            }
            Violation::Hamming {
                first,
                second,
                distance,
            } => write!(f, "words {} and {} are at Hamming distance {}", first, second, distance),
            Violation::ReversePairing {
                first,
                second,
                distance,
            } => write!(
                f,
                "words {} and {} are at reverse-pairing distance {}",
                first, second, distance
            ),
        }
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Validation Result: {}", if self.is_valid { "VALID" } else { "INVALID" })?;
        writeln!(f, "  Words checked: {}", self.words_checked)?;
        writeln!(f, "  Pairs checked: {}", self.pairs_checked)?;
        writeln!(f, "  Violations: {}", self.violations.len())?;
        for violation in self.violations.iter().take(10) {
            writeln!(f, "    - {}", violation)?;
        }
        if self.violations.len() > 10 {
            writeln!(f, "    ... and {} more", self.violations.len() - 10)?;
        }
        writeln!(f, "  Validation time: {}ms", self.validation_time_ms)?;
        Ok(())
    }
}
