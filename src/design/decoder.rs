//! Reading word sets back out of satisfying assignments

use super::Alphabet;
use crate::error::{DesignError, DesignResult};
use crate::sat::VariableIndexer;
use std::collections::HashMap;

/// Turns a model over the base variables into words
pub struct ModelDecoder<'a> {
    indexer: &'a VariableIndexer,
    alphabet: &'a Alphabet,
}

impl<'a> ModelDecoder<'a> {
    pub fn new(indexer: &'a VariableIndexer, alphabet: &'a Alphabet) -> Self {
        debug_assert_eq!(indexer.alphabet_size(), alphabet.len());
        Self { indexer, alphabet }
    }

    /// Decode every word of the model, in word order.
    ///
    /// Auxiliary variables are ignored and missing base variables read as
    /// false. A position without exactly one true symbol variable is an error.
    pub fn decode(&self, assignment: &HashMap<i32, bool>) -> DesignResult<Vec<String>> {
        (0..self.indexer.word_count())
            .map(|word| self.decode_word(assignment, word))
            .collect()
    }

    pub fn decode_word(&self, assignment: &HashMap<i32, bool>, word: usize) -> DesignResult<String> {
        let mut text = String::with_capacity(self.indexer.word_length());

        for position in 0..self.indexer.word_length() {
            let chosen: Vec<usize> = (0..self.alphabet.len())
                .filter(|&symbol| {
                    assignment
                        .get(&self.indexer.id(word, position, symbol))
                        .copied()
                        .unwrap_or(false)
                })
                .collect();

            match chosen.as_slice() {
                [symbol] => text.push(self.alphabet.symbol(*symbol)),
                _ => {
                    return Err(DesignError::DecodeInconsistency {
                        word,
                        position,
                        true_count: chosen.len(),
                    })
                }
            }
        }

        Ok(text)
    }
}
