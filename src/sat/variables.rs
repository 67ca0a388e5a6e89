//! Variable management for SAT encoding

use crate::error::{DesignError, DesignResult};
use std::ops::Range;

/// Deterministic bijection between (word, position, symbol) and SAT variable ids.
///
/// `id = word * (L * A) + position * A + symbol + 1`, so the ids of `K` words
/// fill exactly `1..=K * L * A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableIndexer {
    word_count: usize,
    word_length: usize,
    alphabet_size: usize,
}

impl VariableIndexer {
    pub fn new(word_count: usize, word_length: usize, alphabet_size: usize) -> DesignResult<Self> {
        if word_count == 0 {
            return Err(DesignError::config("word count must be positive"));
        }
        if word_length == 0 {
            return Err(DesignError::config("word length must be positive"));
        }
        if alphabet_size == 0 {
            return Err(DesignError::config("alphabet size must be positive"));
        }

        let total = word_count
            .checked_mul(word_length)
            .and_then(|n| n.checked_mul(alphabet_size))
            .filter(|&n| n < i32::MAX as usize);
        if total.is_none() {
            return Err(DesignError::config(format!(
                "{} words of length {} over {} symbols exceed the variable id space",
                word_count, word_length, alphabet_size
            )));
        }

        Ok(Self {
            word_count,
            word_length,
            alphabet_size,
        })
    }

    /// Variable for "word `word` has symbol `symbol` at `position`"
    #[inline]
    pub fn id(&self, word: usize, position: usize, symbol: usize) -> i32 {
        debug_assert!(word < self.word_count);
        debug_assert!(position < self.word_length);
        debug_assert!(symbol < self.alphabet_size);
        (word * self.word_length * self.alphabet_size + position * self.alphabet_size + symbol + 1)
            as i32
    }

    /// Inverse of [`id`](Self::id); `None` for auxiliary or out-of-range ids
    pub fn decode(&self, variable: i32) -> Option<(usize, usize, usize)> {
        if variable < 1 || variable > self.base_count() {
            return None;
        }
        let offset = (variable - 1) as usize;
        let per_word = self.word_length * self.alphabet_size;
        Some((
            offset / per_word,
            (offset % per_word) / self.alphabet_size,
            offset % self.alphabet_size,
        ))
    }

    /// All symbol variables of one position, in symbol order
    pub fn position_variables(&self, word: usize, position: usize) -> Vec<i32> {
        (0..self.alphabet_size)
            .map(|symbol| self.id(word, position, symbol))
            .collect()
    }

    /// Number of base variables, which is also the highest base id
    pub fn base_count(&self) -> i32 {
        (self.word_count * self.word_length * self.alphabet_size) as i32
    }

    pub fn is_base(&self, variable: i32) -> bool {
        variable >= 1 && variable <= self.base_count()
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn word_length(&self) -> usize {
        self.word_length
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }
}

/// Monotonic allocator for auxiliary variables, scoped to one formula build.
///
/// Ids start right after the base variables and are never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxAllocator {
    next_id: i32,
}

impl AuxAllocator {
    /// Fresh allocator whose first id follows the indexer's base range
    pub fn after(indexer: &VariableIndexer) -> Self {
        Self::starting_at(indexer.base_count() + 1)
    }

    /// Allocator handing out ids from `first` upwards
    pub fn starting_at(first: i32) -> Self {
        debug_assert!(first >= 1);
        Self { next_id: first }
    }

    pub fn fresh(&mut self) -> DesignResult<i32> {
        Ok(self.reserve(1)?.start)
    }

    /// `count` consecutive fresh ids
    pub fn fresh_block(&mut self, count: usize) -> DesignResult<Vec<i32>> {
        Ok(self.reserve(count)?.collect())
    }

    /// Claim a contiguous id range without materialising it.
    ///
    /// Fails when the range would run past the largest DIMACS variable id.
    pub fn reserve(&mut self, count: usize) -> DesignResult<Range<i32>> {
        let start = self.next_id;
        let end = i32::try_from(count)
            .ok()
            .and_then(|count| start.checked_add(count))
            .ok_or_else(|| {
                DesignError::config(format!(
                    "{} auxiliary variables after id {} exceed the {} variable limit",
                    count,
                    start - 1,
                    i32::MAX
                ))
            })?;
        self.next_id = end;
        Ok(start..end)
    }

    /// Highest id handed out so far (or the last base id if none)
    pub fn highest(&self) -> i32 {
        self.next_id - 1
    }

    pub fn peek(&self) -> i32 {
        self.next_id
    }
}
