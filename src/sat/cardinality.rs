//! At-most-k cardinality constraints and the compositions built on them
//!
//! The default encoding forbids every (k+1)-subset of the constrained set with
//! one clause, which costs `C(n, k+1)` clauses. That is only affordable while
//! sets stay small (a position's symbols, a word's class variables, one match
//! vector per word pair). The sequential counter is a linear-size alternative
//! that admits exactly the same assignments of the constrained variables, at
//! the price of `(n - 1) * k` auxiliary variables per constraint.

use super::variables::AuxAllocator;
use super::Clause;
use crate::config::CardinalityEncoding;
use crate::error::DesignResult;
use itertools::Itertools;

/// Generates cardinality clauses with a fixed encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    encoding: CardinalityEncoding,
}

impl Cardinality {
    pub fn new(encoding: CardinalityEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> CardinalityEncoding {
        self.encoding
    }

    /// Clauses allowing at most `k` of `variables` to be true
    pub fn at_most_k(&self, variables: &[i32], k: usize, aux: &mut AuxAllocator) -> DesignResult<Vec<Clause>> {
        match self.encoding {
            CardinalityEncoding::Combinations => Ok(at_most_k_combinations(variables, k)),
            CardinalityEncoding::SequentialCounter => at_most_k_sequential(variables, k, aux),
        }
    }

    /// At least one and at most one of `variables`
    pub fn exactly_one(&self, variables: &[i32], aux: &mut AuxAllocator) -> DesignResult<Vec<Clause>> {
        let mut clauses = vec![Clause::new(variables.to_vec())];
        clauses.extend(self.at_most_k(variables, 1, aux)?);
        Ok(clauses)
    }

    /// Exactly `target` true in `class` when `class` and `rest` together always hold
    /// exactly `total` true variables.
    ///
    /// Bounds both sides from above: `class <= target` and `rest <= total - target`.
    /// Since the two counts sum to `total`, both are forced to their exact values.
    pub fn exactly_split(
        &self,
        class: &[i32],
        rest: &[i32],
        target: usize,
        total: usize,
        aux: &mut AuxAllocator,
    ) -> DesignResult<Vec<Clause>> {
        debug_assert!(target <= total);
        let mut clauses = self.at_most_k(class, target, aux)?;
        clauses.extend(self.at_most_k(rest, total - target, aux)?);
        Ok(clauses)
    }

    /// Number of clauses `at_most_k` emits for a set of `n` variables
    pub fn clause_count(&self, n: usize, k: usize) -> usize {
        match self.encoding {
            CardinalityEncoding::Combinations => binomial(n, k + 1),
            CardinalityEncoding::SequentialCounter => {
                if k >= n {
                    0
                } else if k == 0 {
                    n
                } else {
                    k + 1 + (n - 2) * (2 * k + 1)
                }
            }
        }
    }

    /// Number of auxiliary variables `at_most_k` allocates for a set of `n` variables
    pub fn aux_count(&self, n: usize, k: usize) -> usize {
        match self.encoding {
            CardinalityEncoding::Combinations => 0,
            CardinalityEncoding::SequentialCounter => {
                if k >= n || k == 0 {
                    0
                } else {
                    (n - 1) * k
                }
            }
        }
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::new(CardinalityEncoding::Combinations)
    }
}

/// One clause per (k+1)-subset, negating every member
pub fn at_most_k_combinations(variables: &[i32], k: usize) -> Vec<Clause> {
    variables
        .iter()
        .copied()
        .combinations(k + 1)
        .map(|subset| Clause::not_all(&subset))
        .collect()
}

/// Sinz's sequential counter: `s[i][j]` holds when at least `j + 1` of the first
/// `i + 1` variables are true.
pub fn at_most_k_sequential(variables: &[i32], k: usize, aux: &mut AuxAllocator) -> DesignResult<Vec<Clause>> {
    let n = variables.len();
    if k >= n {
        return Ok(Vec::new());
    }
    if k == 0 {
        return Ok(variables.iter().map(|&x| Clause::unit(-x)).collect());
    }

    let counters = aux.fresh_block((n - 1) * k)?;
    let s = |i: usize, j: usize| counters[i * k + j];
    let x = variables;
    let mut clauses = Vec::with_capacity(k + 1 + (n - 2) * (2 * k + 1));

    clauses.push(Clause::new(vec![-x[0], s(0, 0)]));
    for j in 1..k {
        clauses.push(Clause::unit(-s(0, j)));
    }

    for i in 1..n - 1 {
        clauses.push(Clause::new(vec![-x[i], s(i, 0)]));
        clauses.push(Clause::new(vec![-s(i - 1, 0), s(i, 0)]));
        for j in 1..k {
            clauses.push(Clause::new(vec![-x[i], -s(i - 1, j - 1), s(i, j)]));
            clauses.push(Clause::new(vec![-s(i - 1, j), s(i, j)]));
        }
        clauses.push(Clause::new(vec![-x[i], -s(i - 1, k - 1)]));
    }

    clauses.push(Clause::new(vec![-x[n - 1], -s(n - 2, k - 1)]));
    Ok(clauses)
}

/// `C(n, k)`, saturating at `usize::MAX`
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
        if result > usize::MAX as u128 {
            return usize::MAX;
        }
    }
    result as usize
}
