//! Constraint generation for the word design SAT encoding

use super::cardinality::Cardinality;
use super::variables::{AuxAllocator, VariableIndexer};
use super::Clause;
use crate::design::DesignParameters;
use crate::error::{DesignError, DesignResult};
use rayon::prelude::*;

/// Generates the four constraint families over a fixed set of words.
///
/// Every method threads the caller's [`AuxAllocator`]; none keeps allocation
/// state of its own, so a fresh allocator per build gives a fresh numbering.
pub struct ConstraintGenerator {
    params: DesignParameters,
    indexer: VariableIndexer,
    cardinality: Cardinality,
}

impl ConstraintGenerator {
    /// Create a new constraint generator
    pub fn new(params: DesignParameters, indexer: VariableIndexer, cardinality: Cardinality) -> Self {
        debug_assert_eq!(params.word_length, indexer.word_length());
        debug_assert_eq!(params.alphabet.len(), indexer.alphabet_size());
        Self {
            params,
            indexer,
            cardinality,
        }
    }

    /// Every position of every word carries exactly one symbol
    pub fn exactly_one_symbol(&self, aux: &mut AuxAllocator) -> DesignResult<Vec<Clause>> {
        let mut clauses = Vec::new();
        for word in 0..self.indexer.word_count() {
            for position in 0..self.params.word_length {
                let symbols = self.indexer.position_variables(word, position);
                clauses.extend(self.cardinality.exactly_one(&symbols, aux)?);
            }
        }
        Ok(clauses)
    }

    /// Every word holds exactly `gc_target` strong symbols
    pub fn fixed_composition(&self, aux: &mut AuxAllocator) -> DesignResult<Vec<Clause>> {
        let (strong, weak) = self.params.alphabet.partition();
        let length = self.params.word_length;
        let mut clauses = Vec::new();

        for word in 0..self.indexer.word_count() {
            let mut strong_vars = Vec::with_capacity(length * strong.len());
            let mut weak_vars = Vec::with_capacity(length * weak.len());
            for position in 0..length {
                strong_vars.extend(strong.iter().map(|&c| self.indexer.id(word, position, c)));
                weak_vars.extend(weak.iter().map(|&c| self.indexer.id(word, position, c)));
            }
            clauses.extend(self.cardinality.exactly_split(
                &strong_vars,
                &weak_vars,
                self.params.gc_target,
                length,
                aux,
            )?);
        }
        Ok(clauses)
    }

    /// Match bound for one unordered pair of distinct words.
    ///
    /// One fresh variable per position is forced true whenever both words
    /// carry the same symbol there; bounding how many of them may be true
    /// leaves at least `min_hamming_distance` positions that differ.
    pub fn min_distance_pair(
        &self,
        first: usize,
        second: usize,
        aux: &mut AuxAllocator,
    ) -> DesignResult<Vec<Clause>> {
        let alphabet_size = self.params.alphabet.len();
        let matches = aux.fresh_block(self.params.word_length)?;
        let mut clauses = Vec::with_capacity(self.params.word_length * alphabet_size);

        for (position, &matched) in matches.iter().enumerate() {
            for symbol in 0..alphabet_size {
                clauses.push(Clause::new(vec![
                    -self.indexer.id(first, position, symbol),
                    -self.indexer.id(second, position, symbol),
                    matched,
                ]));
            }
        }

        clauses.extend(
            self.cardinality
                .at_most_k(&matches, self.params.max_matches(), aux)?,
        );
        Ok(clauses)
    }

    /// Complementary-alignment bound for one ordered pair (possibly a word with itself).
    ///
    /// Offset `i` compares position `L-1-i` of `first` with position `i` of
    /// `second` through the complement table, i.e. `first` read backwards
    /// against `second` read forwards.
    pub fn reverse_pairing_pair(
        &self,
        first: usize,
        second: usize,
        aux: &mut AuxAllocator,
    ) -> DesignResult<Vec<Clause>> {
        let length = self.params.word_length;
        let pairings = aux.fresh_block(length)?;
        let mut clauses = Vec::with_capacity(length * self.params.alphabet.len());

        for (offset, &paired) in pairings.iter().enumerate() {
            let mirrored = length - 1 - offset;
            for (c1, c2) in self.params.alphabet.complementary_pairs() {
                clauses.push(Clause::new(vec![
                    -self.indexer.id(first, mirrored, c1),
                    -self.indexer.id(second, offset, c2),
                    paired,
                ]));
            }
        }

        clauses.extend(
            self.cardinality
                .at_most_k(&pairings, self.params.max_pairings(), aux)?,
        );
        Ok(clauses)
    }

    /// Minimum Hamming distance over all unordered pairs of distinct words
    pub fn min_distance(&self, aux: &mut AuxAllocator, parallel: bool) -> DesignResult<Vec<Clause>> {
        let block = self.min_distance_block_size();
        self.pair_blocks(&self.distinct_pairs(), block, aux, parallel, |a, b, local| {
            self.min_distance_pair(a, b, local)
        })
    }

    /// Reverse-pairing distance over all ordered pairs, self-pairs included
    pub fn reverse_pairing(&self, aux: &mut AuxAllocator, parallel: bool) -> DesignResult<Vec<Clause>> {
        let block = self.reverse_pairing_block_size();
        self.pair_blocks(&self.ordered_pairs(), block, aux, parallel, |a, b, local| {
            self.reverse_pairing_pair(a, b, local)
        })
    }

    /// Auxiliary ids consumed by one `min_distance_pair` call
    pub fn min_distance_block_size(&self) -> usize {
        let length = self.params.word_length;
        length + self.cardinality.aux_count(length, self.params.max_matches())
    }

    /// Auxiliary ids consumed by one `reverse_pairing_pair` call
    pub fn reverse_pairing_block_size(&self) -> usize {
        let length = self.params.word_length;
        length + self.cardinality.aux_count(length, self.params.max_pairings())
    }

    /// (w1, w2) with w1 < w2, in lexicographic order
    pub fn distinct_pairs(&self) -> Vec<(usize, usize)> {
        let k = self.indexer.word_count();
        (0..k)
            .flat_map(|a| (a + 1..k).map(move |b| (a, b)))
            .collect()
    }

    /// Every (w1, w2) including w1 == w2, in lexicographic order
    pub fn ordered_pairs(&self) -> Vec<(usize, usize)> {
        let k = self.indexer.word_count();
        (0..k).flat_map(|a| (0..k).map(move |b| (a, b))).collect()
    }

    /// Build one clause block per pair.
    ///
    /// The auxiliary range of the whole family is reserved up front and pair
    /// `n` owns the slice starting at `n * block`, so the numbering (and the
    /// clause order) is the same whether the blocks are built in parallel or not.
    fn pair_blocks<F>(
        &self,
        pairs: &[(usize, usize)],
        block: usize,
        aux: &mut AuxAllocator,
        parallel: bool,
        build: F,
    ) -> DesignResult<Vec<Clause>>
    where
        F: Fn(usize, usize, &mut AuxAllocator) -> DesignResult<Vec<Clause>> + Sync + Send,
    {
        let total = pairs.len().checked_mul(block).ok_or_else(|| {
            DesignError::config(format!(
                "{} pairs of {} auxiliary variables overflow the id space",
                pairs.len(),
                block
            ))
        })?;
        let range = aux.reserve(total)?;
        // Every slice lies inside the reserved range, so the offsets fit in i32
        let slice_start = |index: usize| range.start + (index * block) as i32;

        let build_one = |(index, &(a, b)): (usize, &(usize, usize))| {
            let mut local = AuxAllocator::starting_at(slice_start(index));
            let clauses = build(a, b, &mut local)?;
            debug_assert_eq!(local.peek(), slice_start(index + 1));
            log::trace!("pair ({}, {}): {} clauses", a, b, clauses.len());
            Ok(clauses)
        };

        let blocks: Vec<Vec<Clause>> = if parallel {
            pairs
                .par_iter()
                .enumerate()
                .map(build_one)
                .collect::<DesignResult<_>>()?
        } else {
            pairs
                .iter()
                .enumerate()
                .map(build_one)
                .collect::<DesignResult<_>>()?
        };

        Ok(blocks.into_iter().flatten().collect())
    }

    pub fn indexer(&self) -> &VariableIndexer {
        &self.indexer
    }

    pub fn params(&self) -> &DesignParameters {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardinalityEncoding;
    use crate::design::Alphabet;

    fn generator(k: usize, params: DesignParameters) -> ConstraintGenerator {
        let indexer = VariableIndexer::new(k, params.word_length, params.alphabet.len()).unwrap();
        ConstraintGenerator::new(params, indexer, Cardinality::default())
    }

    fn small_params(length: usize, hamming: usize, reverse: usize) -> DesignParameters {
        DesignParameters::new(length, Alphabet::dna(), None, hamming, reverse).unwrap()
    }

    /// Decode an assignment mask over the base variables of `k` words of `length`
    fn assignment_words(mask: u64, k: usize, length: usize) -> Option<Vec<Vec<usize>>> {
        let indexer = VariableIndexer::new(k, length, 4).unwrap();
        let mut words = Vec::new();
        for w in 0..k {
            let mut word = Vec::new();
            for i in 0..length {
                let set: Vec<usize> = (0..4)
                    .filter(|&c| mask >> (indexer.id(w, i, c) - 1) & 1 == 1)
                    .collect();
                if set.len() != 1 {
                    return None;
                }
                word.push(set[0]);
            }
            words.push(word);
        }
        Some(words)
    }

    #[test]
    fn test_exactly_one_symbol_clause_count() {
        let gen = generator(3, DesignParameters::default());
        let mut aux = AuxAllocator::after(gen.indexer());
        let clauses = gen.exactly_one_symbol(&mut aux).unwrap();
        // per position: 1 at-least-one + C(4, 2) pairwise exclusions
        assert_eq!(clauses.len(), 3 * 8 * 7);
        assert_eq!(aux.peek(), 97);
    }

    #[test]
    fn test_exactly_one_symbol_models() {
        // One word of length 2: 8 base variables, enumerate all assignments
        let gen = generator(1, small_params(2, 0, 0));
        let mut aux = AuxAllocator::after(gen.indexer());
        let clauses = gen.exactly_one_symbol(&mut aux).unwrap();

        for mask in 0u64..1 << 8 {
            let satisfied = clauses
                .iter()
                .all(|c| c.is_satisfied_by(|v| mask >> (v - 1) & 1 == 1));
            assert_eq!(satisfied, assignment_words(mask, 1, 2).is_some());
        }
    }

    #[test]
    fn test_fixed_composition_is_exact() {
        // One word of length 3 with gc_target 1
        let params = DesignParameters::new(3, Alphabet::dna(), Some(1), 0, 0).unwrap();
        let gen = generator(1, params);
        let mut aux = AuxAllocator::after(gen.indexer());
        let mut clauses = gen.exactly_one_symbol(&mut aux).unwrap();
        clauses.extend(gen.fixed_composition(&mut aux).unwrap());

        let dna = Alphabet::dna();
        let mut models = 0;
        for mask in 0u64..1 << 12 {
            let satisfied = clauses
                .iter()
                .all(|c| c.is_satisfied_by(|v| mask >> (v - 1) & 1 == 1));
            if let Some(words) = assignment_words(mask, 1, 3) {
                let strong = words[0].iter().filter(|&&c| dna.is_strong(c)).count();
                assert_eq!(satisfied, strong == 1, "word {:?}", words[0]);
                if satisfied {
                    models += 1;
                }
            } else {
                assert!(!satisfied);
            }
        }
        // 3 positions for the strong symbol, 2 choices there, 2 * 2 elsewhere
        assert_eq!(models, 3 * 2 * 4);
    }

    #[test]
    fn test_fixed_composition_zero_and_full_targets() {
        // Length 2: one side gets 4 unit exclusions, the other C(4, 3) triples
        for target in [0, 2] {
            let params = DesignParameters::new(2, Alphabet::dna(), Some(target), 0, 0).unwrap();
            let gen = generator(1, params);
            let mut aux = AuxAllocator::after(gen.indexer());
            let clauses = gen.fixed_composition(&mut aux).unwrap();
            assert_eq!(clauses.len(), 8);
            assert_eq!(clauses.iter().filter(|c| c.len() == 1).count(), 4);
        }
    }

    #[test]
    fn test_min_distance_pair_structure() {
        let gen = generator(2, DesignParameters::default());
        let mut aux = AuxAllocator::after(gen.indexer());
        let clauses = gen.min_distance_pair(0, 1, &mut aux).unwrap();

        // 8 positions * 4 symbols implications + C(8, 5) bound clauses
        assert_eq!(clauses.len(), 32 + 56);
        assert_eq!(aux.peek(), 65 + 8);
        assert_eq!(clauses[0], Clause::new(vec![-1, -33, 65]));
        assert_eq!(clauses[5], Clause::new(vec![-6, -38, 66]));
    }

    #[test]
    fn test_min_distance_models() {
        // Two words of length 2, distance 1: the words must differ somewhere
        let gen = generator(2, small_params(2, 1, 0));
        let mut aux = AuxAllocator::after(gen.indexer());
        let mut clauses = gen.exactly_one_symbol(&mut aux).unwrap();
        let base_clauses = clauses.len();
        clauses.extend(gen.min_distance(&mut aux, false).unwrap());
        assert!(clauses.len() > base_clauses);
        let aux_count = (aux.peek() - 17) as u32;

        for w0 in 0..16usize {
            for w1 in 0..16usize {
                let words = [[w0 / 4, w0 % 4], [w1 / 4, w1 % 4]];
                let mut mask = 0u64;
                for (w, word) in words.iter().enumerate() {
                    for (i, &c) in word.iter().enumerate() {
                        mask |= 1 << (gen.indexer().id(w, i, c) - 1);
                    }
                }
                let satisfiable = (0..1u64 << aux_count).any(|extra| {
                    let full = mask | extra << 16;
                    clauses
                        .iter()
                        .all(|c| c.is_satisfied_by(|v| full >> (v - 1) & 1 == 1))
                });
                assert_eq!(satisfiable, w0 != w1, "words {:?}", words);
            }
        }
    }

    #[test]
    fn test_reverse_pairing_pair_structure() {
        let gen = generator(2, DesignParameters::default());
        let mut aux = AuxAllocator::after(gen.indexer());
        let clauses = gen.reverse_pairing_pair(0, 1, &mut aux).unwrap();

        assert_eq!(clauses.len(), 32 + 56);
        // offset 0 compares position 7 of word 0 with position 0 of word 1: A pairs with T
        let a_at_7 = gen.indexer().id(0, 7, 0);
        let t_at_0 = gen.indexer().id(1, 0, 3);
        assert_eq!(clauses[0], Clause::new(vec![-a_at_7, -t_at_0, 65]));
    }

    #[test]
    fn test_reverse_pairing_models_include_self_pairs() {
        // One word of length 2, reverse distance 1: the word may not equal its own reverse complement
        let gen = generator(1, small_params(2, 0, 1));
        let dna = Alphabet::dna();
        let mut aux = AuxAllocator::after(gen.indexer());
        let mut clauses = gen.exactly_one_symbol(&mut aux).unwrap();
        clauses.extend(gen.reverse_pairing(&mut aux, false).unwrap());
        let aux_count = (aux.peek() - 9) as u32;
        assert_eq!(aux_count, 2);

        for w in 0..16usize {
            let word = [w / 4, w % 4];
            let mut mask = 0u64;
            for (i, &c) in word.iter().enumerate() {
                mask |= 1 << (gen.indexer().id(0, i, c) - 1);
            }
            let satisfiable = (0..1u64 << aux_count).any(|extra| {
                let full = mask | extra << 8;
                clauses
                    .iter()
                    .all(|c| c.is_satisfied_by(|v| full >> (v - 1) & 1 == 1))
            });
            let self_complementary = dna.complement(word[1]) == word[0];
            assert_eq!(satisfiable, !self_complementary, "word {:?}", word);
        }
    }

    #[test]
    fn test_pair_enumeration() {
        let gen = generator(3, DesignParameters::default());
        assert_eq!(gen.distinct_pairs(), vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(gen.ordered_pairs().len(), 9);
        assert!(gen.ordered_pairs().contains(&(2, 2)));
    }

    #[test]
    fn test_parallel_build_is_identical() {
        for encoding in [
            CardinalityEncoding::Combinations,
            CardinalityEncoding::SequentialCounter,
        ] {
            let params = DesignParameters::default();
            let indexer = VariableIndexer::new(5, 8, 4).unwrap();
            let gen = ConstraintGenerator::new(params, indexer, Cardinality::new(encoding));

            let mut sequential_aux = AuxAllocator::after(&indexer);
            let mut sequential = gen.min_distance(&mut sequential_aux, false).unwrap();
            sequential.extend(gen.reverse_pairing(&mut sequential_aux, false).unwrap());

            let mut parallel_aux = AuxAllocator::after(&indexer);
            let mut parallel = gen.min_distance(&mut parallel_aux, true).unwrap();
            parallel.extend(gen.reverse_pairing(&mut parallel_aux, true).unwrap());

            assert_eq!(sequential, parallel);
            assert_eq!(sequential_aux, parallel_aux);
        }
    }

    #[test]
    fn test_block_sizes_match_allocation() {
        let params = DesignParameters::default();
        let indexer = VariableIndexer::new(2, 8, 4).unwrap();
        let gen = ConstraintGenerator::new(
            params,
            indexer,
            Cardinality::new(CardinalityEncoding::SequentialCounter),
        );
        let mut aux = AuxAllocator::after(&indexer);
        gen.min_distance_pair(0, 1, &mut aux).unwrap();
        assert_eq!((aux.peek() - 65) as usize, gen.min_distance_block_size());
        assert_eq!(gen.min_distance_block_size(), 8 + 7 * 4);
    }

    #[test]
    fn test_pair_families_report_exhausted_ids() {
        let gen = generator(3, DesignParameters::default());
        for parallel in [false, true] {
            let mut aux = AuxAllocator::starting_at(i32::MAX - 10);
            assert!(matches!(
                gen.min_distance(&mut aux, parallel),
                Err(DesignError::Configuration(_))
            ));
            assert!(matches!(
                gen.reverse_pairing(&mut aux, parallel),
                Err(DesignError::Configuration(_))
            ));
            assert_eq!(aux.peek(), i32::MAX - 10);
        }
    }
}
