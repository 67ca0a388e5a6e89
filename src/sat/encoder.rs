//! SAT encoder for word sets of a given size

use super::cardinality::{binomial, Cardinality};
use super::variables::{AuxAllocator, VariableIndexer};
use super::{CnfFormula, ConstraintGenerator};
use crate::config::{CardinalityEncoding, EncodingConfig};
use crate::design::DesignParameters;
use crate::error::DesignResult;
use std::time::{Duration, Instant};

/// Builds one fresh formula per candidate word count
#[derive(Debug, Clone)]
pub struct WordSetEncoder {
    params: DesignParameters,
    cardinality: Cardinality,
    parallel: bool,
}

/// A built formula together with what is needed to read its models back
#[derive(Debug, Clone)]
pub struct EncodedFormula {
    pub formula: CnfFormula,
    pub indexer: VariableIndexer,
    pub statistics: EncodingStatistics,
}

impl WordSetEncoder {
    pub fn new(params: DesignParameters, config: &EncodingConfig) -> Self {
        Self {
            params,
            cardinality: Cardinality::new(config.cardinality),
            parallel: config.parallel,
        }
    }

    /// Encode "there are `word_count` words satisfying every constraint".
    ///
    /// The auxiliary allocator is created here and dropped with the build, so
    /// repeated calls for the same count are structurally identical.
    pub fn encode(&self, word_count: usize) -> DesignResult<EncodedFormula> {
        let start = Instant::now();
        let indexer =
            VariableIndexer::new(word_count, self.params.word_length, self.params.alphabet.len())?;
        let generator = ConstraintGenerator::new(self.params.clone(), indexer, self.cardinality);
        let mut aux = AuxAllocator::after(&indexer);

        let exactly_one = generator.exactly_one_symbol(&mut aux)?;
        let composition = generator.fixed_composition(&mut aux)?;
        let min_distance = generator.min_distance(&mut aux, self.parallel)?;
        let reverse_pairing = generator.reverse_pairing(&mut aux, self.parallel)?;

        let clause_counts = ClauseCounts {
            exactly_one: exactly_one.len(),
            composition: composition.len(),
            min_distance: min_distance.len(),
            reverse_pairing: reverse_pairing.len(),
        };

        let mut formula = CnfFormula::new(aux.highest() as usize);
        formula.extend(exactly_one);
        formula.extend(composition);
        formula.extend(min_distance);
        formula.extend(reverse_pairing);

        let statistics = EncodingStatistics {
            word_count,
            word_length: self.params.word_length,
            alphabet_size: self.params.alphabet.len(),
            cardinality: self.cardinality.encoding(),
            base_variables: indexer.base_count() as usize,
            auxiliary_variables: (aux.highest() - indexer.base_count()) as usize,
            total_variables: formula.num_vars(),
            clause_counts,
            total_clauses: formula.num_clauses(),
            encode_time: start.elapsed(),
        };

        log::debug!(
            "encoded K={}: {} variables, {} clauses in {:.3}s",
            word_count,
            statistics.total_variables,
            statistics.total_clauses,
            statistics.encode_time.as_secs_f64()
        );

        Ok(EncodedFormula {
            formula,
            indexer,
            statistics,
        })
    }

    /// Exact formula size for `word_count` words, computed without building it
    pub fn estimate(&self, word_count: usize) -> DesignResult<ComplexityEstimate> {
        let indexer =
            VariableIndexer::new(word_count, self.params.word_length, self.params.alphabet.len())?;
        let card = &self.cardinality;
        let k = word_count;
        let length = self.params.word_length;
        let alphabet = self.params.alphabet.len();
        let (strong, weak) = self.params.alphabet.partition();
        let gc = self.params.gc_target;

        let positions = k * length;
        let distinct_pairs = binomial(k, 2);
        let ordered_pairs = k * k;

        let clause_counts = ClauseCounts {
            exactly_one: positions * (1 + card.clause_count(alphabet, 1)),
            composition: k
                * (card.clause_count(length * strong.len(), gc)
                    + card.clause_count(length * weak.len(), length - gc)),
            min_distance: distinct_pairs
                * (length * alphabet + card.clause_count(length, self.params.max_matches())),
            reverse_pairing: ordered_pairs
                * (length * alphabet + card.clause_count(length, self.params.max_pairings())),
        };

        let auxiliary_variables = positions * card.aux_count(alphabet, 1)
            + k * (card.aux_count(length * strong.len(), gc)
                + card.aux_count(length * weak.len(), length - gc))
            + distinct_pairs * (length + card.aux_count(length, self.params.max_matches()))
            + ordered_pairs * (length + card.aux_count(length, self.params.max_pairings()));

        let base_variables = indexer.base_count() as usize;
        let total_variables = base_variables + auxiliary_variables;
        let total_clauses = clause_counts.total();

        Ok(ComplexityEstimate {
            word_count,
            complexity_level: ComplexityLevel::from_clauses(total_clauses),
            base_variables,
            auxiliary_variables,
            total_variables,
            clause_counts,
            total_clauses,
        })
    }

    pub fn params(&self) -> &DesignParameters {
        &self.params
    }
}

/// Clauses contributed by each constraint family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClauseCounts {
    pub exactly_one: usize,
    pub composition: usize,
    pub min_distance: usize,
    pub reverse_pairing: usize,
}

impl ClauseCounts {
    pub fn total(&self) -> usize {
        self.exactly_one + self.composition + self.min_distance + self.reverse_pairing
    }
}

/// Statistics about the SAT encoding
#[derive(Debug, Clone)]
pub struct EncodingStatistics {
    pub word_count: usize,
    pub word_length: usize,
    pub alphabet_size: usize,
    pub cardinality: CardinalityEncoding,
    pub base_variables: usize,
    pub auxiliary_variables: usize,
    pub total_variables: usize,
    pub clause_counts: ClauseCounts,
    pub total_clauses: usize,
    pub encode_time: Duration,
}

/// Complexity estimate for the problem
#[derive(Debug, Clone)]
pub struct ComplexityEstimate {
    pub word_count: usize,
    pub complexity_level: ComplexityLevel,
    pub base_variables: usize,
    pub auxiliary_variables: usize,
    pub total_variables: usize,
    pub clause_counts: ClauseCounts,
    pub total_clauses: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    fn from_clauses(clauses: usize) -> Self {
        if clauses < 100_000 {
            ComplexityLevel::Low
        } else if clauses < 1_000_000 {
            ComplexityLevel::Medium
        } else if clauses < 10_000_000 {
            ComplexityLevel::High
        } else {
            ComplexityLevel::VeryHigh
        }
    }
}

impl std::fmt::Display for ClauseCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "    Exactly one symbol: {}", self.exactly_one)?;
        writeln!(f, "    Fixed composition: {}", self.composition)?;
        writeln!(f, "    Minimum distance: {}", self.min_distance)?;
        writeln!(f, "    Reverse pairing: {}", self.reverse_pairing)?;
        Ok(())
    }
}

impl std::fmt::Display for EncodingStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Encoding Statistics:")?;
        writeln!(f, "  Words: {} x {} symbols", self.word_count, self.word_length)?;
        writeln!(f, "  Alphabet size: {}", self.alphabet_size)?;
        writeln!(f, "  Cardinality encoding: {:?}", self.cardinality)?;
        writeln!(
            f,
            "  Variables: {} ({} base, {} auxiliary)",
            self.total_variables, self.base_variables, self.auxiliary_variables
        )?;
        writeln!(f, "  Clauses: {}", self.total_clauses)?;
        write!(f, "{}", self.clause_counts)?;
        writeln!(f, "  Encode time: {:.3}s", self.encode_time.as_secs_f64())?;
        Ok(())
    }
}

impl std::fmt::Display for ComplexityEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Problem Complexity Estimate (K={}):", self.word_count)?;
        writeln!(f, "  Complexity level: {:?}", self.complexity_level)?;
        writeln!(
            f,
            "  Variables: {} ({} base, {} auxiliary)",
            self.total_variables, self.base_variables, self.auxiliary_variables
        )?;
        writeln!(f, "  Clauses: {}", self.total_clauses)?;
        write!(f, "{}", self.clause_counts)?;

        let recommendation = match self.complexity_level {
            ComplexityLevel::Low => "Should encode and solve quickly",
            ComplexityLevel::Medium => "May take some time to solve",
            ComplexityLevel::High => "Large formula, consider the sequential counter encoding",
            ComplexityLevel::VeryHigh => {
                "Very large formula, use the sequential counter encoding or a smaller word count"
            }
        };
        writeln!(f, "  Recommendation: {}", recommendation)?;

        Ok(())
    }
}
