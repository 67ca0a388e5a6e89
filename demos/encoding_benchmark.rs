//! Benchmark of formula construction
//!
//! Compares the two cardinality encodings, built sequentially and on the rayon
//! pool, by formula size and build time over a range of word counts.

use anyhow::Result;
use dna_word_design::config::{CardinalityEncoding, EncodingConfig};
use dna_word_design::design::DesignParameters;
use dna_word_design::sat::WordSetEncoder;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct BenchmarkResult {
    cardinality: CardinalityEncoding,
    parallel: bool,
    word_count: usize,
    variables: usize,
    clauses: usize,
    run_times: Vec<Duration>,
}

impl BenchmarkResult {
    fn average_time(&self) -> Duration {
        let total: Duration = self.run_times.iter().sum();
        total / self.run_times.len().max(1) as u32
    }

    fn min_time(&self) -> Duration {
        self.run_times.iter().copied().min().unwrap_or_default()
    }

    fn display(&self) -> String {
        format!(
            "  {:<18} {:<10} K={:<3} vars={:<8} clauses={:<10} avg={:.3}s min={:.3}s",
            format!("{:?}", self.cardinality),
            if self.parallel { "parallel" } else { "sequential" },
            self.word_count,
            self.variables,
            self.clauses,
            self.average_time().as_secs_f64(),
            self.min_time().as_secs_f64()
        )
    }
}

fn main() -> Result<()> {
    let runs_per_config = 3;
    let word_counts = [4, 8, 16, 32];
    let params = DesignParameters::default();

    println!("=== Encoding Benchmark (L={}, {} runs per configuration) ===\n", params.word_length, runs_per_config);

    let mut results = Vec::new();
    for cardinality in [CardinalityEncoding::Combinations, CardinalityEncoding::SequentialCounter] {
        for parallel in [false, true] {
            let encoder = WordSetEncoder::new(params.clone(), &EncodingConfig { cardinality, parallel });
            for &word_count in &word_counts {
                let mut result = BenchmarkResult {
                    cardinality,
                    parallel,
                    word_count,
                    variables: 0,
                    clauses: 0,
                    run_times: Vec::new(),
                };

                for _ in 0..runs_per_config {
                    let start = Instant::now();
                    let encoded = encoder.encode(word_count)?;
                    result.run_times.push(start.elapsed());
                    result.variables = encoded.statistics.total_variables;
                    result.clauses = encoded.statistics.total_clauses;
                }

                println!("{}", result.display());
                results.push(result);
            }
        }
    }

    println!("\nSpeedup of parallel construction:");
    for sequential in results.iter().filter(|r| !r.parallel) {
        if let Some(parallel) = results.iter().find(|r| {
            r.parallel && r.cardinality == sequential.cardinality && r.word_count == sequential.word_count
        }) {
            let speedup = sequential.average_time().as_secs_f64()
                / parallel.average_time().as_secs_f64().max(f64::EPSILON);
            println!(
                "  {:<18} K={:<3} {:.2}x",
                format!("{:?}", sequential.cardinality),
                sequential.word_count,
                speedup
            );
        }
    }

    Ok(())
}
