//! Configuration settings for the word design encoder

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub design: DesignConfig,
    pub solver: SolverConfig,
    pub search: SearchConfig,
    pub encoding: EncodingConfig,
    pub output: OutputConfig,
}

/// Shape of the words and the thresholds between them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignConfig {
    pub word_length: usize,
    pub alphabet: String,
    /// Complement of the i-th alphabet symbol
    pub complements: String,
    /// Symbols counted by `gc_target`
    pub strong_symbols: String,
    /// Defaults to half the word length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gc_target: Option<usize>,
    pub min_hamming_distance: usize,
    pub min_reverse_pairing_distance: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    pub executable: PathBuf,
    pub verbosity: u32,
    /// Zero disables the limit
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    Cadical,
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub start_k: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub cardinality: CardinalityEncoding,
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CardinalityEncoding {
    /// One clause per (k+1)-subset
    Combinations,
    /// Sinz sequential counter, linear in the set size
    SequentialCounter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub cnf_path: PathBuf,
    pub format: OutputFormat,
    pub output_directory: PathBuf,
    pub save_formula: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            word_length: 8,
            alphabet: "ACGT".to_string(),
            complements: "TGCA".to_string(),
            strong_symbols: "CG".to_string(),
            gc_target: None,
            min_hamming_distance: 4,
            min_reverse_pairing_distance: 4,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            design: DesignConfig::default(),
            solver: SolverConfig {
                backend: SolverBackend::Cadical,
                executable: PathBuf::from("glucose-syrup"),
                verbosity: 1,
                timeout_seconds: 300,
            },
            search: SearchConfig {
                start_k: 1,
                max_k: None,
            },
            encoding: EncodingConfig {
                cardinality: CardinalityEncoding::Combinations,
                parallel: false,
            },
            output: OutputConfig {
                cnf_path: PathBuf::from("formula.cnf"),
                format: OutputFormat::Text,
                output_directory: PathBuf::from("output/designs"),
                save_formula: false,
            },
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        crate::design::DesignParameters::from_config(&self.design)
            .context("Invalid design section")?;

        if self.search.start_k == 0 {
            anyhow::bail!("search.start_k must be positive");
        }

        if let Some(max_k) = self.search.max_k {
            if max_k < self.search.start_k {
                anyhow::bail!(
                    "search.max_k ({}) is below search.start_k ({})",
                    max_k,
                    self.search.start_k
                );
            }
        }

        if self.solver.backend == SolverBackend::External
            && self.solver.executable.as_os_str().is_empty()
        {
            anyhow::bail!("solver.executable must be set for the external backend");
        }

        Ok(())
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(ref executable) = cli_overrides.solver_executable {
            self.solver.executable = executable.clone();
            self.solver.backend = SolverBackend::External;
        }
        if let Some(backend) = cli_overrides.backend {
            self.solver.backend = backend;
        }
        if let Some(verbosity) = cli_overrides.verbosity {
            self.solver.verbosity = verbosity;
        }
        if let Some(timeout) = cli_overrides.timeout_seconds {
            self.solver.timeout_seconds = timeout;
        }
        if let Some(ref cnf_path) = cli_overrides.cnf_path {
            self.output.cnf_path = cnf_path.clone();
        }
        if let Some(format) = cli_overrides.format {
            self.output.format = format;
        }
        if let Some(start_k) = cli_overrides.start_k {
            self.search.start_k = start_k;
        }
        if let Some(max_k) = cli_overrides.max_k {
            self.search.max_k = Some(max_k);
        }
        if let Some(cardinality) = cli_overrides.cardinality {
            self.encoding.cardinality = cardinality;
        }
        if cli_overrides.parallel {
            self.encoding.parallel = true;
        }
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub solver_executable: Option<PathBuf>,
    pub backend: Option<SolverBackend>,
    pub verbosity: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub cnf_path: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub start_k: Option<usize>,
    pub max_k: Option<usize>,
    pub cardinality: Option<CardinalityEncoding>,
    pub parallel: bool,
}
