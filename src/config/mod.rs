//! Configuration management for the word design encoder

pub mod settings;

pub use settings::{
    CardinalityEncoding, CliOverrides, DesignConfig, EncodingConfig, OutputConfig, OutputFormat,
    SearchConfig, Settings, SolverBackend, SolverConfig,
};
