//! Main CLI application for the DNA word design encoder

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dna_word_design::{
    config::{CardinalityEncoding, CliOverrides, OutputFormat, Settings, SolverBackend},
    design::{read_word_list, DesignSolution, StepStatus, WordDesignProblem, WordSetValidator},
    utils::{ColorOutput, SolutionFormatter},
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "dna_word_design")]
#[command(about = "DNA word design via SAT encoding")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads the configuration
#[derive(Args, Debug, Clone)]
struct SharedOptions {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// DIMACS formula path (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// External solver executable; selects the external backend
    #[arg(short, long)]
    solver: Option<PathBuf>,

    /// Solver backend (overrides config and --solver)
    #[arg(long, value_enum)]
    backend: Option<SolverBackend>,

    /// Verbosity passed to the external solver
    #[arg(long)]
    verb: Option<u32>,

    /// Per-solve timeout in seconds, 0 for none
    #[arg(long)]
    timeout: Option<u64>,

    /// Output format for saved word sets
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Cardinality encoding
    #[arg(long, value_enum)]
    cardinality: Option<CardinalityEncoding>,

    /// Build pair constraints in parallel
    #[arg(long)]
    parallel: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find a word set of one fixed size
    Solve {
        /// Number of words
        #[arg(short = 'k', long)]
        words: usize,

        /// Save the word set to the output directory
        #[arg(long)]
        save: bool,

        #[command(flatten)]
        options: SharedOptions,
    },

    /// Search upward for the largest word set
    Search {
        /// First word count to try (overrides config)
        #[arg(long)]
        start: Option<usize>,

        /// Last word count to try (overrides config)
        #[arg(long)]
        max: Option<usize>,

        /// Save the best word set to the output directory
        #[arg(long)]
        save: bool,

        #[command(flatten)]
        options: SharedOptions,
    },

    /// Write the formula for a word count without solving it
    Encode {
        /// Number of words
        #[arg(short = 'k', long)]
        words: usize,

        #[command(flatten)]
        options: SharedOptions,
    },

    /// Print the exact formula size for a word count
    Estimate {
        /// Number of words
        #[arg(short = 'k', long)]
        words: usize,

        #[command(flatten)]
        options: SharedOptions,
    },

    /// Check a word list file against the design constraints
    Verify {
        /// Word list, one word per line
        words_file: PathBuf,

        #[command(flatten)]
        options: SharedOptions,
    },

    /// Create the default configuration file
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Solve { options, .. }
        | Commands::Search { options, .. }
        | Commands::Encode { options, .. }
        | Commands::Estimate { options, .. }
        | Commands::Verify { options, .. } => options.verbose,
        Commands::Setup { .. } => false,
    };
    init_logging(verbose);

    match cli.command {
        Commands::Solve {
            words,
            save,
            options,
        } => solve_command(words, save, options),
        Commands::Search {
            start,
            max,
            save,
            options,
        } => search_command(start, max, save, options),
        Commands::Encode { words, options } => encode_command(words, options),
        Commands::Estimate { words, options } => estimate_command(words, options),
        Commands::Verify {
            words_file,
            options,
        } => verify_command(words_file, options),
        Commands::Setup { directory, force } => setup_command(directory, force),
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Load the configuration file (or defaults) and apply command line overrides
fn load_settings(options: &SharedOptions, start_k: Option<usize>, max_k: Option<usize>) -> Result<Settings> {
    let mut settings = if options.config.exists() {
        Settings::from_file(&options.config)
            .with_context(|| format!("Failed to load config from {}", options.config.display()))?
    } else {
        log::warn!("Config file {} not found, using defaults", options.config.display());
        Settings::default()
    };

    let cli_overrides = CliOverrides {
        solver_executable: options.solver.clone(),
        backend: options.backend,
        verbosity: options.verb,
        timeout_seconds: options.timeout,
        cnf_path: options.output.clone(),
        format: options.format,
        start_k,
        max_k,
        cardinality: options.cardinality,
        parallel: options.parallel,
    };
    settings.merge_with_cli(&cli_overrides);

    settings
        .validate()
        .context("Configuration validation failed")?;

    if options.verbose {
        let design = &settings.design;
        println!("Configuration:");
        println!("  Word length: {}", design.word_length);
        println!("  Alphabet: {} (complements {})", design.alphabet, design.complements);
        println!("  Hamming distance: >= {}", design.min_hamming_distance);
        println!("  Reverse pairing distance: >= {}", design.min_reverse_pairing_distance);
        println!("  Backend: {:?}", settings.solver.backend);
        println!("  Cardinality encoding: {:?}", settings.encoding.cardinality);
        println!();
    }

    Ok(settings)
}

fn solve_command(words: usize, save: bool, options: SharedOptions) -> Result<()> {
    let settings = load_settings(&options, None, None)?;
    let problem = WordDesignProblem::new(settings.clone()).context("Failed to create problem")?;

    if options.verbose {
        println!("{}", problem.estimate(words)?);
    }

    println!("{}", ColorOutput::info(&format!("Solving for {} words...", words)));
    let step = problem.solve_fixed(words)?;
    println!("{}", SolutionFormatter::format_step(&step));

    match (&step.status, &step.solution) {
        (StepStatus::Satisfiable, Some(solution)) => {
            println!("\n{}", SolutionFormatter::format_solution(solution));
            if save {
                save_solution(solution, &settings)?;
            }
        }
        (StepStatus::Unsatisfiable, _) => {
            println!("{}", ColorOutput::warning(&format!("No set of {} words exists", words)));
        }
        _ => {
            println!("{}", ColorOutput::warning("Solver gave no verdict"));
        }
    }

    Ok(())
}

fn search_command(start: Option<usize>, max: Option<usize>, save: bool, options: SharedOptions) -> Result<()> {
    let settings = load_settings(&options, start, max)?;
    let problem = WordDesignProblem::new(settings.clone()).context("Failed to create problem")?;

    println!(
        "{}",
        ColorOutput::info(&format!("Searching from K={}...", settings.search.start_k))
    );
    let start_time = Instant::now();
    let report = problem.search_with(|step| {
        println!("{}", SolutionFormatter::format_step(step));
    })?;

    println!("\n{}", SolutionFormatter::format_search_summary(&report));
    println!("Total time: {:.3}s", start_time.elapsed().as_secs_f64());

    if let Some(best) = &report.best {
        println!("\n{}", SolutionFormatter::format_solution(best));
        if save {
            save_solution(best, &settings)?;
        }
    }

    if report.is_conclusive() {
        println!("{}", ColorOutput::success("Search complete"));
    } else if report.max_satisfiable_k.is_none() {
        println!("{}", ColorOutput::warning("Maximum not established; try a lower start_k"));
    } else {
        println!("{}", ColorOutput::warning("Result is a lower bound"));
    }

    Ok(())
}

fn encode_command(words: usize, options: SharedOptions) -> Result<()> {
    let settings = load_settings(&options, None, None)?;
    let problem = WordDesignProblem::new(settings.clone()).context("Failed to create problem")?;

    let statistics = problem.encode_to_file(words)?;
    println!("{}", statistics);
    println!(
        "{}",
        ColorOutput::success(&format!("Formula written to {}", settings.output.cnf_path.display()))
    );
    Ok(())
}

fn estimate_command(words: usize, options: SharedOptions) -> Result<()> {
    let settings = load_settings(&options, None, None)?;
    let problem = WordDesignProblem::new(settings).context("Failed to create problem")?;

    println!("{}", problem.estimate(words)?);
    Ok(())
}

fn verify_command(words_file: PathBuf, options: SharedOptions) -> Result<()> {
    let settings = load_settings(&options, None, None)?;
    let problem = WordDesignProblem::new(settings).context("Failed to create problem")?;
    let words = read_word_list(&words_file)?;

    println!(
        "{}",
        ColorOutput::info(&format!("Checking {} words from {}", words.len(), words_file.display()))
    );
    let validator: &WordSetValidator = problem.validator();
    let result = validator.validate(&words);
    println!("{}", result);

    if result.is_valid {
        println!("{}", ColorOutput::success("Word set is valid"));
        Ok(())
    } else {
        anyhow::bail!("{} constraint violations", result.violations.len())
    }
}

fn save_solution(solution: &DesignSolution, settings: &Settings) -> Result<()> {
    let path = SolutionFormatter::save_solution(
        solution,
        &settings.output.output_directory,
        settings.output.format,
    )
    .context("Failed to save word set")?;
    println!("{}", ColorOutput::success(&format!("Word set saved to {}", path.display())));
    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("Setting up project structure..."));

    let config_dir = directory.join("config");
    let output_dir = directory.join("output/designs");
    for dir in [&config_dir, &output_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let config_path = config_dir.join("default.yaml");
    write_config(&config_path, &Settings::default(), force)?;

    // Shorter words for quick experiments
    let mut small = Settings::default();
    small.design.word_length = 4;
    small.design.min_hamming_distance = 2;
    small.design.min_reverse_pairing_distance = 2;
    small.solver.timeout_seconds = 60;
    write_config(&config_dir.join("small.yaml"), &small, force)?;

    println!("\n{}", ColorOutput::success("Setup complete!"));
    println!("\nNext steps:");
    println!("1. Edit {}", config_path.display());
    println!("2. Run: dna_word_design search --config {}", config_path.display());

    Ok(())
}

fn write_config(path: &Path, settings: &Settings, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Skipped: {} (already exists)", path.display());
        return Ok(());
    }
    settings
        .to_file(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    println!("Created: {}", ColorOutput::highlight(&path.display().to_string()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "dna_word_design",
            "search",
            "--config",
            "test.yaml",
            "--solver",
            "./glucose",
            "--timeout",
            "10",
            "--max",
            "12",
        ]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from(["dna_word_design", "solve", "-k", "3", "--backend", "cadical"]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from(["dna_word_design", "estimate", "-k", "5", "--cardinality", "sequential-counter"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_cli_requires_word_count() {
        assert!(Cli::try_parse_from(["dna_word_design", "solve"]).is_err());
    }

    #[test]
    fn test_setup_command() {
        let temp_dir = tempdir().unwrap();
        let result = setup_command(temp_dir.path().to_path_buf(), false);

        assert!(result.is_ok());
        let config = temp_dir.path().join("config/default.yaml");
        assert!(config.exists());
        assert!(Settings::from_file(&config).is_ok());
        assert!(Settings::from_file(&temp_dir.path().join("config/small.yaml")).is_ok());
    }

    #[test]
    fn test_verify_command() {
        let temp_dir = tempdir().unwrap();
        let words = temp_dir.path().join("words.txt");
        std::fs::write(&words, "# length 8\nAACCGGTT\n").unwrap();

        let options = SharedOptions {
            config: temp_dir.path().join("missing.yaml"),
            output: None,
            solver: None,
            backend: None,
            verb: None,
            timeout: None,
            format: None,
            cardinality: None,
            parallel: false,
            verbose: false,
        };
        // AACCGGTT is its own reverse complement
        assert!(verify_command(words.clone(), options.clone()).is_err());

        std::fs::write(&words, "AACCAACC\n").unwrap();
        assert!(verify_command(words, options).is_ok());
    }
}
