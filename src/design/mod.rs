//! Word design domain: parameters, decoding, validation and the search driver

pub mod decoder;
pub mod parameters;
pub mod problem;
pub mod solution;
pub mod validator;

pub use decoder::ModelDecoder;
pub use parameters::{Alphabet, DesignParameters};
pub use problem::{SearchReport, SearchStep, SearchTermination, StepStatus, WordDesignProblem};
pub use solution::{parse_word_list, read_word_list, DesignSolution, SolutionMetadata};
pub use validator::{hamming_distance, reverse_pairing_distance, ValidationResult, Violation, WordSetValidator};
