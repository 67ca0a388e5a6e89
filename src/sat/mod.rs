//! SAT encoding and solving for DNA word design

pub mod cardinality;
pub mod constraints;
pub mod encoder;
pub mod external_solver;
pub mod formula;
pub mod solver;
pub mod solver_factory;
pub mod variables;

pub use cardinality::Cardinality;
pub use constraints::ConstraintGenerator;
pub use encoder::{ComplexityEstimate, ComplexityLevel, EncodedFormula, EncodingStatistics, WordSetEncoder};
pub use external_solver::{parse_solver_output, ExternalSatSolver};
pub use formula::{Clause, CnfFormula};
pub use solver::{CancelToken, SatSolver, SolveBudget, SolveOutcome, SolverSolution, UnknownReason};
pub use solver_factory::UnifiedSatSolver;
pub use variables::{AuxAllocator, VariableIndexer};
