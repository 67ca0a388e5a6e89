//! CNF formula assembly and DIMACS serialization

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Represents a SAT clause (disjunction of literals)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    pub literals: Vec<i32>, // Positive for variable, negative for negation
}

impl Clause {
    /// Create a new clause from literals
    pub fn new(literals: Vec<i32>) -> Self {
        Self { literals }
    }

    /// Create a unit clause (single literal)
    pub fn unit(literal: i32) -> Self {
        Self {
            literals: vec![literal],
        }
    }

    /// Clause forbidding all of `variables` from being true together
    pub fn not_all(variables: &[i32]) -> Self {
        Self {
            literals: variables.iter().map(|&v| -v).collect(),
        }
    }

    /// Check if clause is empty (unsatisfiable)
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Evaluate under a total assignment given as a lookup function
    pub fn is_satisfied_by(&self, value: impl Fn(i32) -> bool) -> bool {
        self.literals.iter().any(|&literal| {
            let truth = value(literal.abs());
            if literal > 0 {
                truth
            } else {
                !truth
            }
        })
    }

    /// Highest variable mentioned by the clause
    pub fn max_variable(&self) -> i32 {
        self.literals.iter().map(|l| l.abs()).max().unwrap_or(0)
    }
}

/// An ordered clause list plus the number of variables it is declared over
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CnfFormula {
    num_vars: usize,
    clauses: Vec<Clause>,
}

impl CnfFormula {
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            clauses: Vec::new(),
        }
    }

    pub fn with_clauses(num_vars: usize, clauses: Vec<Clause>) -> Self {
        let mut formula = Self::new(num_vars);
        formula.extend(clauses);
        formula
    }

    /// Add a clause, widening the variable count if it mentions a new variable
    pub fn add_clause(&mut self, clause: Clause) {
        self.num_vars = self.num_vars.max(clause.max_variable() as usize);
        self.clauses.push(clause);
    }

    pub fn extend(&mut self, clauses: impl IntoIterator<Item = Clause>) {
        for clause in clauses {
            self.add_clause(clause);
        }
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether every clause holds under `assignment` (missing variables read as false)
    pub fn is_satisfied_by(&self, assignment: &HashMap<i32, bool>) -> bool {
        self.clauses
            .iter()
            .all(|c| c.is_satisfied_by(|v| assignment.get(&v).copied().unwrap_or(false)))
    }

    /// Write the formula in DIMACS CNF format
    pub fn write_dimacs<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            for literal in &clause.literals {
                write!(writer, "{} ", literal)?;
            }
            writeln!(writer, "0")?;
        }
        Ok(())
    }

    pub fn to_dimacs(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_dimacs(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Save the formula to a DIMACS file, creating parent directories as needed
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create formula file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.write_dimacs(&mut writer)
            .and_then(|_| writer.flush())
            .with_context(|| format!("Failed to write formula file: {}", path.display()))?;

        Ok(())
    }
}
