//! Parallel fill of many literals
//!
//! Uses Rayon with a bounded pool; every literal is an independent request
//! sharing only the type registry.

use super::emit::Patch;
use crate::error::{Error, Result};
use crate::lexer::Span;
use crate::parser::CompositeLiteral;
use rayon::prelude::*;
use serde::Serialize;

/// A literal that could not be filled, left untouched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Span of the literal
    pub span: Span,
    /// Line of the literal start (1-indexed)
    pub line: usize,
    /// Column of the literal start (1-indexed)
    pub column: usize,
    /// Human readable message
    pub message: String,
    /// The failure
    #[serde(skip)]
    pub error: Error,
}

/// Result of filling every literal of a file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    /// Source with all patches applied
    pub source: String,
    /// Patches that changed a literal, in source order
    pub patches: Vec<Patch>,
    /// Literals left untouched because they failed
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    /// Whether any literal changed
    pub fn changed(&self) -> bool {
        !self.patches.is_empty()
    }
}

/// Fills every literal on a pool of at most `parallelism` threads
///
/// Never fails fast: each literal gets its own outcome, in input order.
pub(crate) fn fill_literals<F>(
    literals: &[CompositeLiteral],
    fill: F,
    parallelism: usize,
) -> Result<Vec<Result<Patch>>>
where
    F: Fn(&CompositeLiteral) -> Result<Patch> + Send + Sync,
{
    // Empty fast path
    if literals.is_empty() {
        return Ok(Vec::new());
    }

    // Single literal - no pool needed
    if literals.len() == 1 {
        return Ok(vec![fill(&literals[0])]);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.max(1).min(literals.len()))
        .build()
        .map_err(|e| Error::RuntimeError(format!("Failed to create thread pool: {}", e)))?;

    Ok(pool.install(|| literals.par_iter().map(|literal| fill(literal)).collect()))
}
