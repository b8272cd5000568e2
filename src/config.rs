//! Fill options

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How rewritten literals are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `T{A: 1, B: 2}`
    Inline,
    /// One element per line, indented from the literal's line
    Multiline,
}

/// What to do when a named type cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTypePolicy {
    /// Fail the request with `TypeNotFound`
    Error,
    /// Zero-fill unknown named types as `T{}` and keep unknown nested literals verbatim
    EmptyLiteral,
}

/// Options for literal filling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillOptions {
    /// Layout of rewritten literals
    pub layout: Layout,
    /// Indentation unit for multiline layout
    pub indent: String,
    /// Policy for unresolvable named types
    pub unknown_types: UnknownTypePolicy,
    /// Whether `_test.go` files contribute declarations
    pub include_test_files: bool,
    /// Worker threads for batch fills (default: num_cpus)
    pub parallelism: usize,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            layout: Layout::Multiline,
            indent: "\t".to_string(),
            unknown_types: UnknownTypePolicy::Error,
            include_test_files: false,
            parallelism: num_cpus::get(),
        }
    }
}

impl FillOptions {
    /// Loads options from a JSON document; absent keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: FillOptions =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Checks option values
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(Error::Config("parallelism must be at least 1".to_string()));
        }
        if !self.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(Error::Config(format!(
                "indent must be spaces or tabs, got {:?}",
                self.indent
            )));
        }
        Ok(())
    }
}
