//! Literal filling engine
//!
//! ```text
//! CompositeLiteral ─► Resolver ─► Normalizer ─► (zero values) ─► Emitter ─► Patch
//!                        ▲             │
//!                        └─ nested ────┘
//! ```
//!
//! One request normalizes one literal synchronously. Requests may run
//! concurrently; they share only the [`TypeRegistry`].

mod batch;
mod emit;
pub mod locate;
mod normalize;
mod resolve;
mod zero;

pub use batch::{Diagnostic, FileReport};
pub use emit::{line_indent, render, Patch};
pub use normalize::normalize;

use crate::config::FillOptions;
use crate::error::{Error, Result};
use crate::parser::{CompositeLiteral, GoParser};
use crate::registry::{FsSources, ScopeContext, Session, TypeRegistry};
use crate::types::ScopePath;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-request state: registry view, invoking scope and options
pub(crate) struct Request<'a> {
    pub(crate) session: &'a Session<'a>,
    pub(crate) ctx: &'a ScopeContext,
    pub(crate) options: &'a FillOptions,
}

/// Fills and reorders Go composite literals
pub struct Engine {
    registry: Arc<TypeRegistry>,
    options: FillOptions,
}

impl Engine {
    /// Creates an engine with default options
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_options(registry, FillOptions::default())
    }

    /// Creates an engine with the given options
    pub fn with_options(registry: Arc<TypeRegistry>, options: FillOptions) -> Self {
        Engine { registry, options }
    }

    /// Creates an engine over the Go module rooted at `root`
    pub fn for_module(root: impl Into<PathBuf>, options: FillOptions) -> Result<Self> {
        options.validate()?;
        let sources = FsSources::open(root, options.include_test_files)?;
        let registry = Arc::new(TypeRegistry::new(Arc::new(sources)));
        Ok(Self::with_options(registry, options))
    }

    /// The shared type registry
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Active options
    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    /// Normalizes a literal written in `ctx`: every struct literal in it gets
    /// all writable fields in declaration order, authored values unchanged
    ///
    /// Fails without partial results; `StaleSource` means a declaring scope
    /// was invalidated while the request ran.
    pub fn normalize_literal(
        &self,
        literal: &CompositeLiteral,
        ctx: &ScopeContext,
    ) -> Result<CompositeLiteral> {
        let ty_expr = literal
            .ty
            .as_ref()
            .ok_or_else(|| Error::unsupported("composite literal without a type"))?;
        let ty = ctx.lower(ty_expr);

        let session = self.registry.session();
        let request = Request {
            session: &session,
            ctx,
            options: &self.options,
        };

        let normalized = request.resolve_literal(literal, &ty, &[])?.ok_or_else(|| {
            Error::unsupported(format!("literal of type {} cannot be filled", ty_expr))
        })?;
        session.verify()?;

        debug!(
            scope = %ctx.scope(),
            type_name = %ty,
            elements = normalized.elements.len(),
            "Normalized literal"
        );
        Ok(normalized)
    }

    /// Normalizes a literal parsed from `source` and renders its replacement
    pub fn patch_literal(
        &self,
        literal: &CompositeLiteral,
        source: &str,
        ctx: &ScopeContext,
    ) -> Result<Patch> {
        let normalized = self.normalize_literal(literal, ctx)?;
        let indent = line_indent(source, literal.span.start);
        Ok(Patch {
            span: literal.span,
            replacement: render(&normalized, &self.options, indent),
        })
    }

    /// Fills the innermost typed literal around byte `offset` of a file in package `scope`
    pub fn fill_at(&self, source: &str, offset: usize, scope: &ScopePath) -> Result<Patch> {
        let ctx = file_context(source, scope)?;
        let literal = locate::literal_at(source, offset)?;
        self.patch_literal(&literal, source, &ctx)
    }

    /// Fills every outermost typed literal of a file in package `scope`
    ///
    /// Literals that fail are reported and left untouched.
    pub fn fill_file(&self, source: &str, scope: &ScopePath) -> Result<FileReport> {
        let ctx = file_context(source, scope)?;
        let literals = locate::outermost_literals(source)?;
        let outcomes = batch::fill_literals(
            &literals,
            |literal| self.patch_literal(literal, source, &ctx),
            self.options.parallelism,
        )?;

        let mut patches = Vec::new();
        let mut diagnostics = Vec::new();
        for (literal, outcome) in literals.iter().zip(outcomes) {
            match outcome {
                Ok(patch) if patch.replacement == literal.text => {}
                Ok(patch) => patches.push(patch),
                Err(error) => {
                    let (line, column) = locate::line_col(source, literal.span.start);
                    diagnostics.push(Diagnostic {
                        span: literal.span,
                        line,
                        column,
                        message: error.enhanced_message(),
                        error,
                    });
                }
            }
        }

        info!(
            scope = %scope,
            literals = literals.len(),
            patched = patches.len(),
            failed = diagnostics.len(),
            "Filled file"
        );

        Ok(FileReport {
            source: Patch::apply_all(source, &patches),
            patches,
            diagnostics,
        })
    }
}

/// Import context of a file, read from its header only
fn file_context(source: &str, scope: &ScopePath) -> Result<ScopeContext> {
    let header = GoParser::from_source(source)?.parse_header()?;
    Ok(ScopeContext::from_file(scope.clone(), &header))
}
