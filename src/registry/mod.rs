//! Type Registry
//!
//! Resolves named types to their declarations. Declarations are read per
//! package (scope) through a [`SourceProvider`], parsed, lowered to semantic
//! types and cached as one immutable [`ScopeTable`] per scope.
//!
//! Every scope carries a modification epoch. [`TypeRegistry::invalidate`]
//! bumps it; a cached table is only served while its epoch is current.
//! Tables are built without holding any lock and published with a single
//! map insert, so readers see either the old table or the complete new one.
//!
//! A [`Session`] is the per-request view: it remembers the epoch of every
//! table it read and reports [`Error::StaleSource`] when one moved.

mod gomod;
mod scope;
mod source;

pub use gomod::{escape_module_path, GoMod, Replace, ReplaceTarget, Requirement};
pub use scope::ScopeContext;
pub use source::{FsSources, InMemorySources, SourceProvider, SourceText};

use crate::error::{Error, Result};
use crate::lexer::GoScanner;
use crate::parser::{GoParser, TypeExpr, TypeSpec};
use crate::types::{FieldDeclaration, RecordKey, RecordType, ScopePath, TypeDef, TypeRef, Visibility};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Longest alias / named-type chain followed before giving up
const MAX_TYPE_CHAIN: usize = 32;

/// All type declarations of one scope, as of one epoch
#[derive(Debug)]
pub struct ScopeTable {
    scope: ScopePath,
    epoch: u64,
    types: HashMap<String, Arc<TypeDef>>,
}

impl ScopeTable {
    /// Scope the table was built for
    pub fn scope(&self) -> &ScopePath {
        &self.scope
    }

    /// Epoch the table was built at
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of declared types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the scope declares no types
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn get(&self, name: &str) -> Result<Arc<TypeDef>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| Error::TypeNotFound {
                scope: self.scope.to_string(),
                name: name.to_string(),
            })
    }
}

/// Shared cache of scope tables
pub struct TypeRegistry {
    provider: Arc<dyn SourceProvider>,
    tables: DashMap<ScopePath, Arc<ScopeTable>>,
    epochs: DashMap<ScopePath, Arc<AtomicU64>>,
}

impl TypeRegistry {
    /// Creates a registry reading declarations from `provider`
    pub fn new(provider: Arc<dyn SourceProvider>) -> Self {
        TypeRegistry {
            provider,
            tables: DashMap::new(),
            epochs: DashMap::new(),
        }
    }

    /// Current modification epoch of a scope
    pub fn epoch(&self, scope: &ScopePath) -> u64 {
        self.epochs
            .get(scope)
            .map(|counter| counter.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Marks a scope's sources as changed
    pub fn invalidate(&self, scope: &ScopePath) {
        let epoch = self.epoch_counter(scope).fetch_add(1, Ordering::SeqCst) + 1;
        self.tables.remove(scope);
        debug!(scope = %scope, epoch, "Invalidated scope");
    }

    /// Whether a current table for the scope is cached
    pub fn is_cached(&self, scope: &ScopePath) -> bool {
        self.tables
            .get(scope)
            .map(|table| table.epoch == self.epoch(scope))
            .unwrap_or(false)
    }

    /// Starts a request-local view that tracks observed epochs
    pub fn session(&self) -> Session<'_> {
        Session {
            registry: self,
            observed: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves a type name to its declaration
    pub fn resolve(&self, key: &RecordKey) -> Result<Arc<TypeDef>> {
        self.table(&key.scope)?.get(&key.name)
    }

    /// Resolves a type name to a struct type, following aliases and named types
    pub fn resolve_record(&self, key: &RecordKey) -> Result<Arc<RecordType>> {
        follow_to_record(key, |k| self.resolve(k))
    }

    /// Resolves a textual type name (`Name` or `pkg.Name`) as written in `ctx`
    pub fn resolve_name(&self, ctx: &ScopeContext, name: &str) -> Result<Arc<RecordType>> {
        let key = key_for_name(ctx, name)?;
        self.resolve_record(&key)
    }

    /// Table for a scope, building and publishing it on a miss
    pub fn table(&self, scope: &ScopePath) -> Result<Arc<ScopeTable>> {
        let counter = self.epoch_counter(scope);
        let epoch = counter.load(Ordering::SeqCst);

        if let Some(table) = self.tables.get(scope).map(|t| Arc::clone(&t)) {
            if table.epoch == epoch {
                trace!(scope = %scope, epoch, "Scope table cache hit");
                return Ok(table);
            }
        }

        let table = Arc::new(self.build_table(scope, epoch)?);

        if counter.load(Ordering::SeqCst) == epoch {
            self.tables
                .entry(scope.clone())
                .and_modify(|cached| {
                    if cached.epoch < table.epoch {
                        *cached = Arc::clone(&table);
                    }
                })
                .or_insert_with(|| Arc::clone(&table));
        } else {
            debug!(scope = %scope, epoch, "Scope changed during build, table not published");
        }

        Ok(table)
    }

    fn epoch_counter(&self, scope: &ScopePath) -> Arc<AtomicU64> {
        if let Some(counter) = self.epochs.get(scope) {
            return Arc::clone(&counter);
        }
        Arc::clone(
            &self
                .epochs
                .entry(scope.clone())
                .or_insert_with(|| Arc::new(AtomicU64::new(0))),
        )
    }

    fn build_table(&self, scope: &ScopePath, epoch: u64) -> Result<ScopeTable> {
        let files = self.provider.load(scope)?;
        let mut types = HashMap::new();

        for file in &files {
            let parsed = GoScanner::new(&file.text)
                .scan_tokens()
                .and_then(|tokens| GoParser::new(&file.text, tokens).parse_file());
            let parsed = match parsed {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(scope = %scope, file = %file.path, error = %e, "Skipping unparsable file");
                    continue;
                }
            };

            let ctx = ScopeContext::from_file(scope.clone(), &parsed);
            for spec in &parsed.types {
                if types.contains_key(&spec.name) {
                    warn!(scope = %scope, name = %spec.name, "Duplicate type declaration ignored");
                    continue;
                }
                types.insert(spec.name.clone(), Arc::new(lower_type_spec(&ctx, spec)));
            }
        }

        debug!(
            scope = %scope,
            files = files.len(),
            types = types.len(),
            epoch,
            "Built scope table"
        );

        Ok(ScopeTable {
            scope: scope.clone(),
            epoch,
            types,
        })
    }
}

/// Request-local registry view
///
/// Records the epoch of every scope table it reads, so that a result
/// computed against declarations that changed meanwhile can be rejected.
pub struct Session<'r> {
    registry: &'r TypeRegistry,
    observed: Mutex<HashMap<ScopePath, u64>>,
}

impl<'r> Session<'r> {
    /// The underlying registry
    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Resolves a type name to its declaration
    pub fn resolve(&self, key: &RecordKey) -> Result<Arc<TypeDef>> {
        let table = self.registry.table(&key.scope)?;
        self.observe(&table)?;
        table.get(&key.name)
    }

    /// Resolves a type name to a struct type, following aliases and named types
    pub fn resolve_record(&self, key: &RecordKey) -> Result<Arc<RecordType>> {
        follow_to_record(key, |k| self.resolve(k))
    }

    /// Resolves a textual type name as written in `ctx`
    pub fn resolve_name(&self, ctx: &ScopeContext, name: &str) -> Result<Arc<RecordType>> {
        let key = key_for_name(ctx, name)?;
        self.resolve_record(&key)
    }

    /// Fails with `StaleSource` if any scope read so far has changed
    pub fn verify(&self) -> Result<()> {
        let observed = self.observed.lock();
        for (scope, epoch) in observed.iter() {
            if self.registry.epoch(scope) != *epoch {
                return Err(Error::StaleSource {
                    scope: scope.to_string(),
                });
            }
        }
        Ok(())
    }

    fn observe(&self, table: &ScopeTable) -> Result<()> {
        let mut observed = self.observed.lock();
        let seen = *observed.entry(table.scope.clone()).or_insert(table.epoch);
        if seen != table.epoch {
            return Err(Error::StaleSource {
                scope: table.scope.to_string(),
            });
        }
        Ok(())
    }
}

fn follow_to_record(
    key: &RecordKey,
    resolve: impl Fn(&RecordKey) -> Result<Arc<TypeDef>>,
) -> Result<Arc<RecordType>> {
    let mut current = key.clone();
    for _ in 0..MAX_TYPE_CHAIN {
        let next = match resolve(&current)?.as_ref() {
            TypeDef::Record(record) => return Ok(Arc::clone(record)),
            TypeDef::Alias(target) => target.clone(),
            TypeDef::Named { underlying, .. } => underlying.clone(),
        };
        match next {
            TypeRef::Record { key, .. } => current = key,
            other => {
                return Err(Error::unsupported(format!(
                    "{} is not a struct type (underlying type {})",
                    key, other
                )))
            }
        }
    }
    Err(Error::unsupported(format!(
        "type chain starting at {} is too long",
        key
    )))
}

fn key_for_name(ctx: &ScopeContext, name: &str) -> Result<RecordKey> {
    let expr = match name.split_once('.') {
        Some((package, name)) => TypeExpr::Named {
            package: Some(package.to_string()),
            name: name.to_string(),
            args: Vec::new(),
        },
        None => TypeExpr::named(name),
    };
    match ctx.lower(&expr) {
        TypeRef::Record { key, .. } => Ok(key),
        other => Err(Error::unsupported(format!(
            "{} is not a named struct type",
            other
        ))),
    }
}

/// Lowers one type declaration written in the file of `ctx`
fn lower_type_spec(ctx: &ScopeContext, spec: &TypeSpec) -> TypeDef {
    let ctx = ctx.with_type_params(&spec.type_params);
    let key = RecordKey::new(ctx.scope().clone(), spec.name.clone());

    if spec.is_alias {
        return TypeDef::Alias(ctx.lower(&spec.ty));
    }

    match &spec.ty {
        TypeExpr::Struct(specs) => {
            let fields = specs
                .iter()
                .flat_map(|field| {
                    let ty = ctx.lower(&field.ty);
                    field.names.iter().map(move |name| FieldDeclaration {
                        name: name.clone(),
                        ty: ty.clone(),
                        visibility: Visibility::of(name),
                        embedded: field.embedded,
                        metadata: field.tag.clone(),
                    })
                })
                .collect();
            TypeDef::Record(Arc::new(RecordType {
                key,
                type_params: spec.type_params.clone(),
                fields,
            }))
        }
        other => TypeDef::Named {
            key,
            underlying: ctx.lower(other),
        },
    }
}
