use crate::parser::{SourceFile, TypeExpr};
use crate::types::{predeclared, ArrayLen, RecordKey, ScopePath, TypeRef};
use std::collections::BTreeMap;

/// Name resolution context of one Go file: its package and its imports
///
/// Lowers type expressions written in that file into semantic types, and
/// spells semantic types back into source text as that file would write them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeContext {
    scope: ScopePath,
    /// Import local name to import path
    imports: BTreeMap<String, ScopePath>,
    /// Type parameters in scope while lowering a generic declaration
    type_params: Vec<String>,
}

impl ScopeContext {
    /// Context for a package with no imports
    pub fn new(scope: impl Into<ScopePath>) -> Self {
        ScopeContext {
            scope: scope.into(),
            imports: BTreeMap::new(),
            type_params: Vec::new(),
        }
    }

    /// Context of a parsed file declared in `scope`
    pub fn from_file(scope: impl Into<ScopePath>, file: &SourceFile) -> Self {
        let mut ctx = ScopeContext::new(scope);
        for import in &file.imports {
            let local = import.local_name();
            // Blank imports bind nothing; dot imports are not followed
            if local == "_" || local == "." {
                continue;
            }
            ctx.imports
                .insert(local.to_string(), ScopePath::new(import.path.clone()));
        }
        ctx
    }

    /// Adds an import binding
    pub fn with_import(mut self, local: impl Into<String>, path: impl Into<ScopePath>) -> Self {
        self.imports.insert(local.into(), path.into());
        self
    }

    /// Same context with the type parameters of a generic declaration in scope
    pub fn with_type_params(&self, params: &[String]) -> Self {
        let mut ctx = self.clone();
        ctx.type_params = params.to_vec();
        ctx
    }

    /// The package this context belongs to
    pub fn scope(&self) -> &ScopePath {
        &self.scope
    }

    /// Import path bound to a local package name
    pub fn import(&self, local: &str) -> Option<&ScopePath> {
        self.imports.get(local)
    }

    /// Lowers a type expression written in this scope
    ///
    /// Qualifiers that are not imported stay as their own scope path, so the
    /// lookup fails later with a `TypeNotFound` naming the qualifier.
    pub fn lower(&self, expr: &TypeExpr) -> TypeRef {
        match expr {
            TypeExpr::Named {
                package: None,
                name,
                args,
            } => {
                if self.type_params.iter().any(|p| p == name) {
                    return TypeRef::TypeParam(name.clone());
                }
                if args.is_empty() {
                    if let Some(ty) = predeclared(name) {
                        return ty;
                    }
                }
                TypeRef::Record {
                    key: RecordKey::new(self.scope.clone(), name.clone()),
                    args: args.iter().map(|a| self.lower(a)).collect(),
                }
            }
            TypeExpr::Named {
                package: Some(package),
                name,
                args,
            } => {
                let scope = self
                    .imports
                    .get(package)
                    .cloned()
                    .unwrap_or_else(|| ScopePath::new(package.clone()));
                TypeRef::Record {
                    key: RecordKey::new(scope, name.clone()),
                    args: args.iter().map(|a| self.lower(a)).collect(),
                }
            }
            TypeExpr::Pointer(inner) => TypeRef::Pointer(Box::new(self.lower(inner))),
            TypeExpr::Slice(elem) => TypeRef::Slice(Box::new(self.lower(elem))),
            TypeExpr::Array { len, elem } => {
                TypeRef::Array(Box::new(self.lower(elem)), ArrayLen::parse(len))
            }
            TypeExpr::Map { key, value } => {
                TypeRef::Map(Box::new(self.lower(key)), Box::new(self.lower(value)))
            }
            TypeExpr::Struct(_) => TypeRef::AnonStruct(expr.to_string()),
            TypeExpr::Opaque(text) => TypeRef::Nilable(text.clone()),
        }
    }

    /// Spells a semantic type the way a literal in this scope writes it
    pub fn spell(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Scalar(kind) => kind.name().to_string(),
            TypeRef::Record { key, args } => {
                let mut text = self.spell_name(key);
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| self.spell(a)).collect();
                    text.push('[');
                    text.push_str(&args.join(", "));
                    text.push(']');
                }
                text
            }
            TypeRef::Pointer(inner) => format!("*{}", self.spell(inner)),
            TypeRef::Slice(elem) => format!("[]{}", self.spell(elem)),
            TypeRef::Array(elem, len) => format!("[{}]{}", len, self.spell(elem)),
            TypeRef::Map(key, value) => format!("map[{}]{}", self.spell(key), self.spell(value)),
            TypeRef::Nilable(text) | TypeRef::AnonStruct(text) | TypeRef::TypeParam(text) => {
                text.clone()
            }
        }
    }

    fn spell_name(&self, key: &RecordKey) -> String {
        if key.scope == self.scope {
            return key.name.clone();
        }
        let package = self
            .imports
            .iter()
            .find(|(_, path)| **path == key.scope)
            .map(|(local, _)| local.as_str())
            .unwrap_or_else(|| key.scope.last_segment());
        format!("{}.{}", package, key.name)
    }
}
