use super::normalize::normalize;
use super::zero::enter;
use super::Request;
use crate::config::UnknownTypePolicy;
use crate::error::{Error, Result};
use crate::parser::{CompositeLiteral, Element, ElementKey, ValueExpr};
use crate::types::{RecordKey, RecordType, TypeDef, TypeRef};
use std::collections::HashSet;
use tracing::{trace, warn};

impl Request<'_> {
    /// Normalizes a literal of type `ty` and every composite literal nested in it
    ///
    /// Returns `None` for literals that are kept verbatim (anonymous struct
    /// types). Any failure aborts the whole literal.
    pub(crate) fn resolve_literal(
        &self,
        literal: &CompositeLiteral,
        ty: &TypeRef,
        chain: &[RecordKey],
    ) -> Result<Option<CompositeLiteral>> {
        match ty {
            TypeRef::Record { key, args } => self.resolve_named(literal, key, args, chain),
            TypeRef::Slice(elem) => self.resolve_elements(literal, elem, &[]).map(Some),
            TypeRef::Array(elem, _) => self.resolve_elements(literal, elem, chain).map(Some),
            TypeRef::Map(_, value) => self.resolve_elements(literal, value, &[]).map(Some),
            TypeRef::AnonStruct(_) => Ok(None),
            TypeRef::Scalar(_)
            | TypeRef::Pointer(_)
            | TypeRef::Nilable(_)
            | TypeRef::TypeParam(_) => Err(Error::unsupported(format!(
                "composite literal of non-composite type {}",
                self.ctx.spell(ty)
            ))),
        }
    }

    fn resolve_named(
        &self,
        literal: &CompositeLiteral,
        key: &RecordKey,
        args: &[TypeRef],
        chain: &[RecordKey],
    ) -> Result<Option<CompositeLiteral>> {
        match self.session.resolve(key)?.as_ref() {
            TypeDef::Record(record) => {
                let record = record.instantiate(args)?;
                self.resolve_struct(literal, &record, chain).map(Some)
            }
            TypeDef::Alias(target) => self.resolve_literal(literal, target, chain),
            TypeDef::Named {
                underlying: TypeRef::Record { .. },
                ..
            } if !args.is_empty() => Err(Error::unsupported(format!(
                "literal of generic defined struct type {}",
                key
            ))),
            TypeDef::Named { underlying, .. } => {
                self.resolve_literal(literal, underlying, &enter(chain, key)?)
            }
        }
    }

    fn resolve_struct(
        &self,
        literal: &CompositeLiteral,
        record: &RecordType,
        chain: &[RecordKey],
    ) -> Result<CompositeLiteral> {
        trace!(type_name = %record.key, "Normalizing struct literal");
        let mut next = chain.to_vec();
        next.push(record.key.clone());

        let normalized = normalize(record, literal, self.ctx.scope(), |field| {
            self.zero_value(&field.ty, &next)
        })?;

        // Synthesized zero values are already complete; only authored values need descending
        let authored: HashSet<&str> = literal.field_names().into_iter().collect();
        let mut elements = Vec::with_capacity(normalized.elements.len());
        for element in &normalized.elements {
            let field = match &element.key {
                Some(ElementKey::Field(name)) if authored.contains(name.as_str()) => {
                    record.field(name)
                }
                _ => None,
            };
            match field {
                Some(field) => elements.push(Element {
                    value: self.resolve_value(&element.value, &field.ty, &next)?,
                    ..element.clone()
                }),
                None => elements.push(element.clone()),
            }
        }

        Ok(CompositeLiteral {
            elements,
            ..normalized
        })
    }

    fn resolve_elements(
        &self,
        literal: &CompositeLiteral,
        elem: &TypeRef,
        chain: &[RecordKey],
    ) -> Result<CompositeLiteral> {
        let elements = literal
            .elements
            .iter()
            .map(|element| {
                Ok(Element {
                    value: self.resolve_value(&element.value, elem, chain)?,
                    ..element.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompositeLiteral {
            elements,
            ..literal.clone()
        })
    }

    /// Descends into a value held in a slot of type `ty`
    ///
    /// Explicitly typed literals are resolved by their own type, elided ones
    /// by the slot's type. Opaque values are returned unchanged.
    fn resolve_value(&self, value: &ValueExpr, ty: &TypeRef, chain: &[RecordKey]) -> Result<ValueExpr> {
        match value {
            ValueExpr::Composite(literal) => {
                let (target, chain) = match (&literal.ty, ty) {
                    (Some(expr), TypeRef::Record { .. } | TypeRef::Array(..)) => {
                        (self.ctx.lower(expr), chain)
                    }
                    (Some(expr), _) => (self.ctx.lower(expr), &[][..]),
                    (None, TypeRef::Pointer(inner)) => (inner.as_ref().clone(), &[][..]),
                    (None, _) => (ty.clone(), chain),
                };
                Ok(match self.resolve_or_keep(literal, &target, chain)? {
                    Some(resolved) => ValueExpr::Composite(resolved),
                    None => ValueExpr::Opaque(literal.text.clone()),
                })
            }
            ValueExpr::AddressOf(literal) => {
                let target = match (&literal.ty, ty) {
                    (Some(expr), _) => self.ctx.lower(expr),
                    (None, TypeRef::Pointer(inner)) => inner.as_ref().clone(),
                    (None, _) => ty.clone(),
                };
                Ok(match self.resolve_or_keep(literal, &target, &[])? {
                    Some(resolved) => ValueExpr::AddressOf(Box::new(resolved)),
                    None => ValueExpr::Opaque(format!("&{}", literal.text)),
                })
            }
            ValueExpr::Opaque(_) | ValueExpr::Nil | ValueExpr::Spread(_) => Ok(value.clone()),
        }
    }

    fn resolve_or_keep(
        &self,
        literal: &CompositeLiteral,
        ty: &TypeRef,
        chain: &[RecordKey],
    ) -> Result<Option<CompositeLiteral>> {
        match self.resolve_literal(literal, ty, chain) {
            Err(Error::TypeNotFound { scope, name })
                if self.options.unknown_types == UnknownTypePolicy::EmptyLiteral =>
            {
                warn!(scope = %scope, name = %name, "Nested literal of unresolvable type kept verbatim");
                Ok(None)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FillOptions;
    use crate::parser::GoParser;
    use crate::registry::{InMemorySources, ScopeContext, TypeRegistry};
    use std::sync::Arc;

    const TYPES: &str = r#"package main

type ListNode struct {
	Val  int
	Next *ListNode
}

type Holder struct {
	Nodes []ListNode
	ByKey map[string]*ListNode
	Pair  [2]ListNode
	Any   interface{}
}
"#;

    fn resolve(source: &str, options: &FillOptions) -> Result<CompositeLiteral> {
        let sources = Arc::new(InMemorySources::new());
        sources.insert("main", "types.go", TYPES);
        let registry = TypeRegistry::new(sources);
        let session = registry.session();
        let ctx = ScopeContext::new("main");
        let request = Request {
            session: &session,
            ctx: &ctx,
            options,
        };
        let literal = GoParser::from_source(source)?.parse_literal_at(0)?;
        let ty = ctx.lower(literal.ty.as_ref().unwrap());
        Ok(request.resolve_literal(&literal, &ty, &[])?.unwrap())
    }

    #[test]
    fn test_pointer_literal_is_normalized() {
        let out = resolve("ListNode{Next: &ListNode{Val: 5}}", &FillOptions::default()).unwrap();
        assert_eq!(out.field("Val"), Some(&ValueExpr::opaque("0")));
        let Some(ValueExpr::AddressOf(next)) = out.field("Next") else {
            panic!("expected address-of literal");
        };
        assert_eq!(next.field_names(), vec!["Val", "Next"]);
        assert_eq!(next.field("Next"), Some(&ValueExpr::Nil));
    }

    #[test]
    fn test_elided_container_elements() {
        let out = resolve(
            "Holder{Nodes: []ListNode{{Val: 1}, f()}, ByKey: map[string]*ListNode{\"a\": {}}, Pair: [2]ListNode{{}}}",
            &FillOptions::default(),
        )
        .unwrap();

        let Some(ValueExpr::Composite(nodes)) = out.field("Nodes") else {
            panic!("expected slice literal");
        };
        let ValueExpr::Composite(first) = &nodes.elements[0].value else {
            panic!("expected element literal");
        };
        assert_eq!(first.type_text, None);
        assert_eq!(first.field_names(), vec!["Val", "Next"]);
        assert_eq!(nodes.elements[1].value, ValueExpr::opaque("f()"));

        let Some(ValueExpr::Composite(by_key)) = out.field("ByKey") else {
            panic!("expected map literal");
        };
        assert_eq!(
            by_key.elements[0].key,
            Some(ElementKey::Expr("\"a\"".into()))
        );
        let ValueExpr::Composite(value) = &by_key.elements[0].value else {
            panic!("expected map value literal");
        };
        assert_eq!(value.field_names(), vec!["Val", "Next"]);

        assert_eq!(out.field("Any"), Some(&ValueExpr::Nil));
    }

    #[test]
    fn test_nested_failure_aborts_whole_literal() {
        let err = resolve(
            "Holder{Nodes: []ListNode{{Val: 1, Val: 2}}}",
            &FillOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateFieldKey { .. }));
    }

    #[test]
    fn test_unknown_nested_literal_policy() {
        let source = "Holder{Any: Mystery{B: 1}}";
        let err = resolve(source, &FillOptions::default()).unwrap_err();
        assert!(matches!(err, Error::TypeNotFound { .. }));

        let lenient = FillOptions {
            unknown_types: UnknownTypePolicy::EmptyLiteral,
            ..FillOptions::default()
        };
        let out = resolve(source, &lenient).unwrap();
        assert_eq!(out.field("Any"), Some(&ValueExpr::opaque("Mystery{B: 1}")));
    }

    #[test]
    fn test_scalar_literal_is_unsupported() {
        let err = resolve("Holder{Any: int{}}", &FillOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExpressionShape(_)));
    }
}
