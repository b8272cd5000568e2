use super::Request;
use crate::config::UnknownTypePolicy;
use crate::error::{Error, Result};
use crate::parser::{CompositeLiteral, Element, ValueExpr};
use crate::types::{ArrayLen, RecordKey, RecordType, TypeDef, TypeRef};
use tracing::warn;

impl Request<'_> {
    /// Zero value expression for a field of type `ty`
    ///
    /// `chain` holds the struct types currently being expanded by value.
    /// Reaching one of them again without a pointer, slice or map in between
    /// means the type has no finite zero value.
    pub(crate) fn zero_value(&self, ty: &TypeRef, chain: &[RecordKey]) -> Result<ValueExpr> {
        match ty {
            TypeRef::Scalar(kind) => Ok(ValueExpr::opaque(kind.zero_text())),
            TypeRef::Pointer(_) | TypeRef::Nilable(_) => Ok(ValueExpr::Nil),
            TypeRef::TypeParam(name) => Ok(ValueExpr::Opaque(format!("*new({})", name))),
            TypeRef::AnonStruct(text) => Ok(ValueExpr::Opaque(format!("{}{{}}", text))),
            TypeRef::Slice(_) | TypeRef::Map(..) => Ok(self.empty_literal(ty)),
            TypeRef::Array(elem, ArrayLen::Fixed(n)) if *n > 0 => {
                let zero = self.zero_value(elem, chain)?;
                Ok(ValueExpr::Composite(CompositeLiteral::synthesized(
                    self.ctx.spell(ty),
                    vec![Element::positional(zero); *n],
                )))
            }
            TypeRef::Array(elem, _) => {
                self.zero_value(elem, chain)?;
                Ok(self.empty_literal(ty))
            }
            TypeRef::Record { key, args } => self.zero_named(ty, key, args, chain),
        }
    }

    fn zero_named(
        &self,
        ty: &TypeRef,
        key: &RecordKey,
        args: &[TypeRef],
        chain: &[RecordKey],
    ) -> Result<ValueExpr> {
        let def = match self.session.resolve(key) {
            Ok(def) => def,
            Err(Error::TypeNotFound { .. })
                if self.options.unknown_types == UnknownTypePolicy::EmptyLiteral =>
            {
                warn!(type_name = %key, "Unresolvable type zero-filled as empty literal");
                return Ok(self.empty_literal(ty));
            }
            Err(e) => return Err(e),
        };

        match def.as_ref() {
            TypeDef::Record(record) => self.zero_struct(ty, &*record.instantiate(args)?, chain),
            TypeDef::Alias(target) => self.zero_value(target, chain),
            TypeDef::Named { underlying, .. } => match underlying {
                TypeRef::Scalar(_)
                | TypeRef::Pointer(_)
                | TypeRef::Nilable(_)
                | TypeRef::TypeParam(_) => self.zero_value(underlying, chain),
                TypeRef::Record { .. } if !args.is_empty() => Err(Error::unsupported(format!(
                    "zero value of generic defined struct type {}",
                    key
                ))),
                // `type Admin User` zero-fills as `Admin{...}` with User's fields
                TypeRef::Record {
                    key: target,
                    args: target_args,
                } => {
                    let next = enter(chain, key)?;
                    match self.zero_named(underlying, target, target_args, &next)? {
                        ValueExpr::Composite(literal) => {
                            Ok(ValueExpr::Composite(CompositeLiteral {
                                type_text: Some(self.ctx.spell(ty)),
                                ..literal
                            }))
                        }
                        other => Ok(other),
                    }
                }
                // `type Roles []string` zero-fills as `Roles{}`
                _ => Ok(self.empty_literal(ty)),
            },
        }
    }

    fn zero_struct(
        &self,
        ty: &TypeRef,
        record: &RecordType,
        chain: &[RecordKey],
    ) -> Result<ValueExpr> {
        let next = enter(chain, &record.key)?;

        let elements = record
            .writable_fields(self.ctx.scope())
            .map(|field| {
                Ok(Element::field(
                    field.name.clone(),
                    self.zero_value(&field.ty, &next)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ValueExpr::Composite(CompositeLiteral::synthesized(
            self.ctx.spell(ty),
            elements,
        )))
    }

    pub(crate) fn empty_literal(&self, ty: &TypeRef) -> ValueExpr {
        ValueExpr::Composite(CompositeLiteral::synthesized(self.ctx.spell(ty), Vec::new()))
    }
}

/// `chain` extended by `key`, failing if `key` is already being expanded by value
pub(super) fn enter(chain: &[RecordKey], key: &RecordKey) -> Result<Vec<RecordKey>> {
    if let Some(start) = chain.iter().position(|k| k == key) {
        let mut path: Vec<String> = chain[start..].iter().map(|k| k.to_string()).collect();
        path.push(key.to_string());
        return Err(Error::CyclicNonPointerComposite { path });
    }
    let mut next = chain.to_vec();
    next.push(key.clone());
    Ok(next)
}
