use crate::error::{Error, Result};
use crate::parser::{CompositeLiteral, Element, ElementKey, ValueExpr};
use crate::types::{FieldDeclaration, RecordType, ScopePath};
use std::collections::HashMap;

/// Merges a struct literal's authored elements with its type's declaration
///
/// The result has one element per declared field in declaration order.
/// Authored values are kept unchanged; missing fields get `zero(field)`.
/// Fields the invoking scope cannot write are skipped unless authored.
/// Nested literals are not touched here.
pub fn normalize<F>(
    record: &RecordType,
    literal: &CompositeLiteral,
    invoking: &ScopePath,
    mut zero: F,
) -> Result<CompositeLiteral>
where
    F: FnMut(&FieldDeclaration) -> Result<ValueExpr>,
{
    let type_name = || {
        literal
            .type_text
            .clone()
            .unwrap_or_else(|| record.key.name.clone())
    };

    let mut authored: HashMap<&str, &Element> = HashMap::with_capacity(literal.elements.len());
    for element in &literal.elements {
        if let ValueExpr::Spread(text) = &element.value {
            return Err(Error::unsupported(format!(
                "spread value {} in {} literal",
                text,
                type_name()
            )));
        }

        let name = match &element.key {
            Some(ElementKey::Field(name)) => name.as_str(),
            Some(ElementKey::Expr(text)) => {
                return Err(Error::UnresolvableFieldName {
                    type_name: type_name(),
                    field: text.clone(),
                    declared: writable_names(record, invoking),
                })
            }
            None => {
                return Err(Error::unsupported(format!(
                    "positional elements in {} literal",
                    type_name()
                )))
            }
        };

        if record.field(name).is_none() {
            return Err(Error::UnresolvableFieldName {
                type_name: type_name(),
                field: name.to_string(),
                declared: writable_names(record, invoking),
            });
        }
        if authored.insert(name, element).is_some() {
            return Err(Error::DuplicateFieldKey {
                type_name: type_name(),
                field: name.to_string(),
            });
        }
    }

    let mut elements = Vec::with_capacity(record.fields.len());
    for field in &record.fields {
        match authored.get(field.name.as_str()) {
            Some(element) => elements.push((*element).clone()),
            None if field.writable_from(&record.key.scope, invoking) => {
                elements.push(Element::field(field.name.clone(), zero(field)?))
            }
            None => {}
        }
    }

    Ok(CompositeLiteral {
        elements,
        ..literal.clone()
    })
}

fn writable_names(record: &RecordType, invoking: &ScopePath) -> Vec<String> {
    record
        .writable_fields(invoking)
        .map(|f| f.name.clone())
        .collect()
}
