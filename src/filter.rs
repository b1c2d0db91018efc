//! Evaluation of `WHERE` conditions against a loaded table.

use std::collections::BTreeSet;

use crate::{
    ast::{BoolOperator, Comparator, Condition},
    data_type::{DataType, parse_number},
    error::{DbError, Result},
    table::{EMPTY_VALUE, Table},
};

/// Returns the ids of the records of `table` that satisfy `condition`.
///
/// # Errors
/// Returns [DbError::AttributeNotFound] if a comparison names an attribute
/// the table does not have.
pub fn evaluate(condition: &Condition, table: &Table) -> Result<BTreeSet<u64>> {
    match condition {
        Condition::Boolean { left, op, right } => {
            let left = evaluate(left, table)?;
            let right = evaluate(right, table)?;
            Ok(match op {
                BoolOperator::And => left.intersection(&right).copied().collect(),
                BoolOperator::Or => left.union(&right).copied().collect(),
            })
        }
        Condition::Comparison {
            attribute,
            comparator,
            value,
        } => {
            if !table.attributes().contains(attribute) {
                return Err(DbError::AttributeNotFound {
                    name: attribute.clone(),
                });
            }

            let attribute_type = infer_attribute_type(table, attribute);
            Ok(table
                .records()
                .filter(|(id, _)| {
                    let stored = table.value(*id, attribute).unwrap_or(EMPTY_VALUE);
                    matches(*comparator, stored, value, attribute_type)
                })
                .map(|(id, _)| id)
                .collect())
        }
    }
}

/// The type of the first value of `attribute`, in id order, that is not
/// `NULL`. [DataType::Null] when the column holds nothing else.
pub fn infer_attribute_type(table: &Table, attribute: &str) -> DataType {
    table
        .records()
        .filter_map(|(id, _)| table.value(id, attribute))
        .map(DataType::infer)
        .find(|data_type| *data_type != DataType::Null)
        .unwrap_or(DataType::Null)
}

/// Compares one stored value against a condition literal.
///
/// Ordering comparators only ever match numbers. `!=` only falls back to
/// textual inequality when the column is inferred as text or boolean, so
/// it is not the negation of `==` on columns of mixed content.
pub fn matches(comparator: Comparator, stored: &str, literal: &str, attribute_type: DataType) -> bool {
    let numbers = parse_number(stored).zip(parse_number(literal));

    match comparator {
        Comparator::Equal => {
            numbers.is_some_and(|(a, b)| a == b)
                || stored == literal
                || (attribute_type == DataType::Boolean && stored.eq_ignore_ascii_case(literal))
        }
        Comparator::NotEqual => {
            numbers.is_some_and(|(a, b)| a != b)
                || (attribute_type == DataType::Boolean && !stored.eq_ignore_ascii_case(literal))
                || (attribute_type == DataType::Text && stored != literal)
        }
        Comparator::LessThan => numbers.is_some_and(|(a, b)| a < b),
        Comparator::LessThanOrEqual => numbers.is_some_and(|(a, b)| a <= b),
        Comparator::GreaterThan => numbers.is_some_and(|(a, b)| a > b),
        Comparator::GreaterThanOrEqual => numbers.is_some_and(|(a, b)| a >= b),
        Comparator::Like => stored.to_lowercase().contains(&literal.to_lowercase()),
    }
}
