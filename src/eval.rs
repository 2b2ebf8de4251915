//! In-memory evaluation of compiled clauses against JSON rows.
//!
//! Comparisons follow SQL semantics: anything compared with `NULL` is false,
//! except for the explicit null checks.

use crate::ast::{Clause, Comparison, DatePart, LikePattern, Literal, Predicate};
use crate::builders::parse_date;
use chrono::Datelike;
use serde_json::{Map, Value};
use std::cmp::Ordering;

impl Clause {
    /// Whether `row` satisfies this clause.
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        match self {
            Clause::And(left, right) => left.matches(row) && right.matches(row),
            Clause::Or(left, right) => left.matches(row) || right.matches(row),
            Clause::Predicate(predicate) => predicate.matches(row),
        }
    }
}

impl Predicate {
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        let actual = row.get(&self.field).map_or(Literal::Null, json_literal);
        let ordering = |expected: &Literal| compare(&actual, expected);

        match &self.comparison {
            Comparison::Eq(Literal::Null) | Comparison::IsNull => actual.is_null(),
            Comparison::Ne(Literal::Null) | Comparison::IsNotNull => !actual.is_null(),
            Comparison::Eq(expected) => ordering(expected) == Some(Ordering::Equal),
            Comparison::Ne(expected) => {
                matches!(ordering(expected), Some(Ordering::Less | Ordering::Greater))
            }
            Comparison::Gt(expected) => ordering(expected) == Some(Ordering::Greater),
            Comparison::Gte(expected) => {
                matches!(ordering(expected), Some(Ordering::Greater | Ordering::Equal))
            }
            Comparison::Lt(expected) => ordering(expected) == Some(Ordering::Less),
            Comparison::Lte(expected) => {
                matches!(ordering(expected), Some(Ordering::Less | Ordering::Equal))
            }
            Comparison::Between(low, high) => {
                matches!(ordering(low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(ordering(high), Some(Ordering::Less | Ordering::Equal))
            }
            Comparison::In(values) => values
                .iter()
                .any(|value| ordering(value) == Some(Ordering::Equal)),
            Comparison::NotIn(values) => {
                !actual.is_null()
                    && values
                        .iter()
                        .all(|value| ordering(value) != Some(Ordering::Equal))
            }
            Comparison::Like { pattern, negated } => match actual.as_text() {
                Some(text) => like_matches(&text, pattern) != *negated,
                None => false,
            },
            Comparison::DatePart { part, value } => parse_date(&actual).is_some_and(|date| {
                let extracted = match part {
                    DatePart::Day => date.day(),
                    DatePart::Month => date.month(),
                };
                i64::from(extracted) == *value
            }),
        }
    }
}

fn like_matches(text: &str, pattern: &LikePattern) -> bool {
    let text = text.to_lowercase();
    match pattern {
        LikePattern::Contains(needle) => text.contains(&needle.to_lowercase()),
        LikePattern::StartsWith(needle) => text.starts_with(&needle.to_lowercase()),
        LikePattern::EndsWith(needle) => text.ends_with(&needle.to_lowercase()),
    }
}

fn json_literal(value: &Value) -> Literal {
    match value {
        Value::Bool(b) => Literal::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(Literal::Integer)
            .or_else(|| n.as_f64().map(Literal::Float))
            .unwrap_or(Literal::Null),
        Value::String(s) => Literal::Text(s.clone()),
        Value::Null | Value::Array(_) | Value::Object(_) => Literal::Null,
    }
}

/// Orders two literals when they are comparable. Numbers compare numerically
/// (numeric text included), dates after parsing both sides, text
/// lexicographically.
fn compare(actual: &Literal, expected: &Literal) -> Option<Ordering> {
    match (actual, expected) {
        (Literal::Null, _) | (_, Literal::Null) => None,
        (Literal::Bool(a), Literal::Bool(b)) => Some(a.cmp(b)),
        (Literal::Text(a), Literal::Text(b)) => Some(a.cmp(b)),
        (_, Literal::DateTime(_)) | (Literal::DateTime(_), _) => {
            parse_date(actual)?.partial_cmp(&parse_date(expected)?)
        }
        _ => actual.as_f64()?.partial_cmp(&expected.as_f64()?),
    }
}
