//! Per-type clause builders.
//!
//! Every builder takes the raw operator string, the primary operand, an
//! optional second bound (present only for range requests) and the target
//! field, and returns a predicate keyed by that field. `None` means the entry
//! cannot be expressed and is dropped by the compiler.

use crate::ast::{Clause, Comparison, DatePart, FilterValue, LikePattern, Literal};
use crate::operators::{DateOperator, EntityOperator, NumberOperator, TextOperator};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

/// Builds a case-insensitive text predicate.
pub fn text_clause(operator: &str, value: &Literal, field: &str) -> Option<Clause> {
    let op = TextOperator::parse(operator);
    let comparison = match op {
        TextOperator::Equal => Comparison::Eq(value.clone()),
        TextOperator::Different => Comparison::Ne(value.clone()),
        TextOperator::Contains | TextOperator::DontContains => Comparison::Like {
            pattern: LikePattern::Contains(like_text(value, field)?),
            negated: op == TextOperator::DontContains,
        },
        TextOperator::StartWith => Comparison::Like {
            pattern: LikePattern::StartsWith(like_text(value, field)?),
            negated: false,
        },
        TextOperator::EndWith => Comparison::Like {
            pattern: LikePattern::EndsWith(like_text(value, field)?),
            negated: false,
        },
    };
    Some(Clause::predicate(field, comparison))
}

fn like_text(value: &Literal, field: &str) -> Option<String> {
    let text = value.as_text();
    if text.is_none() {
        debug!(field, "dropping pattern match without a text operand");
    }
    text
}

/// Builds a numeric predicate. Only invoked with a primary value that parses
/// as a float; otherwise the entry is dropped.
pub fn number_clause(
    operator: &str,
    value: &Literal,
    upper: Option<&Literal>,
    field: &str,
) -> Option<Clause> {
    let Some(lower) = value.as_f64() else {
        debug!(field, ?value, "dropping non-numeric value for number field");
        return None;
    };
    let lower = number_literal(lower);

    let comparison = match NumberOperator::parse(operator) {
        NumberOperator::Equal => Comparison::Eq(lower),
        NumberOperator::Different => Comparison::Ne(lower),
        NumberOperator::BiggerThan => Comparison::Gt(lower),
        NumberOperator::SmallerThan => Comparison::Lt(lower),
        NumberOperator::BiggerOrEqualThan => Comparison::Gte(lower),
        NumberOperator::SmallerOrEqualThan => Comparison::Lte(lower),
        NumberOperator::Between => {
            let Some(upper) = upper.and_then(Literal::as_f64) else {
                debug!(field, "dropping numeric range without a numeric upper bound");
                return None;
            };
            Comparison::Between(lower, number_literal(upper))
        }
    };
    Some(Clause::predicate(field, comparison))
}

fn number_literal(value: f64) -> Literal {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Literal::Integer(value as i64)
    } else {
        Literal::Float(value)
    }
}

/// Builds a date predicate.
///
/// `year` and `week` compare the raw operand for equality without any date
/// parsing or extraction.
pub fn date_clause(
    operator: &str,
    value: &Literal,
    upper: Option<&Literal>,
    field: &str,
) -> Option<Clause> {
    let comparison = match DateOperator::parse(operator) {
        DateOperator::Between => {
            let start = parsed_date(value, field)?;
            let end = parsed_date(upper.unwrap_or(&Literal::Null), field)?;
            Comparison::Between(start, end)
        }
        DateOperator::BeforeThan => Comparison::Lt(parsed_date(value, field)?),
        DateOperator::AfterThan => Comparison::Gt(parsed_date(value, field)?),
        DateOperator::BeforeOrEqualThan => Comparison::Lte(parsed_date(value, field)?),
        DateOperator::AfterOrEqualThan => Comparison::Gte(parsed_date(value, field)?),
        DateOperator::Day => Comparison::DatePart {
            part: DatePart::Day,
            value: date_part(value, field)?,
        },
        DateOperator::Month => Comparison::DatePart {
            part: DatePart::Month,
            value: date_part(value, field)?,
        },
        DateOperator::Year | DateOperator::Week => Comparison::Eq(value.clone()),
        DateOperator::Equal => Comparison::Eq(parsed_date(value, field)?),
    };
    Some(Clause::predicate(field, comparison))
}

fn parsed_date(value: &Literal, field: &str) -> Option<Literal> {
    let parsed = parse_date(value);
    if parsed.is_none() {
        debug!(field, ?value, "dropping unparseable date");
    }
    parsed.map(Literal::DateTime)
}

fn date_part(value: &Literal, field: &str) -> Option<i64> {
    let part = value.as_i64();
    if part.is_none() {
        debug!(field, ?value, "dropping non-integer date part");
    }
    part
}

/// Parses a date operand. Integers are read as epoch milliseconds; strings
/// accept RFC 3339, ISO date-times with or without fraction, plain ISO dates
/// and `DD/MM/YYYY`.
pub fn parse_date(value: &Literal) -> Option<NaiveDateTime> {
    match value {
        Literal::DateTime(dt) => Some(*dt),
        Literal::Integer(millis) => {
            DateTime::<Utc>::from_timestamp_millis(*millis).map(|dt| dt.naive_utc())
        }
        Literal::Text(raw) => parse_date_str(raw.trim()),
        _ => None,
    }
}

fn parse_date_str(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    const DATE_TIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ];
    if let Some(dt) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Builds a direct equality predicate; the operator is ignored.
pub fn boolean_clause(value: &Literal, field: &str) -> Clause {
    Clause::predicate(field, Comparison::Eq(value.clone()))
}

/// Builds a predicate on an entity field treated as a scalar foreign-key column.
pub fn entity_clause(operator: &str, value: &FilterValue, field: &str) -> Clause {
    let comparison = match (EntityOperator::parse(operator), value) {
        (EntityOperator::In, _) | (EntityOperator::Equal, FilterValue::List(_)) => {
            Comparison::In(value.to_list())
        }
        (EntityOperator::NotIn, _) | (EntityOperator::Different, FilterValue::List(_)) => {
            Comparison::NotIn(value.to_list())
        }
        (EntityOperator::Equal, _) => Comparison::Eq(value.bounds().0.clone()),
        (EntityOperator::Different, _) => Comparison::Ne(value.bounds().0.clone()),
        (EntityOperator::IsNull, _) => Comparison::IsNull,
        (EntityOperator::IsNotNull, _) => Comparison::IsNotNull,
    };
    Clause::predicate(field, comparison)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> Literal {
        Literal::DateTime(parse_date(&Literal::from(raw)).unwrap())
    }

    #[test]
    fn test_text_operators() {
        let value = Literal::from("ana");
        assert_eq!(
            text_clause("equal", &value, "name"),
            Some(Clause::predicate("name", Comparison::Eq(value.clone())))
        );
        assert_eq!(
            text_clause("dontContains", &value, "name"),
            Some(Clause::predicate(
                "name",
                Comparison::Like {
                    pattern: LikePattern::Contains("ana".to_string()),
                    negated: true,
                }
            ))
        );
        assert_eq!(
            text_clause("endWith", &value, "name"),
            Some(Clause::predicate(
                "name",
                Comparison::Like {
                    pattern: LikePattern::EndsWith("ana".to_string()),
                    negated: false,
                }
            ))
        );
    }

    #[test]
    fn test_text_unknown_operator_is_contains() {
        let value = Literal::from("ana");
        assert_eq!(
            text_clause("whatever", &value, "name"),
            text_clause("contains", &value, "name")
        );
        assert_eq!(
            text_clause("match", &value, "name"),
            text_clause("contains", &value, "name")
        );
    }

    #[test]
    fn test_number_guard() {
        assert_eq!(number_clause("equal", &Literal::from("abc"), None, "age"), None);
        assert_eq!(
            number_clause("biggerThan", &Literal::from("18"), None, "age"),
            Some(Clause::predicate("age", Comparison::Gt(Literal::Integer(18))))
        );
        assert_eq!(
            number_clause("nope", &Literal::Float(1.5), None, "weight"),
            Some(Clause::predicate("weight", Comparison::Eq(Literal::Float(1.5))))
        );
    }

    #[test]
    fn test_number_between() {
        assert_eq!(
            number_clause("between", &Literal::Integer(1), Some(&Literal::from("10")), "age"),
            Some(Clause::predicate(
                "age",
                Comparison::Between(Literal::Integer(1), Literal::Integer(10))
            ))
        );
        assert_eq!(number_clause("between", &Literal::Integer(1), None, "age"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date(&Literal::from("2024-03-15")), Some(expected));
        assert_eq!(parse_date(&Literal::from("15/03/2024")), Some(expected));
        assert_eq!(parse_date(&Literal::from("2024-03-15T00:00:00.000Z")), Some(expected));
        assert_eq!(parse_date(&Literal::from("2024-03-15T00:00:00")), Some(expected));
        assert_eq!(parse_date(&Literal::from("yesterday")), None);
        assert_eq!(parse_date(&Literal::Bool(true)), None);
    }

    #[test]
    fn test_date_operators() {
        assert_eq!(
            date_clause("between", &"2024-01-01".into(), Some(&"2024-01-31".into()), "born"),
            Some(Clause::predicate(
                "born",
                Comparison::Between(date("2024-01-01"), date("2024-01-31"))
            ))
        );
        assert_eq!(
            date_clause("afterOrEqualThan", &"2024-01-01".into(), None, "born"),
            Some(Clause::predicate("born", Comparison::Gte(date("2024-01-01"))))
        );
        assert_eq!(
            date_clause("day", &"7".into(), None, "born"),
            Some(Clause::predicate(
                "born",
                Comparison::DatePart { part: DatePart::Day, value: 7 }
            ))
        );
        assert_eq!(
            date_clause("year", &"2024".into(), None, "born"),
            Some(Clause::predicate("born", Comparison::Eq("2024".into())))
        );
        assert_eq!(
            date_clause("unknown", &"2024-01-01".into(), None, "born"),
            Some(Clause::predicate("born", Comparison::Eq(date("2024-01-01"))))
        );
    }

    #[test]
    fn test_date_drops_unparseable() {
        assert_eq!(date_clause("beforeThan", &"soon".into(), None, "born"), None);
        assert_eq!(date_clause("between", &"2024-01-01".into(), None, "born"), None);
        assert_eq!(date_clause("month", &"march".into(), None, "born"), None);
    }

    #[test]
    fn test_entity_operators() {
        assert_eq!(
            entity_clause("in", &FilterValue::from(3i64), "role"),
            Clause::predicate("role", Comparison::In(vec![Literal::Integer(3)]))
        );
        assert_eq!(
            entity_clause(
                "notIn",
                &FilterValue::List(vec![1i64.into(), 2i64.into()]),
                "role"
            ),
            Clause::predicate(
                "role",
                Comparison::NotIn(vec![Literal::Integer(1), Literal::Integer(2)])
            )
        );
        assert_eq!(
            entity_clause("isNull", &FilterValue::default(), "role"),
            Clause::predicate("role", Comparison::IsNull)
        );
        assert_eq!(
            entity_clause("bogus", &FilterValue::from(5i64), "role"),
            Clause::predicate("role", Comparison::Eq(Literal::Integer(5)))
        );
    }

    #[test]
    fn test_text_pattern_with_null_is_dropped() {
        for op in ["contains", "dontContains", "startWith", "endWith", "bogus"] {
            assert_eq!(text_clause(op, &Literal::Null, "name"), None, "operator {}", op);
        }
        assert_eq!(
            text_clause("equal", &Literal::Null, "name"),
            Some(Clause::predicate("name", Comparison::Eq(Literal::Null)))
        );
    }

    #[test]
    fn test_entity_equality_with_list_is_membership() {
        let ids = FilterValue::List(vec![1i64.into(), 2i64.into()]);
        assert_eq!(
            entity_clause("equal", &ids, "role"),
            Clause::predicate(
                "role",
                Comparison::In(vec![Literal::Integer(1), Literal::Integer(2)])
            )
        );
        assert_eq!(
            entity_clause("different", &ids, "role"),
            Clause::predicate(
                "role",
                Comparison::NotIn(vec![Literal::Integer(1), Literal::Integer(2)])
            )
        );
    }

    #[test]
    fn test_date_week_is_plain_equality() {
        assert_eq!(
            date_clause("week", &"12".into(), None, "born"),
            Some(Clause::predicate("born", Comparison::Eq(Literal::from("12"))))
        );
    }

    #[test]
    fn test_boolean_ignores_operator() {
        assert_eq!(
            boolean_clause(&Literal::Bool(false), "active"),
            Clause::predicate("active", Comparison::Eq(Literal::Bool(false)))
        );
    }
}
