//! Per-type operator enums.
//!
//! Each field type accepts its own closed set of operators. Unknown operator
//! strings never fail: they map to the type's default variant.

/// Operators for `string` fields. Default: [`TextOperator::Contains`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOperator {
    Equal,
    Different,
    Contains,
    DontContains,
    StartWith,
    EndWith,
}

impl TextOperator {
    pub fn parse(op: &str) -> Self {
        match op {
            "equal" => TextOperator::Equal,
            "different" => TextOperator::Different,
            "dontContains" => TextOperator::DontContains,
            "startWith" => TextOperator::StartWith,
            "endWith" => TextOperator::EndWith,
            // "match" behaves exactly like "contains"
            "contains" | "match" => TextOperator::Contains,
            _ => TextOperator::Contains,
        }
    }
}

/// Operators for `number` fields. Default: [`NumberOperator::Equal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberOperator {
    Equal,
    Different,
    Between,
    BiggerThan,
    SmallerThan,
    BiggerOrEqualThan,
    SmallerOrEqualThan,
}

impl NumberOperator {
    pub fn parse(op: &str) -> Self {
        match op {
            "different" => NumberOperator::Different,
            "between" => NumberOperator::Between,
            "biggerThan" => NumberOperator::BiggerThan,
            "smallerThan" => NumberOperator::SmallerThan,
            "biggerOrEqualThan" => NumberOperator::BiggerOrEqualThan,
            "smallerOrEqualThan" => NumberOperator::SmallerOrEqualThan,
            _ => NumberOperator::Equal,
        }
    }
}

/// Operators for `date` fields. Default: [`DateOperator::Equal`] on the parsed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOperator {
    Equal,
    Between,
    BeforeThan,
    AfterThan,
    BeforeOrEqualThan,
    AfterOrEqualThan,
    Day,
    Month,
    Year,
    Week,
}

impl DateOperator {
    pub fn parse(op: &str) -> Self {
        match op {
            "between" => DateOperator::Between,
            "beforeThan" => DateOperator::BeforeThan,
            "afterThan" => DateOperator::AfterThan,
            "beforeOrEqualThan" => DateOperator::BeforeOrEqualThan,
            "afterOrEqualThan" => DateOperator::AfterOrEqualThan,
            "day" => DateOperator::Day,
            "month" => DateOperator::Month,
            "year" => DateOperator::Year,
            "week" => DateOperator::Week,
            _ => DateOperator::Equal,
        }
    }
}

/// Operators for `entity` fields. Default: [`EntityOperator::Equal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOperator {
    Equal,
    Different,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl EntityOperator {
    pub fn parse(op: &str) -> Self {
        match op {
            "different" => EntityOperator::Different,
            "in" => EntityOperator::In,
            "notIn" => EntityOperator::NotIn,
            "isNull" => EntityOperator::IsNull,
            "isNotNull" => EntityOperator::IsNotNull,
            _ => EntityOperator::Equal,
        }
    }
}
