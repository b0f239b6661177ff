//! Value classification, literal coercion and the comparison rules shared by
//! the record evaluator and the entailment check.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use regex::{Regex, RegexBuilder};

use crate::ast::{Operator, ValueType};
use crate::error::{Error, Result};

/// Fixed timestamp layout used for date literals.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Classify an unquoted literal.
///
/// Numeric when every character is a digit with at most one embedded `.`,
/// date when it parses with [`DATETIME_FORMAT`], alphanumeric otherwise.
pub fn infer_value_type(value: &str) -> ValueType {
    if is_numeric(value) {
        ValueType::Numeric
    } else if parse_timestamp(value).is_some() {
        ValueType::Date
    } else {
        ValueType::Alphanumeric
    }
}

/// Classify a double-quoted literal. Quoting rules out numeric.
pub fn infer_quoted_type(value: &str) -> ValueType {
    if parse_timestamp(value).is_some() {
        ValueType::Date
    } else {
        ValueType::Alphanumeric
    }
}

fn is_numeric(value: &str) -> bool {
    let mut dots = 0;
    for c in value.chars() {
        match c {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    !value.is_empty() && dots <= 1 && !value.starts_with('.') && !value.ends_with('.')
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DATETIME_FORMAT).ok()
}

/// `t` and `true` (any case) are true, everything else is false.
pub fn to_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "t" | "true")
}

/// Parse a number, `0` when unparseable.
pub fn to_f64_lossy(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}

/// Parse a timestamp, the zero timestamp when unparseable.
pub fn to_timestamp_lossy(value: &str) -> NaiveDateTime {
    parse_timestamp(value).unwrap_or_default()
}

/// The kind a comparison is carried out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Number,
    Timestamp,
    Bool,
    Text,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Number => "number",
            ScalarKind::Timestamp => "timestamp",
            ScalarKind::Bool => "bool",
            ScalarKind::Text => "text",
        }
    }
}

impl From<ValueType> for ScalarKind {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Numeric => ScalarKind::Number,
            ValueType::Date => ScalarKind::Timestamp,
            ValueType::Alphanumeric => ScalarKind::Text,
        }
    }
}

/// A non-null value ready for comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Timestamp(NaiveDateTime),
    Bool(bool),
    Text(String),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Number(_) => ScalarKind::Number,
            Scalar::Timestamp(_) => ScalarKind::Timestamp,
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Text(_) => ScalarKind::Text,
        }
    }

    /// Strict conversion of a literal into `kind`.
    pub fn parse(literal: &str, kind: ScalarKind) -> Result<Scalar> {
        match kind {
            ScalarKind::Number => literal
                .trim()
                .parse()
                .map(Scalar::Number)
                .map_err(|_| Error::coercion(literal, kind.as_str())),
            ScalarKind::Timestamp => parse_timestamp(literal)
                .map(Scalar::Timestamp)
                .ok_or_else(|| Error::coercion(literal, kind.as_str())),
            ScalarKind::Bool => Ok(Scalar::Bool(to_bool(literal))),
            ScalarKind::Text => Ok(Scalar::Text(literal.to_string())),
        }
    }

    /// Conversion that never fails: unparseable numbers become `0` and
    /// unparseable timestamps the zero timestamp.
    pub fn parse_lossy(literal: &str, kind: ScalarKind) -> Scalar {
        match kind {
            ScalarKind::Number => Scalar::Number(to_f64_lossy(literal)),
            ScalarKind::Timestamp => Scalar::Timestamp(to_timestamp_lossy(literal)),
            ScalarKind::Bool => Scalar::Bool(to_bool(literal)),
            ScalarKind::Text => Scalar::Text(literal.to_string()),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Timestamp(t) => t.format(DATETIME_FORMAT).to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }

    fn equals(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Text(a), Scalar::Text(b)) => a.to_lowercase() == b.to_lowercase(),
            (Scalar::Number(a), Scalar::Number(b)) => a == b,
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a == b,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            _ => false,
        }
    }

    fn ordering(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Number(a), Scalar::Number(b)) => a.partial_cmp(b),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(b)),
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        }
    }
}

/// Apply `op` to a field value and a literal.
///
/// `field` is `None` for a null value. `coerce` turns the literal (or each
/// item of an `IN` list) into the field's kind.
pub fn apply<F>(op: Operator, field: Option<&Scalar>, literal: &str, coerce: F) -> Result<bool>
where
    F: Fn(&str) -> Result<Scalar>,
{
    let field = match (op, field) {
        (Operator::IsNull, field) => return Ok(field.is_none()),
        (Operator::IsNotNull, field) => return Ok(field.is_some()),
        (_, None) => return Ok(false),
        (_, Some(field)) => field,
    };

    let matched = match op {
        Operator::Eq => field.equals(&coerce(literal)?),
        Operator::NotEq => !field.equals(&coerce(literal)?),
        Operator::Lt => field.ordering(&coerce(literal)?) == Some(Ordering::Less),
        Operator::Lte => matches!(
            field.ordering(&coerce(literal)?),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Gt => field.ordering(&coerce(literal)?) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            field.ordering(&coerce(literal)?),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::In | Operator::NotIn => {
            let items = literal
                .split(',')
                .map(|item| coerce(item.trim()))
                .collect::<Result<Vec<_>>>()?;
            items.iter().any(|item| field.equals(item)) == (op == Operator::In)
        }
        Operator::Like => like(&field.to_text(), literal),
        Operator::IsNull | Operator::IsNotNull => unreachable!("handled above"),
    };
    Ok(matched)
}

/// SQL `LIKE` with `%` and `_` wildcards, case-insensitive.
pub fn like(text: &str, pattern: &str) -> bool {
    compile_like(pattern).is_some_and(|re| re.is_match(text))
}

/// Compile a `LIKE` pattern into an anchored regex.
pub fn compile_like(pattern: &str) -> Option<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 2);
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            c => expr.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');

    RegexBuilder::new(&expr)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(kind: ScalarKind) -> impl Fn(&str) -> Result<Scalar> {
        move |literal| Scalar::parse(literal, kind)
    }

    #[test]
    fn test_infer_value_type() {
        assert_eq!(infer_value_type("123"), ValueType::Numeric);
        assert_eq!(infer_value_type("1200.50"), ValueType::Numeric);
        assert_eq!(infer_value_type("1.2.3"), ValueType::Alphanumeric);
        assert_eq!(infer_value_type(".5"), ValueType::Alphanumeric);
        assert_eq!(infer_value_type("5."), ValueType::Alphanumeric);
        assert_eq!(infer_value_type("-5"), ValueType::Alphanumeric);
        assert_eq!(infer_value_type(""), ValueType::Alphanumeric);
        assert_eq!(infer_value_type("engineering"), ValueType::Alphanumeric);
        assert_eq!(infer_value_type("2020-02-02 12:12:12"), ValueType::Date);
        assert_eq!(infer_value_type("2019-09-09"), ValueType::Alphanumeric);
    }

    #[test]
    fn test_quoted_literals_are_never_numeric() {
        assert_eq!(infer_quoted_type("123"), ValueType::Alphanumeric);
        assert_eq!(infer_quoted_type("2020-02-02 12:12:12"), ValueType::Date);
    }

    #[test]
    fn test_lossy_conversions() {
        assert_eq!(to_f64_lossy("abc"), 0.0);
        assert_eq!(to_f64_lossy(" 12.5 "), 12.5);
        assert_eq!(to_timestamp_lossy("nope"), NaiveDateTime::default());
        assert!(to_bool("T"));
        assert!(to_bool("true"));
        assert!(!to_bool("yes"));
    }

    #[test]
    fn test_strict_coercion_failure() {
        let err = Scalar::parse("abc", ScalarKind::Number).unwrap_err();
        assert!(matches!(err, Error::Coercion { kind: "number", .. }));
        assert!(Scalar::parse("2020-13-01 00:00:00", ScalarKind::Timestamp).is_err());
    }

    #[test]
    fn test_apply_text_equality_ignores_case() {
        let field = Scalar::Text("engineering".into());
        assert!(apply(Operator::Eq, Some(&field), "Engineering", strict(ScalarKind::Text)).unwrap());
        assert!(!apply(Operator::NotEq, Some(&field), "ENGINEERING", strict(ScalarKind::Text)).unwrap());
    }

    #[test]
    fn test_apply_numeric_relations() {
        let field = Scalar::Number(1200.51);
        let coerce = strict(ScalarKind::Number);
        assert!(apply(Operator::Gt, Some(&field), "1200.50", &coerce).unwrap());
        assert!(apply(Operator::Gte, Some(&field), "1200.51", &coerce).unwrap());
        assert!(!apply(Operator::Lt, Some(&field), "100", &coerce).unwrap());
        assert!(apply(Operator::Lte, Some(&field), "5000", &coerce).unwrap());
        assert!(apply(Operator::Gt, Some(&field), "x", &coerce).is_err());
    }

    #[test]
    fn test_apply_null_handling() {
        let coerce = strict(ScalarKind::Number);
        assert!(apply(Operator::IsNull, None, "", &coerce).unwrap());
        assert!(!apply(Operator::IsNotNull, None, "", &coerce).unwrap());
        assert!(!apply(Operator::Eq, None, "1", &coerce).unwrap());
        assert!(!apply(Operator::NotEq, None, "1", &coerce).unwrap());
    }

    #[test]
    fn test_apply_set_membership() {
        let field = Scalar::Number(32.0);
        let coerce = strict(ScalarKind::Number);
        assert!(apply(Operator::In, Some(&field), "22, 32,45", &coerce).unwrap());
        assert!(!apply(Operator::NotIn, Some(&field), "22,32,45", &coerce).unwrap());
        assert!(apply(Operator::NotIn, Some(&field), "1,2", &coerce).unwrap());
        // every item is coerced, even after a match
        assert!(apply(Operator::In, Some(&field), "32,abc", &coerce).is_err());
    }

    #[test]
    fn test_bool_relations_are_false() {
        let field = Scalar::Bool(true);
        let coerce = strict(ScalarKind::Bool);
        assert!(apply(Operator::Eq, Some(&field), "t", &coerce).unwrap());
        assert!(!apply(Operator::Gt, Some(&field), "false", &coerce).unwrap());
    }

    #[test]
    fn test_like() {
        assert!(like("Budi Santoso", "budi%"));
        assert!(like("a.c", "a_c"));
        assert!(!like("abc", "a.c"));
        assert!(like("100%", "100%"));
        assert!(!like("xbudi", "budi%"));

        let re = compile_like("%santoso").unwrap();
        assert!(re.is_match("Budi SANTOSO"));
        assert!(!re.is_match("Santoso Budi"));
    }
}
