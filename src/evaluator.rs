//! Evaluate a condition tree against in-memory records.

use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, trace};

use crate::ast::{Attribute, Condition, Node, Operator};
use crate::convert::{apply, compile_like, like, Scalar, ScalarKind};
use crate::error::{Error, Result};
use crate::record::{FieldValue, Record};

/// Fold a branch's children left to right.
///
/// `None` from a child means it did not take part: it neither seeds the
/// accumulator nor combines with it. A branch where no child took part is
/// itself `None`.
pub(crate) fn fold<'c, E, F>(children: &'c [Condition], mut eval: F) -> std::result::Result<Option<bool>, E>
where
    F: FnMut(&'c Condition) -> std::result::Result<Option<bool>, E>,
{
    let mut acc = None;
    for child in children {
        // every child is evaluated, there is no short-circuit
        let Some(value) = eval(child)? else {
            continue;
        };
        acc = Some(match acc {
            None => value,
            Some(prev) => child.logical_operator().apply(prev, value),
        });
    }
    Ok(acc)
}

/// What a leaf is resolved against.
#[derive(Clone, Copy)]
enum Target<'r> {
    Single(&'r dyn Record),
    Many(&'r [(&'r str, &'r dyn Record)]),
}

/// Evaluates one condition tree against records. The tree is only read.
///
/// `LIKE` patterns are compiled once, when the evaluator is built.
#[derive(Debug, Clone)]
pub struct Evaluator<'c> {
    condition: &'c Condition,
    patterns: HashMap<&'c str, Regex>,
}

impl<'c> Evaluator<'c> {
    pub fn new(condition: &'c Condition) -> Self {
        let patterns = condition
            .leaves()
            .into_iter()
            .filter(|attribute| attribute.operator == Operator::Like)
            .filter_map(|attribute| {
                compile_like(&attribute.value).map(|re| (attribute.value.as_str(), re))
            })
            .collect();
        Self { condition, patterns }
    }

    /// Evaluate against a single record.
    pub fn evaluate(&self, record: &dyn Record) -> Result<bool> {
        self.run(Target::Single(record))
    }

    /// Evaluate against several records, each addressed by its
    /// [`Record::kind_name`] in `alias.field` names.
    pub fn evaluate_many(&self, records: &[&dyn Record]) -> Result<bool> {
        let aliased: Vec<(&str, &dyn Record)> = records
            .iter()
            .map(|record| (record.kind_name(), *record))
            .collect();
        self.evaluate_aliased(&aliased)
    }

    /// Evaluate against several records with explicit aliases.
    ///
    /// A single record is evaluated as if passed to [`Evaluator::evaluate`].
    pub fn evaluate_aliased(&self, records: &[(&str, &dyn Record)]) -> Result<bool> {
        match records {
            [] => Err(Error::InvalidData("empty".to_string())),
            [(_, record)] => self.evaluate(*record),
            _ => self.run(Target::Many(records)),
        }
    }

    /// Records that satisfy the condition, in their original order.
    pub fn filter<'r, R: Record>(&self, records: &'r [R]) -> Result<Vec<&'r R>> {
        let mut matched = Vec::new();
        for record in records {
            if self.evaluate(record)? {
                matched.push(record);
            }
        }
        debug!(total = records.len(), matched = matched.len(), "filtered records");
        Ok(matched)
    }

    fn run(&self, target: Target<'_>) -> Result<bool> {
        let matched = self.eval_node(self.condition, target)?.unwrap_or(false);
        trace!(matched, "evaluated condition");
        Ok(matched)
    }

    fn eval_node(&self, condition: &Condition, target: Target<'_>) -> Result<Option<bool>> {
        match &condition.node {
            Node::Branch(children) => fold(children, |child| self.eval_node(child, target)),
            Node::Leaf(attribute) => self.eval_leaf(attribute, target),
        }
    }

    fn eval_leaf(&self, attribute: &Attribute, target: Target<'_>) -> Result<Option<bool>> {
        if attribute.is_empty() {
            return Ok(Some(false));
        }

        let value = match target {
            Target::Single(record) => lookup_single(record, &attribute.name),
            Target::Many(records) => {
                let Some((alias, field)) = attribute.name.split_once('.') else {
                    return Ok(None);
                };
                match records.iter().find(|(name, _)| name.eq_ignore_ascii_case(alias)) {
                    Some((_, record)) => record.field(field),
                    None => return Ok(None),
                }
            }
        };

        match value {
            Some(value) => self.compare(attribute, &value).map(Some),
            None => Ok(Some(false)),
        }
    }

    /// Compare a field with a leaf, coercing the literal to the field's kind.
    ///
    /// A literal that does not fit the field kind never satisfies `=`. For
    /// every other operator that takes a literal it is a coercion error.
    fn compare(&self, attribute: &Attribute, value: &FieldValue) -> Result<bool> {
        let field = value.to_scalar();
        let kind = field.as_ref().map_or(ScalarKind::Text, Scalar::kind);

        match attribute.operator {
            Operator::Like => Ok(field.is_some_and(|field| {
                let text = field.to_text();
                match self.patterns.get(attribute.value.as_str()) {
                    Some(re) => re.is_match(&text),
                    None => like(&text, &attribute.value),
                }
            })),
            Operator::Eq => apply(Operator::Eq, field.as_ref(), &attribute.value, |literal| {
                Ok(Scalar::parse(literal, kind).unwrap_or_else(|_| Scalar::Text(literal.to_string())))
            }),
            op => apply(op, field.as_ref(), &attribute.value, |literal| {
                Scalar::parse(literal, kind)
            }),
        }
    }
}

/// Full name first, then `alias.field` when the alias names this record.
fn lookup_single(record: &dyn Record, name: &str) -> Option<FieldValue> {
    record.field(name).or_else(|| {
        let (alias, field) = name.split_once('.')?;
        let kind = record.kind_name();
        if !kind.is_empty() && kind.eq_ignore_ascii_case(alias) {
            record.field(field)
        } else {
            None
        }
    })
}
