//! Decide whether an input condition tree satisfies a reference tree.
//!
//! Each reference leaf is resolved against the input leaves that carry the
//! same attribute name, folding the input's own AND/OR structure. The result
//! replaces the reference leaf, and the reference tree is folded as usual.
//! Matching is by name and literal value, not general boolean implication.

use std::convert::Infallible;

use tracing::debug;

use crate::ast::{Attribute, Condition, LogicalOperator, Node, Operator};
use crate::convert::{apply, Scalar, ScalarKind};
use crate::evaluator::fold;

/// True when `input` satisfies `reference`. Neither tree is modified.
pub fn entails(reference: &Condition, input: &Condition) -> bool {
    let input = augment(reference, input);
    let entailed = resolve(reference, &input).unwrap_or(false);
    debug!(entailed, "checked condition entailment");
    entailed
}

/// Copy of `input` with a synthetic `name = ""` leaf (AND-joined, top level)
/// for every reference leaf name that `input` does not mention.
pub fn augment(reference: &Condition, input: &Condition) -> Condition {
    let present = leaf_names(input);
    let missing: Vec<String> = leaf_names(reference)
        .into_iter()
        .filter(|name| !present.iter().any(|p| p.eq_ignore_ascii_case(name)))
        .collect();

    if missing.is_empty() {
        return input.clone();
    }

    let mut children = match &input.node {
        Node::Branch(children) => children.clone(),
        Node::Leaf(attribute) => vec![Condition::leaf(None, attribute.clone())],
    };
    for name in missing {
        children.push(Condition::leaf(
            Some(LogicalOperator::And),
            Attribute::named(name),
        ));
    }
    Condition::branch(input.operator, children)
}

/// Distinct non-empty leaf names, compared case-insensitively, in the order
/// they first appear.
pub fn leaf_names(condition: &Condition) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for attribute in condition.leaves() {
        if attribute.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case(&attribute.name)) {
            continue;
        }
        names.push(attribute.name.clone());
    }
    names
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

fn resolve(reference: &Condition, input: &Condition) -> Option<bool> {
    match &reference.node {
        Node::Branch(children) => infallible(fold(children, |child| Ok(resolve(child, input)))),
        Node::Leaf(attribute) if attribute.is_empty() => Some(false),
        // no input leaf with this name reads as false
        Node::Leaf(attribute) => Some(scan(attribute, input).unwrap_or(false)),
    }
}

/// Fold the input tree for one reference leaf, skipping leaves with other names.
fn scan(reference: &Attribute, input: &Condition) -> Option<bool> {
    match &input.node {
        Node::Branch(children) => infallible(fold(children, |child| Ok(scan(reference, child)))),
        Node::Leaf(candidate) => candidate
            .name
            .eq_ignore_ascii_case(&reference.name)
            .then(|| leaf_matches(reference, candidate)),
    }
}

/// The input value checked against the reference leaf's operator and value.
/// The input leaf's own operator is not consulted.
fn leaf_matches(reference: &Attribute, candidate: &Attribute) -> bool {
    if reference.operator == Operator::Eq {
        return candidate.value.to_lowercase() == reference.value.to_lowercase();
    }

    let kind = ScalarKind::from(reference.value_type());
    let field = if reference.operator.is_nullary() && candidate.value.is_empty() {
        None
    } else {
        Some(Scalar::parse_lossy(&candidate.value, kind))
    };
    apply(reference.operator, field.as_ref(), &reference.value, |literal| {
        Ok(Scalar::parse_lossy(literal, kind))
    })
    .unwrap_or(false)
}
