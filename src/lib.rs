//! Boolean filter expressions such as
//! `id=1 && (division=engineering || division=finance)`.
//!
//! Filter text is tokenized by [`lexer`] and parsed by [`parser`] into a
//! [`Condition`] tree, which can then be
//!
//! - evaluated against in-memory records ([`evaluator`]),
//! - checked for entailment against another tree ([`entailment`]),
//! - rendered as a SQL `WHERE` clause ([`sql_compiler`]).
//!
//! ```
//! use filtergen::{generate_condition, validate_condition, JsonRecord, validate};
//!
//! let condition = generate_condition("id=1 && division=engineering");
//! let record = JsonRecord::from_json(r#"{"id": 1, "division": "Engineering"}"#).unwrap();
//! assert!(validate(&condition, &record).unwrap());
//!
//! let reference = generate_condition("id=1 || id=2");
//! assert!(validate_condition(&reference, &generate_condition("id=2")));
//! ```

pub mod ast;
pub mod config;
pub mod convert;
pub mod entailment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod record;
pub mod sql_compiler;
pub mod token;

pub use ast::{
    Attribute, BaseCondition, Condition, Footer, LogicalOperator, Node, Operator, SortDirection,
    SortKey, ValueType,
};
pub use config::{ConfigError, QueryConfig};
pub use entailment::entails;
pub use error::{Error, Result};
pub use evaluator::Evaluator;
pub use record::{FieldValue, JsonRecord, Record};
pub use sql_compiler::SqlCompiler;

/// Parse filter text into a condition tree. Never fails.
pub fn generate_condition(filter: &str) -> Condition {
    parser::parse(&lexer::tokenize(filter))
}

/// Parse a condition tree from its JSON form.
pub fn condition_from_json(json: &str) -> Result<Condition> {
    Ok(serde_json::from_str(json)?)
}

/// Evaluate a condition against one record.
pub fn validate(condition: &Condition, record: &dyn Record) -> Result<bool> {
    Evaluator::new(condition).evaluate(record)
}

/// Evaluate a condition against several records addressed as `alias.field`.
pub fn validate_objects(condition: &Condition, records: &[&dyn Record]) -> Result<bool> {
    Evaluator::new(condition).evaluate_many(records)
}

/// True when `input` satisfies `reference`.
pub fn validate_condition(reference: &Condition, input: &Condition) -> bool {
    entails(reference, input)
}

/// The records that satisfy a condition, cloned, in their original order.
pub fn filter_slice<R: Record + Clone>(condition: &Condition, records: &[R]) -> Result<Vec<R>> {
    let matched = Evaluator::new(condition).filter(records)?;
    Ok(matched.into_iter().cloned().collect())
}

/// Render a `SELECT` statement for `request`.
pub fn generate_query(main_query: &str, request: &BaseCondition) -> Result<String> {
    SqlCompiler::new().compile(main_query, request)
}
