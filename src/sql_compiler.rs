//! SQL compiler that renders condition trees as a WHERE clause with optional
//! ORDER BY / LIMIT trailer.
//!
//! Output is single-spaced text:
//! `SELECT <fields> FROM <source> WHERE <conditions> [ORDER BY ...] [LIMIT n OFFSET m]`.
//! Identifiers are written as given and numeric literals verbatim.

use tracing::debug;

use crate::ast::{Attribute, BaseCondition, Condition, Footer, Node, ValueType};
use crate::convert::infer_value_type;
use crate::error::{Error, Result};

/// Renders [`BaseCondition`] requests to SQL text.
#[derive(Debug, Clone, Default)]
pub struct SqlCompiler {}

impl SqlCompiler {
    pub fn new() -> Self {
        Self {}
    }

    /// Compile a full query.
    ///
    /// When `request.fields` is non-empty and `main_query` has a `FROM`, the
    /// select list is replaced by the requested fields.
    pub fn compile(&self, main_query: &str, request: &BaseCondition) -> Result<String> {
        let mut sql = self.select_prefix(main_query, request);

        let clause = self.render_where(&request.conditions)?;
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(&clause);
        }

        let footer = self.render_footer(&request.footer);
        if !footer.is_empty() {
            sql.push(' ');
            sql.push_str(&footer);
        }

        debug!(sql = %sql, "compiled query");
        Ok(sql)
    }

    fn select_prefix(&self, main_query: &str, request: &BaseCondition) -> String {
        let main_query = main_query.trim();
        if request.fields.is_empty() {
            return main_query.to_string();
        }
        // ASCII lowercasing keeps byte offsets intact
        let Some(at) = main_query.to_ascii_lowercase().find(" from ") else {
            return main_query.to_string();
        };
        let source = main_query[at + " from ".len()..].trim();
        let distinct = if request.distinct { "DISTINCT " } else { "" };
        format!("SELECT {distinct}{} FROM {source}", request.fields.join(", "))
    }

    /// Render the conditions of every root, `WHERE` first.
    ///
    /// Returns an empty string when there is nothing to filter on.
    pub fn render_where(&self, roots: &[Condition]) -> Result<String> {
        let mut clause = String::new();

        for root in roots {
            let children = match &root.node {
                Node::Branch(children) => children.as_slice(),
                Node::Leaf(_) => std::slice::from_ref(root),
            };
            for child in children {
                let Some(body) = self.render_condition(child)? else {
                    continue;
                };
                if clause.is_empty() {
                    clause.push_str("WHERE ");
                } else {
                    clause.push(' ');
                    clause.push_str(child.logical_operator().as_str());
                    clause.push(' ');
                }
                clause.push_str(&body);
            }
        }

        Ok(clause)
    }

    /// A branch with two or more children is parenthesized; a single child is
    /// rendered bare and takes the branch's place.
    fn render_condition(&self, condition: &Condition) -> Result<Option<String>> {
        let children = match &condition.node {
            Node::Leaf(attribute) => return self.render_attribute(attribute).map(Some),
            Node::Branch(children) => children,
        };

        let mut parts = Vec::with_capacity(children.len());
        for child in children {
            let Some(body) = self.render_condition(child)? else {
                continue;
            };
            if parts.is_empty() {
                parts.push(body);
            } else {
                parts.push(format!("{} {}", child.logical_operator(), body));
            }
        }

        Ok(match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(format!("({})", parts.join(" "))),
        })
    }

    fn render_attribute(&self, attribute: &Attribute) -> Result<String> {
        if attribute.name.trim().is_empty() {
            return Err(Error::InvalidParameter("attribute name".to_string()));
        }

        let op = attribute.operator;
        if op.is_nullary() {
            return Ok(format!("{} {}", attribute.name, op));
        }
        let value = if op.is_set_membership() {
            format!("({})", render_list(attribute))
        } else if attribute.value_type() == ValueType::Numeric {
            attribute.value.clone()
        } else {
            quote(&attribute.value)
        };
        Ok(format!("{} {} {}", attribute.name, op, value))
    }

    /// `ORDER BY` in the given order, then `LIMIT`/`OFFSET` when a limit is set.
    pub fn render_footer(&self, footer: &Footer) -> String {
        let mut parts = Vec::new();

        let sort: Vec<String> = footer
            .sort
            .iter()
            .filter(|key| !key.field.trim().is_empty())
            .map(|key| format!("{} {}", key.field, key.direction.as_str()))
            .collect();
        if !sort.is_empty() {
            parts.push(format!("ORDER BY {}", sort.join(", ")));
        }

        if footer.limit > 0 {
            let page = footer.page.max(1);
            let offset = u64::from(footer.limit) * u64::from(page - 1);
            parts.push(format!("LIMIT {} OFFSET {}", footer.limit, offset));
        }

        parts.join(" ")
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Items of an `IN` list. Bare when declared numeric, or when undeclared and
/// every item looks numeric.
fn render_list(attribute: &Attribute) -> String {
    let items: Vec<&str> = attribute.value.split(',').map(str::trim).collect();
    let numeric = match attribute.value_type {
        Some(value_type) => value_type == ValueType::Numeric,
        None => items
            .iter()
            .all(|item| infer_value_type(item) == ValueType::Numeric),
    };
    if numeric {
        items.join(",")
    } else {
        items.iter().map(|item| quote(item)).collect::<Vec<_>>().join(",")
    }
}
