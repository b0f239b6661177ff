//! Property tests for the parse / evaluate / render pipeline.

use proptest::prelude::*;
use serde_json::json;

use filtergen::lexer::tokenize;
use filtergen::{generate_condition, generate_query, BaseCondition, Evaluator, JsonRecord};

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators
// ═══════════════════════════════════════════════════════════════════════════

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

fn op_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["=", "!=", "<", "<=", ">", ">="])
}

fn connective_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["&&", "||"])
}

fn space_strategy() -> impl Strategy<Value = String> {
    " {0,2}"
}

/// A flat filter and the (name, value) pairs it was built from.
fn filter_strategy() -> impl Strategy<Value = (String, Vec<(String, String)>)> {
    prop::collection::vec(
        (
            name_strategy(),
            op_strategy(),
            value_strategy(),
            connective_strategy(),
            space_strategy(),
        ),
        1..6,
    )
    .prop_map(|terms| {
        let mut text = String::new();
        let mut pairs = Vec::new();
        for (i, (name, op, value, connective, space)) in terms.into_iter().enumerate() {
            if i > 0 {
                text.push_str(&format!("{space}{connective}{space}"));
            }
            text.push_str(&format!("{name}{space}{op}{space}{value}"));
            pairs.push((name, value));
        }
        (text, pairs)
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Property tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// Leaves come back in traversal order with their names and values.
    #[test]
    fn prop_parse_keeps_names_and_values((text, pairs) in filter_strategy()) {
        let condition = generate_condition(&text);
        let leaves: Vec<(String, String)> = condition
            .leaves()
            .iter()
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect();
        prop_assert_eq!(leaves, pairs);
    }

    /// Rendering keeps every leaf and emits WHERE exactly once.
    #[test]
    fn prop_render_mentions_every_leaf((text, pairs) in filter_strategy()) {
        let request = BaseCondition::new(vec![generate_condition(&text)]);
        let sql = generate_query("SELECT * FROM t", &request).unwrap();
        prop_assert_eq!(sql.matches("WHERE").count(), 1);
        for (name, value) in &pairs {
            prop_assert!(sql.contains(name.as_str()));
            prop_assert!(sql.contains(value.as_str()));
        }
    }

    /// The same tree against the same record always gives the same answer.
    #[test]
    fn prop_evaluation_is_idempotent(
        (text, _) in filter_strategy(),
        values in prop::collection::vec(0i64..100, 6),
    ) {
        let record = JsonRecord::from_value(json!({
            "a": values[0], "b": values[1], "c": values[2],
            "d": values[3], "e": values[4], "f": values[5],
        }))
        .unwrap();
        let condition = generate_condition(&text);
        let evaluator = Evaluator::new(&condition);

        let first = evaluator.evaluate(&record).map_err(|e| e.to_string());
        let second = evaluator.evaluate(&record).map_err(|e| e.to_string());
        prop_assert_eq!(first, second);
    }

    /// Whitespace between tokens never changes the tree.
    #[test]
    fn prop_whitespace_is_insignificant((text, _) in filter_strategy()) {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        prop_assert_eq!(generate_condition(&text), generate_condition(&compact));
    }

    /// Arbitrary input never panics.
    #[test]
    fn prop_arbitrary_input_is_accepted(text in ".{0,64}") {
        let tokens = tokenize(&text);
        for token in &tokens {
            prop_assert!(token.span.start <= token.span.end);
            prop_assert!(token.span.end <= text.len());
        }
        let _ = generate_condition(&text);
    }
}
