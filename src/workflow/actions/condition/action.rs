use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use strum::VariantNames;

use crate::{
    Result,
    runtime::{Context, LogEntry},
    workflow::{
        actions::{Action, ActionOutput, parse_config},
        consts::{CONDITION_BRANCH, CONDITION_FALSE, CONDITION_RESULT, CONDITION_TRUE},
        node::{Node, NodeType},
        template::{lookup_path, resolve_json_value},
    },
};

use super::models::*;

/// Evaluates one comparison against the node input and reports the branch taken.
#[derive(Debug, Clone)]
pub struct ConditionAction;

impl ConditionAction {
    /// Evaluate a single comparison
    fn evaluate(
        actual: Option<&Value>,
        operator: ComparisonOperator,
        expected: Option<&Value>,
    ) -> bool {
        match operator {
            ComparisonOperator::Exists => actual.is_some_and(|v| !v.is_null()),
            ComparisonOperator::NotExists => actual.is_none_or(Value::is_null),
            ComparisonOperator::Empty => match actual {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(Value::Array(arr)) => arr.is_empty(),
                Some(Value::Object(obj)) => obj.is_empty(),
                _ => false,
            },
            ComparisonOperator::NotEmpty => !Self::evaluate(actual, ComparisonOperator::Empty, expected),
            ComparisonOperator::Ne => !Self::evaluate(actual, ComparisonOperator::Eq, expected),
            ComparisonOperator::NotContains => !Self::evaluate(actual, ComparisonOperator::Contains, expected),
            _ => {
                let (Some(actual), Some(expected)) = (actual, expected) else {
                    return false;
                };
                Self::evaluate_with_value(actual, operator, expected)
            }
        }
    }

    /// Evaluate comparison operators that require a value
    fn evaluate_with_value(
        actual: &Value,
        operator: ComparisonOperator,
        expected: &Value,
    ) -> bool {
        match operator {
            ComparisonOperator::Eq => Self::eval_eq(actual, expected),
            ComparisonOperator::Contains => match (actual, expected) {
                (Value::String(s), Value::String(e)) => s.contains(e.as_str()),
                (Value::Array(arr), e) => arr.iter().any(|v| Self::eval_eq(v, e)),
                (Value::Object(obj), Value::String(e)) => obj.contains_key(e),
                _ => false,
            },
            ComparisonOperator::StartsWith => matches!((actual, expected), (Value::String(s), Value::String(e)) if s.starts_with(e.as_str())),
            ComparisonOperator::EndsWith => matches!((actual, expected), (Value::String(s), Value::String(e)) if s.ends_with(e.as_str())),
            ComparisonOperator::Gt => Self::eval_cmp(actual, expected, |a, b| a > b),
            ComparisonOperator::Lt => Self::eval_cmp(actual, expected, |a, b| a < b),
            ComparisonOperator::Ge => Self::eval_cmp(actual, expected, |a, b| a >= b),
            ComparisonOperator::Le => Self::eval_cmp(actual, expected, |a, b| a <= b),
            _ => false,
        }
    }

    /// Numbers compare by value, so `200` equals `200.0` and `"200"`.
    fn eval_eq(
        actual: &Value,
        expected: &Value,
    ) -> bool {
        match (as_number(actual), as_number(expected)) {
            (Some(a), Some(e)) => a == e,
            _ => actual == expected,
        }
    }

    fn eval_cmp<F>(
        actual: &Value,
        expected: &Value,
        cmp: F,
    ) -> bool
    where
        F: Fn(f64, f64) -> bool,
    {
        match (as_number(actual), as_number(expected)) {
            (Some(a), Some(e)) => cmp(a, e),
            _ => false,
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[async_trait]
impl Action for ConditionAction {
    fn action_type(&self) -> NodeType {
        NodeType::Condition
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "field": { "type": "string", "minLength": 1 },
                "operator": { "type": "string", "enum": ComparisonOperator::VARIANTS },
                "value": {}
            },
            "required": ["field", "operator"]
        })
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        node: &Node,
        input: &Value,
    ) -> Result<ActionOutput> {
        let config: ConditionConfig = parse_config(&self.schema(), &node.config)?;
        let expected = match &config.value {
            Some(value) => Some(resolve_json_value(&ctx, value)?),
            None => None,
        };

        let actual = lookup_path(input, &config.field);
        let result = Self::evaluate(actual, config.operator, expected.as_ref());
        let branch = if result { CONDITION_TRUE } else { CONDITION_FALSE };

        Ok(ActionOutput::success(json!({ CONDITION_RESULT: result, CONDITION_BRANCH: branch }))
            .with_log(LogEntry::debug(format!("{} {} evaluated to {}", config.field, config.operator.as_ref(), result))))
    }
}
