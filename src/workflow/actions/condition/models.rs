use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComparisonOperator {
    // for any value
    Eq,
    Ne,
    Exists,
    NotExists,
    // for string or array
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Empty,
    NotEmpty,
    // for number
    Gt,
    Lt,
    Ge,
    Le,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionConfig {
    /// dotted path into the node input, e.g. `fetch.status`
    pub field: String,
    pub operator: ComparisonOperator,
    #[serde(default)]
    pub value: Option<Value>,
}
