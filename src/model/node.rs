use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeModel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "empty_config")]
    pub config: serde_json::Value,
    /// declared output ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    /// per-attempt timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl NodeModel {
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: String::new(),
            config: empty_config(),
            outputs: Vec::new(),
            timeout_ms: None,
        }
    }

    pub fn with_config(
        mut self,
        config: serde_json::Value,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn with_outputs(
        mut self,
        outputs: &[&str],
    ) -> Self {
        self.outputs = outputs.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn with_timeout_ms(
        mut self,
        timeout_ms: u64,
    ) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}
