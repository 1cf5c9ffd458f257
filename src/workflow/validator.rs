//! Structural and semantic checks run before a workflow is saved or executed.
//!
//! Validation never mutates or rejects the model itself; it only reports.
//! Errors block deployment and execution, warnings are advisory.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{WorkflowModel, workflow::actions::ActionRegistry, workflow::node::NodeType};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Structural validation: trigger presence, cycles, node ids, connection ends,
/// unconnected nodes.
pub fn validate(model: &WorkflowModel) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !model.nodes.iter().any(|n| NodeType::from(n.kind.as_str()).is_trigger()) {
        errors.push("workflow must contain at least one trigger node".to_string());
    }

    let mut seen = HashSet::new();
    for node in &model.nodes {
        if !seen.insert(node.id.as_str()) {
            errors.push(format!("duplicate node id {}", node.id));
        }
    }

    for connection in &model.connections {
        if !seen.contains(connection.source.as_str()) {
            errors.push(format!("connection {} references unknown source node {}", connection.id, connection.source));
        }
        if !seen.contains(connection.target.as_str()) {
            errors.push(format!("connection {} references unknown target node {}", connection.id, connection.target));
        }
    }

    if let Some(node) = find_cycle(model) {
        errors.push(format!("circular dependency detected at node {}", node));
    }

    for node in &model.nodes {
        let incoming = model.connections.iter().filter(|c| c.target == node.id).count();
        let outgoing = model.connections.iter().filter(|c| c.source == node.id).count();

        if incoming == 0 && !NodeType::from(node.kind.as_str()).is_trigger() {
            warnings.push(format!("node {} has no incoming connections and will only receive an empty input", node.id));
        }
        if !node.outputs.is_empty() && outgoing == 0 {
            warnings.push(format!("node {} declares outputs but has no outgoing connections", node.id));
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// [`validate`] plus per-node checks against the registered actions: the node
/// configuration must satisfy its action's schema, and node types without an
/// action are reported.
pub fn validate_with(
    model: &WorkflowModel,
    registry: &ActionRegistry,
) -> ValidationReport {
    let mut report = validate(model);

    for node in &model.nodes {
        let node_type = NodeType::from(node.kind.as_str());
        match registry.get(&node_type) {
            Some(action) => {
                if let Err(e) = action.validate(&node.config) {
                    report.errors.push(format!("node {} has invalid {} configuration: {}", node.id, node_type, e.message()));
                }
            }
            None => {
                report.warnings.push(format!("node {} has type {} with no registered action and will pass its input through", node.id, node_type));
            }
        }
    }

    report.valid = report.errors.is_empty();
    report
}

/// Depth-first search over outgoing connections keeping the current path on a
/// recursion stack. Returns the node that closed the first cycle found.
fn find_cycle(model: &WorkflowModel) -> Option<String> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in &model.nodes {
        adjacency.entry(node.id.as_str()).or_default();
    }
    for connection in &model.connections {
        if adjacency.contains_key(connection.target.as_str()) {
            if let Some(targets) = adjacency.get_mut(connection.source.as_str()) {
                targets.push(connection.target.as_str());
            }
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();

    for node in &model.nodes {
        let root = node.id.as_str();
        if visited.contains(root) {
            continue;
        }

        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        visited.insert(root);
        on_stack.insert(root);

        while let Some((current, next)) = stack.last().copied() {
            let targets = &adjacency[current];
            if next < targets.len() {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let target = targets[next];
                if on_stack.contains(target) {
                    return Some(target.to_string());
                }
                if visited.insert(target) {
                    on_stack.insert(target);
                    stack.push((target, 0));
                }
            } else {
                on_stack.remove(current);
                stack.pop();
            }
        }
    }

    None
}
