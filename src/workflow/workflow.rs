//! Runtime workflow representation using a directed graph.
//!
//! The serde [`WorkflowModel`] is turned into a [`Workflow`] before it runs.
//! The graph is built once and shared read-only by every run of the workflow,
//! so node membership cannot change under an already resolved order.

use std::collections::HashMap;

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

use crate::{
    NodeflowError, Result, WorkflowModel,
    model::WorkflowSettings,
    workflow::{
        connection::Connection,
        node::{Node, NodeId},
    },
};

/// Runtime workflow representation as a directed graph.
///
/// Nodes are stored in the order they were declared and connections in the
/// order they were listed; both orders are observable through the accessors
/// and make execution ordering deterministic.
#[derive(Debug, Clone)]
pub struct Workflow {
    id: String,
    name: String,
    description: String,
    variables: HashMap<String, serde_json::Value>,
    settings: WorkflowSettings,
    graph: DiGraph<Node, Connection>,
    index: HashMap<NodeId, NodeIndex>,
}

impl Workflow {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn variables(&self) -> &HashMap<String, serde_json::Value> {
        &self.variables
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub(crate) fn graph(&self) -> &DiGraph<Node, Connection> {
        &self.graph
    }

    /// Output a human-readable representation of the workflow graph
    pub fn schema(&self) -> String {
        let graph = &self.graph;
        let mut lines = Vec::new();

        lines.push(format!("=== Workflow {} ===", self.id));
        lines.push(format!("Nodes: {}, Connections: {}", graph.node_count(), graph.edge_count()));
        lines.push(String::new());

        lines.push("--- Nodes ---".to_string());
        for node in self.nodes() {
            lines.push(format!("[{}] {} (type: {})", node.id, node.name, node.node_type));
        }
        lines.push(String::new());

        lines.push("--- Connections ---".to_string());
        for connection in self.connections() {
            lines.push(format!("{} --> {} (id: {})", connection.source, connection.target, connection.id));
        }
        lines.push(String::new());

        lines.push("--- Graph Structure ---".to_string());
        for node in self.nodes() {
            let downstream = self.downstream(&node.id);
            if downstream.is_empty() {
                lines.push(format!("{} -> (end)", node.id));
            } else {
                lines.push(format!("{} -> {}", node.id, downstream.join(", ")));
            }
        }

        lines.join("\n")
    }

    /// get node by id
    pub fn get_node(
        &self,
        id: &str,
    ) -> Option<&Node> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    /// all nodes in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// all connections in declaration order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.graph.edge_indices().map(|idx| &self.graph[idx])
    }

    /// all node ids in declaration order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|n| n.id.clone()).collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn has_trigger(&self) -> bool {
        self.nodes().any(|n| n.node_type.is_trigger())
    }

    /// ids of the nodes with a connection into `nid`, in connection order
    pub fn upstream(
        &self,
        nid: &str,
    ) -> Vec<NodeId> {
        self.neighbors(nid, Direction::Incoming)
    }

    /// ids of the nodes `nid` connects to, in connection order
    pub fn downstream(
        &self,
        nid: &str,
    ) -> Vec<NodeId> {
        self.neighbors(nid, Direction::Outgoing)
    }

    fn neighbors(
        &self,
        nid: &str,
        direction: Direction,
    ) -> Vec<NodeId> {
        let Some(idx) = self.index.get(nid) else {
            return Vec::new();
        };
        // petgraph walks adjacency lists newest first
        let mut edges: Vec<_> = self.graph.edges_directed(*idx, direction).collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| {
                let other = match direction {
                    Direction::Incoming => e.source(),
                    Direction::Outgoing => e.target(),
                };
                self.graph[other].id.clone()
            })
            .collect()
    }
}

impl TryFrom<&WorkflowModel> for Workflow {
    type Error = NodeflowError;

    fn try_from(model: &WorkflowModel) -> Result<Self> {
        let mut graph: DiGraph<Node, Connection> = DiGraph::new();
        let mut index = HashMap::new();

        for node in model.nodes.iter() {
            if index.contains_key(&node.id) {
                return Err(NodeflowError::Workflow(format!("duplicate node id {}", node.id)));
            }
            let node_idx = graph.add_node(Node::from(node));
            index.insert(node.id.clone(), node_idx);
        }
        for connection in model.connections.iter() {
            let source = index
                .get(&connection.source)
                .ok_or(NodeflowError::Edge(format!("connection {}: source node {} not found", connection.id, connection.source)))?;
            let target = index
                .get(&connection.target)
                .ok_or(NodeflowError::Edge(format!("connection {}: target node {} not found", connection.id, connection.target)))?;
            graph.add_edge(*source, *target, Connection::from(connection));
        }

        Ok(Self {
            id: model.id.clone(),
            name: model.name.clone(),
            description: model.description.clone(),
            variables: model.variables.clone(),
            settings: model.settings.clone(),
            graph,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeModel;

    fn diamond() -> WorkflowModel {
        WorkflowModel::new("wf")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("a", "action"))
            .node(NodeModel::new("b", "action"))
            .node(NodeModel::new("j", "transform"))
            .connect("t", "a")
            .connect("t", "b")
            .connect("b", "j")
            .connect("a", "j")
    }

    #[test]
    fn test_neighbors_follow_connection_order() {
        let workflow = Workflow::try_from(&diamond()).unwrap();
        assert_eq!(workflow.downstream("t"), vec!["a", "b"]);
        assert_eq!(workflow.upstream("j"), vec!["b", "a"]);
        assert!(workflow.upstream("t").is_empty());
        assert!(workflow.upstream("missing").is_empty());
        assert!(workflow.has_trigger());
    }

    #[test]
    fn test_rejects_dangling_connection() {
        let model = diamond().connect("j", "ghost");
        let err = Workflow::try_from(&model).unwrap_err();
        assert!(matches!(err, NodeflowError::Edge(_)));
    }

    #[test]
    fn test_rejects_duplicate_node() {
        let model = diamond().node(NodeModel::new("a", "email"));
        let err = Workflow::try_from(&model).unwrap_err();
        assert_eq!(err, NodeflowError::Workflow("duplicate node id a".to_string()));
    }

    #[test]
    fn test_schema_lists_structure() {
        let workflow = Workflow::try_from(&diamond()).unwrap();
        let schema = workflow.schema();
        assert!(schema.contains("Nodes: 4, Connections: 4"));
        assert!(schema.contains("t -> a, b"));
        assert!(schema.contains("j -> (end)"));
    }
}
