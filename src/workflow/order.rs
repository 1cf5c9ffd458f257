//! Execution order resolution.
//!
//! A depth-first walk over upstream dependencies with a temporary mark for
//! nodes on the current path and a permanent mark for finished nodes. A node
//! is emitted only after every node it depends on, so the result is a
//! topological order. Walks start from each node in declaration order and
//! dependencies are followed in connection order, which makes the result
//! deterministic. The walk keeps its own stack, so graph depth is not limited
//! by the call stack.

use petgraph::{Direction, graph::NodeIndex, visit::EdgeRef};

use crate::{
    NodeflowError, Result,
    workflow::{NodeId, Workflow},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Temporary,
    Visited,
}

struct Frame {
    idx: NodeIndex,
    deps: Vec<NodeIndex>,
    next: usize,
}

/// Returns every node id of `workflow` once, each after all of its upstream nodes.
///
/// Fails with [`NodeflowError::CircularDependency`] when the connections form a
/// cycle; no partial order is returned in that case.
pub fn execution_order(workflow: &Workflow) -> Result<Vec<NodeId>> {
    let graph = workflow.graph();
    let mut marks: Vec<Option<Mark>> = vec![None; graph.node_count()];
    let mut order = Vec::with_capacity(graph.node_count());

    let dependencies = |idx: NodeIndex| -> Vec<NodeIndex> {
        let mut edges: Vec<_> = graph.edges_directed(idx, Direction::Incoming).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.source()).collect()
    };

    for start in graph.node_indices() {
        if marks[start.index()].is_some() {
            continue;
        }

        marks[start.index()] = Some(Mark::Temporary);
        let mut stack = vec![Frame {
            idx: start,
            deps: dependencies(start),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.deps.len() {
                let dep = frame.deps[frame.next];
                frame.next += 1;

                match marks[dep.index()] {
                    Some(Mark::Visited) => {}
                    Some(Mark::Temporary) => {
                        return Err(NodeflowError::CircularDependency {
                            node: graph[dep].id.clone(),
                        });
                    }
                    None => {
                        marks[dep.index()] = Some(Mark::Temporary);
                        stack.push(Frame {
                            idx: dep,
                            deps: dependencies(dep),
                            next: 0,
                        });
                    }
                }
            } else {
                let idx = frame.idx;
                stack.pop();
                marks[idx.index()] = Some(Mark::Visited);
                order.push(graph[idx].id.clone());
            }
        }
    }

    Ok(order)
}
