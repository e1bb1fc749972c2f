// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::errors::{ForemanError, Result};
use crate::worker::{Worker, WorkerKey};

/// Build-time graph of ordering constraints between workers.
///
/// One node per distinct worker; nodes are created lazily the first time a
/// worker is mentioned and looked up by [`WorkerKey`], so repeated references
/// to the same worker reuse one node. An edge `a -> b` means `a` must run
/// before `b`.
#[derive(Default)]
pub struct DependencyGraph {
    graph: DiGraph<Worker, ()>,
    nodes: HashMap<WorkerKey, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node for `worker`, created on first use.
    pub fn node_of(&mut self, worker: &Worker) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&worker.key()) {
            return idx;
        }
        let idx = self.graph.add_node(worker.clone());
        self.nodes.insert(worker.key(), idx);
        idx
    }

    /// Record that `first` must run before `then`.
    pub fn add_ordering(&mut self, first: &Worker, then: &Worker) {
        let a = self.node_of(first);
        let b = self.node_of(then);
        self.graph.update_edge(a, b, ());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Consume the graph and return a total order consistent with every
    /// declared edge.
    ///
    /// A cycle (including a worker ordered relative to itself) yields
    /// [`ForemanError::DependencyCycle`] naming a worker on it.
    pub fn into_order(self) -> Result<Vec<Worker>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let worker = &self.graph[cycle.node_id()];
            ForemanError::DependencyCycle(format!(
                "cycle detected in worker dependencies involving worker '{}'",
                worker.id()
            ))
        })?;

        let (nodes, _edges) = self.graph.into_nodes_edges();
        let mut slots: Vec<Option<Worker>> = nodes.into_iter().map(|n| Some(n.weight)).collect();

        Ok(order
            .into_iter()
            .filter_map(|idx| slots[idx.index()].take())
            .collect())
    }
}
