//! Client-side class dependency graph using `petgraph`.
//!
//! Orders component classes so that every class appears after the classes
//! it extends. Classes unrelated by ancestry keep insertion order as far as
//! the edges allow.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use trellis_common::error::{Result, TrellisError};

/// A dependency graph of component classes.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: petgraph::Graph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class node, returning the existing node for a known class.
    pub fn add_class(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_owned());
        let _ = self.index.insert(name.to_owned(), idx);
        idx
    }

    /// Records that `dependent` needs `dependency` loaded first.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        if dependent == dependency {
            let _ = self.add_class(dependent);
            return;
        }
        let dependent = self.add_class(dependent);
        let dependency = self.add_class(dependency);
        if self.graph.find_edge(dependency, dependent).is_none() {
            let _ = self.graph.add_edge(dependency, dependent, ());
        }
    }

    /// Returns the number of classes in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the graph holds no class.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns every class, dependencies first. Among classes whose
    /// dependencies are all listed, the earliest inserted comes next.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn resolve_order(&self) -> Result<Vec<String>> {
        if let Err(cycle) = petgraph::algo::toposort(&self.graph, None) {
            return Err(TrellisError::Config {
                message: format!(
                    "cyclic client dependency through class '{}'",
                    self.graph.node_weight(cycle.node_id()).map_or("?", String::as_str)
                ),
            });
        }

        let mut pending: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
            .collect();
        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|idx| pending[idx.index()] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(idx)) = ready.pop() {
            order.extend(self.graph.node_weight(idx).cloned());
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                let count = &mut pending[next.index()];
                *count -= 1;
                if *count == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
        Ok(order)
    }
}
