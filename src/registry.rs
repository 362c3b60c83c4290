//! Named registry of built graphs.
//!
//! Registration swaps the entry wholesale under a single writer lock;
//! lookups hand out `Arc` snapshots, so a solve that started against an
//! older build keeps reading that build even while a replacement lands.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use tracing::info;

use crate::graph::Graph;

#[derive(Debug, Default)]
pub struct GraphRegistry {
    graphs: RwLock<IndexMap<String, Arc<Graph>>>,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a graph under a name, replacing any previous graph of
    /// that name wholesale. Returns the published handle.
    pub fn register(&self, name: &str, graph: Graph) -> Arc<Graph> {
        let graph = Arc::new(graph);
        let mut graphs = self.graphs.write().expect("registry lock poisoned");
        let previous = graphs.insert(name.to_string(), Arc::clone(&graph));
        if previous.is_some() {
            info!("replaced graph '{}'", name);
        } else {
            info!("registered graph '{}'", name);
        }
        graph
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Graph>> {
        self.graphs
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<Graph>> {
        self.graphs
            .write()
            .expect("registry lock poisoned")
            .shift_remove(name)
    }

    /// Registered graph names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.graphs
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graphs.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
