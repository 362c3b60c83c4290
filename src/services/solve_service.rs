//! The solve invocation surface: named-graph registration and solving.
//! Everything a query layer or the CLI calls goes through here.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::builder::{BuildError, EdgeRecord, GraphBuilder};
use crate::graph::Graph;
use crate::materialize::{materialize, ResultRelation};
use crate::registry::GraphRegistry;
use crate::solver::{solve, SolveError, SolveOptions, SolveRequest};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no graph registered under '{0}'")]
    UnknownGraph(String),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// Service wrapping a graph registry. Cloning shares the registry.
#[derive(Clone, Debug, Default)]
pub struct SolveService {
    registry: Arc<GraphRegistry>,
}

impl SolveService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: Arc<GraphRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &GraphRegistry {
        &self.registry
    }

    /// Builds a graph from raw edge records and publishes it under `name`,
    /// replacing any previous build. A failed build leaves the previous
    /// registration untouched.
    pub fn build_and_register(
        &self,
        name: &str,
        records: &[EdgeRecord],
        epsilon: f64,
    ) -> Result<Arc<Graph>, BuildError> {
        let graph = GraphBuilder::with_epsilon(epsilon).build(name, records)?;
        info!("built graph '{}': {}", name, graph.stats());
        Ok(self.registry.register(name, graph))
    }

    /// Runs a request against a registered graph and materializes the
    /// result relation.
    pub fn solve_named(
        &self,
        graph_name: &str,
        solve_name: &str,
        request: &SolveRequest,
        options: &SolveOptions,
    ) -> Result<ResultRelation, ServiceError> {
        let graph = self
            .registry
            .lookup(graph_name)
            .ok_or_else(|| ServiceError::UnknownGraph(graph_name.to_string()))?;
        let paths = solve(&graph, request, options)?;
        Ok(materialize(&graph, solve_name, &paths))
    }
}
