//! # Task Registry
//!
//! Tagged dispatch from operation kind plus typed parameters to a concrete
//! task, replacing a class-per-operation hierarchy. Custom operations can be
//! registered at runtime under a name, the way plugin handlers are.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::cluster_tasks::{
    AddClusterToUniverse, DeleteClusterFromUniverse, RemoveNodesFromUniverse,
};
use super::mutation::TopologyMutation;
use super::task::{ClusterTaskParams, UniverseTask, UniverseTaskParams};
use crate::models::{Cluster, NodeDetail, ReferenceData};

/// Built-in operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    DeleteCluster,
    AddCluster,
    RemoveNodes,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteCluster => write!(f, "delete_cluster"),
            Self::AddCluster => write!(f, "add_cluster"),
            Self::RemoveNodes => write!(f, "remove_nodes"),
        }
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delete_cluster" => Ok(Self::DeleteCluster),
            "add_cluster" => Ok(Self::AddCluster),
            "remove_nodes" => Ok(Self::RemoveNodes),
            _ => Err(format!("Unknown operation kind: {s}")),
        }
    }
}

/// Typed request for a built-in operation
pub enum OperationRequest {
    DeleteCluster(ClusterTaskParams),
    AddCluster {
        params: UniverseTaskParams,
        cluster: Cluster,
        nodes: Vec<NodeDetail>,
        reference: Option<Arc<ReferenceData>>,
    },
    RemoveNodes {
        params: UniverseTaskParams,
        node_names: Vec<String>,
    },
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::DeleteCluster(_) => OperationKind::DeleteCluster,
            Self::AddCluster { .. } => OperationKind::AddCluster,
            Self::RemoveNodes { .. } => OperationKind::RemoveNodes,
        }
    }
}

/// Constructor for a runtime-registered operation
pub type CustomTaskBuilder =
    Arc<dyn Fn(Arc<TopologyMutation>) -> Arc<dyn UniverseTask> + Send + Sync>;

/// Errors from registry lookups
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("no operation registered under name {0}")]
    UnknownOperation(String),
}

/// Maps operation requests to task instances over a shared mutation loop.
pub struct TaskRegistry {
    mutation: Arc<TopologyMutation>,
    custom: RwLock<HashMap<String, CustomTaskBuilder>>,
}

impl TaskRegistry {
    pub fn new(mutation: Arc<TopologyMutation>) -> Self {
        Self {
            mutation,
            custom: RwLock::new(HashMap::new()),
        }
    }

    /// Build a task for a built-in operation request.
    pub fn build(&self, request: OperationRequest) -> Arc<dyn UniverseTask> {
        debug!(kind = %request.kind(), "Building task from registry");
        match request {
            OperationRequest::DeleteCluster(params) => Arc::new(DeleteClusterFromUniverse::new(
                params,
                self.mutation.clone(),
            )),
            OperationRequest::AddCluster {
                params,
                cluster,
                nodes,
                reference,
            } => match reference {
                Some(reference) => Arc::new(AddClusterToUniverse::with_reference_data(
                    params,
                    cluster,
                    nodes,
                    reference,
                    self.mutation.clone(),
                )),
                None => Arc::new(AddClusterToUniverse::new(
                    params,
                    cluster,
                    nodes,
                    self.mutation.clone(),
                )),
            },
            OperationRequest::RemoveNodes { params, node_names } => Arc::new(
                RemoveNodesFromUniverse::new(params, node_names, self.mutation.clone()),
            ),
        }
    }

    /// Register a custom operation constructor under a name.
    pub fn register_custom(&self, name: impl Into<String>, builder: CustomTaskBuilder) {
        self.custom.write().insert(name.into(), builder);
    }

    /// Build a task for a runtime-registered operation.
    pub fn build_custom(&self, name: &str) -> Result<Arc<dyn UniverseTask>, RegistryError> {
        let custom = self.custom.read();
        let builder = custom
            .get(name)
            .ok_or_else(|| RegistryError::UnknownOperation(name.to_string()))?;
        Ok(builder(self.mutation.clone()))
    }

    /// Names of registered custom operations
    pub fn custom_operations(&self) -> Vec<String> {
        self.custom.read().keys().cloned().collect()
    }
}
