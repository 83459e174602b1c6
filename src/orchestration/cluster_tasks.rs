//! Concrete universe tasks.
//!
//! Each task wraps one updater in the shared mutation loop, logs under its
//! computed name, and converts any failure into the uniform [`TaskFailure`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::mutation::TopologyMutation;
use super::task::{ClusterTaskParams, TaskFailure, TaskOutcome, UniverseTask, UniverseTaskParams};
use crate::logging::log_error;
use crate::models::{Cluster, NodeDetail, ReferenceData};
use crate::updater::{AddClusterUpdater, DeleteClusterUpdater, RemoveNodesUpdater};

/// Remove a cluster and all of its nodes from a universe.
pub struct DeleteClusterFromUniverse {
    params: ClusterTaskParams,
    mutation: Arc<TopologyMutation>,
}

impl DeleteClusterFromUniverse {
    pub fn new(params: ClusterTaskParams, mutation: Arc<TopologyMutation>) -> Self {
        Self { params, mutation }
    }
}

#[async_trait]
impl UniverseTask for DeleteClusterFromUniverse {
    fn name(&self) -> String {
        format!(
            "DeleteClusterFromUniverse({} {})",
            self.params.universe_uuid, self.params.cluster_uuid
        )
    }

    fn universe_uuid(&self) -> Uuid {
        self.params.universe_uuid
    }

    async fn run(&self) -> Result<TaskOutcome, TaskFailure> {
        info!("Running {}", self.name());

        let updater = DeleteClusterUpdater::new(self.params.cluster_uuid);
        let result = self
            .mutation
            .apply(self.params.universe_uuid, &updater)
            .await
            .map_err(|e| {
                log_error("cluster_tasks", &self.name(), &e.to_string(), None);
                TaskFailure::new(self.name(), e.to_string())
            })?;

        info!(
            cluster_uuid = %self.params.cluster_uuid,
            version = result.version,
            changed = result.changed,
            "Delete cluster done"
        );
        Ok(TaskOutcome {
            version: Some(result.version),
            changed: result.changed,
        })
    }
}

/// Add a cluster and its initial nodes to a universe.
///
/// When reference data is supplied, the placement is validated against it
/// before any updater is constructed; the updater itself stays pure.
pub struct AddClusterToUniverse {
    params: UniverseTaskParams,
    cluster: Cluster,
    nodes: Vec<NodeDetail>,
    reference: Option<Arc<ReferenceData>>,
    mutation: Arc<TopologyMutation>,
}

impl AddClusterToUniverse {
    pub fn new(
        params: UniverseTaskParams,
        cluster: Cluster,
        nodes: Vec<NodeDetail>,
        mutation: Arc<TopologyMutation>,
    ) -> Self {
        Self {
            params,
            cluster,
            nodes,
            reference: None,
            mutation,
        }
    }

    pub fn with_reference_data(
        params: UniverseTaskParams,
        cluster: Cluster,
        nodes: Vec<NodeDetail>,
        reference: Arc<ReferenceData>,
        mutation: Arc<TopologyMutation>,
    ) -> Self {
        Self {
            params,
            cluster,
            nodes,
            reference: Some(reference),
            mutation,
        }
    }
}

#[async_trait]
impl UniverseTask for AddClusterToUniverse {
    fn name(&self) -> String {
        format!(
            "AddClusterToUniverse({} {})",
            self.params.universe_uuid, self.cluster.cluster_uuid
        )
    }

    fn universe_uuid(&self) -> Uuid {
        self.params.universe_uuid
    }

    async fn run(&self) -> Result<TaskOutcome, TaskFailure> {
        info!("Running {}", self.name());

        if let Some(reference) = &self.reference {
            if !reference.placement_is_valid(&self.cluster.placement) {
                let cause = format!(
                    "placement references unknown or inactive regions/zones for provider {}",
                    self.cluster.placement.provider_code
                );
                log_error("cluster_tasks", &self.name(), &cause, None);
                return Err(TaskFailure::new(self.name(), cause));
            }
        }

        let updater = AddClusterUpdater::new(self.cluster.clone(), self.nodes.clone());
        let result = self
            .mutation
            .apply(self.params.universe_uuid, &updater)
            .await
            .map_err(|e| {
                log_error("cluster_tasks", &self.name(), &e.to_string(), None);
                TaskFailure::new(self.name(), e.to_string())
            })?;

        info!(
            cluster_uuid = %self.cluster.cluster_uuid,
            version = result.version,
            changed = result.changed,
            "Add cluster done"
        );
        Ok(TaskOutcome {
            version: Some(result.version),
            changed: result.changed,
        })
    }
}

/// Remove named nodes from a universe's document.
pub struct RemoveNodesFromUniverse {
    params: UniverseTaskParams,
    node_names: Vec<String>,
    mutation: Arc<TopologyMutation>,
}

impl RemoveNodesFromUniverse {
    pub fn new(
        params: UniverseTaskParams,
        node_names: Vec<String>,
        mutation: Arc<TopologyMutation>,
    ) -> Self {
        Self {
            params,
            node_names,
            mutation,
        }
    }
}

#[async_trait]
impl UniverseTask for RemoveNodesFromUniverse {
    fn name(&self) -> String {
        format!(
            "RemoveNodesFromUniverse({} [{}])",
            self.params.universe_uuid,
            self.node_names.join(",")
        )
    }

    fn universe_uuid(&self) -> Uuid {
        self.params.universe_uuid
    }

    async fn run(&self) -> Result<TaskOutcome, TaskFailure> {
        info!("Running {}", self.name());

        let updater = RemoveNodesUpdater::new(self.node_names.clone());
        let result = self
            .mutation
            .apply(self.params.universe_uuid, &updater)
            .await
            .map_err(|e| {
                log_error("cluster_tasks", &self.name(), &e.to_string(), None);
                TaskFailure::new(self.name(), e.to_string())
            })?;

        info!(
            removed = result.changed,
            version = result.version,
            "Remove nodes done"
        );
        Ok(TaskOutcome {
            version: Some(result.version),
            changed: result.changed,
        })
    }
}
