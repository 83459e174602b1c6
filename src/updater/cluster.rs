//! Cluster-level updaters.

use uuid::Uuid;

use super::{UniverseUpdater, UpdateOutcome, UpdaterError};
use crate::models::{Cluster, NodeDetail, UniverseTopology};

/// Remove a cluster and every node placed in it.
///
/// Both removals land in the same committed document; no intermediate state
/// with orphaned node records is ever persisted. Applying this to a document
/// that already lacks the cluster converges as a no-op.
#[derive(Debug, Clone)]
pub struct DeleteClusterUpdater {
    pub cluster_uuid: Uuid,
}

impl DeleteClusterUpdater {
    pub fn new(cluster_uuid: Uuid) -> Self {
        Self { cluster_uuid }
    }
}

impl UniverseUpdater for DeleteClusterUpdater {
    fn update(&self, topology: &mut UniverseTopology) -> Result<UpdateOutcome, UpdaterError> {
        if topology.delete_cluster(self.cluster_uuid) {
            Ok(UpdateOutcome::Changed)
        } else {
            Ok(UpdateOutcome::Unchanged)
        }
    }
}

/// Add a cluster and its initial node records.
///
/// Declarative: a document that already carries an identical cluster is left
/// untouched, so a retried application converges instead of erroring. A
/// same-uuid cluster with different configuration is a logic error.
#[derive(Debug, Clone)]
pub struct AddClusterUpdater {
    pub cluster: Cluster,
    pub nodes: Vec<NodeDetail>,
}

impl AddClusterUpdater {
    pub fn new(cluster: Cluster, nodes: Vec<NodeDetail>) -> Self {
        Self { cluster, nodes }
    }
}

impl UniverseUpdater for AddClusterUpdater {
    fn update(&self, topology: &mut UniverseTopology) -> Result<UpdateOutcome, UpdaterError> {
        for node in &self.nodes {
            if !node.is_in_cluster(self.cluster.cluster_uuid) {
                return Err(UpdaterError::PlacementInvalid(format!(
                    "node {} is not tagged with cluster {}",
                    node.node_name, self.cluster.cluster_uuid
                )));
            }
        }

        if let Some(existing) = topology.find_cluster(self.cluster.cluster_uuid) {
            if *existing == self.cluster {
                return Ok(UpdateOutcome::Unchanged);
            }
            return Err(UpdaterError::DuplicateCluster(self.cluster.cluster_uuid));
        }

        topology.add_cluster(self.cluster.clone());
        topology.node_details.extend(self.nodes.iter().cloned());
        Ok(UpdateOutcome::Changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClusterRole, PlacementSpec};

    fn placement() -> PlacementSpec {
        PlacementSpec {
            provider_code: "aws".to_string(),
            region_codes: vec!["us-west-2".to_string()],
            zone_codes: vec!["us-west-2a".to_string()],
            replication_factor: 3,
            num_nodes: 2,
        }
    }

    fn seeded() -> (UniverseTopology, Uuid) {
        let cluster_uuid = Uuid::new_v4();
        let mut topology = UniverseTopology::new(Uuid::new_v4(), "updater-test");
        topology.add_cluster(Cluster::new(cluster_uuid, ClusterRole::Primary, placement()));
        topology
            .node_details
            .push(NodeDetail::new("n1", cluster_uuid, "us-west-2a"));
        topology
            .node_details
            .push(NodeDetail::new("n2", cluster_uuid, "us-west-2a"));
        (topology, cluster_uuid)
    }

    #[test]
    fn test_delete_cluster_removes_members() {
        let (mut topology, cluster_uuid) = seeded();

        let outcome = DeleteClusterUpdater::new(cluster_uuid)
            .update(&mut topology)
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Changed);
        assert!(topology.clusters.is_empty());
        assert!(topology.node_details.is_empty());
        topology.validate().unwrap();
    }

    #[test]
    fn test_delete_absent_cluster_converges() {
        let (mut topology, _) = seeded();
        let snapshot = topology.clone();

        let outcome = DeleteClusterUpdater::new(Uuid::new_v4())
            .update(&mut topology)
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Unchanged);
        assert_eq!(topology, snapshot);
    }

    #[test]
    fn test_add_cluster_inserts_members() {
        let (mut topology, _) = seeded();
        let new_uuid = Uuid::new_v4();
        let cluster = Cluster::new(new_uuid, ClusterRole::ReadReplica, placement());
        let nodes = vec![NodeDetail::new("rr1", new_uuid, "us-west-2a")];

        let outcome = AddClusterUpdater::new(cluster, nodes)
            .update(&mut topology)
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Changed);
        assert_eq!(topology.clusters.len(), 2);
        assert_eq!(topology.nodes_in_cluster(new_uuid).len(), 1);
        topology.validate().unwrap();
    }

    #[test]
    fn test_add_identical_cluster_converges() {
        let (mut topology, _) = seeded();
        let new_uuid = Uuid::new_v4();
        let cluster = Cluster::new(new_uuid, ClusterRole::ReadReplica, placement());
        let updater = AddClusterUpdater::new(cluster, vec![]);

        assert_eq!(updater.update(&mut topology).unwrap(), UpdateOutcome::Changed);
        assert_eq!(
            updater.update(&mut topology).unwrap(),
            UpdateOutcome::Unchanged
        );
    }

    #[test]
    fn test_add_conflicting_cluster_errors() {
        let (mut topology, cluster_uuid) = seeded();
        let conflicting = Cluster::new(cluster_uuid, ClusterRole::ReadReplica, placement());

        let err = AddClusterUpdater::new(conflicting, vec![])
            .update(&mut topology)
            .unwrap_err();

        assert!(matches!(err, UpdaterError::DuplicateCluster(_)));
    }

    #[test]
    fn test_add_rejects_mistagged_nodes() {
        let (mut topology, _) = seeded();
        let new_uuid = Uuid::new_v4();
        let cluster = Cluster::new(new_uuid, ClusterRole::ReadReplica, placement());
        let stray = vec![NodeDetail::new("stray", Uuid::new_v4(), "us-west-2a")];

        let err = AddClusterUpdater::new(cluster, stray)
            .update(&mut topology)
            .unwrap_err();

        assert!(matches!(err, UpdaterError::PlacementInvalid(_)));
    }
}
