//! End-to-end orchestration tests over the in-memory store: concurrent
//! mutation races, idempotent convergence, retry ceilings, fail-fast
//! sequencing, and registry dispatch.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use uuid::Uuid;

use universe_core::orchestration::{
    ClusterTaskParams, DeleteClusterFromUniverse, MutationError, OperationRequest, RetryPolicy,
    TaskEntry, TaskExecutor, TaskFailure, TaskOutcome, TaskRegistry, TaskState, TopologyMutation,
    UniverseTask,
};
use universe_core::store::{
    InMemoryUniverseStore, StoreError, UniverseStore, Versioned,
};
use universe_core::updater::DeleteClusterUpdater;
use universe_core::{
    Cluster, ClusterRole, EventPublisher, LifecycleEvent, NodeDetail, PlacementSpec,
    UniverseTopology,
};

fn placement() -> PlacementSpec {
    PlacementSpec {
        provider_code: "aws".to_string(),
        region_codes: vec!["us-west-2".to_string()],
        zone_codes: vec!["us-west-2a".to_string()],
        replication_factor: 3,
        num_nodes: 3,
    }
}

/// Universe with clusters {A, B} and nodes {n1->A, n2->A, n3->B} at version 1.
async fn seed_two_cluster_universe(
    store: &InMemoryUniverseStore,
) -> (Uuid, Uuid, Uuid) {
    let universe_uuid = Uuid::new_v4();
    let cluster_a = Uuid::new_v4();
    let cluster_b = Uuid::new_v4();

    let mut topology = UniverseTopology::new(universe_uuid, "integration-universe");
    topology.add_cluster(Cluster::new(cluster_a, ClusterRole::Primary, placement()));
    topology.add_cluster(Cluster::new(cluster_b, ClusterRole::ReadReplica, placement()));
    topology
        .node_details
        .push(NodeDetail::new("n1", cluster_a, "us-west-2a"));
    topology
        .node_details
        .push(NodeDetail::new("n2", cluster_a, "us-west-2a"));
    topology
        .node_details
        .push(NodeDetail::new("n3", cluster_b, "us-west-2a"));
    store.create(universe_uuid, &topology).await.unwrap();

    (universe_uuid, cluster_a, cluster_b)
}

#[tokio::test]
async fn delete_cluster_scenario() {
    let store = Arc::new(InMemoryUniverseStore::new());
    let (universe_uuid, cluster_a, cluster_b) = seed_two_cluster_universe(&store).await;

    let mutation = TopologyMutation::new(store.clone());
    let result = mutation
        .apply(universe_uuid, &DeleteClusterUpdater::new(cluster_a))
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.version, 2);

    let loaded = store.load(universe_uuid).await.unwrap();
    assert_eq!(loaded.version, 2);
    assert_eq!(loaded.document.clusters.len(), 1);
    assert_eq!(loaded.document.clusters[0].cluster_uuid, cluster_b);
    assert_eq!(loaded.document.node_details.len(), 1);
    assert_eq!(loaded.document.node_details[0].node_name, "n3");
    loaded.document.validate().unwrap();
}

#[tokio::test]
async fn idempotent_convergence_leaves_version_untouched() {
    let store = Arc::new(InMemoryUniverseStore::new());
    let (universe_uuid, cluster_a, _) = seed_two_cluster_universe(&store).await;

    let mutation = TopologyMutation::new(store.clone());
    mutation
        .apply(universe_uuid, &DeleteClusterUpdater::new(cluster_a))
        .await
        .unwrap();

    // Second application finds the cluster already gone
    let result = mutation
        .apply(universe_uuid, &DeleteClusterUpdater::new(cluster_a))
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(result.version, 2);
    assert_eq!(store.load(universe_uuid).await.unwrap().version, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_deletes_of_different_clusters_both_commit() {
    let store = Arc::new(InMemoryUniverseStore::new());
    let (universe_uuid, cluster_a, cluster_b) = seed_two_cluster_universe(&store).await;

    let mutation = Arc::new(TopologyMutation::new(
        store.clone() as Arc<dyn UniverseStore>
    ));

    let handles = [cluster_a, cluster_b].map(|cluster_uuid| {
        let mutation = mutation.clone();
        tokio::spawn(async move {
            mutation
                .apply(universe_uuid, &DeleteClusterUpdater::new(cluster_uuid))
                .await
        })
    });

    for joined in join_all(handles).await {
        let result = joined.unwrap().unwrap();
        assert!(result.changed);
    }

    // Both mutations committed: one at v2, the loser reloaded and landed v3
    let loaded = store.load(universe_uuid).await.unwrap();
    assert_eq!(loaded.version, 3);
    assert!(loaded.document.clusters.is_empty());
    assert!(loaded.document.node_details.is_empty());
    loaded.document.validate().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_deletes_of_same_cluster_converge() {
    let store = Arc::new(InMemoryUniverseStore::new());
    let (universe_uuid, cluster_a, _) = seed_two_cluster_universe(&store).await;

    let mutation = Arc::new(TopologyMutation::new(
        store.clone() as Arc<dyn UniverseStore>
    ));

    let handles = (0..2).map(|_| {
        let mutation = mutation.clone();
        tokio::spawn(async move {
            mutation
                .apply(universe_uuid, &DeleteClusterUpdater::new(cluster_a))
                .await
        })
    });

    for joined in join_all(handles).await {
        joined.unwrap().unwrap();
    }

    // Exactly one mutation changed the document; no lost updates, no orphans
    let loaded = store.load(universe_uuid).await.unwrap();
    assert_eq!(loaded.version, 2);
    assert!(!loaded.document.has_cluster(cluster_a));
    loaded.document.validate().unwrap();
}

/// Store double that injects failures into `save` before delegating.
struct FaultInjectingStore {
    inner: InMemoryUniverseStore,
    conflicts_remaining: AtomicU32,
    unavailable_remaining: AtomicU32,
}

impl FaultInjectingStore {
    fn conflicts(count: u32) -> Self {
        Self {
            inner: InMemoryUniverseStore::new(),
            conflicts_remaining: AtomicU32::new(count),
            unavailable_remaining: AtomicU32::new(0),
        }
    }

    fn unavailable(count: u32) -> Self {
        Self {
            inner: InMemoryUniverseStore::new(),
            conflicts_remaining: AtomicU32::new(0),
            unavailable_remaining: AtomicU32::new(count),
        }
    }

    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl UniverseStore for FaultInjectingStore {
    async fn load(&self, universe_uuid: Uuid) -> Result<Versioned<UniverseTopology>, StoreError> {
        self.inner.load(universe_uuid).await
    }

    async fn save(
        &self,
        universe_uuid: Uuid,
        expected_version: u64,
        topology: &UniverseTopology,
    ) -> Result<u64, StoreError> {
        if Self::take(&self.conflicts_remaining) {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: expected_version + 1,
            });
        }
        if Self::take(&self.unavailable_remaining) {
            return Err(StoreError::Unavailable("injected outage".to_string()));
        }
        self.inner.save(universe_uuid, expected_version, topology).await
    }

    async fn create(
        &self,
        universe_uuid: Uuid,
        topology: &UniverseTopology,
    ) -> Result<u64, StoreError> {
        self.inner.create(universe_uuid, topology).await
    }

    async fn remove(&self, universe_uuid: Uuid) -> Result<(), StoreError> {
        self.inner.remove(universe_uuid).await
    }
}

fn tight_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay_ms: 1,
        max_delay_ms: 4,
        backoff_multiplier: 2.0,
    }
}

#[tokio::test]
async fn retry_ceiling_surfaces_as_error_not_infinite_loop() {
    // More injected conflicts than the ceiling allows
    let store = Arc::new(FaultInjectingStore::conflicts(u32::MAX));
    let (universe_uuid, cluster_a, _) = seed_two_cluster_universe(&store.inner).await;

    let mutation = TopologyMutation::with_policy(
        store,
        tight_policy(3),
        EventPublisher::default(),
    );

    let err = mutation
        .apply(universe_uuid, &DeleteClusterUpdater::new(cluster_a))
        .await
        .unwrap_err();

    match err {
        MutationError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected retries exhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn conflicts_below_ceiling_are_absorbed() {
    let store = Arc::new(FaultInjectingStore::conflicts(2));
    let (universe_uuid, cluster_a, _) = seed_two_cluster_universe(&store.inner).await;

    let mutation = TopologyMutation::with_policy(
        store.clone(),
        tight_policy(5),
        EventPublisher::default(),
    );

    let result = mutation
        .apply(universe_uuid, &DeleteClusterUpdater::new(cluster_a))
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.attempts, 3);
    assert!(!store.load(universe_uuid).await.unwrap().document.has_cluster(cluster_a));
}

#[tokio::test]
async fn store_outage_is_retried_with_backoff_then_succeeds() {
    let store = Arc::new(FaultInjectingStore::unavailable(2));
    let (universe_uuid, cluster_a, _) = seed_two_cluster_universe(&store.inner).await;

    let mutation = TopologyMutation::with_policy(
        store,
        tight_policy(5),
        EventPublisher::default(),
    );

    let result = mutation
        .apply(universe_uuid, &DeleteClusterUpdater::new(cluster_a))
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.attempts, 3);
}

#[tokio::test]
async fn executor_fail_fast_names_the_failing_task() {
    let store = Arc::new(InMemoryUniverseStore::new());
    let (universe_uuid, cluster_a, cluster_b) = seed_two_cluster_universe(&store).await;
    let mutation = Arc::new(TopologyMutation::new(store.clone() as Arc<dyn UniverseStore>));

    let missing_universe = Uuid::new_v4();
    let entries = vec![
        TaskEntry::new(Arc::new(DeleteClusterFromUniverse::new(
            ClusterTaskParams::new(universe_uuid, cluster_a),
            mutation.clone(),
        ))),
        // Targets a universe the store has never seen; fails fatally
        TaskEntry::new(Arc::new(DeleteClusterFromUniverse::new(
            ClusterTaskParams::new(missing_universe, cluster_b),
            mutation.clone(),
        ))),
        TaskEntry::new(Arc::new(DeleteClusterFromUniverse::new(
            ClusterTaskParams::new(universe_uuid, cluster_b),
            mutation.clone(),
        ))),
    ];

    let executor = TaskExecutor::new();
    let report = executor.execute("delete_clusters", entries).await;

    assert!(!report.succeeded);
    assert_eq!(report.reports[0].state, TaskState::Succeeded);
    assert_eq!(report.reports[1].state, TaskState::Failed);
    assert_eq!(report.reports[2].state, TaskState::Skipped);

    let failure = report.first_failure().unwrap();
    assert!(failure.task_name.contains(&missing_universe.to_string()));
    assert!(failure.error.as_deref().unwrap().contains("not found"));

    // Task 3 never ran: cluster B remains
    let loaded = store.load(universe_uuid).await.unwrap();
    assert!(loaded.document.has_cluster(cluster_b));
}

/// Task that raises the shared cancellation flag when it runs.
struct CancellingTask {
    universe_uuid: Uuid,
    flag: Arc<AtomicBool>,
}

#[async_trait]
impl UniverseTask for CancellingTask {
    fn name(&self) -> String {
        format!("CancellingTask({})", self.universe_uuid)
    }

    fn universe_uuid(&self) -> Uuid {
        self.universe_uuid
    }

    async fn run(&self) -> Result<TaskOutcome, TaskFailure> {
        self.flag.store(true, Ordering::Release);
        Ok(TaskOutcome::converged(1))
    }
}

#[tokio::test]
async fn cancellation_is_honored_between_tasks_only() {
    let store = Arc::new(InMemoryUniverseStore::new());
    let (universe_uuid, cluster_a, cluster_b) = seed_two_cluster_universe(&store).await;
    let mutation = Arc::new(TopologyMutation::new(store.clone() as Arc<dyn UniverseStore>));

    let flag = Arc::new(AtomicBool::new(false));
    let entries = vec![
        TaskEntry::new(Arc::new(CancellingTask {
            universe_uuid,
            flag: flag.clone(),
        })),
        TaskEntry::new(Arc::new(DeleteClusterFromUniverse::new(
            ClusterTaskParams::new(universe_uuid, cluster_a),
            mutation.clone(),
        ))),
        TaskEntry::new(Arc::new(DeleteClusterFromUniverse::new(
            ClusterTaskParams::new(universe_uuid, cluster_b),
            mutation,
        ))),
    ];

    let executor = TaskExecutor::with_cancellation(EventPublisher::default(), flag);
    let report = executor.execute("cancelled_operation", entries).await;

    assert!(!report.succeeded);
    assert_eq!(report.reports[0].state, TaskState::Succeeded);
    assert_eq!(report.reports[1].state, TaskState::Skipped);
    assert_eq!(report.reports[2].state, TaskState::Skipped);

    // Neither delete ran
    let loaded = store.load(universe_uuid).await.unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.document.clusters.len(), 2);
}

#[tokio::test]
async fn registry_built_task_matches_direct_construction() {
    let store = Arc::new(InMemoryUniverseStore::new());
    let (universe_uuid, cluster_a, _) = seed_two_cluster_universe(&store).await;
    let mutation = Arc::new(TopologyMutation::new(store.clone() as Arc<dyn UniverseStore>));

    let registry = TaskRegistry::new(mutation.clone());
    let params = ClusterTaskParams::new(universe_uuid, cluster_a);

    let direct = DeleteClusterFromUniverse::new(params, mutation);
    let built = registry.build(OperationRequest::DeleteCluster(params));
    assert_eq!(built.name(), direct.name());

    let outcome = built.run().await.unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.version, Some(2));
}

#[tokio::test]
async fn lifecycle_events_are_published_through_an_operation() {
    let store = Arc::new(InMemoryUniverseStore::new());
    let (universe_uuid, cluster_a, _) = seed_two_cluster_universe(&store).await;

    let publisher = EventPublisher::new(64);
    let mut receiver = publisher.subscribe();

    let mutation = Arc::new(TopologyMutation::with_event_publisher(
        store.clone() as Arc<dyn UniverseStore>,
        publisher.clone(),
    ));
    let executor = TaskExecutor::with_event_publisher(publisher);

    let report = executor
        .execute(
            "delete_cluster",
            vec![TaskEntry::new(Arc::new(DeleteClusterFromUniverse::new(
                ClusterTaskParams::new(universe_uuid, cluster_a),
                mutation,
            )))],
        )
        .await;
    assert!(report.succeeded);

    let mut saw_started = false;
    let mut saw_committed = false;
    let mut saw_succeeded = false;
    let mut saw_completed = false;
    while let Ok(event) = receiver.try_recv() {
        match event {
            LifecycleEvent::TaskStarted { universe_uuid: u, .. } => {
                assert_eq!(u, universe_uuid);
                saw_started = true;
            }
            LifecycleEvent::MutationCommitted { version, .. } => {
                assert_eq!(version, 2);
                saw_committed = true;
            }
            LifecycleEvent::TaskSucceeded { .. } => saw_succeeded = true,
            LifecycleEvent::OperationCompleted { succeeded, .. } => {
                assert!(succeeded);
                saw_completed = true;
            }
            LifecycleEvent::TaskFailed { .. } => panic!("no task should fail"),
        }
    }
    assert!(saw_started && saw_committed && saw_succeeded && saw_completed);
}

#[tokio::test]
async fn universe_provisioning_lifecycle() {
    let store = InMemoryUniverseStore::new();
    let universe_uuid = Uuid::new_v4();
    let topology = UniverseTopology::new(universe_uuid, "ephemeral");

    assert_eq!(store.create(universe_uuid, &topology).await.unwrap(), 1);
    store.remove(universe_uuid).await.unwrap();
    assert!(matches!(
        store.load(universe_uuid).await.unwrap_err(),
        StoreError::UniverseNotFound(_)
    ));
}

mod orphan_invariant {
    use super::*;
    use proptest::prelude::*;
    use universe_core::updater::{AddClusterUpdater, UniverseUpdater};

    #[derive(Debug, Clone)]
    enum Op {
        Add { slot: usize, node_count: usize },
        Delete { slot: usize },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..8usize, 0..4usize).prop_map(|(slot, node_count)| Op::Add { slot, node_count }),
            (0..8usize).prop_map(|slot| Op::Delete { slot }),
        ]
    }

    proptest! {
        /// Arbitrary add/delete sequences never leave a node referencing a
        /// missing cluster.
        #[test]
        fn committed_documents_have_no_orphans(ops in proptest::collection::vec(op_strategy(), 1..40)) {
            let slots: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
            let mut topology = UniverseTopology::new(Uuid::new_v4(), "prop-universe");
            let mut next_node = 0usize;

            for op in ops {
                match op {
                    Op::Add { slot, node_count } => {
                        let cluster_uuid = slots[slot];
                        let cluster = Cluster::new(cluster_uuid, ClusterRole::Primary, placement());
                        let nodes: Vec<NodeDetail> = (0..node_count)
                            .map(|_| {
                                next_node += 1;
                                NodeDetail::new(format!("node-{next_node}"), cluster_uuid, "us-west-2a")
                            })
                            .collect();
                        // Re-adding an occupied slot errors; both outcomes are fine here
                        let _ = AddClusterUpdater::new(cluster, nodes).update(&mut topology);
                    }
                    Op::Delete { slot } => {
                        DeleteClusterUpdater::new(slots[slot]).update(&mut topology).unwrap();
                    }
                }
                prop_assert!(topology.validate().is_ok());
            }
        }
    }
}
