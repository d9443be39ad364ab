//! [`Forest`]: the single-partition facade composing the spatial index,
//! partition topology, ghost layer, fault detector and recovery
//! orchestrator into the workspace's external API surface (§6).

use std::collections::HashMap;
use std::sync::Arc;

use luciferase_balance::BalanceTransport;
use luciferase_error::{LuciferaseError, Result};
use luciferase_fault::{FaultDetector, PartitionChangeListener, SubscriptionId};
use luciferase_forest::{GhostManager, GhostTransport, PartitionTopology};
use luciferase_geometry::KeyKind;
use luciferase_index::{Index, SpatialIndex};
use luciferase_observability::StatusMonitor;
use luciferase_recovery::{
    OperationBarrier, RecoveryOrchestrator, RecoveryPhase, RecoveryResult, RedistributionStrategy,
};
use luciferase_types::{
    Aabb, AlertThresholds, EntityId, FaultToleranceConfig, IndexConfig, NodeId, PartitionId,
    PartitionMetrics, PartitionStatus, SpanningPolicy, TimeSource, Vec3f,
};
use parking_lot::RwLock;

use crate::collaborators::{
    BoundaryPairSource, ClusterGhostValidation, ClusterSnapshotSource, CrossPartitionFailureProbe,
    HeartbeatProbe, NearestRankRedistribution, TracingAlertSink,
};

/// Callback invoked once a `recover()` call for a given partition finishes,
/// registered ahead of time via [`Forest::register_recovery`] (§6
/// `register_recovery(partition_id, recovery)`).
pub type RecoveryHandler = Arc<dyn Fn(&RecoveryResult) + Send + Sync>;

/// Everything one partition of the forest owns: its slice of the spatial
/// index, its view of the cluster topology and ghost layer, its fault
/// detector and recovery orchestrator, and the status monitor feeding
/// operator alerts.
pub struct Forest {
    partition_id: PartitionId,
    self_rank: u32,
    index: Index,
    topology: Arc<PartitionTopology>,
    ghosts: Arc<GhostManager>,
    detector: Arc<FaultDetector>,
    barrier: Arc<OperationBarrier>,
    orchestrator: RecoveryOrchestrator,
    status: Arc<StatusMonitor>,
    strategy_name: String,
    recovery_handlers: RwLock<HashMap<PartitionId, RecoveryHandler>>,
}

/// Everything external and network-shaped a [`Forest`] needs injected at
/// construction: the collaborators the recovery orchestrator and ghost
/// manager cannot synthesize from local state alone.
pub struct ForestDependencies {
    pub heartbeat_probe: Arc<dyn HeartbeatProbe>,
    pub boundary_pairs: Arc<dyn BoundaryPairSource>,
    pub balance_transport: Arc<dyn BalanceTransport>,
    pub cluster_snapshot: Arc<dyn ClusterSnapshotSource>,
    pub alert_callback: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl Forest {
    /// Build a forest partition, registering it in `topology` at
    /// `self_rank` and wiring every collaborator the recovery orchestrator
    /// needs.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        partition_id: PartitionId,
        self_rank: u32,
        kind: KeyKind,
        index_config: IndexConfig,
        bounds: Aabb,
        fault_config: FaultToleranceConfig,
        alert_thresholds: AlertThresholds,
        staleness_ms: u64,
        clock: Arc<dyn TimeSource>,
        deps: ForestDependencies,
    ) -> Self {
        let topology = Arc::new(PartitionTopology::new());
        topology
            .register(partition_id, self_rank)
            .expect("freshly constructed topology cannot collide");

        let index = Index::new(kind, index_config, bounds);
        let ghosts = Arc::new(GhostManager::new(self_rank, topology.clone()));
        let detector = Arc::new(FaultDetector::new(clock.clone(), fault_config));
        let barrier = Arc::new(OperationBarrier::new());
        let status = Arc::new(StatusMonitor::new(clock.clone(), alert_thresholds, staleness_ms, 256));
        detector.subscribe_to_changes(status.clone());

        let redistribution = Arc::new(NearestRankRedistribution::new(topology.clone()));
        let strategy_name = redistribution.name().to_string();
        let probe = Arc::new(CrossPartitionFailureProbe::new(deps.heartbeat_probe));
        let balancer = Arc::new(crate::collaborators::ButterflyBalancer::new(
            self_rank,
            topology.clone(),
            clock,
            deps.boundary_pairs,
            deps.balance_transport,
        ));
        let validation = Arc::new(ClusterGhostValidation::new(topology.clone(), deps.cluster_snapshot));
        let alert_sink: Option<Arc<dyn luciferase_recovery::AlertSink>> =
            Some(Arc::new(TracingAlertSink::new(deps.alert_callback)));

        let orchestrator = RecoveryOrchestrator::new(
            fault_config,
            detector.clone(),
            topology.clone(),
            barrier.clone(),
            probe,
            redistribution,
            balancer,
            validation,
            alert_sink,
        );

        Self {
            partition_id,
            self_rank,
            index,
            topology,
            ghosts,
            detector,
            barrier,
            orchestrator,
            status,
            strategy_name,
            recovery_handlers: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    #[must_use]
    pub const fn self_rank(&self) -> u32 {
        self.self_rank
    }

    #[must_use]
    pub fn topology(&self) -> &Arc<PartitionTopology> {
        &self.topology
    }

    #[must_use]
    pub fn ghosts(&self) -> &Arc<GhostManager> {
        &self.ghosts
    }

    #[must_use]
    pub fn status(&self) -> &Arc<StatusMonitor> {
        &self.status
    }

    /// Refresh the ghost layer against every other active rank (§4.3).
    pub fn sync_ghosts(&self, transport: &dyn GhostTransport) {
        self.ghosts.sync(transport);
    }

    // ---- Spatial Index API (§6) ------------------------------------

    /// Rejects the call with [`LuciferaseError::RecoveryInProgress`] while a
    /// recovery has this partition's operations paused (§4.5 step 3).
    fn begin_write(&self) -> Result<luciferase_recovery::OperationGuard<'_>> {
        self.barrier
            .try_begin_operation()
            .ok_or(LuciferaseError::RecoveryInProgress(self.partition_id))
    }

    /// # Errors
    /// See [`SpatialIndex::insert`]; also rejected while paused for recovery.
    pub fn insert(&self, id: EntityId, position: Vec3f, bounds: Option<Aabb>) -> Result<()> {
        let _guard = self.begin_write()?;
        self.index.insert(id, position, bounds)
    }

    /// # Errors
    /// See [`SpatialIndex::insert_batch`]; also rejected while paused for
    /// recovery.
    pub fn insert_batch(&self, entities: &[(EntityId, Vec3f, Option<Aabb>)]) -> Result<Vec<EntityId>> {
        let _guard = self.begin_write()?;
        self.index.insert_batch(entities)
    }

    /// # Errors
    /// See [`SpatialIndex::remove`]; also rejected while paused for recovery.
    pub fn remove(&self, id: EntityId) -> Result<()> {
        let _guard = self.begin_write()?;
        self.index.remove(id)
    }

    /// # Errors
    /// See [`SpatialIndex::update_position`]; also rejected while paused for
    /// recovery.
    pub fn update_position(&self, id: EntityId, position: Vec3f) -> Result<()> {
        let _guard = self.begin_write()?;
        self.index.update_position(id, position)
    }

    #[must_use]
    pub fn lookup(&self, id: EntityId) -> Option<Vec3f> {
        self.index.lookup(id)
    }

    #[must_use]
    pub fn entities_in_bounds(&self, bounds: Aabb) -> Vec<EntityId> {
        self.index.entities_in_bounds(bounds)
    }

    #[must_use]
    pub fn k_nearest(&self, origin: Vec3f, k: usize) -> Vec<EntityId> {
        self.index.k_nearest(origin, k)
    }

    #[must_use]
    pub fn find_collisions(&self, id: EntityId) -> Vec<(EntityId, EntityId)> {
        self.index.find_collisions(id)
    }

    pub fn set_max_entities_per_node(&self, max_entities_per_node: u32) {
        self.index.set_max_entities_per_node(max_entities_per_node);
    }

    pub fn set_max_depth(&self, max_depth: u8) {
        self.index.set_max_depth(max_depth);
    }

    pub fn set_spanning_policy(&self, policy: SpanningPolicy) {
        self.index.set_spanning_policy(policy);
    }

    // ---- Fault Handler API (§6) -------------------------------------

    #[must_use]
    pub fn check_health(&self, partition_id: PartitionId) -> PartitionStatus {
        self.detector.check_health(partition_id)
    }

    pub fn mark_healthy(&self, partition_id: PartitionId) {
        self.detector.mark_healthy(partition_id);
    }

    pub fn report_barrier_timeout(&self, partition_id: PartitionId) {
        self.detector.report_barrier_timeout(partition_id);
    }

    pub fn report_sync_failure(&self, partition_id: PartitionId) {
        self.detector.report_sync_failure(partition_id);
    }

    pub fn report_heartbeat_failure(&self, partition_id: PartitionId, node_id: NodeId) {
        self.detector.report_heartbeat_failure(partition_id, node_id);
    }

    /// Register a one-shot handler invoked with the [`RecoveryResult`] the
    /// next time [`Forest::recover`] finishes for `partition_id` (§6
    /// `register_recovery(partition_id, recovery)`).
    pub fn register_recovery(&self, partition_id: PartitionId, recovery: RecoveryHandler) {
        self.recovery_handlers.write().insert(partition_id, recovery);
    }

    pub fn subscribe_to_changes(&self, listener: Arc<dyn PartitionChangeListener>) -> SubscriptionId {
        self.detector.subscribe_to_changes(listener)
    }

    pub fn unsubscribe(&self, subscription: SubscriptionId) {
        self.detector.unsubscribe(subscription);
    }

    #[must_use]
    pub fn get_partition_view(&self, partition_id: PartitionId) -> Option<luciferase_fault::PartitionView> {
        self.detector.get_partition_view(partition_id)
    }

    #[must_use]
    pub fn get_metrics(&self, partition_id: PartitionId) -> Option<PartitionMetrics> {
        self.detector.get_metrics(partition_id)
    }

    // ---- Recovery API (§6) -------------------------------------------

    /// Drive `partition_id` through the recovery phase machine, invoking
    /// any handler registered via [`Forest::register_recovery`] with the
    /// result before returning it.
    pub fn recover(&self, partition_id: PartitionId) -> RecoveryResult {
        let result = self.orchestrator.recover(partition_id);
        if let Some(handler) = self.recovery_handlers.write().remove(&partition_id) {
            handler(&result);
        }
        result
    }

    /// Whether `partition_id` is currently eligible to attempt recovery:
    /// observed `FAILED` and quorum holds.
    #[must_use]
    pub fn can_recover(&self, partition_id: PartitionId) -> bool {
        self.detector.check_health(partition_id) == PartitionStatus::Failed && self.orchestrator.has_quorum()
    }

    #[must_use]
    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    #[must_use]
    pub fn recovery_phase(&self, partition_id: PartitionId) -> Option<RecoveryPhase> {
        self.orchestrator.phase_of(partition_id)
    }

    pub fn request_cancel(&self, partition_id: PartitionId) {
        self.orchestrator.request_cancel(partition_id);
    }
}
