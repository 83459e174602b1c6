use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of a provisioned node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Node is serving traffic
    Live,
    /// Node processes are stopped but the instance remains
    Stopped,
    /// Node has been removed from service and awaits cleanup
    Decommissioned,
}

impl NodeState {
    /// Check whether the node still participates in its cluster
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Stopped => write!(f, "stopped"),
            Self::Decommissioned => write!(f, "decommissioned"),
        }
    }
}

impl std::str::FromStr for NodeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(Self::Live),
            "stopped" => Ok(Self::Stopped),
            "decommissioned" => Ok(Self::Decommissioned),
            _ => Err(format!("Invalid node state: {s}")),
        }
    }
}

/// Metadata record for one node, including its cluster membership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetail {
    /// Node name, unique within a topology document
    pub node_name: String,
    /// Cluster uuids this node currently belongs to
    pub memberships: Vec<Uuid>,
    /// Zone code the node is placed in
    pub zone_code: String,
    pub state: NodeState,
}

impl NodeDetail {
    pub fn new(node_name: impl Into<String>, cluster_uuid: Uuid, zone_code: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            memberships: vec![cluster_uuid],
            zone_code: zone_code.into(),
            state: NodeState::Live,
        }
    }

    /// Check whether this node is placed in the given cluster
    pub fn is_in_cluster(&self, cluster_uuid: Uuid) -> bool {
        self.memberships.contains(&cluster_uuid)
    }
}
