use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role a cluster plays within its universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterRole {
    /// Primary data-bearing cluster
    Primary,
    /// Asynchronously replicated read-only cluster
    ReadReplica,
}

impl fmt::Display for ClusterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::ReadReplica => write!(f, "read_replica"),
        }
    }
}

impl std::str::FromStr for ClusterRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "read_replica" => Ok(Self::ReadReplica),
            _ => Err(format!("Invalid cluster role: {s}")),
        }
    }
}

/// Desired placement for a cluster's nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    /// Cloud provider code, e.g. "aws"
    pub provider_code: String,
    /// Region codes the cluster spans
    pub region_codes: Vec<String>,
    /// Zone codes nodes may be placed in
    pub zone_codes: Vec<String>,
    /// Number of data copies
    pub replication_factor: u32,
    /// Desired node count
    pub num_nodes: u32,
}

/// A logical grouping of nodes within a universe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_uuid: Uuid,
    pub role: ClusterRole,
    pub placement: PlacementSpec,
}

impl Cluster {
    pub fn new(cluster_uuid: Uuid, role: ClusterRole, placement: PlacementSpec) -> Self {
        Self {
            cluster_uuid,
            role,
            placement,
        }
    }

    /// Check whether this cluster serves reads only
    pub fn is_read_replica(&self) -> bool {
        self.role == ClusterRole::ReadReplica
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_string_conversion() {
        assert_eq!(ClusterRole::Primary.to_string(), "primary");
        assert_eq!(
            "read_replica".parse::<ClusterRole>().unwrap(),
            ClusterRole::ReadReplica
        );
        assert!("replica".parse::<ClusterRole>().is_err());
    }

    #[test]
    fn test_role_serde() {
        let role = ClusterRole::ReadReplica;
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, "\"read_replica\"");

        let parsed: ClusterRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, role);
    }
}
