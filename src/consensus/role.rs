//! Leadership state of a node
//!
//! - Leader: may accept writes and membership changes
//! - Follower: rejects both, pointing the client at the leader if known

/// Node role as seen by the consensus layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRole {
    Leader,
    Follower {
        /// Address of the current leader, if known
        leader: Option<String>,
    },
}

impl NodeRole {
    pub fn is_leader(&self) -> bool {
        matches!(self, NodeRole::Leader)
    }

    /// Leader address as seen from this node, given its own address.
    pub fn leader_address(&self, own_address: &str) -> Option<String> {
        match self {
            NodeRole::Leader => Some(own_address.to_string()),
            NodeRole::Follower { leader } => leader.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leader_reports_itself() {
        assert!(NodeRole::Leader.is_leader());
        assert_eq!(
            NodeRole::Leader.leader_address("a:1"),
            Some("a:1".to_string())
        );
    }

    #[test]
    fn test_follower_reports_hint() {
        let role = NodeRole::Follower {
            leader: Some("b:2".into()),
        };
        assert!(!role.is_leader());
        assert_eq!(role.leader_address("a:1"), Some("b:2".to_string()));
        assert_eq!(
            NodeRole::Follower { leader: None }.leader_address("a:1"),
            None
        );
    }
}
