//! Per-node, per-zone and batch setup outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{zone_debug, NodeRole};
use uuid::Uuid;

use crate::error::{NodeFailure, SetupError, SetupResult};

/// Progress of one zone through setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneState {
    Idle,
    DatabaseConfigured,
    ProviderConfigured,
    ConsumersDispatched,
    Ready,
    Failed,
}

impl ZoneState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ZoneState::Ready | ZoneState::Failed)
    }
}

/// Result of setting up a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupOutcome {
    Succeeded,
    Failed(NodeFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOutcome {
    pub node: String,
    pub role: NodeRole,
    pub outcome: SetupOutcome,
}

impl NodeOutcome {
    pub fn succeeded(node: impl Into<String>, role: NodeRole) -> Self {
        Self {
            node: node.into(),
            role,
            outcome: SetupOutcome::Succeeded,
        }
    }

    pub fn failed(role: NodeRole, failure: NodeFailure) -> Self {
        Self {
            node: failure.node.clone(),
            role,
            outcome: SetupOutcome::Failed(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SetupOutcome::Succeeded)
    }

    pub fn failure(&self) -> Option<&NodeFailure> {
        match &self.outcome {
            SetupOutcome::Failed(failure) => Some(failure),
            SetupOutcome::Succeeded => None,
        }
    }
}

/// Everything that happened to one zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneReport {
    pub zone: String,
    pub state: ZoneState,
    pub nodes: Vec<NodeOutcome>,
}

impl ZoneReport {
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            state: ZoneState::Idle,
            nodes: Vec::new(),
        }
    }

    pub fn transition(&mut self, next: ZoneState) {
        zone_debug!(self.zone, "zone state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub fn record(&mut self, outcome: NodeOutcome) {
        self.nodes.push(outcome);
    }

    /// Record a failure and mark the zone failed
    pub fn fail(&mut self, role: NodeRole, failure: NodeFailure) {
        self.record(NodeOutcome::failed(role, failure));
        self.transition(ZoneState::Failed);
    }

    pub fn is_ready(&self) -> bool {
        self.state == ZoneState::Ready
    }

    pub fn failures(&self) -> impl Iterator<Item = &NodeFailure> {
        self.nodes.iter().filter_map(NodeOutcome::failure)
    }

    /// Convert into a result that names every failed node
    pub fn into_result(self) -> SetupResult<ZoneReport> {
        if self.is_ready() {
            return Ok(self);
        }
        let failures: Vec<NodeFailure> = self.failures().cloned().collect();
        Err(SetupError::AggregateSetupFailed { failures })
    }
}

/// Outcome of setting up several zones together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub zones: Vec<ZoneReport>,
    /// True iff every zone is ready
    pub success: bool,
    pub completed_at: DateTime<Utc>,
}

impl BatchOutcome {
    pub fn from_zones(run_id: Uuid, zones: Vec<ZoneReport>) -> Self {
        let success = zones.iter().all(ZoneReport::is_ready);
        Self {
            run_id,
            zones,
            success,
            completed_at: Utc::now(),
        }
    }

    pub fn failures(&self) -> Vec<NodeFailure> {
        self.zones.iter().flat_map(|z| z.failures().cloned()).collect()
    }

    pub fn failed_zones(&self) -> Vec<&str> {
        self.zones
            .iter()
            .filter(|z| !z.is_ready())
            .map(|z| z.zone.as_str())
            .collect()
    }

    pub fn into_result(self) -> SetupResult<BatchOutcome> {
        if self.success {
            return Ok(self);
        }
        Err(SetupError::AggregateSetupFailed {
            failures: self.failures(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetupPhase;

    fn failure(zone: &str, node: &str) -> NodeFailure {
        NodeFailure {
            zone: zone.to_string(),
            node: node.to_string(),
            phase: SetupPhase::RunSetupScript,
            exit_status: Some(1),
            reason: "setup script exited with 1".to_string(),
        }
    }

    #[test]
    fn test_batch_success_requires_every_zone_ready() {
        let mut ready = ZoneReport::new("a");
        ready.record(NodeOutcome::succeeded("csp_1", NodeRole::CatalogProvider));
        ready.transition(ZoneState::Ready);

        let mut failed = ZoneReport::new("b");
        failed.fail(NodeRole::CatalogConsumer, failure("b", "csc_3"));

        let batch = BatchOutcome::from_zones(Uuid::new_v4(), vec![ready.clone(), failed]);
        assert!(!batch.success);
        assert_eq!(batch.failed_zones(), vec!["b"]);

        let err = batch.into_result().unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].node, "csc_3");

        let all_ready = BatchOutcome::from_zones(Uuid::new_v4(), vec![ready]);
        assert!(all_ready.success);
        assert!(all_ready.into_result().is_ok());
    }

    #[test]
    fn test_zone_report_collects_every_failure() {
        let mut report = ZoneReport::new("a");
        report.record(NodeOutcome::failed(NodeRole::CatalogConsumer, failure("a", "csc_1")));
        report.record(NodeOutcome::succeeded("csc_2", NodeRole::CatalogConsumer));
        report.record(NodeOutcome::failed(NodeRole::CatalogConsumer, failure("a", "csc_3")));
        report.transition(ZoneState::Failed);

        let names: Vec<_> = report.failures().map(|f| f.node.as_str()).collect();
        assert_eq!(names, vec!["csc_1", "csc_3"]);
        assert!(ZoneState::Failed.is_terminal());
        assert!(!ZoneState::ConsumersDispatched.is_terminal());
    }

    #[test]
    fn test_batch_outcome_serializes() {
        let batch = BatchOutcome::from_zones(Uuid::new_v4(), vec![ZoneReport::new("a")]);
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["zones"][0]["state"], "Idle");
        assert_eq!(json["success"], false);
    }
}
