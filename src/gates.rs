//! Regression gates over operational signals.
//!
//! A static acceptance check, not a scheduler: one call certifies that every
//! required operational guarantee is simultaneously enabled before a run
//! configuration is trusted. Stateless and side-effect free, suitable for a
//! CLI exit-code gate in a surrounding tool.

use serde::{Deserialize, Serialize};

/// Boolean operational signals a run configuration must hold.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RegressionGateSignals {
    pub replay_equivalent: bool,
    pub cap_enforcement_active: bool,
    pub heartbeat_policy_active: bool,
    pub trust_gating_active: bool,
    pub mutable_graph_enabled: bool,
    pub reconcile_enabled: bool,
}

impl RegressionGateSignals {
    pub fn all_enabled() -> Self {
        Self {
            replay_equivalent: true,
            cap_enforcement_active: true,
            heartbeat_policy_active: true,
            trust_gating_active: true,
            mutable_graph_enabled: true,
            reconcile_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub name: String,
    pub passed: bool,
}

impl GateResult {
    fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionGateReport {
    pub passed: bool,
    pub gates: Vec<GateResult>,
}

impl RegressionGateReport {
    pub fn failed_gates(&self) -> Vec<&GateResult> {
        self.gates.iter().filter(|g| !g.passed).collect()
    }

    pub fn summary(&self) -> String {
        if self.passed {
            format!("All {} gates passed", self.gates.len())
        } else {
            format!("{}/{} gates failed", self.failed_gates().len(), self.gates.len())
        }
    }
}

/// Evaluates every gate; overall `passed` is the AND across all of them.
pub fn evaluate_mvp_regression_gates(signals: &RegressionGateSignals) -> RegressionGateReport {
    let gates = vec![
        GateResult::new("replay_equivalent", signals.replay_equivalent),
        GateResult::new("cap_enforcement_active", signals.cap_enforcement_active),
        GateResult::new("heartbeat_policy_active", signals.heartbeat_policy_active),
        GateResult::new("trust_gating_active", signals.trust_gating_active),
        GateResult::new("mutable_graph_enabled", signals.mutable_graph_enabled),
        GateResult::new("reconcile_enabled", signals.reconcile_enabled),
    ];

    let passed = gates.iter().all(|g| g.passed);
    RegressionGateReport { passed, gates }
}
