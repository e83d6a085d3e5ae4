use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deployment::DeploymentRecord;
use super::plan::StepStatus;

/// Outcome of a single plan step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub index: usize,
    pub description: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Outcome of a whole migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    pub records: Vec<DeploymentRecord>,
}

impl MigrationReport {
    /// True when every step confirmed.
    pub fn succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|s| s.status == StepStatus::Confirmed)
    }

    /// The first failed step, if any.
    pub fn failure(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }
}
