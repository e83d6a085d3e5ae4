use std::fmt;

use serde::{Deserialize, Serialize};

/// A declarative migration plan: where the build outputs live and the
/// ordered deploy/link steps to run against the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub artifacts_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_timeout_secs: Option<u64>,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanStep {
    Deploy(DeploySpec),
    Link(LinkSpec),
}

/// A deploy step. YAML accepts the shorthand `- deploy: name` or the
/// full mapping with constructor args.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeploySpec {
    Name(String),
    Detailed {
        artifact: String,
        #[serde(default)]
        args: Vec<serde_json::Value>,
    },
}

impl DeploySpec {
    pub fn artifact(&self) -> &str {
        match self {
            DeploySpec::Name(name) => name,
            DeploySpec::Detailed { artifact, .. } => artifact,
        }
    }

    pub fn args(&self) -> &[serde_json::Value] {
        match self {
            DeploySpec::Name(_) => &[],
            DeploySpec::Detailed { args, .. } => args,
        }
    }
}

/// A link step: substitute `library`'s deployed address for its
/// placeholder in `into`'s bytecode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSpec {
    pub library: String,
    pub into: String,
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStep::Deploy(spec) => write!(f, "deploy {}", spec.artifact()),
            PlanStep::Link(spec) => write!(f, "link {} -> {}", spec.library, spec.into),
        }
    }
}

/// Lifecycle of a single step within a run. Steps after a failed step
/// are marked skipped and never reach the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    Pending,
    Submitted,
    Confirmed,
    Failed,
    Skipped,
}
