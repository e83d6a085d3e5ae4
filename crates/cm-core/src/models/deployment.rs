use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The on-chain address assigned to an artifact once its creation
/// transaction confirmed. Produced by the backend, consumed by later
/// link steps. Re-running a plan produces fresh records at fresh
/// addresses; deployment is not content-addressed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub artifact: String,
    pub address: String,
    pub tx_hash: String,
    pub block_number: u64,
    pub deployed_at: DateTime<Utc>,
}

impl DeploymentRecord {
    pub fn new(
        artifact: impl Into<String>,
        address: impl Into<String>,
        tx_hash: impl Into<String>,
        block_number: u64,
    ) -> Self {
        Self {
            artifact: artifact.into(),
            address: address.into(),
            tx_hash: tx_hash.into(),
            block_number,
            deployed_at: Utc::now(),
        }
    }
}
