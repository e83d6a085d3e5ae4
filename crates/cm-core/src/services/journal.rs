use std::path::PathBuf;

use crate::error::{MigratorError, Result};
use crate::models::DeploymentRecord;

/// Persists the run's deployment records as pretty-printed JSON. One run
/// owns one journal file; a later run overwrites it.
pub struct JournalStore {
    journal_path: PathBuf,
}

impl JournalStore {
    pub fn new(journal_path: impl Into<PathBuf>) -> Self {
        Self {
            journal_path: journal_path.into(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.journal_path
    }

    pub async fn load(&self) -> Result<Vec<DeploymentRecord>> {
        if !self.journal_path.exists() {
            return Ok(Vec::new());
        }
        let json = tokio::fs::read_to_string(&self.journal_path)
            .await
            .map_err(|e| MigratorError::Journal(format!("failed to read journal: {e}")))?;
        let records: Vec<DeploymentRecord> = serde_json::from_str(&json)?;
        Ok(records)
    }

    pub async fn save(&self, records: &[DeploymentRecord]) -> Result<()> {
        if let Some(parent) = self.journal_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MigratorError::Journal(format!("failed to create journal dir: {e}")))?;
        }
        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.journal_path, json)
            .await
            .map_err(|e| MigratorError::Journal(format!("failed to write journal: {e}")))?;
        Ok(())
    }
}
