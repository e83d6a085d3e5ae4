use std::collections::HashMap;
use std::path::Path;

use crate::error::{MigratorError, Result};
use crate::models::Artifact;

/// Typed registry of compiled artifacts, populated once at startup from
/// the build-output directory and consumed by value thereafter.
#[derive(Debug)]
pub struct ArtifactRegistry {
    artifacts: HashMap<String, Artifact>,
}

impl ArtifactRegistry {
    /// Load every `*.json` build output under `dir`. Duplicate contract
    /// names across files are an error.
    pub async fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(MigratorError::ArtifactStore(format!(
                "artifacts directory not found at {}",
                dir.display()
            )));
        }

        let mut artifacts = HashMap::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| MigratorError::ArtifactStore(format!("reading artifacts dir: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MigratorError::ArtifactStore(format!("reading artifacts entry: {e}")))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| {
                    MigratorError::ArtifactStore(format!("reading {}: {e}", path.display()))
                })?;
            let artifact: Artifact = serde_json::from_str(&content).map_err(|e| {
                MigratorError::ArtifactStore(format!("parsing {}: {e}", path.display()))
            })?;

            if let Some(previous) = artifacts.insert(artifact.name.clone(), artifact) {
                return Err(MigratorError::ArtifactStore(format!(
                    "duplicate artifact '{}' in {}",
                    previous.name,
                    dir.display()
                )));
            }
        }

        Ok(Self { artifacts })
    }

    /// Build a registry directly from artifacts (programmatic plans, tests).
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        Self {
            artifacts: artifacts
                .into_iter()
                .map(|a| (a.name.clone(), a))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.artifacts.contains_key(name)
    }

    /// Sorted artifact names, for listings and error messages.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.artifacts.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn into_artifacts(self) -> HashMap<String, Artifact> {
        self.artifacts
    }
}
