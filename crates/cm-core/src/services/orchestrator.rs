use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;

use crate::error::{DeployError, LinkError, MigratorError, Result};
use crate::models::{
    Artifact, DeploymentRecord, DeploySpec, LinkSpec, MigrationPlan, MigrationReport, PlanStep,
    StepReport, StepStatus,
};
use crate::services::backend::Backend;
use crate::services::journal::JournalStore;
use crate::services::{artifact_store::ArtifactRegistry, linker, plan_loader};

/// Executes a migration plan strictly in order against a deployment
/// backend, one session per run.
///
/// The orchestrator owns working copies of the artifacts (link steps
/// rewrite their bytecode in place) and the deployment records produced
/// so far; later steps consume records produced by earlier ones. The
/// first failed step aborts the run and the remaining steps never reach
/// the backend.
pub struct Orchestrator<B: Backend> {
    backend: B,
    artifacts: HashMap<String, Artifact>,
    records: HashMap<String, DeploymentRecord>,
    journal: Option<JournalStore>,
    step_timeout: Option<Duration>,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(backend: B, registry: ArtifactRegistry) -> Self {
        Self {
            backend,
            artifacts: registry.into_artifacts(),
            records: HashMap::new(),
            journal: None,
            step_timeout: None,
        }
    }

    /// Persist deployment records to `store` as they are produced.
    pub fn with_journal(mut self, store: JournalStore) -> Self {
        self.journal = Some(store);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The deployment record for `artifact`, if this session deployed it.
    pub fn record(&self, artifact: &str) -> Option<&DeploymentRecord> {
        self.records.get(artifact)
    }

    /// Run the plan to completion or first failure.
    pub async fn run(&mut self, plan: &MigrationPlan) -> Result<MigrationReport> {
        if let Err(errors) = plan_loader::validate(plan) {
            return Err(MigratorError::InvalidPlan(errors.join("; ")));
        }

        self.step_timeout = plan.step_timeout_secs.map(Duration::from_secs);

        let started_at = Utc::now();
        let mut steps = Vec::with_capacity(plan.steps.len());
        let mut aborted = false;

        for (index, step) in plan.steps.iter().enumerate() {
            if aborted {
                steps.push(StepReport {
                    index,
                    description: step.to_string(),
                    status: StepStatus::Skipped,
                    error: None,
                    address: None,
                });
                continue;
            }

            tracing::info!(index, step = %step, "step_submitted");
            match self.execute(step).await {
                Ok(address) => {
                    tracing::info!(index, step = %step, "step_confirmed");
                    steps.push(StepReport {
                        index,
                        description: step.to_string(),
                        status: StepStatus::Confirmed,
                        error: None,
                        address,
                    });
                }
                Err(e) => {
                    tracing::error!(index, step = %step, error = %e, "step_failed");
                    steps.push(StepReport {
                        index,
                        description: step.to_string(),
                        status: StepStatus::Failed,
                        error: Some(e.to_string()),
                        address: None,
                    });
                    aborted = true;
                }
            }
        }

        let mut records: Vec<DeploymentRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.block_number.cmp(&b.block_number));

        Ok(MigrationReport {
            started_at,
            finished_at: Utc::now(),
            steps,
            records,
        })
    }

    async fn execute(&mut self, step: &PlanStep) -> Result<Option<String>> {
        match step {
            PlanStep::Deploy(spec) => {
                let record = self.deploy(spec).await?;
                Ok(Some(record.address))
            }
            PlanStep::Link(spec) => {
                self.link(spec)?;
                Ok(None)
            }
        }
    }

    /// Submit a contract-creation transaction for the artifact and record
    /// the resulting address. Refuses bytecode that still carries
    /// unresolved library placeholders.
    pub async fn deploy(&mut self, spec: &DeploySpec) -> Result<DeploymentRecord> {
        let name = spec.artifact();
        let artifact = self
            .artifacts
            .get(name)
            .ok_or_else(|| DeployError::ArtifactNotFound(name.to_string()))?;

        if !artifact.is_fully_linked() {
            return Err(DeployError::UnlinkedBytecode {
                artifact: name.to_string(),
                placeholders: linker::unresolved(&artifact.bytecode).join(", "),
            }
            .into());
        }

        let bytecode = artifact.bytecode.clone();
        let submission = self.backend.deploy_contract(&bytecode, spec.args());

        let result = match self.step_timeout {
            Some(limit) => match tokio::time::timeout(limit, submission).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(DeployError::Timeout {
                        artifact: name.to_string(),
                        secs: limit.as_secs(),
                    }
                    .into())
                }
            },
            None => submission.await,
        };

        let outcome = result.map_err(|e| DeployError::Rejected {
            artifact: name.to_string(),
            reason: e.to_string(),
        })?;

        let record = DeploymentRecord::new(name, outcome.address, outcome.tx_hash, outcome.block_number);
        self.records.insert(name.to_string(), record.clone());
        self.persist().await?;

        Ok(record)
    }

    /// Rewrite the dependent artifact's working bytecode, substituting the
    /// library's deployed address for its placeholder. The library must
    /// already have a deployment record from this session.
    pub fn link(&mut self, spec: &LinkSpec) -> Result<()> {
        let address = self
            .records
            .get(&spec.library)
            .ok_or_else(|| LinkError::LibraryNotDeployed {
                library: spec.library.clone(),
                dependent: spec.into.clone(),
            })?
            .address
            .clone();

        let dependent = self
            .artifacts
            .get_mut(&spec.into)
            .ok_or_else(|| LinkError::ArtifactNotFound(spec.into.clone()))?;

        dependent.bytecode = linker::link_into(dependent, &spec.library, &address)?;
        Ok(())
    }

    /// Write all records produced so far to the journal, if one is set.
    async fn persist(&self) -> Result<()> {
        if let Some(journal) = &self.journal {
            let mut records: Vec<DeploymentRecord> = self.records.values().cloned().collect();
            records.sort_by(|a, b| a.block_number.cmp(&b.block_number));
            journal.save(&records).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::{BackendError, DeployOutcome};
    use crate::services::ledger::DevLedger;

    fn linked(name: &str) -> Artifact {
        Artifact::new(name, "0x6080604052600a600b")
    }

    fn registry(artifacts: Vec<Artifact>) -> ArtifactRegistry {
        ArtifactRegistry::from_artifacts(artifacts)
    }

    fn deploy(name: &str) -> PlanStep {
        PlanStep::Deploy(DeploySpec::Name(name.to_string()))
    }

    fn plan(steps: Vec<PlanStep>) -> MigrationPlan {
        MigrationPlan {
            artifacts_dir: "build".into(),
            step_timeout_secs: None,
            steps,
        }
    }

    #[tokio::test]
    async fn link_without_deployment_record_fails() {
        let artifacts = vec![
            linked("mathlib"),
            Artifact::new(
                "consumer",
                format!("0x6080{}", Artifact::placeholder("mathlib")),
            ),
        ];
        let mut orchestrator = Orchestrator::new(DevLedger::new(), registry(artifacts));

        let err = orchestrator
            .link(&LinkSpec {
                library: "mathlib".into(),
                into: "consumer".into(),
            })
            .unwrap_err();

        assert!(matches!(
            err,
            MigratorError::Link(LinkError::LibraryNotDeployed { .. })
        ));
    }

    #[tokio::test]
    async fn failed_step_skips_the_rest() {
        // Funds for roughly one deployment, then the well runs dry.
        let ledger = DevLedger::with_balance(25_000);
        let artifacts = vec![linked("a"), linked("b"), linked("c")];
        let mut orchestrator = Orchestrator::new(ledger, registry(artifacts));

        let report = orchestrator
            .run(&plan(vec![deploy("a"), deploy("b"), deploy("c")]))
            .await
            .unwrap();

        assert_eq!(report.steps[0].status, StepStatus::Confirmed);
        assert_eq!(report.steps[1].status, StepStatus::Failed);
        assert_eq!(report.steps[2].status, StepStatus::Skipped);
        assert!(report.steps[1]
            .error
            .as_deref()
            .unwrap()
            .contains("insufficient funds"));
        assert!(!report.succeeded());

        // The backend saw exactly one creation transaction.
        assert_eq!(orchestrator.backend().deployed_count(), 1);
        assert_eq!(report.records.len(), 1);
    }

    #[tokio::test]
    async fn deploying_unlinked_bytecode_is_refused() {
        let artifacts = vec![Artifact::new(
            "consumer",
            format!("0x6080{}", Artifact::placeholder("mathlib")),
        )];
        let mut orchestrator = Orchestrator::new(DevLedger::new(), registry(artifacts));

        let report = orchestrator
            .run(&plan(vec![deploy("consumer")]))
            .await
            .unwrap();

        assert_eq!(report.steps[0].status, StepStatus::Failed);
        let error = report.steps[0].error.as_deref().unwrap();
        assert!(error.contains("unlinked"));
        assert!(error.contains("mathlib"));
        assert_eq!(orchestrator.backend().deployed_count(), 0);
    }

    #[tokio::test]
    async fn unknown_artifact_fails_the_step() {
        let mut orchestrator = Orchestrator::new(DevLedger::new(), registry(vec![]));
        let report = orchestrator.run(&plan(vec![deploy("ghost")])).await.unwrap();
        assert_eq!(report.steps[0].status, StepStatus::Failed);
        assert!(report.steps[0]
            .error
            .as_deref()
            .unwrap()
            .contains("'ghost' not found"));
    }

    #[tokio::test]
    async fn invalid_plan_is_rejected_before_any_step() {
        let mut orchestrator = Orchestrator::new(DevLedger::new(), registry(vec![linked("a")]));
        let bad = plan(vec![PlanStep::Link(LinkSpec {
            library: "a".into(),
            into: "b".into(),
        })]);

        let err = orchestrator.run(&bad).await.unwrap_err();
        assert!(matches!(err, MigratorError::InvalidPlan(_)));
        assert_eq!(orchestrator.backend().deployed_count(), 0);
    }

    /// Backend that never confirms; used to exercise the per-step deadline.
    struct StalledBackend;

    impl Backend for StalledBackend {
        async fn deploy_contract(
            &self,
            _bytecode: &str,
            _constructor_args: &[serde_json::Value],
        ) -> std::result::Result<DeployOutcome, BackendError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(BackendError("unreachable".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn step_timeout_fails_the_step() {
        let mut orchestrator = Orchestrator::new(StalledBackend, registry(vec![linked("a")]));
        let mut timed_plan = plan(vec![deploy("a")]);
        timed_plan.step_timeout_secs = Some(30);

        let report = orchestrator.run(&timed_plan).await.unwrap();
        assert_eq!(report.steps[0].status, StepStatus::Failed);
        assert!(report.steps[0]
            .error
            .as_deref()
            .unwrap()
            .contains("timed out after 30s"));
    }
}
