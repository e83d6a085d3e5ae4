use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::error::{MigratorError, Result};
use crate::models::{MigrationPlan, PlanStep};

/// Load and validate a migration plan from a YAML file.
pub fn load(plan_path: &Path) -> Result<MigrationPlan> {
    if !plan_path.exists() {
        return Err(MigratorError::PlanNotFound(plan_path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(plan_path)?;
    let plan: MigrationPlan =
        serde_yaml::from_str(&contents).map_err(|e| MigratorError::InvalidPlan(e.to_string()))?;
    if let Err(errors) = validate(&plan) {
        return Err(MigratorError::InvalidPlan(errors.join("; ")));
    }
    Ok(plan)
}

/// Static plan checks, independent of the artifact set: a link step must
/// name a library some earlier step deploys, and may not link an artifact
/// into itself.
pub fn validate(plan: &MigrationPlan) -> std::result::Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if plan.artifacts_dir.is_empty() {
        errors.push("artifactsDir is required".to_string());
    }

    if plan.steps.is_empty() {
        errors.push("plan has no steps".to_string());
    }

    let mut deployed: HashSet<&str> = HashSet::new();

    for (i, step) in plan.steps.iter().enumerate() {
        match step {
            PlanStep::Deploy(spec) => {
                if spec.artifact().is_empty() {
                    errors.push(format!("step {i} deploys an unnamed artifact"));
                }
                deployed.insert(spec.artifact());
            }
            PlanStep::Link(spec) => {
                if spec.library.is_empty() || spec.into.is_empty() {
                    errors.push(format!("step {i} has an incomplete link"));
                    continue;
                }
                if spec.library == spec.into {
                    errors.push(format!("step {i} links '{}' into itself", spec.library));
                }
                if !deployed.contains(spec.library.as_str()) {
                    errors.push(format!(
                        "step {i} links '{}' before any step deploys it",
                        spec.library
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Every artifact name the plan mentions, for cross-checking against the
/// registry before a run.
pub fn referenced_artifacts(plan: &MigrationPlan) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for step in &plan.steps {
        match step {
            PlanStep::Deploy(spec) => {
                names.insert(spec.artifact().to_string());
            }
            PlanStep::Link(spec) => {
                names.insert(spec.library.clone());
                names.insert(spec.into.clone());
            }
        }
    }
    names
}
