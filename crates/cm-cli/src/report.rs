use cm_core::models::{MigrationReport, StepStatus};

/// Render the run report as a plain text table.
pub fn render(report: &MigrationReport) -> String {
    let width = report
        .steps
        .iter()
        .map(|s| s.description.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for step in &report.steps {
        out.push_str(&format!(
            "{:>3}  {:<width$}  {:<9}",
            step.index + 1,
            step.description,
            status_label(&step.status),
        ));
        if let Some(address) = &step.address {
            out.push_str(&format!("  {address}"));
        }
        if let Some(error) = &step.error {
            out.push_str(&format!("  {error}"));
        }
        // Trailing spaces from the status column padding
        while out.ends_with(' ') {
            out.pop();
        }
        out.push('\n');
    }

    let failed = count(report, StepStatus::Failed);
    let skipped = count(report, StepStatus::Skipped);
    out.push_str(&format!(
        "\n{} deployed, {failed} failed, {skipped} skipped\n",
        report.records.len()
    ));
    out
}

fn count(report: &MigrationReport, status: StepStatus) -> usize {
    report.steps.iter().filter(|s| s.status == status).count()
}

fn status_label(status: &StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "pending",
        StepStatus::Submitted => "submitted",
        StepStatus::Confirmed => "confirmed",
        StepStatus::Failed => "FAILED",
        StepStatus::Skipped => "skipped",
    }
}
