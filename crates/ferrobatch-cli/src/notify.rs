//! Operator notification after a run

use anyhow::Result;
use console::{style, Term};
use ferrobatch_config::NotificationPolicy;
use ferrobatch_engine::FailureReport;
use tracing::debug;

/// Something that can alert an operator about a finished run
pub trait Notifier {
    /// Deliver the notification for `report`
    fn notify(&self, report: &FailureReport) -> Result<()>;
}

/// Notifier printing a styled alert to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, report: &FailureReport) -> Result<()> {
        let term = Term::stderr();
        let headline = if report.has_failures() {
            style("⚠ ferrobatch run finished with failures").red().bold()
        } else {
            style("✓ ferrobatch run finished").green().bold()
        };
        term.write_line(&headline.to_string())?;
        for line in alert_lines(report) {
            term.write_line(&format!("  {}", line))?;
        }
        Ok(())
    }
}

/// Body lines of an alert, one per failure after the totals
pub fn alert_lines(report: &FailureReport) -> Vec<String> {
    let mut lines = vec![format!("run {}: {}", report.run_id, report.summary())];
    lines.extend(report.failures().map(|failure| failure.to_string()));
    lines
}

/// Run `notifier` if `policy` asks for it, returning whether it ran
pub fn notify_if_needed(
    notifier: &dyn Notifier,
    policy: NotificationPolicy,
    report: &FailureReport,
) -> Result<bool> {
    if !policy.should_notify(report.has_failures()) {
        debug!("Notification skipped by policy {:?}", policy);
        return Ok(false);
    }
    notifier.notify(report)?;
    Ok(true)
}
