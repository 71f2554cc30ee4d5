//! Console rendering for ferrobatch

use console::style;
use ferrobatch_config::ConfigError;
use ferrobatch_engine::FailureReport;
use ferrobatch_types::TaskState;
use std::time::Duration;

/// Print one line per task followed by run totals
pub fn print_report(report: &FailureReport) {
    println!();
    println!("{}", style("Batch Summary:").bold().underlined());

    for result in &report.results {
        let marker = if result.has_failures() {
            style("✗").red().bold()
        } else {
            style("✓").green().bold()
        };
        let detail = match (&result.state, &result.task_level_error) {
            (TaskState::Failed, Some(error)) => style(error.message.clone()).red().to_string(),
            _ => format!(
                "{} found, {} selected, {} transferred, {} failed",
                result.files_found,
                result.files_selected,
                result.succeeded_count(),
                result.failed_count()
            ),
        };
        println!("  {} {}: {}", marker, style(&result.task.name).cyan(), detail);

        for outcome in result.failed_outcomes() {
            if let Some(error) = &outcome.error {
                println!("      {} {}", style("→").dim(), style(error).dim());
            }
        }
    }

    let summary = report.summary();
    let elapsed = report
        .finished_at
        .and_then(|finished| (finished - report.started_at).to_std().ok())
        .unwrap_or_default();

    println!();
    println!("  Tasks: {}", style(summary.tasks).green());
    println!(
        "  Files transferred: {}",
        style(summary.files_transferred).green()
    );
    println!(
        "  Files failed: {}",
        if summary.files_failed > 0 {
            style(summary.files_failed).red()
        } else {
            style(summary.files_failed).green()
        }
    );
    println!(
        "  Tasks failed: {}",
        if summary.failed_tasks > 0 {
            style(summary.failed_tasks).red()
        } else {
            style(summary.failed_tasks).green()
        }
    );
    println!(
        "  Bytes transferred: {}",
        style(format_bytes(summary.bytes_transferred)).green()
    );
    println!("  Duration: {}", style(format_duration(elapsed)).blue());
}

/// Print a configuration error, one violation per line
pub fn print_config_error(error: &ConfigError) {
    let violations = error.violations();
    if violations.is_empty() {
        eprintln!("{} {}", style("✗").red().bold(), error);
        return;
    }

    eprintln!(
        "{} {} configuration violation(s):",
        style("✗").red().bold(),
        violations.len()
    );
    for violation in violations {
        eprintln!("    • {}", violation);
    }
}

/// Format a byte count with a binary unit
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format a duration for humans
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
