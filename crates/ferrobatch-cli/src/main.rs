//! ferrobatch - scheduled batch transfer of recent files
//!
//! Reads a list of copy/move tasks, selects files by name and creation date,
//! transfers them, and reports every failure without stopping the batch.

mod display;
mod json_output;
mod notify;
mod progress;
mod sink;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use ferrobatch_config::{NotificationPolicy, ReportFormat, Settings, TaskFileLoader};
use ferrobatch_engine::BatchOrchestrator;
use ferrobatch_types::TaskConcurrency;
use notify::{notify_if_needed, ConsoleNotifier};
use progress::BatchProgress;
use sink::LogSink;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// Exit code when every task and file succeeded
const EXIT_SUCCESS: u8 = 0;
/// Exit code when any task or file failed
const EXIT_FAILURES: u8 = 1;
/// Exit code when configuration was rejected and nothing ran
const EXIT_CONFIG: u8 = 2;

/// ferrobatch - scheduled batch transfer of recent files
#[derive(Parser)]
#[command(
    name = "ferrobatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Copy or move recent files in batches",
    long_about = "ferrobatch runs a list of copy/move tasks. Each task scans a source folder,\n\
                  keeps files whose name matches a regular expression and whose creation date\n\
                  falls inside an age window, and transfers them into a destination folder."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every task in a task file
    Run {
        /// Task file (JSON, YAML or TOML)
        #[arg(short, long)]
        tasks: PathBuf,
        /// Number of tasks run at the same time
        #[arg(short = 'j', long)]
        max_concurrent: Option<usize>,
        /// Folder for log files and reports
        #[arg(long)]
        log_dir: Option<PathBuf>,
        /// Report format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// When to notify
        #[arg(long, value_enum)]
        notify: Option<NotifyArg>,
        /// Write successful entries to the report too
        #[arg(long)]
        all_entries: bool,
    },
    /// Check a task file without running it
    Validate {
        /// Task file (JSON, YAML or TOML)
        #[arg(short, long)]
        tasks: PathBuf,
    },
    /// Show settings
    Settings {
        /// Show default settings
        #[arg(long)]
        default: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum NotifyArg {
    Always,
    OnFailure,
    Never,
}

impl From<NotifyArg> for NotificationPolicy {
    fn from(policy: NotifyArg) -> Self {
        match policy {
            NotifyArg::Always => NotificationPolicy::Always,
            NotifyArg::OnFailure => NotificationPolicy::OnFailure,
            NotifyArg::Never => NotificationPolicy::Never,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(code) => code,
        Err(error) => {
            error!("{:#}", error);
            eprintln!("{} {:#}", style("✗").red().bold(), error);
            ExitCode::from(EXIT_FAILURES)
        }
    }
}

async fn execute(cli: Cli) -> Result<ExitCode> {
    let console_level = console_level(cli.debug, cli.quiet, cli.verbose);

    if let Commands::Settings { default: true } = cli.command {
        print!("{}", serde_yaml::to_string(&Settings::default())?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(error) => {
            display::print_config_error(&error);
            return Ok(ExitCode::from(EXIT_CONFIG));
        }
    };

    match cli.command {
        Commands::Run {
            tasks,
            max_concurrent,
            log_dir,
            format,
            notify,
            all_entries,
        } => {
            if let Some(max_concurrent) = max_concurrent {
                match TaskConcurrency::new(max_concurrent) {
                    Ok(value) => settings.execution.max_concurrent_tasks = value,
                    Err(error) => {
                        eprintln!("{} {}", style("✗").red().bold(), error);
                        return Ok(ExitCode::from(EXIT_CONFIG));
                    }
                }
            }
            if log_dir.is_some() {
                settings.logging.directory = log_dir;
            }
            if let Some(format) = format {
                settings.logging.report_format = format.into();
            }
            if let Some(notify) = notify {
                settings.notification.policy = notify.into();
            }
            if all_entries {
                settings.logging.failures_only = false;
            }

            let _guard = init_logging(
                console_level,
                settings
                    .logging
                    .directory
                    .as_deref()
                    .map(|dir| (dir, settings.logging.level.as_str())),
            )?;
            run_command(&tasks, &settings, cli.quiet).await
        }
        Commands::Validate { tasks } => {
            let _guard = init_logging(console_level, None)?;
            Ok(ExitCode::from(validate_command(&tasks, cli.quiet)))
        }
        Commands::Settings { .. } => {
            print!("{}", serde_yaml::to_string(&settings)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn console_level(debug: bool, quiet: bool, verbose: bool) -> &'static str {
    if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Console logging, plus a daily log file when a directory is given
fn init_logging(console_level: &str, file: Option<(&Path, &str)>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

    let console_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(console_level))?;
    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file_layer, guard) = match file {
        Some((directory, level)) => {
            std::fs::create_dir_all(directory).with_context(|| {
                format!("Failed to create log directory {}", directory.display())
            })?;
            let appender = tracing_appender::rolling::daily(directory, "ferrobatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let level: LevelFilter = level.parse().context("Invalid log level")?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(level);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn run_command(tasks_path: &Path, settings: &Settings, quiet: bool) -> Result<ExitCode> {
    let tasks = match TaskFileLoader::new().load(tasks_path) {
        Ok(tasks) => tasks,
        Err(error) => {
            error!("Task file {} rejected: {}", tasks_path.display(), error);
            display::print_config_error(&error);
            return Ok(ExitCode::from(EXIT_CONFIG));
        }
    };
    info!("Loaded {} task(s) from {}", tasks.len(), tasks_path.display());

    if !quiet {
        println!(
            "{} Running {} task(s) from {}",
            style("→").green().bold(),
            tasks.len(),
            style(tasks_path.display()).cyan()
        );
    }

    let progress = Arc::new(BatchProgress::new(tasks.len(), quiet));
    let orchestrator = BatchOrchestrator::builder()
        .with_max_concurrent(settings.execution.max_concurrent_tasks)
        .with_age_policy(settings.execution.age_policy)
        .with_reporter(progress.clone())
        .build();

    let report = orchestrator.run_all(&tasks).await;
    progress.finish();

    if !quiet {
        display::print_report(&report);
    }

    let mut code = if report.has_failures() {
        ExitCode::from(EXIT_FAILURES)
    } else {
        ExitCode::SUCCESS
    };

    if let Some(sink) = LogSink::from_settings(&settings.logging) {
        match sink.write(&report) {
            Ok(Some(path)) if !quiet => {
                println!("  Report: {}", style(path.display()).cyan());
            }
            Ok(_) => {}
            Err(error) => {
                error!("{:#}", error);
                eprintln!("{} {:#}", style("✗").red().bold(), error);
                code = ExitCode::from(EXIT_FAILURES);
            }
        }
    }

    if let Err(error) = notify_if_needed(&ConsoleNotifier, settings.notification.policy, &report) {
        warn!("Notification failed: {:#}", error);
    }

    Ok(code)
}

fn validate_command(tasks_path: &Path, quiet: bool) -> u8 {
    match TaskFileLoader::new().load(tasks_path) {
        Ok(tasks) => {
            if !quiet {
                println!(
                    "{} {} task(s) valid",
                    style("✓").green().bold(),
                    tasks.len()
                );
                for task in &tasks {
                    println!("    • {}", task);
                }
            }
            EXIT_SUCCESS
        }
        Err(error) => {
            display::print_config_error(&error);
            EXIT_CONFIG
        }
    }
}
