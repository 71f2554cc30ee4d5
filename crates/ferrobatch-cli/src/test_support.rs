//! Report fixtures shared by the CLI tests

use chrono::{Local, TimeZone};
use ferrobatch_engine::FailureReport;
use ferrobatch_types::{
    Candidate, Error, ErrorDetail, NamePattern, Task, TaskResult, TaskState, TransferAction,
    TransferOutcome,
};
use std::path::PathBuf;
use std::time::Duration;

fn task(name: &str) -> Task {
    Task::new(
        name,
        TransferAction::Copy,
        format!("/data/{}/in", name),
        NamePattern::new(".*").unwrap(),
        format!("/data/{}/out", name),
    )
}

fn outcome(task: &Task, file: &str, ok: bool) -> TransferOutcome {
    let candidate = Candidate::new(task.source_folder.join(file), Local::now());
    let destination: PathBuf = task.destination_folder.join(file);
    if ok {
        TransferOutcome::success(
            candidate,
            destination,
            task.action,
            42,
            Duration::from_millis(3),
        )
    } else {
        let error = ErrorDetail::from(Error::DestinationExists {
            path: destination.clone(),
        })
        .with_source(candidate.path.clone())
        .with_action(task.action);
        TransferOutcome::failure(
            candidate,
            destination,
            task.action,
            error,
            Duration::from_millis(1),
        )
    }
}

fn done(task: Task, outcomes: Vec<TransferOutcome>) -> TaskResult {
    let now = Local::now();
    TaskResult {
        task,
        files_found: outcomes.len() as u64,
        files_selected: outcomes.len() as u64,
        outcomes,
        task_level_error: None,
        state: TaskState::Done,
        started_at: now,
        finished_at: now,
    }
}

/// Three tasks: one with a failed file, one failed scan, one clean
pub fn sample_report() -> FailureReport {
    let started = Local.with_ymd_and_hms(2025, 3, 26, 7, 5, 9).unwrap();
    let run_id = uuid::Uuid::from_u128(0x67e5_5044_10b1_426f_9247_bb68_0e5f_e0c8);
    let mut report = FailureReport::new(run_id, started);

    let reports = task("reports");
    let outcomes = vec![
        outcome(&reports, "Analyse_1.xlsx", true),
        outcome(&reports, "Analyse_2.xlsx", false),
    ];
    report.push(done(reports, outcomes));

    let archive = task("archive");
    let error = ErrorDetail::from(Error::scan(&archive.source_folder, "not a directory"));
    report.push(TaskResult::failed(archive, error, started, started));

    let clean = task("clean");
    let outcomes = vec![outcome(&clean, "a.txt", true)];
    report.push(done(clean, outcomes));

    report.finish(started + chrono::Duration::seconds(2));
    report
}

/// One clean task
pub fn clean_report() -> FailureReport {
    let started = Local.with_ymd_and_hms(2025, 3, 26, 7, 5, 9).unwrap();
    let mut report = FailureReport::new(uuid::Uuid::new_v4(), started);
    let clean = task("clean");
    let outcomes = vec![outcome(&clean, "a.txt", true)];
    report.push(done(clean, outcomes));
    report.finish(started);
    report
}
