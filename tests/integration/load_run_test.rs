// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use loadrs::api::client::IngestClient;
use loadrs::dispatch::distributor::{distribute, scan_input};
use loadrs::domain::models::profile::{
    LoadProfile, Model, OcrStrategy, SegmentationStrategy, TestType,
};
use loadrs::domain::models::report::{AggregateReport, WorkerReport};
use loadrs::reporting::{ProgressLog, RunFolder, RunSnapshot, ThroughputMonitor};
use loadrs::workers::load_worker::WorkerEvent;
use loadrs::workers::manager::WorkerManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::helpers::{start_mock_api, MockApiState};

struct Harness {
    _dir: tempfile::TempDir,
    input_dir: std::path::PathBuf,
    run: Arc<RunFolder>,
    monitor: Arc<ThroughputMonitor>,
    state: MockApiState,
    manager: WorkerManager<IngestClient>,
}

/// 搭建一次进程内端到端运行
///
/// 输入文件写入临时目录，运行目录建在同一临时根下
async fn harness(files: &[(&str, usize)], api_url: &str, state: MockApiState) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("input");
    std::fs::create_dir_all(&input_dir).unwrap();
    for (name, size) in files {
        std::fs::write(input_dir.join(name), vec![b'x'; *size]).unwrap();
    }

    let run = Arc::new(RunFolder::create(&dir.path().join("output")).await.unwrap());
    let monitor = Arc::new(
        ThroughputMonitor::create(run.path(), Duration::from_secs(1))
            .await
            .unwrap(),
    );
    let client = Arc::new(
        IngestClient::new(api_url, "integration-key".to_string(), Duration::from_secs(5))
            .unwrap(),
    );
    let progress = Arc::new(ProgressLog::new(run.path().to_path_buf()));
    let manager = WorkerManager::new(
        client,
        run.clone(),
        progress,
        input_dir.clone(),
        4,
        Duration::from_millis(10),
    );

    Harness {
        _dir: dir,
        input_dir,
        run,
        monitor,
        state,
        manager,
    }
}

async fn run_to_completion(
    harness: &Harness,
    profiles: &[LoadProfile],
    max_files: usize,
) -> Vec<WorkerReport> {
    let files = scan_input(&harness.input_dir).await.unwrap();
    let assignments = distribute(&files, profiles, max_files);

    let (events, mut event_rx) = mpsc::unbounded_channel();
    let drain = {
        let monitor = harness.monitor.clone();
        tokio::spawn(async move {
            while let Some(WorkerEvent::PagesProcessed(pages)) = event_rx.recv().await {
                monitor.add_pages(pages as u64);
            }
        })
    };

    let reports = harness.manager.run(assignments, events).await.unwrap();
    drain.await.unwrap();
    harness.monitor.finalize().await.unwrap();
    reports
}

fn profile(
    ocr_strategy: OcrStrategy,
    test_type: TestType,
    percentage: u32,
    workers: usize,
) -> LoadProfile {
    LoadProfile {
        model: Model::HighQuality,
        ocr_strategy,
        segmentation_strategy: SegmentationStrategy::LayoutAnalysis,
        test_type,
        percentage,
        workers,
    }
}

#[tokio::test]
async fn test_end_to_end_run_produces_reports_and_files() {
    let (url, state) = start_mock_api().await;
    // Ten files named doc_00..doc_09, sized 1..=10 bytes
    let files: Vec<(String, usize)> = (0..10)
        .map(|i| (format!("doc_{:02}.pdf", i), i + 1))
        .collect();
    let file_refs: Vec<(&str, usize)> =
        files.iter().map(|(n, s)| (n.as_str(), *s)).collect();
    let harness = harness(&file_refs, &url, state).await;

    let profiles = vec![
        profile(OcrStrategy::Auto, TestType::Standard, 60, 2),
        profile(OcrStrategy::All, TestType::Structured, 40, 1),
    ];
    let snapshot = RunSnapshot::new(
        &profiles,
        &loadrs::config::settings::LoadSettings {
            max_files: 10,
            concurrency_per_worker: 4,
            workers_per_profile: 2,
            poll_interval_ms: 10,
            request_timeout_secs: 5,
            throughput_log_interval_secs: 1,
        },
    );
    snapshot.write(harness.run.path()).await.unwrap();

    let reports = run_to_completion(&harness, &profiles, 10).await;

    // 2 workers for the standard profile, 1 for the structured one
    assert_eq!(reports.len(), 3);
    let total_pages: u64 = reports.iter().map(|r| r.total_pages).sum();
    // Sizes 1..=6 go to the 60% profile, 7..=10 to the 40% profile
    assert_eq!(total_pages, 55);
    assert!(reports.iter().all(|r| r.tally.total() == 0));
    assert_eq!(harness.monitor.pages(), 55);

    let aggregate = AggregateReport::from_workers(&reports);
    assert_eq!(aggregate.total_pages, 55);
    RunSnapshot::finalize(harness.run.path(), &aggregate)
        .await
        .unwrap();

    // Progress CSVs: one folder per profile key, two rows per succeeded task
    let auto_csv = std::fs::read_to_string(
        harness
            .run
            .path()
            .join("highquality_auto")
            .join("task_progress.csv"),
    )
    .unwrap();
    assert_eq!(auto_csv.lines().count(), 1 + 6 * 2);
    assert!(auto_csv.contains("Processing page 1"));
    assert!(auto_csv.contains("Task succeeded"));

    let all_csv = std::fs::read_to_string(
        harness
            .run
            .path()
            .join("highquality_all")
            .join("task_progress.csv"),
    )
    .unwrap();
    assert_eq!(all_csv.lines().count(), 1 + 4 * 2);

    // Result blocks for every worker
    let auto_results = std::fs::read_to_string(
        harness.run.path().join("HighQuality_Auto_results.txt"),
    )
    .unwrap();
    assert!(auto_results.contains("Worker 1 Results:"));
    assert!(auto_results.contains("Worker 2 Results:"));
    let all_results = std::fs::read_to_string(
        harness.run.path().join("HighQuality_All_results.txt"),
    )
    .unwrap();
    assert!(all_results.contains("Worker 1 Results:"));
    assert!(all_results.contains("Total failed files: 0"));

    // Structured outputs for the four structured tasks
    let outputs_dir = harness
        .run
        .path()
        .join("highquality_structured")
        .join("structured_outputs");
    assert_eq!(std::fs::read_dir(&outputs_dir).unwrap().count(), 4);

    // Throughput log carries the header and a final sample
    let throughput = std::fs::read_to_string(
        harness.run.path().join("aggregate_log.txt"),
    )
    .unwrap();
    let lines: Vec<&str> = throughput.lines().collect();
    assert_eq!(lines[0], "Time (s),Pages Processed,Pages/Second");
    assert!(lines.len() >= 2);
    assert!(lines.last().unwrap().split(',').nth(1) == Some("55"));

    // The snapshot was finalized with the aggregate
    let snapshot_raw =
        std::fs::read(harness.run.path().join("config.txt")).unwrap();
    let reloaded: RunSnapshot = serde_json::from_slice(&snapshot_raw).unwrap();
    assert_eq!(reloaded.aggregate_results.unwrap().total_pages, 55);

    // Every submission reached the mock with the wire-cased parameters
    let tasks = harness.state.tasks();
    assert_eq!(tasks.len(), 10);
    assert!(tasks.iter().all(|t| t.model == "HighQuality"));
    assert!(tasks
        .iter()
        .filter(|t| t.ocr_strategy == "All")
        .all(|t| t.has_schema));
    assert!(tasks
        .iter()
        .filter(|t| t.ocr_strategy == "Auto")
        .all(|t| !t.has_schema));
}

#[tokio::test]
async fn test_failures_are_tallied_by_kind() {
    let (url, state) = start_mock_api().await;
    let harness = harness(
        &[
            ("a_ok.pdf", 3),
            ("droppoll_c.pdf", 2),
            ("failtask_b.pdf", 2),
            ("reject_d.pdf", 2),
        ],
        &url,
        state,
    )
    .await;

    let profiles = vec![profile(OcrStrategy::Auto, TestType::Standard, 100, 1)];
    let reports = run_to_completion(&harness, &profiles, 100).await;

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.total_pages, 3);
    assert_eq!(report.processed_files, 1);
    assert_eq!(report.tally.start_failed, 1);
    assert_eq!(report.tally.poll_failed, 1);
    assert_eq!(report.tally.status_failed, 1);

    let results = std::fs::read_to_string(
        harness.run.path().join("HighQuality_Auto_results.txt"),
    )
    .unwrap();
    assert!(results.contains("Failed to start task: 1"));
    assert!(results.contains("Failed to poll task: 1"));
    assert!(results.contains("Tasks completed with failure status: 1"));
    assert!(results.contains("Total failed files: 3"));
}

#[tokio::test]
async fn test_empty_input_is_a_clean_noop_run() {
    let (url, state) = start_mock_api().await;
    let harness = harness(&[], &url, state).await;

    let profiles = vec![profile(OcrStrategy::Auto, TestType::Standard, 100, 2)];
    let reports = run_to_completion(&harness, &profiles, 200).await;

    // Both workers run and report zeroes
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.total_pages == 0));
    assert!(reports.iter().all(|r| r.tally.total() == 0));

    let aggregate = AggregateReport::from_workers(&reports);
    assert_eq!(aggregate.total_pages, 0);
    assert_eq!(aggregate.pages_per_second, 0.0);

    assert!(harness
        .run
        .path()
        .join("HighQuality_Auto_results.txt")
        .is_file());
    assert!(harness.state.tasks().is_empty());
}
