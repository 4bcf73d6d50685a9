// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Context;
use loadrs::api::client::IngestClient;
use loadrs::config::settings::Settings;
use loadrs::dispatch::distributor::{distribute, scan_input};
use loadrs::domain::models::report::AggregateReport;
use loadrs::reporting::{ProgressLog, RunFolder, RunSnapshot, ThroughputMonitor};
use loadrs::workers::load_worker::WorkerEvent;
use loadrs::workers::manager::WorkerManager;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use loadrs::utils::{metrics, telemetry};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并驱动一次完整的负载测试
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting loadrs...");

    // Initialize Prometheus Metrics
    metrics::init_metrics();

    // 2. Load configuration
    let settings = Settings::new()?;
    let profiles = settings.resolve_profiles()?;
    info!("Configuration loaded with {} profiles", profiles.len());

    // 3. Create the run folder and persist the configuration snapshot
    let run = Arc::new(RunFolder::create(Path::new(&settings.io.output_dir)).await?);
    info!("Run folder created: {}", run.path().display());

    let snapshot = RunSnapshot::new(&profiles, &settings.load);
    snapshot.write(run.path()).await?;

    // 4. Scan the input directory and distribute files across profiles
    let input_dir = Path::new(&settings.io.input_dir);
    let files = scan_input(input_dir)
        .await
        .with_context(|| format!("Failed to scan input directory {}", input_dir.display()))?;
    info!("Discovered {} input files", files.len());

    let assignments = distribute(&files, &profiles, settings.load.max_files);

    // 5. Initialize the API client and report sinks
    let client = Arc::new(IngestClient::new(
        &settings.api.url,
        settings.api.key.clone(),
        Duration::from_secs(settings.load.request_timeout_secs),
    )?);
    let progress = Arc::new(ProgressLog::new(run.path().to_path_buf()));

    // 6. Start the throughput monitor and the worker event drain
    let monitor = Arc::new(
        ThroughputMonitor::create(
            run.path(),
            Duration::from_secs(settings.load.throughput_log_interval_secs),
        )
        .await?,
    );
    let monitor_handle = monitor.start();

    let (events, mut event_rx) = mpsc::unbounded_channel();
    let drain = {
        let monitor = monitor.clone();
        tokio::spawn(async move {
            while let Some(WorkerEvent::PagesProcessed(pages)) = event_rx.recv().await {
                monitor.add_pages(pages as u64);
            }
        })
    };

    // 7. Run the workers
    let manager = WorkerManager::new(
        client,
        run.clone(),
        progress,
        input_dir.to_path_buf(),
        settings.load.concurrency_per_worker,
        Duration::from_millis(settings.load.poll_interval_ms),
    );
    let reports = manager.run(assignments, events).await?;

    // The event channel closes once every worker has finished
    drain.await?;
    monitor_handle.abort();
    monitor.finalize().await?;

    // 8. Aggregate the results and finalize the snapshot
    let aggregate = AggregateReport::from_workers(&reports);
    RunSnapshot::finalize(run.path(), &aggregate).await?;

    info!(
        "Run {} finished: {} pages in {:.2}s ({:.2} pages/s) across {} workers",
        run.run_id(),
        aggregate.total_pages,
        aggregate.total_time_ms as f64 / 1000.0,
        aggregate.pages_per_second,
        reports.len()
    );

    Ok(())
}
