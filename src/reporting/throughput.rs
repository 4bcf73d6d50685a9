// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::error;

use crate::reporting::ReportError;

const THROUGHPUT_FILE: &str = "aggregate_log.txt";
const HEADER: &str = "Time (s),Pages Processed,Pages/Second\n";

/// 吞吐量监视器
///
/// 维护跨全部工作器的已处理页数计数，按固定间隔向
/// `aggregate_log.txt`追加一行运行至今的吞吐量采样。
/// 运行结束时调用`finalize`补写最后一行。
pub struct ThroughputMonitor {
    pages: Arc<AtomicU64>,
    log_path: PathBuf,
    started: Instant,
    interval: Duration,
}

impl ThroughputMonitor {
    /// 创建监视器并写入日志表头
    pub async fn create(run_dir: &Path, interval: Duration) -> Result<Self, ReportError> {
        let log_path = run_dir.join(THROUGHPUT_FILE);
        fs::write(&log_path, HEADER).await?;

        Ok(Self {
            pages: Arc::new(AtomicU64::new(0)),
            log_path,
            started: Instant::now(),
            interval,
        })
    }

    /// 累加已处理页数
    pub fn add_pages(&self, pages: u64) {
        self.pages.fetch_add(pages, Ordering::Relaxed);
    }

    /// 当前已处理页数
    pub fn pages(&self) -> u64 {
        self.pages.load(Ordering::Relaxed)
    }

    /// 启动采样后台任务
    ///
    /// 返回任务句柄，运行结束后由调用方中止
    pub fn start(&self) -> JoinHandle<()> {
        let pages = self.pages.clone();
        let path = self.log_path.clone();
        let started = self.started;
        let period = self.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) =
                    Self::append_sample(&path, started, pages.load(Ordering::Relaxed)).await
                {
                    error!("Failed to update aggregate log: {}", e);
                }
            }
        })
    }

    /// 写入最终采样行
    pub async fn finalize(&self) -> Result<(), ReportError> {
        Self::append_sample(&self.log_path, self.started, self.pages()).await
    }

    async fn append_sample(
        path: &Path,
        started: Instant,
        pages: u64,
    ) -> Result<(), ReportError> {
        let elapsed = started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            pages as f64 / elapsed
        } else {
            0.0
        };
        let row = format!("{:.2},{},{:.2}\n", elapsed, pages, rate);

        let mut file = OpenOptions::new().append(true).open(path).await?;
        file.write_all(row.as_bytes()).await?;

        Ok(())
    }
}
