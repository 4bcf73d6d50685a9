// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::domain::models::profile::LoadProfile;
use crate::domain::models::report::WorkerReport;
use crate::reporting::ReportError;

/// 结果日志
///
/// 每个档位键一个`{key}_results.txt`，工作器完成时追加
/// 一个结果块。只有管理器写入该文件，块内统计互不覆盖。
pub struct ResultsLog {
    run_dir: PathBuf,
}

impl ResultsLog {
    /// 创建新的结果日志实例
    pub fn new(run_dir: PathBuf) -> Self {
        Self { run_dir }
    }

    /// 追加一个工作器结果块
    pub async fn append_worker_block(
        &self,
        profile: &LoadProfile,
        report: &WorkerReport,
    ) -> Result<(), ReportError> {
        let path = self.run_dir.join(format!("{}_results.txt", profile.key()));
        let block = Self::format_block(report);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(block.as_bytes()).await?;

        Ok(())
    }

    fn format_block(report: &WorkerReport) -> String {
        format!(
            "Worker {} Results:\n\
             Total pages processed: {}\n\
             Failed to start task: {}\n\
             Failed to poll task: {}\n\
             Tasks completed with failure status: {}\n\
             Total failed files: {}\n\
             Duration: {:.2} seconds\n\
             Pages per second: {:.2}\n\
             ----------------------------------------\n",
            report.worker_id,
            report.total_pages,
            report.tally.start_failed,
            report.tally.poll_failed,
            report.tally.status_failed,
            report.tally.total(),
            report.duration_secs(),
            report.pages_per_second(),
        )
    }
}
