// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::api::traits::TaskApi;
use crate::dispatch::distributor::{split_among, ProfileAssignment};
use crate::domain::models::profile::LoadProfile;
use crate::domain::models::report::WorkerReport;
use crate::reporting::{ProgressLog, ReportError, ResultsLog, RunFolder};
use crate::workers::load_worker::{LoadWorker, WorkerEvent};

/// 工作器管理器
///
/// 把每个档位的文件分配切分到其工作器，统一启动并回收。
/// 工作器完成时向结果日志追加其结果块；崩溃的工作器
/// 记录日志并从聚合中剔除。
pub struct WorkerManager<A>
where
    A: TaskApi + 'static,
{
    api: Arc<A>,
    run: Arc<RunFolder>,
    progress: Arc<ProgressLog>,
    results: ResultsLog,
    input_dir: PathBuf,
    concurrency_per_worker: usize,
    poll_interval: Duration,
}

impl<A> WorkerManager<A>
where
    A: TaskApi + Send + Sync + 'static,
{
    /// 创建新的工作器管理器实例
    pub fn new(
        api: Arc<A>,
        run: Arc<RunFolder>,
        progress: Arc<ProgressLog>,
        input_dir: PathBuf,
        concurrency_per_worker: usize,
        poll_interval: Duration,
    ) -> Self {
        let results = ResultsLog::new(run.path().to_path_buf());

        Self {
            api,
            run,
            progress,
            results,
            input_dir,
            concurrency_per_worker,
            poll_interval,
        }
    }

    /// 运行全部工作器并收集结果
    ///
    /// # 参数
    ///
    /// * `assignments` - 档位文件分配
    /// * `events` - 工作器事件通道的发送端，随最后一个工作器结束而关闭
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<WorkerReport>)` - 全部正常结束的工作器结果
    /// * `Err(ReportError)` - 进度文件初始化失败
    pub async fn run(
        &self,
        assignments: Vec<ProfileAssignment>,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Result<Vec<WorkerReport>, ReportError> {
        let mut join_set: JoinSet<(LoadProfile, WorkerReport)> = JoinSet::new();
        let mut total_workers = 0usize;

        for assignment in assignments {
            let profile = assignment.profile;
            self.progress.ensure_profile(&profile).await?;

            let chunks = split_among(&assignment.files, profile.workers);
            for (i, files) in chunks.into_iter().enumerate() {
                let worker = LoadWorker::new(
                    i + 1,
                    profile,
                    files,
                    self.input_dir.clone(),
                    self.api.clone(),
                    self.run.clone(),
                    self.progress.clone(),
                    self.concurrency_per_worker,
                    self.poll_interval,
                    events.clone(),
                );

                join_set.spawn(async move { (profile, worker.run().await) });
                total_workers += 1;
            }
        }
        drop(events);

        info!("Starting {} workers...", total_workers);

        let mut reports = Vec::with_capacity(total_workers);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((profile, report)) => {
                    if let Err(e) = self.results.append_worker_block(&profile, &report).await {
                        error!(
                            "Failed to write worker results for {}: {}",
                            profile.key(),
                            e
                        );
                    }
                    reports.push(report);
                }
                Err(e) => {
                    error!("Worker stopped abnormally: {}", e);
                }
            }
        }

        info!("Load test completed for all configurations");
        Ok(reports)
    }
}
