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

use bytes::Bytes;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use metrics::counter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::api::traits::TaskApi;
use crate::domain::models::profile::{document_metadata_schema, LoadProfile, TestType};
use crate::domain::models::report::{FailureTally, WorkerReport};
use crate::domain::models::task::TaskStatus;
use crate::reporting::{ProgressLog, RunFolder};
use crate::workers::poller::TaskPoller;

/// 工作器事件
///
/// 工作器运行期间发往主线程的消息，用于实时吞吐量统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    /// 一个任务成功，携带其页数
    PagesProcessed(u32),
}

/// 单个文件的处理结局
enum FileOutcome {
    Succeeded { pages: u32 },
    StartFailed,
    PollFailed,
    StatusFailed,
}

/// 负载工作器
///
/// 持有一个档位的文件子集，在并发上限内对每个文件执行
/// 提交、轮询、统计的流水线。文件子集与其他工作器互不重叠，
/// 结果只通过返回值和事件通道上报。
pub struct LoadWorker<A: TaskApi + 'static> {
    worker_id: usize,
    profile: LoadProfile,
    files: Vec<String>,
    input_dir: PathBuf,
    api: Arc<A>,
    poller: TaskPoller<A>,
    run: Arc<RunFolder>,
    concurrency: usize,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl<A: TaskApi + Send + Sync + 'static> LoadWorker<A> {
    /// 创建新的负载工作器实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        worker_id: usize,
        profile: LoadProfile,
        files: Vec<String>,
        input_dir: PathBuf,
        api: Arc<A>,
        run: Arc<RunFolder>,
        progress: Arc<ProgressLog>,
        concurrency: usize,
        poll_interval: Duration,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Self {
        let poller = TaskPoller::new(api.clone(), progress, poll_interval);

        Self {
            worker_id,
            profile,
            files,
            input_dir,
            api,
            poller,
            run,
            concurrency,
            events,
        }
    }

    /// 运行工作器
    ///
    /// 处理完全部文件后返回本工作器的结果统计
    pub async fn run(self) -> WorkerReport {
        info!(
            "Load worker {} for profile {} started with {} files",
            self.worker_id,
            self.profile.key(),
            self.files.len()
        );
        let started_at = Utc::now();

        let worker = &self;
        let outcomes: Vec<FileOutcome> = stream::iter(worker.files.clone())
            .map(|file| async move { worker.process_file(&file).await })
            .buffer_unordered(worker.concurrency.max(1))
            .collect()
            .await;

        let mut total_pages = 0u64;
        let mut processed_files = 0u32;
        let mut tally = FailureTally::default();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Succeeded { pages } => {
                    processed_files += 1;
                    total_pages += pages as u64;
                }
                FileOutcome::StartFailed => tally.start_failed += 1,
                FileOutcome::PollFailed => tally.poll_failed += 1,
                FileOutcome::StatusFailed => tally.status_failed += 1,
            }
        }

        info!(
            "Load worker {} for profile {} finished: {} pages, {} failures",
            self.worker_id,
            self.profile.key(),
            total_pages,
            tally.total()
        );

        WorkerReport {
            worker_id: self.worker_id,
            profile_key: self.profile.key(),
            total_pages,
            processed_files,
            tally,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// 处理单个文件
    ///
    /// 提交失败的文件不进入轮询；轮询中断和失败终态分别计数
    async fn process_file(&self, file: &str) -> FileOutcome {
        let path = self.input_dir.join(file);
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                error!("Failed to read input file {}: {}", path.display(), e);
                counter!("loadrs_tasks_failed_total", "kind" => "start").increment(1);
                return FileOutcome::StartFailed;
            }
        };

        let schema =
            (self.profile.test_type == TestType::Structured).then(document_metadata_schema);
        let task = match self
            .api
            .submit(file, data, &self.profile, schema)
            .await
        {
            Ok(task) => {
                counter!("loadrs_tasks_submitted_total").increment(1);
                task
            }
            Err(e) => {
                error!("Failed to start task for file {}: {}", file, e);
                counter!("loadrs_tasks_failed_total", "kind" => "start").increment(1);
                return FileOutcome::StartFailed;
            }
        };

        let finished = match self.poller.poll(&task.task_id, &self.profile).await {
            Ok(task) => task,
            Err(e) => {
                error!("Failed to poll task for file {}: {}", file, e);
                counter!("loadrs_tasks_failed_total", "kind" => "poll").increment(1);
                return FileOutcome::PollFailed;
            }
        };

        match finished.status {
            TaskStatus::Succeeded => {
                if self.profile.test_type == TestType::Structured {
                    if let Some(output) = &finished.output {
                        if let Err(e) = self
                            .run
                            .save_structured_output(&self.profile, &finished, output)
                            .await
                        {
                            error!(
                                "Failed to save structured output for task {}: {}",
                                finished.task_id, e
                            );
                        }
                    }
                }

                info!(
                    "Processed file {} with {} pages",
                    file, finished.page_count
                );
                counter!("loadrs_pages_processed_total").increment(finished.page_count as u64);
                let _ = self
                    .events
                    .send(WorkerEvent::PagesProcessed(finished.page_count));

                FileOutcome::Succeeded {
                    pages: finished.page_count,
                }
            }
            _ => {
                error!("Task failed for file {}: {}", file, finished.message);
                counter!("loadrs_tasks_failed_total", "kind" => "status").increment(1);
                FileOutcome::StatusFailed
            }
        }
    }
}
