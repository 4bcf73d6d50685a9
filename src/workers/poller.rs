// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::api::traits::TaskApi;
use crate::domain::models::profile::LoadProfile;
use crate::domain::models::report::StageRecord;
use crate::domain::models::task::TaskResponse;
use crate::reporting::ProgressLog;
use crate::utils::errors::WorkerError;

/// 任务轮询器
///
/// 以固定间隔查询任务状态直到终态。每次观察到message变化时
/// 把上一阶段写入进度CSV，终态时写入最后一个阶段。
/// 轮询失败即放弃该任务，没有重试和退避。
pub struct TaskPoller<A: TaskApi> {
    api: Arc<A>,
    progress: Arc<ProgressLog>,
    interval: Duration,
}

impl<A: TaskApi> TaskPoller<A> {
    /// 创建新的轮询器实例
    pub fn new(api: Arc<A>, progress: Arc<ProgressLog>, interval: Duration) -> Self {
        Self {
            api,
            progress,
            interval,
        }
    }

    /// 轮询任务直到终态
    ///
    /// # 参数
    ///
    /// * `task_id` - 任务ID
    /// * `profile` - 任务所属档位，决定进度CSV的落盘目录
    ///
    /// # 返回值
    ///
    /// * `Ok(TaskResponse)` - 终态的任务记录
    /// * `Err(WorkerError)` - 状态查询或进度写入失败
    pub async fn poll(
        &self,
        task_id: &str,
        profile: &LoadProfile,
    ) -> Result<TaskResponse, WorkerError> {
        info!(
            "Polling task {} for model {} with OCR strategy {}",
            task_id, profile.model, profile.ocr_strategy
        );

        let mut last_message = String::new();
        let mut stage_started = Utc::now();

        loop {
            let task = match self.api.fetch_status(task_id).await {
                Ok(task) => task,
                Err(e) => {
                    error!("Error polling task {}: {}", task_id, e);
                    return Err(WorkerError::PollFailed(e.to_string()));
                }
            };
            let now = Utc::now();

            if task.message != last_message {
                debug!(task_id, message = %task.message, "Task message changed");
                // Close out the previous stage; the very first message opens one
                if !last_message.is_empty() {
                    self.progress
                        .append(
                            profile,
                            &StageRecord {
                                task_id: task.task_id.clone(),
                                file_name: task.file_name.clone(),
                                page_count: task.page_count,
                                message: last_message.clone(),
                                start_time: stage_started,
                                end_time: now,
                            },
                        )
                        .await?;
                }
                last_message = task.message.clone();
                stage_started = now;
            }

            if task.status.is_terminal() {
                self.progress
                    .append(
                        profile,
                        &StageRecord {
                            task_id: task.task_id.clone(),
                            file_name: task.file_name.clone(),
                            page_count: task.page_count,
                            message: last_message.clone(),
                            start_time: stage_started,
                            end_time: now,
                        },
                    )
                    .await?;

                info!(
                    "Task {} finished with status: {}, page count: {}",
                    task_id, task.status, task.page_count
                );
                return Ok(task);
            }

            sleep(self.interval).await;
        }
    }
}
