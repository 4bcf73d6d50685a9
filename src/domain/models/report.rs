// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 失败分类统计
///
/// 三类失败互斥：提交失败的文件不会进入轮询，
/// 轮询失败的任务不会产生终态统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureTally {
    /// 任务提交失败数
    pub start_failed: u32,
    /// 轮询中断数
    pub poll_failed: u32,
    /// 以失败或取消终态结束的任务数
    pub status_failed: u32,
}

impl FailureTally {
    /// 失败文件总数
    pub fn total(&self) -> u32 {
        self.start_failed + self.poll_failed + self.status_failed
    }
}

/// 工作器结果
///
/// 单个工作器处理完其文件子集后的统计快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReport {
    /// 工作器在其档位内的编号，从1开始
    pub worker_id: usize,
    /// 所属档位键
    pub profile_key: String,
    /// 成功任务的页数合计
    pub total_pages: u64,
    /// 成功处理的文件数
    pub processed_files: u32,
    /// 失败分类统计
    pub tally: FailureTally,
    /// 工作器启动时间
    pub started_at: DateTime<Utc>,
    /// 工作器结束时间
    pub finished_at: DateTime<Utc>,
}

impl WorkerReport {
    /// 工作器运行时长（秒）
    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0
    }

    /// 工作器页吞吐率（页/秒）
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.duration_secs();
        if secs > 0.0 {
            self.total_pages as f64 / secs
        } else {
            0.0
        }
    }
}

/// 聚合结果
///
/// 跨全部工作器的汇总：总页数求和，总时长取
/// 最晚结束减最早启动，吞吐率为两者之商。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AggregateReport {
    /// 总运行时长（毫秒）
    pub total_time_ms: i64,
    /// 总页数
    pub total_pages: u64,
    /// 页吞吐率（页/秒）
    pub pages_per_second: f64,
}

impl AggregateReport {
    /// 从工作器结果计算聚合结果
    ///
    /// 空结果集返回全零聚合
    pub fn from_workers(reports: &[WorkerReport]) -> Self {
        let started = reports.iter().map(|r| r.started_at).min();
        let finished = reports.iter().map(|r| r.finished_at).max();
        let (Some(started), Some(finished)) = (started, finished) else {
            return Self::default();
        };

        let total_time_ms = (finished - started).num_milliseconds().max(0);
        let total_pages: u64 = reports.iter().map(|r| r.total_pages).sum();
        let pages_per_second = if total_time_ms > 0 {
            total_pages as f64 / (total_time_ms as f64 / 1000.0)
        } else {
            0.0
        };

        Self {
            total_time_ms,
            total_pages,
            pages_per_second,
        }
    }
}

/// 进度阶段记录
///
/// 进度CSV中的一行：任务在某条message下停留的时间段。
/// 每次观察到message变化时关闭上一阶段，终态时额外写一行。
#[derive(Debug, Clone)]
pub struct StageRecord {
    pub task_id: String,
    pub file_name: String,
    pub page_count: u32,
    pub message: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl StageRecord {
    /// 阶段持续时间（毫秒）
    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }
}
