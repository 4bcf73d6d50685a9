// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::models::profile::{Model, OcrStrategy};

/// 任务状态枚举
///
/// 表示摄取服务端任务在其生命周期中的不同状态。
/// 状态转换遵循以下流程：
/// Starting → Processing → Succeeded/Failed/Cancelled
///
/// 枚举值与服务端的线上格式保持一致（帕斯卡命名）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    /// 任务已创建，尚未开始处理
    #[default]
    Starting,
    /// 处理中，服务端正在解析文档
    Processing,
    /// 已成功，页数和输出已就绪
    Succeeded,
    /// 已失败，message字段携带失败原因
    Failed,
    /// 已取消，任务不会再产生结果
    Cancelled,
}

impl TaskStatus {
    /// 判断状态是否为终态
    ///
    /// 终态任务不会再发生状态变化，轮询应当结束
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Starting => write!(f, "Starting"),
            TaskStatus::Processing => write!(f, "Processing"),
            TaskStatus::Succeeded => write!(f, "Succeeded"),
            TaskStatus::Failed => write!(f, "Failed"),
            TaskStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Starting" => Ok(TaskStatus::Starting),
            "Processing" => Ok(TaskStatus::Processing),
            "Succeeded" => Ok(TaskStatus::Succeeded),
            "Failed" => Ok(TaskStatus::Failed),
            "Cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 任务配置回显
///
/// 服务端在状态记录中回显的提交参数子集
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfiguration {
    pub model: Model,
    pub ocr_strategy: OcrStrategy,
    pub target_chunk_length: Option<u32>,
}

/// 任务状态记录
///
/// 从摄取服务拉取的瞬时状态记录。除`task_id`和`status`外的
/// 字段在任务早期可能尚未填充，反序列化时全部容忍缺失。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    /// 任务唯一标识符
    pub task_id: String,
    /// 任务状态
    pub status: TaskStatus,
    /// 提交的文件名
    #[serde(default)]
    pub file_name: String,
    /// 服务端的进度描述，状态不变时也可能更新
    #[serde(default)]
    pub message: String,
    /// 文档页数，处理完成前可能为0
    #[serde(default)]
    pub page_count: u32,
    /// 创建时间
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// 完成时间
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// 过期时间
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// 输入文件的下载地址
    #[serde(default)]
    pub input_file_url: Option<String>,
    /// 任务状态查询地址
    #[serde(default)]
    pub task_url: Option<String>,
    /// 提交参数回显
    #[serde(default)]
    pub configuration: Option<TaskConfiguration>,
    /// 结构化提取输出，仅结构化任务成功后出现
    #[serde(default)]
    pub output: Option<serde_json::Value>,
}
