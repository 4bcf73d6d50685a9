// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 报告模块
///
/// 提供运行目录管理和各类报告文件的写入
/// 包括进度CSV、结果文本、配置快照和吞吐量日志
pub mod progress;
pub mod results;
pub mod run_folder;
pub mod snapshot;
pub mod throughput;

pub use progress::ProgressLog;
pub use results::ResultsLog;
pub use run_folder::RunFolder;
pub use snapshot::RunSnapshot;
pub use throughput::ThroughputMonitor;

/// 报告错误类型
#[derive(Error, Debug)]
pub enum ReportError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
