// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::config::settings::LoadSettings;
use crate::domain::models::profile::LoadProfile;
use crate::domain::models::report::AggregateReport;
use crate::reporting::ReportError;

/// 快照文件名，沿用历史名称，内容为JSON
const SNAPSHOT_FILE: &str = "config.txt";

/// 运行配置快照
///
/// 运行开始时把档位集和负载参数写入运行目录，
/// 结束时回填聚合结果，便于事后对照配置解读数据。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// 本次运行的档位集
    pub profiles: Vec<LoadProfile>,
    /// 文件配额基数
    pub max_files: usize,
    /// 每个工作器的并发请求上限
    pub concurrency_per_worker: usize,
    /// 每个档位的工作器数量
    pub workers_per_profile: usize,
    /// 聚合结果，运行结束时回填
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_results: Option<AggregateReport>,
}

impl RunSnapshot {
    /// 从档位集和负载配置构建快照
    pub fn new(profiles: &[LoadProfile], load: &LoadSettings) -> Self {
        Self {
            profiles: profiles.to_vec(),
            max_files: load.max_files,
            concurrency_per_worker: load.concurrency_per_worker,
            workers_per_profile: load.workers_per_profile,
            aggregate_results: None,
        }
    }

    /// 写入快照文件
    pub async fn write(&self, run_dir: &Path) -> Result<(), ReportError> {
        let path = run_dir.join(SNAPSHOT_FILE);
        fs::write(&path, serde_json::to_vec_pretty(self)?).await?;
        Ok(())
    }

    /// 回填聚合结果
    ///
    /// 重新读取快照文件，注入聚合结果后重写
    pub async fn finalize(
        run_dir: &Path,
        aggregate: &AggregateReport,
    ) -> Result<(), ReportError> {
        let path = run_dir.join(SNAPSHOT_FILE);
        let raw = fs::read(&path).await?;
        let mut snapshot: RunSnapshot = serde_json::from_slice(&raw)?;

        snapshot.aggregate_results = Some(*aggregate);
        fs::write(&path, serde_json::to_vec_pretty(&snapshot)?).await?;

        Ok(())
    }
}
