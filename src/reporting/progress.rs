// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::SecondsFormat;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::domain::models::profile::LoadProfile;
use crate::domain::models::report::StageRecord;
use crate::reporting::ReportError;

const PROGRESS_FILE: &str = "task_progress.csv";
const HEADER: &str = "task_id,file_name,page_count,message,start_time,end_time,duration_ms\n";

/// 进度日志
///
/// 每个档位目录下的`task_progress.csv`，记录任务的message
/// 阶段转换。共享目录键的档位写入同一个文件，多个工作器
/// 以追加方式并发写入。
///
/// 必须在工作器启动前为每个档位调用`ensure_profile`，
/// 追加路径上不再检查文件是否存在。
pub struct ProgressLog {
    run_dir: PathBuf,
    initialized: Mutex<HashSet<String>>,
}

impl ProgressLog {
    /// 创建新的进度日志实例
    pub fn new(run_dir: PathBuf) -> Self {
        Self {
            run_dir,
            initialized: Mutex::new(HashSet::new()),
        }
    }

    /// 初始化档位的进度文件
    ///
    /// 创建档位目录并写入CSV表头，同一目录键只初始化一次
    pub async fn ensure_profile(&self, profile: &LoadProfile) -> Result<(), ReportError> {
        if !self.initialized.lock().insert(profile.folder_key()) {
            return Ok(());
        }

        let dir = self.run_dir.join(profile.folder_key());
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(PROGRESS_FILE), HEADER).await?;

        Ok(())
    }

    /// 追加一条阶段记录
    pub async fn append(
        &self,
        profile: &LoadProfile,
        record: &StageRecord,
    ) -> Result<(), ReportError> {
        let path = self.run_dir.join(profile.folder_key()).join(PROGRESS_FILE);
        let row = Self::format_row(record);

        let mut file = OpenOptions::new().append(true).open(&path).await?;
        file.write_all(row.as_bytes()).await?;

        Ok(())
    }

    /// 格式化CSV行
    fn format_row(record: &StageRecord) -> String {
        format!(
            "{},{},{},{},{},{},{}\n",
            escape(&record.task_id),
            escape(&record.file_name),
            record.page_count,
            escape(&record.message),
            record.start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
            record.end_time.to_rfc3339_opts(SecondsFormat::Millis, true),
            record.duration_ms(),
        )
    }
}

/// CSV字段转义
///
/// 含分隔符、引号或换行的字段加引号，内部引号成对转义
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
