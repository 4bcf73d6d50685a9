// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::domain::models::profile::LoadProfile;
use crate::domain::models::task::TaskResponse;
use crate::reporting::ReportError;

/// 运行目录
///
/// 每次负载测试在输出根目录下拥有一个以运行ID命名的独立目录，
/// 本次运行的全部报告文件都写在其中。
#[derive(Debug)]
pub struct RunFolder {
    run_id: String,
    path: PathBuf,
}

impl RunFolder {
    /// 创建新的运行目录
    ///
    /// # 参数
    ///
    /// * `output_dir` - 输出根目录，不存在时一并创建
    pub async fn create(output_dir: &Path) -> Result<Self, ReportError> {
        let run_id = Self::generate_run_id();
        let path = output_dir.join(&run_id);
        fs::create_dir_all(&path).await?;

        Ok(Self { run_id, path })
    }

    /// 生成运行ID
    ///
    /// 格式为冒号和点替换为连字符的ISO时间戳，后接UUID前8位，
    /// 例如`2025-01-01T12-00-00-000Z_1a2b3c4d`
    fn generate_run_id() -> String {
        let stamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let uuid = Uuid::new_v4().simple().to_string();

        format!("{}_{}", stamp, &uuid[..8])
    }

    /// 运行ID
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// 运行目录路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存结构化提取输出
    ///
    /// 写入`{model}_structured/structured_outputs/{文件名主干}_output.json`，
    /// 内容为文件名、任务ID和服务端输出。
    ///
    /// # 返回值
    ///
    /// * `Ok(PathBuf)` - 输出文件路径
    /// * `Err(ReportError)` - 目录创建或写入失败
    pub async fn save_structured_output(
        &self,
        profile: &LoadProfile,
        task: &TaskResponse,
        output: &serde_json::Value,
    ) -> Result<PathBuf, ReportError> {
        let dir = self
            .path
            .join(format!("{}_structured", profile.model.to_string().to_lowercase()))
            .join("structured_outputs");
        fs::create_dir_all(&dir).await?;

        let stem = Path::new(&task.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(task.file_name.as_str());
        let path = dir.join(format!("{}_output.json", stem));

        let payload = json!({
            "file_name": task.file_name,
            "task_id": task.task_id,
            "output": output,
        });
        fs::write(&path, serde_json::to_vec_pretty(&payload)?).await?;

        Ok(path)
    }
}
