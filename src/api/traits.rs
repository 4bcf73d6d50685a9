// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::models::profile::{ExtractionSchema, LoadProfile};
use crate::domain::models::task::TaskResponse;

/// API错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 传输层错误，包括连接失败、超时和响应体读取失败
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 服务端返回了非成功状态码
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// API端点URL无效
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// 请求体编码失败
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 摄取服务接口
///
/// 工作器通过该trait访问服务端，测试中可以用内存实现替换
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// 提交文件创建摄取任务
    ///
    /// # 参数
    ///
    /// * `file_name` - 上传的文件名
    /// * `data` - 文件内容
    /// * `profile` - 提交参数所属的负载档位
    /// * `schema` - 结构化档位附带的提取schema
    ///
    /// # 返回值
    ///
    /// * `Ok(TaskResponse)` - 服务端创建的任务记录
    /// * `Err(ApiError)` - 提交失败
    async fn submit(
        &self,
        file_name: &str,
        data: Bytes,
        profile: &LoadProfile,
        schema: Option<&ExtractionSchema>,
    ) -> Result<TaskResponse, ApiError>;

    /// 查询任务状态
    async fn fetch_status(&self, task_id: &str) -> Result<TaskResponse, ApiError>;
}
