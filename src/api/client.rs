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

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use std::time::Duration;
use url::Url;

use crate::api::traits::{ApiError, TaskApi};
use crate::domain::models::profile::{ExtractionSchema, LoadProfile, TestType};
use crate::domain::models::task::TaskResponse;

/// 摄取服务客户端
///
/// 基于reqwest实现的摄取服务访问，所有请求共享一个
/// 连接池并携带相同的鉴权头。
pub struct IngestClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl IngestClient {
    /// 创建新的客户端实例
    ///
    /// # 参数
    ///
    /// * `base_url` - 任务提交端点URL
    /// * `api_key` - 鉴权密钥，原样放入Authorization头
    /// * `timeout` - 单个请求的超时时间
    ///
    /// # 返回值
    ///
    /// * `Ok(IngestClient)` - 客户端实例
    /// * `Err(ApiError)` - URL无效或客户端构建失败
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder()
            .user_agent("loadrs/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// 任务状态查询URL
    ///
    /// 服务端的状态端点是提交端点追加任务ID路径段
    fn status_url(&self, task_id: &str) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            task_id
        );
        Ok(Url::parse(&joined)?)
    }

    /// 解码服务端响应
    ///
    /// 非2xx响应携带状态码和响应体文本返回错误
    async fn decode(response: reqwest::Response) -> Result<TaskResponse, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<TaskResponse>().await?)
    }
}

#[async_trait]
impl TaskApi for IngestClient {
    /// 提交文件创建摄取任务
    ///
    /// 多部分表单携带文件内容和档位参数；结构化档位额外
    /// 附带application/json类型的`json_schema`部分。
    async fn submit(
        &self,
        file_name: &str,
        data: Bytes,
        profile: &LoadProfile,
        schema: Option<&ExtractionSchema>,
    ) -> Result<TaskResponse, ApiError> {
        let file_part = Part::stream(Body::from(data))
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", profile.model.to_string())
            .text("target_chunk_length", "512")
            .text("ocr_strategy", profile.ocr_strategy.to_string())
            .text(
                "segmentation_strategy",
                profile.segmentation_strategy.to_string(),
            );

        if profile.test_type == TestType::Structured {
            if let Some(schema) = schema {
                let encoded = serde_json::to_string(schema)?;
                let part = Part::text(encoded).mime_str("application/json")?;
                form = form.part("json_schema", part);
            }
        }

        let response = self
            .client
            .post(self.base_url.clone())
            .header(AUTHORIZATION, &self.api_key)
            .multipart(form)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// 查询任务状态
    async fn fetch_status(&self, task_id: &str) -> Result<TaskResponse, ApiError> {
        let response = self
            .client
            .get(self.status_url(task_id)?)
            .header(AUTHORIZATION, &self.api_key)
            .send()
            .await?;

        Self::decode(response).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
