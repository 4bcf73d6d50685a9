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

use anyhow::Context;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::models::profile::LoadProfile;

/// 应用程序配置设置
///
/// 包含API端点、负载参数、输入输出目录和可选的档位覆盖文件
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// API配置
    pub api: ApiSettings,
    /// 负载配置
    pub load: LoadSettings,
    /// 输入输出配置
    pub io: IoSettings,
    /// 档位覆盖文件（YAML），缺省时使用内置档位集
    pub profiles_file: Option<String>,
}

/// API配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// 任务提交端点URL
    pub url: String,
    /// 鉴权密钥，随每个请求的Authorization头发送
    pub key: String,
}

/// 负载配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoadSettings {
    /// 本次运行处理的最大文件数
    pub max_files: usize,
    /// 每个工作器的并发请求上限
    pub concurrency_per_worker: usize,
    /// 每个档位的工作器数量
    pub workers_per_profile: usize,
    /// 状态轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// HTTP请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 吞吐量日志写入间隔（秒）
    pub throughput_log_interval_secs: u64,
}

/// 输入输出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct IoSettings {
    /// 输入文件目录
    pub input_dir: String,
    /// 输出根目录，每次运行在其下创建独立的运行目录
    pub output_dir: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值。API的url和key没有默认值，
    /// 缺失时返回错误并终止启动。
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default load settings
            .set_default("load.max_files", 200)?
            .set_default("load.concurrency_per_worker", 25)?
            .set_default("load.workers_per_profile", 2)?
            .set_default("load.poll_interval_ms", 1000)?
            .set_default("load.request_timeout_secs", 600)?
            .set_default("load.throughput_log_interval_secs", 5)?
            // Default IO settings
            .set_default("io.input_dir", "input")?
            .set_default("io.output_dir", "output")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("LOADRS").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 解析本次运行使用的负载档位集
    ///
    /// 配置了`profiles_file`时从YAML文件读取，否则返回内置的四档位集。
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<LoadProfile>)` - 档位列表
    /// * `Err` - 档位文件不可读或格式错误
    pub fn resolve_profiles(&self) -> anyhow::Result<Vec<LoadProfile>> {
        match &self.profiles_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read profiles file {}", path))?;
                let profiles: Vec<LoadProfile> = serde_yaml::from_str(&raw)
                    .with_context(|| format!("Invalid profiles file {}", path))?;
                Ok(profiles)
            }
            None => Ok(LoadProfile::default_set(self.load.workers_per_profile)),
        }
    }
}
