// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 模型枚举
///
/// 摄取服务的处理模型，对本系统不透明，按线上格式透传
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Model {
    /// 高质量模型
    #[default]
    HighQuality,
    /// 快速模型
    Fast,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Model::HighQuality => write!(f, "HighQuality"),
            Model::Fast => write!(f, "Fast"),
        }
    }
}

/// OCR策略枚举
///
/// 控制服务端光学字符识别行为的参数，对本系统不透明
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OcrStrategy {
    /// 服务端自行决定是否OCR
    #[default]
    Auto,
    /// 全部页面OCR
    All,
    /// 禁用OCR
    Off,
}

impl fmt::Display for OcrStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OcrStrategy::Auto => write!(f, "Auto"),
            OcrStrategy::All => write!(f, "All"),
            OcrStrategy::Off => write!(f, "Off"),
        }
    }
}

/// 分段策略枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SegmentationStrategy {
    /// 版面分析分段
    #[default]
    LayoutAnalysis,
    /// 按页分段
    Page,
}

impl fmt::Display for SegmentationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SegmentationStrategy::LayoutAnalysis => write!(f, "LayoutAnalysis"),
            SegmentationStrategy::Page => write!(f, "Page"),
        }
    }
}

/// 测试类型枚举
///
/// 决定提交时是否附带结构化提取schema以及成功后是否落盘输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    /// 标准摄取测试
    #[default]
    Standard,
    /// 结构化提取测试
    Structured,
}

/// 负载档位
///
/// 一组提交参数及其在本次运行中的文件配额和工作器数量。
/// 同一档位的文件在其工作器之间均分，不同档位互不重叠。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadProfile {
    /// 处理模型
    pub model: Model,
    /// OCR策略
    pub ocr_strategy: OcrStrategy,
    /// 分段策略
    pub segmentation_strategy: SegmentationStrategy,
    /// 测试类型
    #[serde(default)]
    pub test_type: TestType,
    /// 文件配额百分比
    pub percentage: u32,
    /// 工作器数量
    #[serde(default = "default_profile_workers")]
    pub workers: usize,
}

fn default_profile_workers() -> usize {
    2
}

impl LoadProfile {
    /// 档位键，用于结果文件命名
    ///
    /// 采用线上格式大小写，例如`HighQuality_Auto`
    pub fn key(&self) -> String {
        format!("{}_{}", self.model, self.ocr_strategy)
    }

    /// 档位目录键，用于进度CSV目录命名
    ///
    /// 小写形式，例如`highquality_auto`。共享模型和OCR策略的
    /// 档位会落入同一目录。
    pub fn folder_key(&self) -> String {
        self.key().to_lowercase()
    }

    /// 内置档位集
    ///
    /// 70%标准Auto、10%标准All、10%结构化版面分析、10%结构化按页
    ///
    /// # 参数
    ///
    /// * `workers` - 每个档位的工作器数量
    pub fn default_set(workers: usize) -> Vec<LoadProfile> {
        vec![
            LoadProfile {
                model: Model::HighQuality,
                ocr_strategy: OcrStrategy::Auto,
                segmentation_strategy: SegmentationStrategy::LayoutAnalysis,
                test_type: TestType::Standard,
                percentage: 70,
                workers,
            },
            LoadProfile {
                model: Model::HighQuality,
                ocr_strategy: OcrStrategy::All,
                segmentation_strategy: SegmentationStrategy::LayoutAnalysis,
                test_type: TestType::Standard,
                percentage: 10,
                workers,
            },
            LoadProfile {
                model: Model::HighQuality,
                ocr_strategy: OcrStrategy::Auto,
                segmentation_strategy: SegmentationStrategy::LayoutAnalysis,
                test_type: TestType::Structured,
                percentage: 10,
                workers,
            },
            LoadProfile {
                model: Model::HighQuality,
                ocr_strategy: OcrStrategy::Auto,
                segmentation_strategy: SegmentationStrategy::Page,
                test_type: TestType::Structured,
                percentage: 10,
                workers,
            },
        ]
    }
}

/// 结构化提取字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionField {
    pub name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub description: String,
    /// 字段缺省值，线上格式要求显式的null
    pub default: Option<serde_json::Value>,
}

/// 结构化提取schema
///
/// 随结构化档位的提交请求一起发送。服务端要求`properties`
/// 是对象数组而不是JSON Schema惯用的对象映射。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSchema {
    pub title: String,
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: Vec<ExtractionField>,
}

static DOCUMENT_METADATA_SCHEMA: Lazy<ExtractionSchema> = Lazy::new(|| ExtractionSchema {
    title: "Document Metadata".to_string(),
    schema_type: "object".to_string(),
    properties: vec![
        ExtractionField {
            name: "title".to_string(),
            title: "Document Title".to_string(),
            field_type: "string".to_string(),
            description: "The main title of the document".to_string(),
            default: None,
        },
        ExtractionField {
            name: "author".to_string(),
            title: "Author".to_string(),
            field_type: "string".to_string(),
            description: "The author(s) of the document".to_string(),
            default: None,
        },
        ExtractionField {
            name: "date_published".to_string(),
            title: "Date Published".to_string(),
            field_type: "string".to_string(),
            description: "The publication date of the document".to_string(),
            default: None,
        },
        ExtractionField {
            name: "location".to_string(),
            title: "Location".to_string(),
            field_type: "string".to_string(),
            description: "The location mentioned in the document".to_string(),
            default: None,
        },
    ],
});

/// 缺省的文档元数据提取schema
pub fn document_metadata_schema() -> &'static ExtractionSchema {
    &DOCUMENT_METADATA_SCHEMA
}
