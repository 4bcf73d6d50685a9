// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::api::traits::ApiError;
use crate::reporting::ReportError;

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Poll failed: {0}")]
    PollFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
