// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::Path;
use tokio::fs;

use crate::domain::models::profile::LoadProfile;

/// 档位文件分配
///
/// 一个档位及其在本次运行中拥有的文件子集
#[derive(Debug, Clone)]
pub struct ProfileAssignment {
    pub profile: LoadProfile,
    pub files: Vec<String>,
}

/// 扫描输入目录
///
/// 返回目录下全部普通文件的文件名，按名称排序以保证
/// 分配结果可复现。子目录和无法以UTF-8表示的文件名被跳过。
pub async fn scan_input(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                files.push(name.to_string());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// 按配额百分比在档位之间分配文件
///
/// 每个档位从剩余文件的头部取`floor(max_files * percentage / 100)`
/// 个文件；文件耗尽后后续档位分到空集。不同档位的子集互不重叠。
///
/// # 参数
///
/// * `files` - 全部候选文件名
/// * `profiles` - 档位列表，按序分配
/// * `max_files` - 配额基数
pub fn distribute(
    files: &[String],
    profiles: &[LoadProfile],
    max_files: usize,
) -> Vec<ProfileAssignment> {
    let mut index = 0usize;

    profiles
        .iter()
        .map(|profile| {
            let quota = max_files * profile.percentage as usize / 100;
            let take = quota.min(files.len().saturating_sub(index));
            let assigned = files[index..index + take].to_vec();
            index += take;

            ProfileAssignment {
                profile: *profile,
                files: assigned,
            }
        })
        .collect()
}

/// 在工作器之间均分文件
///
/// 每个工作器分到`ceil(len / workers)`个文件的连续切片，
/// 尾部工作器可能分到更少甚至零个文件。
pub fn split_among(files: &[String], workers: usize) -> Vec<Vec<String>> {
    if workers == 0 {
        return Vec::new();
    }

    let per_worker = files.len().div_ceil(workers);
    (0..workers)
        .map(|i| {
            files
                .iter()
                .skip(i * per_worker)
                .take(per_worker)
                .cloned()
                .collect()
        })
        .collect()
}
