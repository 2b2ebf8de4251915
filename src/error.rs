//! 错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 编译过滤条件时的错误
///
/// 只有"没有任何过滤条件"是致命错误, 其余异常条目都会被静默跳过或降级处理。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("no filters supplied")]
    NoFilters,
}

/// 模型目录配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {}", .0.display())]
    NotFound(PathBuf),

    #[error("无法读取配置文件 {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析JSON配置文件 {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
