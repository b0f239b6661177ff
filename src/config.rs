//! 配置模块，负责加载JSON配置文件

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::{BaseCondition, Condition, Footer};

/// 默认的主查询
pub const DEFAULT_SELECT: &str = "SELECT * FROM records";

/// 配置加载错误
#[derive(Debug, Error)]
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

/// 查询配置：主查询、输出字段和分页排序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// `SELECT ... FROM ...` 形式的主查询
    pub select: String,
    /// 输出字段, 为空时保留主查询的字段列表
    pub fields: Vec<String>,
    pub distinct: bool,
    pub footer: Footer,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            select: DEFAULT_SELECT.to_string(),
            fields: Vec::new(),
            distinct: false,
            footer: Footer::default(),
        }
    }
}

impl QueryConfig {
    /// 从JSON文件加载查询配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        // 检查文件是否存在
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用配置中的字段和分页信息包装条件树, 生成编译请求
    pub fn request(&self, conditions: Vec<Condition>) -> BaseCondition {
        BaseCondition {
            fields: self.fields.clone(),
            distinct: self.distinct,
            conditions,
            footer: self.footer.clone(),
        }
    }
}
