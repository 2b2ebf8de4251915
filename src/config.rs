//! 配置模块，负责从JSON文件加载模型目录

use crate::catalog::{ModelDescriptor, StaticCatalog};
use crate::error::ConfigError;
use std::fs;
use std::path::Path;

/// 默认的模型目录文件名
pub const DEFAULT_CATALOG_FILE: &str = "model_catalog.json";

/// 读取模型目录路径的环境变量
pub const CATALOG_ENV: &str = "FILTER_CATALOG";

/// 模型目录配置
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub catalog: StaticCatalog,
}

impl CatalogConfig {
    /// 从JSON文件加载模型目录
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.to_path_buf(),
            source,
        })?;

        let catalog: StaticCatalog =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path_ref.to_path_buf(),
                source,
            })?;

        Ok(CatalogConfig { catalog })
    }

    /// 路径取自 `FILTER_CATALOG`, 未设置时使用 `model_catalog.json`
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CATALOG_ENV).unwrap_or_else(|_| DEFAULT_CATALOG_FILE.to_string());
        Self::from_json_file(path)
    }

    /// 获取模型目录
    pub fn catalog(&self) -> &StaticCatalog {
        &self.catalog
    }

    /// 内置的演示目录（用于测试或fallback）
    pub fn builtin() -> Self {
        let catalog = StaticCatalog::new()
            .with_model(
                "patient",
                ModelDescriptor::new()
                    .table("patients")
                    .attributes(&["id", "name", "cpf", "phone", "birth_date", "active", "menu"])
                    .association("roles", "patient", "role")
                    .association("evaluations", "patient", "evaluation"),
            )
            .with_model(
                "evaluation",
                ModelDescriptor::new()
                    .table("evaluations")
                    .attributes(&["id", "patient", "score", "evaluated_at"]),
            )
            .with_model(
                "schedule",
                ModelDescriptor::new()
                    .table("schedules")
                    .attributes(&["id", "patient", "starts_at", "ends_at"]),
            )
            .with_model(
                "menu",
                ModelDescriptor::new()
                    .table("menus")
                    .attributes(&["id", "title", "path"]),
            )
            .with_model(
                "role",
                ModelDescriptor::new()
                    .table("roles")
                    .attributes(&["id", "name"]),
            );

        Self { catalog }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{association_alias, ModelCatalog};
    use std::fs;
    use std::io::Write;

    #[test]
    fn test_load_valid_json_config() {
        // 创建临时配置文件
        let temp_file = "test_model_catalog.json";
        let mut file = fs::File::create(temp_file).unwrap();
        writeln!(file, r#"{{
            "patient": {{
                "table": "patients",
                "attributes": ["id", "name"],
                "associations": {{
                    "ALIASrolesALIASpatientALIAS": {{ "target": "role" }}
                }}
            }},
            "role": {{ "table": "roles" }}
        }}"#).unwrap();

        // 测试加载
        let config = CatalogConfig::from_json_file(temp_file).unwrap();
        let catalog = config.catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.has_own_attribute("patient", "name"));
        assert!(catalog
            .resolve_association("patient", &association_alias("roles", "patient"))
            .is_some());
        assert_eq!(catalog.resolve_model("role").unwrap().table, "roles");

        // 清理
        fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_invalid_json_config() {
        let temp_file = "test_invalid_catalog.json";
        let mut file = fs::File::create(temp_file).unwrap();
        writeln!(file, "invalid json").unwrap();

        let result = CatalogConfig::from_json_file(temp_file);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));

        // 清理
        fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_missing_file() {
        let result = CatalogConfig::from_json_file("non_existent_catalog.json");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_builtin_config() {
        let config = CatalogConfig::builtin();
        let catalog = config.catalog();
        assert!(catalog.has_own_attribute("patient", "cpf"));
        assert!(catalog
            .resolve_association("patient", &association_alias("evaluations", "patient"))
            .is_some());
        assert_eq!(catalog.resolve_model("menu").unwrap().table, "menus");
    }
}
