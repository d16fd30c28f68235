// ==========================================
// 影片目录 XML 导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// 规则: 表或键缺失 → 默认值;值格式错误 → 告警 + 默认值
// ==========================================

use crate::config::import_config_trait::PipelineConfigReader;
use crate::config::pipeline_config::{DEFAULT_BATCH_SIZE, MAX_STAR_ID_WIDTH};
use crate::db::open_sqlite_connection;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::surrogate_key::{DEFAULT_STAR_ID_PREFIX, DEFAULT_STAR_ID_WIDTH};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 会对传入连接再次应用统一 PRAGMA(幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值(scope_id='global')
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置表或配置项不存在
    fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let has_table: bool = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name='config_kv' LIMIT 1",
                [],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !has_table {
            return Ok(None);
        }

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值(公开方法,供其他模块复用)
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值(UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取并解析配置值,格式错误或不满足约束时回退默认值
    fn get_parsed_or_default<T>(
        &self,
        key: &str,
        default: T,
        is_valid: impl Fn(&T) -> bool,
    ) -> ImportResult<T>
    where
        T: FromStr,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(value) if is_valid(&value) => Ok(value),
            _ => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误,使用默认值");
                Ok(default)
            }
        }
    }
}

impl PipelineConfigReader for ConfigManager {
    fn get_batch_size(&self) -> ImportResult<usize> {
        self.get_parsed_or_default(config_keys::BATCH_SIZE, DEFAULT_BATCH_SIZE, |v| *v > 0)
    }

    fn get_star_id_prefix(&self) -> ImportResult<String> {
        match self.get_config_value(config_keys::STAR_ID_PREFIX)? {
            Some(raw) if !raw.trim().is_empty() => Ok(raw.trim().to_string()),
            Some(raw) => {
                tracing::warn!(
                    config_key = config_keys::STAR_ID_PREFIX,
                    raw_value = %raw,
                    "配置格式错误,使用默认值"
                );
                Ok(DEFAULT_STAR_ID_PREFIX.to_string())
            }
            None => Ok(DEFAULT_STAR_ID_PREFIX.to_string()),
        }
    }

    fn get_star_id_width(&self) -> ImportResult<usize> {
        self.get_parsed_or_default(config_keys::STAR_ID_WIDTH, DEFAULT_STAR_ID_WIDTH, |v| {
            (1..=MAX_STAR_ID_WIDTH).contains(v)
        })
    }

    fn get_parallel_parse(&self) -> ImportResult<bool> {
        let Some(raw) = self.get_config_value(config_keys::PARALLEL_PARSE)? else {
            return Ok(false);
        };

        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => {
                tracing::warn!(
                    config_key = config_keys::PARALLEL_PARSE,
                    raw_value = %raw,
                    "配置格式错误,使用默认值"
                );
                Ok(false)
            }
        }
    }

    fn get_report_entry_limit(&self) -> ImportResult<Option<usize>> {
        // 0 表示不限
        let limit = self.get_parsed_or_default(config_keys::REPORT_ENTRY_LIMIT, 0usize, |_| true)?;
        Ok((limit > 0).then_some(limit))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const BATCH_SIZE: &str = "etl.batch_size";
    pub const STAR_ID_PREFIX: &str = "etl.star_id_prefix";
    pub const STAR_ID_WIDTH: &str = "etl.star_id_width";
    pub const PARALLEL_PARSE: &str = "etl.parallel_parse";
    pub const REPORT_ENTRY_LIMIT: &str = "etl.report_entry_limit";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::pipeline_config::PipelineConfig;
    use crate::db::ensure_catalog_schema;

    fn manager_with_schema() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_catalog_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_table_missing() {
        let conn = Connection::open_in_memory().unwrap();
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap();

        assert_eq!(manager.load_pipeline_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let manager = manager_with_schema();
        manager.set_global_config_value(config_keys::BATCH_SIZE, "50").unwrap();
        manager.set_global_config_value(config_keys::STAR_ID_PREFIX, "st").unwrap();
        manager.set_global_config_value(config_keys::STAR_ID_WIDTH, "7").unwrap();
        manager.set_global_config_value(config_keys::PARALLEL_PARSE, "TRUE").unwrap();
        manager.set_global_config_value(config_keys::REPORT_ENTRY_LIMIT, "100").unwrap();

        let config = manager.load_pipeline_config().unwrap();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.star_id_prefix, "st");
        assert_eq!(config.star_id_width, 7);
        assert!(config.parallel_parse);
        assert_eq!(config.report_entry_limit, Some(100));
    }

    #[test]
    fn test_malformed_values_fall_back_to_defaults() {
        let manager = manager_with_schema();
        manager.set_global_config_value(config_keys::BATCH_SIZE, "0").unwrap();
        manager.set_global_config_value(config_keys::STAR_ID_PREFIX, "  ").unwrap();
        manager.set_global_config_value(config_keys::STAR_ID_WIDTH, "wide").unwrap();
        manager.set_global_config_value(config_keys::PARALLEL_PARSE, "maybe").unwrap();
        manager.set_global_config_value(config_keys::REPORT_ENTRY_LIMIT, "-1").unwrap();

        assert_eq!(manager.load_pipeline_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_upsert_overwrites_value() {
        let manager = manager_with_schema();
        manager.set_global_config_value(config_keys::BATCH_SIZE, "10").unwrap();
        manager.set_global_config_value(config_keys::BATCH_SIZE, "20").unwrap();
        assert_eq!(
            manager.get_global_config_value(config_keys::BATCH_SIZE).unwrap(),
            Some("20".to_string())
        );
    }
}
