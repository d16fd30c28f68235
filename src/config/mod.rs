// ==========================================
// 影片目录 XML 导入 - 配置层
// ==========================================
// 职责: 管道运行参数,支持 config_kv 表覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod pipeline_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::PipelineConfigReader;
pub use pipeline_config::PipelineConfig;
