// ==========================================
// 影片目录 XML 导入 - 核心库
// ==========================================
// 技术栈: Rust + quick-xml + SQLite
// 系统定位: 批处理 ETL(演员 / 影片 / 出演关系 → 关系库)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体、诊断、报告
pub mod domain;

// 数据仓储层 - 目录落库
pub mod repository;

// 导入层 - 解析、对账、编排
pub mod importer;

// 配置层 - 管道配置
pub mod config;

// 数据库基础设施(连接初始化/PRAGMA 统一/表结构)
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CastingRecord, DiagnosticEntry, DiagnosticLevel, DiagnosticSource, DiagnosticsLog,
    LoadOutcome, LoadSummary, MovieRecord, ReconciledDataset, RunReport, StarRecord,
};

// 导入管道
pub use importer::{CatalogImporter, CatalogImporterImpl, CatalogSources, ImportError, ImportResult};

// 仓储
pub use repository::{CatalogLoadRepository, CatalogLoadRepositoryImpl, RepositoryError};

// 配置
pub use config::{ConfigManager, PipelineConfig, PipelineConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "影片目录 XML 导入";
