// ==========================================
// 影片目录 XML 导入 - 领域模型层
// ==========================================
// 职责: 定义目录实体、诊断日志、运行报告
// 红线: 不含数据访问逻辑,不含解析逻辑
// ==========================================

pub mod catalog;
pub mod diagnostics;
pub mod report;

// 重导出核心类型
pub use catalog::{CastingRecord, DatasetStats, MovieRecord, ReconciledDataset, StarRecord};
pub use diagnostics::{DiagnosticEntry, DiagnosticLevel, DiagnosticSource, DiagnosticsLog};
pub use report::{LoadOutcome, LoadSummary, RunReport, SourceKind, SourceStatus};
