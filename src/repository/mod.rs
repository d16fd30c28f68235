// ==========================================
// 影片目录 XML 导入 - 数据仓储层
// ==========================================
// 红线: Repository 不含解析与对账逻辑
// 职责: 提供目录落库接口,屏蔽数据库细节
// 约束: 所有写入使用参数化语句
// ==========================================

pub mod catalog_load_repo;
pub mod catalog_load_repo_impl;
pub mod error;

// 重导出核心仓储
pub use catalog_load_repo::{CatalogLoadRepository, CatalogRowCounts};
pub use catalog_load_repo_impl::CatalogLoadRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
