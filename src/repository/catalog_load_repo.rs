// ==========================================
// 影片目录 XML 导入 - 目录落库 Repository Trait
// ==========================================
// 职责: 定义目录数据集写入接口(不包含解析与对账逻辑)
// 红线: 单事务,全部成功或全部回滚
// ==========================================

use crate::domain::catalog::ReconciledDataset;
use crate::domain::diagnostics::DiagnosticsLog;
use crate::domain::report::LoadSummary;
use crate::repository::error::RepositoryResult;
use serde::{Deserialize, Serialize};

/// 目录各表行数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRowCounts {
    pub stars: usize,
    pub movies: usize,
    pub genres: usize,
    pub genres_in_movies: usize,
    pub stars_in_movies: usize,
}

// ==========================================
// CatalogLoadRepository Trait
// ==========================================
// 用途: 目录数据集落库
// 实现者: CatalogLoadRepositoryImpl(使用 rusqlite)
pub trait CatalogLoadRepository: Send + Sync {
    /// 在单个事务内写入整个数据集
    ///
    /// # 参数
    /// - dataset: 对账完成的数据集(只读借用)
    /// - batch_size: 每批写入行数(仅影响进度日志粒度)
    /// - log: 诊断日志(无 FID 影片汇总、未知影片引用)
    ///
    /// # 写入顺序
    /// 1. stars (INSERT OR IGNORE)
    /// 2. movies (INSERT OR IGNORE,仅有 FID 影片)
    /// 3. genres (先加载已有类型,只插入缺失类型)
    /// 4. genres_in_movies (INSERT OR IGNORE)
    /// 5. stars_in_movies (INSERT OR IGNORE,未知演员静默跳过)
    ///
    /// # 返回
    /// - Ok(LoadSummary): 已提交
    /// - Err: 任一步失败,事务已回滚
    fn load_dataset(
        &self,
        dataset: &ReconciledDataset,
        batch_size: usize,
        log: &mut DiagnosticsLog,
    ) -> RepositoryResult<LoadSummary>;

    /// 统计目录各表行数
    fn count_rows(&self) -> RepositoryResult<CatalogRowCounts>;
}
