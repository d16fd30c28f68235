// ==========================================
// 影片目录 XML 导入 - 管道配置
// ==========================================
// 职责: 导入管道运行参数及其默认值
// 存储: config_kv 表(key 以 etl. 开头),缺失时使用默认值
// ==========================================

use crate::importer::surrogate_key::{DEFAULT_STAR_ID_PREFIX, DEFAULT_STAR_ID_WIDTH};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_SIZE: usize = 500;

/// 代理键宽度上限(超过则视为配置错误)
pub const MAX_STAR_ID_WIDTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub batch_size: usize,                 // 每批写入行数
    pub star_id_prefix: String,            // 演员代理键前缀
    pub star_id_width: usize,              // 演员代理键序号宽度
    pub parallel_parse: bool,              // 三个文件并行解析
    pub report_entry_limit: Option<usize>, // 文本报告最多输出的诊断条数(None = 不限)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            star_id_prefix: DEFAULT_STAR_ID_PREFIX.to_string(),
            star_id_width: DEFAULT_STAR_ID_WIDTH,
            parallel_parse: false,
            report_entry_limit: None,
        }
    }
}
