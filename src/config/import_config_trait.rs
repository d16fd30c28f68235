// ==========================================
// 影片目录 XML 导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口(不包含实现)
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::pipeline_config::PipelineConfig;
use crate::importer::error::ImportResult;

// ==========================================
// PipelineConfigReader Trait
// ==========================================
// 用途: 导入管道所需的配置读取接口
// 实现者: ConfigManager(从 config_kv 表读取), PipelineConfig(固定配置)
pub trait PipelineConfigReader: Send + Sync {
    /// 获取每批写入行数
    ///
    /// # 默认值
    /// - 500
    fn get_batch_size(&self) -> ImportResult<usize>;

    /// 获取演员代理键前缀
    ///
    /// # 默认值
    /// - "nm"
    fn get_star_id_prefix(&self) -> ImportResult<String>;

    /// 获取演员代理键序号宽度
    ///
    /// # 默认值
    /// - 5
    fn get_star_id_width(&self) -> ImportResult<usize>;

    /// 是否并行解析三个输入文件
    ///
    /// # 默认值
    /// - false
    fn get_parallel_parse(&self) -> ImportResult<bool>;

    /// 获取文本报告诊断条数上限
    ///
    /// # 返回
    /// - None: 不限
    fn get_report_entry_limit(&self) -> ImportResult<Option<usize>>;

    /// 一次性读取全部管道配置
    fn load_pipeline_config(&self) -> ImportResult<PipelineConfig> {
        Ok(PipelineConfig {
            batch_size: self.get_batch_size()?,
            star_id_prefix: self.get_star_id_prefix()?,
            star_id_width: self.get_star_id_width()?,
            parallel_parse: self.get_parallel_parse()?,
            report_entry_limit: self.get_report_entry_limit()?,
        })
    }
}

// 固定配置(测试注入 / 嵌入调用)
impl PipelineConfigReader for PipelineConfig {
    fn get_batch_size(&self) -> ImportResult<usize> {
        Ok(self.batch_size)
    }

    fn get_star_id_prefix(&self) -> ImportResult<String> {
        Ok(self.star_id_prefix.clone())
    }

    fn get_star_id_width(&self) -> ImportResult<usize> {
        Ok(self.star_id_width)
    }

    fn get_parallel_parse(&self) -> ImportResult<bool> {
        Ok(self.parallel_parse)
    }

    fn get_report_entry_limit(&self) -> ImportResult<Option<usize>> {
        Ok(self.report_entry_limit)
    }
}
