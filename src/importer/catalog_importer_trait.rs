// ==========================================
// 影片目录 XML 导入 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口(不包含实现)
// 阶段: 流式解析 → 对账 → 代理键分配 → 事务落库
// ==========================================

use crate::domain::diagnostics::DiagnosticsLog;
use crate::domain::report::{RunReport, SourceKind};
use crate::importer::error::ImportResult;
use crate::importer::stream_parser::open_source;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

// ==========================================
// CatalogSources - 三个输入文件
// ==========================================
#[derive(Debug, Clone)]
pub struct CatalogSources {
    pub performers: PathBuf, // 演员文件 (actors)
    pub films: PathBuf,      // 影片文件 (mains)
    pub castings: PathBuf,   // 出演关系文件 (casts)
}

impl CatalogSources {
    pub fn new(
        performers: impl Into<PathBuf>,
        films: impl Into<PathBuf>,
        castings: impl Into<PathBuf>,
    ) -> Self {
        Self {
            performers: performers.into(),
            films: films.into(),
            castings: castings.into(),
        }
    }

    pub fn path_of(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Performers => &self.performers,
            SourceKind::Films => &self.films,
            SourceKind::Castings => &self.castings,
        }
    }
}

// ==========================================
// CatalogImporter Trait
// ==========================================
// 用途: 导入主接口
// 实现者: CatalogImporterImpl
pub trait CatalogImporter: Send + Sync {
    /// 执行一次完整导入
    ///
    /// # 参数
    /// - sources: 三个输入文件路径
    ///
    /// # 返回
    /// - Ok(RunReport): 运行报告(包含落库已回滚的情况)
    /// - Err: 运行无法开始(例如配置读取失败)
    ///
    /// # 导入流程
    /// 1. 解析演员 / 影片 / 出演关系三个文件(单文件失败不影响其余文件)
    /// 2. 对账结果移交为 ReconciledDataset
    /// 3. 分配演员代理键
    /// 4. 单事务落库
    /// 5. 生成运行报告
    fn run(&self, sources: &CatalogSources) -> ImportResult<RunReport>;
}

// ==========================================
// DocumentParser Trait
// ==========================================
// 用途: 单文档流式解析接口
// 实现者: PerformerParser, FilmParser, CastingParser
pub trait DocumentParser: Send + Sync {
    /// 解析结果容器
    type Sink: Default + Send;

    fn kind(&self) -> SourceKind;

    /// 从任意字节流解析
    ///
    /// # 参数
    /// - reader: ISO-8859-1 编码的 XML 字节流
    /// - sink: 解析出的记录写入此处;出错时已解析的记录保留
    /// - log: 本解析器独占的诊断日志
    ///
    /// # 返回
    /// - Err: 文件级致命错误(标记错误 / 读取错误)
    fn parse_reader<R: BufRead>(
        &self,
        reader: R,
        sink: &mut Self::Sink,
        log: &mut DiagnosticsLog,
    ) -> ImportResult<()>;

    /// 从文件解析
    fn parse_file(
        &self,
        path: &Path,
        sink: &mut Self::Sink,
        log: &mut DiagnosticsLog,
    ) -> ImportResult<()> {
        let reader = open_source(path)?;
        self.parse_reader(reader, sink, log)
    }
}

// ==========================================
// FieldCleaner Trait
// ==========================================
// 用途: 字段级清洗与数值解析
// 实现者: FieldCleaner
pub trait FieldCleaner: Send + Sync {
    /// 标准化空值(空字符串/空白 → None)
    fn normalize_null(&self, value: &str) -> Option<String>;

    /// 解析影片年份
    ///
    /// # 返回
    /// - Ok(Some(year)): 合法年份
    /// - Ok(None): 空值(不记录)
    /// - Err(YearRejection): 占位值 / 罗马数字 / 非数字
    fn parse_film_year(&self, value: &str) -> Result<Option<i32>, YearRejection>;

    /// 解析演员出生年份
    ///
    /// # 返回
    /// - Ok(None): 空值(不记录)
    /// - Err(()): 非整数
    fn parse_birth_year(&self, value: &str) -> Result<Option<i32>, ()>;
}

/// 年份拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearRejection {
    Placeholder,  // "0" / "undated"
    RomanNumeral, // 例如 "MCMXC"
    NotANumber,
}

impl YearRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            YearRejection::Placeholder => "占位年份",
            YearRejection::RomanNumeral => "罗马数字年份",
            YearRejection::NotANumber => "非数字年份",
        }
    }
}

// ==========================================
// KeyAssigner Trait
// ==========================================
// 用途: 演员代理键分配
// 实现者: SurrogateKeyAssigner
pub trait KeyAssigner: Send + Sync {
    /// 为全部艺名分配代理键
    ///
    /// # 参数
    /// - stage_names: 艺名序列(按此顺序递增编号,重复名只分配一次)
    ///
    /// # 返回
    /// - 艺名 → 代理键,一一对应,无空号
    fn assign(&self, stage_names: &[&str]) -> BTreeMap<String, String>;
}
