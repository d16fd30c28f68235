// ==========================================
// 影片目录 XML 导入 - 诊断日志
// ==========================================
// 职责: 按发生顺序记录导入过程中的每一条数据异常
// 红线: 只追加,不删除;仅供运维人员审阅,管道内不读取
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// DiagnosticSource - 异常来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticSource {
    Performers, // 演员文件
    Films,      // 影片文件
    Castings,   // 出演关系文件
    Loader,     // 落库阶段
    Pipeline,   // 管道编排
}

impl DiagnosticSource {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticSource::Performers => "演员",
            DiagnosticSource::Films => "影片",
            DiagnosticSource::Castings => "出演",
            DiagnosticSource::Loader => "落库",
            DiagnosticSource::Pipeline => "管道",
        }
    }
}

// ==========================================
// DiagnosticLevel - 异常级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Warning,  // 字段级/引用级异常,已就地恢复
    Error,    // 单个文件解析中止
    Critical, // 落库失败,事务已回滚
}

impl DiagnosticLevel {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticLevel::Warning => "WARN",
            DiagnosticLevel::Error => "ERROR",
            DiagnosticLevel::Critical => "CRITICAL",
        }
    }
}

// ==========================================
// DiagnosticEntry - 单条诊断记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub source: DiagnosticSource,
    pub level: DiagnosticLevel,
    pub message: String,
}

impl fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}][{}] {}",
            self.level.label(),
            self.source.label(),
            self.message
        )
    }
}

// ==========================================
// DiagnosticsLog - 诊断日志
// ==========================================
// 并发解析时每个解析器持有独立的 DiagnosticsLog,
// 解析结束后按 演员 → 影片 → 出演 顺序 append 合并
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsLog {
    entries: Vec<DiagnosticEntry>,
}

impl DiagnosticsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条记录
    pub fn record(
        &mut self,
        source: DiagnosticSource,
        level: DiagnosticLevel,
        message: impl Into<String>,
    ) {
        let entry = DiagnosticEntry {
            source,
            level,
            message: message.into(),
        };
        tracing::debug!(source = source.label(), level = level.label(), message = %entry.message, "诊断记录");
        self.entries.push(entry);
    }

    pub fn warn(&mut self, source: DiagnosticSource, message: impl Into<String>) {
        self.record(source, DiagnosticLevel::Warning, message);
    }

    pub fn error(&mut self, source: DiagnosticSource, message: impl Into<String>) {
        self.record(source, DiagnosticLevel::Error, message);
    }

    pub fn critical(&mut self, source: DiagnosticSource, message: impl Into<String>) {
        self.record(source, DiagnosticLevel::Critical, message);
    }

    /// 合并另一份日志(保持对方内部顺序,整体排在本日志之后)
    pub fn append(&mut self, other: DiagnosticsLog) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[DiagnosticEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 统计指定级别的条数
    pub fn count_level(&self, level: DiagnosticLevel) -> usize {
        self.entries.iter().filter(|e| e.level == level).count()
    }

    /// 是否存在包含全部片段的记录(运维检索 / 测试断言用)
    pub fn contains_all(&self, fragments: &[&str]) -> bool {
        self.entries
            .iter()
            .any(|e| fragments.iter().all(|f| e.message.contains(f)))
    }
}
