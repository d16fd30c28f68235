// ==========================================
// 影片目录 XML 导入 - 运行报告
// ==========================================
// 职责: 汇总一次导入运行的解析统计、落库结果与诊断日志
// 输出: 人类可读文本报告(运行结束时写出一次) + JSON
// ==========================================

use crate::domain::catalog::DatasetStats;
use crate::domain::diagnostics::DiagnosticsLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

// ==========================================
// SourceKind - 输入文件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Performers,
    Films,
    Castings,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Performers => "演员文件",
            SourceKind::Films => "影片文件",
            SourceKind::Castings => "出演关系文件",
        }
    }
}

// ==========================================
// SourceStatus - 单个文件的解析结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStatus {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub parsed: bool,           // false = 解析中途致命错误
    pub error: Option<String>,  // 致命错误描述
}

// ==========================================
// LoadSummary - 落库各步骤写入统计
// ==========================================
// 计数为实际新增行数(重复行被忽略,不计入)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub stars_inserted: usize,
    pub movies_inserted: usize,
    pub genres_inserted: usize,
    pub genre_links_inserted: usize,
    pub cast_links_inserted: usize,
    pub castings_unknown_actor: usize, // 演员未知,静默跳过
    pub castings_unknown_movie: usize, // 影片未知,记录后跳过
    pub unkeyed_movies_skipped: usize, // 无 FID 影片,不落库
}

// ==========================================
// LoadOutcome - 落库结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoadOutcome {
    Committed(LoadSummary),
    RolledBack { error: String },
}

impl LoadOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, LoadOutcome::Committed(_))
    }

    pub fn summary(&self) -> Option<&LoadSummary> {
        match self {
            LoadOutcome::Committed(summary) => Some(summary),
            LoadOutcome::RolledBack { .. } => None,
        }
    }
}

// ==========================================
// RunReport - 运行报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub sources: Vec<SourceStatus>,
    pub dataset: DatasetStats,
    pub outcome: LoadOutcome,
    pub diagnostics: DiagnosticsLog,
}

impl RunReport {
    /// 渲染文本报告
    ///
    /// # 参数
    /// - entry_limit: 最多输出的诊断条数(None = 全部输出)
    pub fn render_text(&self, entry_limit: Option<usize>) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "==========================================");
        let _ = writeln!(out, "影片目录导入报告");
        let _ = writeln!(out, "==========================================");
        let _ = writeln!(out, "运行 ID: {}", self.run_id);
        let _ = writeln!(out, "开始时间: {}", self.started_at.to_rfc3339());
        let _ = writeln!(out, "结束时间: {}", self.finished_at.to_rfc3339());
        let _ = writeln!(out, "耗时: {} ms", self.elapsed_ms);
        let _ = writeln!(out);

        let _ = writeln!(out, "--- 输入文件 ---");
        for source in &self.sources {
            match &source.error {
                None => {
                    let _ = writeln!(out, "{}: {} [完成]", source.kind.label(), source.path.display());
                }
                Some(err) => {
                    let _ = writeln!(
                        out,
                        "{}: {} [中止] {}",
                        source.kind.label(),
                        source.path.display(),
                        err
                    );
                }
            }
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "--- 解析汇总 ---");
        let _ = writeln!(out, "唯一演员数: {}", self.dataset.unique_stars);
        let _ = writeln!(out, "有 FID 影片数: {}", self.dataset.keyed_movies);
        let _ = writeln!(out, "无 FID 影片数: {}", self.dataset.unkeyed_movies);
        let _ = writeln!(out, "唯一类型数: {}", self.dataset.unique_genres);
        let _ = writeln!(out, "出演关系数: {}", self.dataset.castings);
        let _ = writeln!(out);

        let _ = writeln!(out, "--- 落库结果 ---");
        match &self.outcome {
            LoadOutcome::Committed(summary) => {
                let _ = writeln!(out, "状态: 已提交");
                let _ = writeln!(out, "新增演员: {}", summary.stars_inserted);
                let _ = writeln!(out, "新增影片: {}", summary.movies_inserted);
                let _ = writeln!(out, "新增类型: {}", summary.genres_inserted);
                let _ = writeln!(out, "新增影片-类型关联: {}", summary.genre_links_inserted);
                let _ = writeln!(out, "新增演员-影片关联: {}", summary.cast_links_inserted);
                let _ = writeln!(out, "跳过(演员未知): {}", summary.castings_unknown_actor);
                let _ = writeln!(out, "跳过(影片未知): {}", summary.castings_unknown_movie);
                let _ = writeln!(out, "未落库(无 FID 影片): {}", summary.unkeyed_movies_skipped);
            }
            LoadOutcome::RolledBack { error } => {
                let _ = writeln!(out, "状态: 已回滚,目标库未被修改");
                let _ = writeln!(out, "原因: {}", error);
            }
        }
        let _ = writeln!(out);

        let total = self.diagnostics.len();
        if total == 0 {
            let _ = writeln!(out, "未发现数据异常。");
            return out;
        }

        let _ = writeln!(out, "--- 数据异常 ({}) ---", total);
        let shown = entry_limit.map_or(total, |limit| limit.min(total));
        for entry in self.diagnostics.entries().iter().take(shown) {
            let _ = writeln!(out, "{}", entry);
        }
        if shown < total {
            let _ = writeln!(out, "... 另有 {} 条未显示", total - shown);
        }

        out
    }

    /// 写出文本报告
    pub fn write_text(&self, path: &Path, entry_limit: Option<usize>) -> std::io::Result<()> {
        std::fs::write(path, self.render_text(entry_limit))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
