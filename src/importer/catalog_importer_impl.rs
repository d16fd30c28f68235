// ==========================================
// 影片目录 XML 导入 - 导入管道实现
// ==========================================
// 职责: 整合导入流程,从三个 XML 文件到目标库
// 流程: 解析(可并行) → 对账移交 → 代理键分配 → 单事务落库 → 运行报告
// 红线:
//   - 单文件解析失败只中止该文件,其余文件继续
//   - 全部解析结束后才分配代理键和落库
//   - 落库失败时目标库保持运行前状态,报告中写明
// ==========================================

use crate::config::PipelineConfigReader;
use crate::domain::diagnostics::{DiagnosticSource, DiagnosticsLog};
use crate::domain::report::{LoadOutcome, RunReport, SourceStatus};
use crate::importer::casting_parser::CastingParser;
use crate::importer::catalog_importer_trait::{CatalogImporter, CatalogSources, DocumentParser};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::film_parser::FilmParser;
use crate::importer::genre_normalizer::GenreVocabulary;
use crate::importer::performer_parser::PerformerParser;
use crate::importer::reconciliation::ReconciliationStore;
use crate::importer::surrogate_key::SurrogateKeyAssigner;
use crate::repository::CatalogLoadRepository;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 单个文件的解析产出
struct ParseOutcome<T> {
    sink: T,
    log: DiagnosticsLog,
    status: SourceStatus,
}

/// 解析单个文件;致命错误转为诊断记录与文件状态
fn parse_source<P: DocumentParser>(parser: &P, path: &Path) -> ParseOutcome<P::Sink> {
    let start = Instant::now();
    let kind = parser.kind();
    let mut sink = P::Sink::default();
    let mut log = DiagnosticsLog::new();

    debug!(source = kind.label(), file = %path.display(), "开始解析");
    let error = match parser.parse_file(path, &mut sink, &mut log) {
        Ok(()) => {
            info!(
                source = kind.label(),
                file = %path.display(),
                anomalies = log.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "文件解析完成"
            );
            None
        }
        Err(e) => {
            error!(source = kind.label(), file = %path.display(), error = %e, "文件解析中止");
            log.error(
                DiagnosticSource::Pipeline,
                format!("{} {} 解析中止,已解析部分保留: {}", kind.label(), path.display(), e),
            );
            Some(e.to_string())
        }
    };

    ParseOutcome {
        sink,
        log,
        status: SourceStatus {
            kind,
            path: path.to_path_buf(),
            parsed: error.is_none(),
            error,
        },
    }
}

// ==========================================
// CatalogImporterImpl - 导入管道实现
// ==========================================
pub struct CatalogImporterImpl<R, C>
where
    R: CatalogLoadRepository,
    C: PipelineConfigReader,
{
    // 数据访问层
    load_repo: R,

    // 配置读取器
    config: C,

    // 解析组件
    performer_parser: PerformerParser,
    film_parser: FilmParser,
    casting_parser: CastingParser,
}

impl<R, C> CatalogImporterImpl<R, C>
where
    R: CatalogLoadRepository,
    C: PipelineConfigReader,
{
    /// 创建导入管道(标准类型词表)
    ///
    /// # 参数
    /// - load_repo: 目录落库仓储
    /// - config: 配置读取器
    pub fn new(load_repo: R, config: C) -> Self {
        Self::with_vocabulary(load_repo, config, GenreVocabulary::standard())
    }

    /// 创建导入管道(指定类型词表)
    pub fn with_vocabulary(load_repo: R, config: C, vocabulary: &'static GenreVocabulary) -> Self {
        Self {
            load_repo,
            config,
            performer_parser: PerformerParser,
            film_parser: FilmParser::new(vocabulary),
            casting_parser: CastingParser,
        }
    }

    pub fn load_repo(&self) -> &R {
        &self.load_repo
    }

    /// 依次解析三个文件
    fn parse_sequential(&self, sources: &CatalogSources) -> ParsedSources {
        (
            parse_source(&self.performer_parser, &sources.performers),
            parse_source(&self.film_parser, &sources.films),
            parse_source(&self.casting_parser, &sources.castings),
        )
    }

    /// 并行解析三个文件(各自独立日志,合并顺序不变)
    fn parse_parallel(&self, sources: &CatalogSources) -> ImportResult<ParsedSources> {
        let performer_parser = &self.performer_parser;
        let film_parser = &self.film_parser;
        let casting_parser = &self.casting_parser;

        std::thread::scope(|scope| {
            let performers = scope.spawn(|| parse_source(performer_parser, &sources.performers));
            let films = scope.spawn(|| parse_source(film_parser, &sources.films));
            let castings = parse_source(casting_parser, &sources.castings);

            let performers = performers
                .join()
                .map_err(|_| ImportError::InternalError("演员文件解析线程异常退出".to_string()))?;
            let films = films
                .join()
                .map_err(|_| ImportError::InternalError("影片文件解析线程异常退出".to_string()))?;
            Ok((performers, films, castings))
        })
    }
}

type ParsedSources = (
    ParseOutcome<crate::importer::reconciliation::StarCollection>,
    ParseOutcome<crate::importer::reconciliation::MovieCollection>,
    ParseOutcome<crate::importer::reconciliation::CastingCollection>,
);

impl<R, C> CatalogImporter for CatalogImporterImpl<R, C>
where
    R: CatalogLoadRepository,
    C: PipelineConfigReader,
{
    #[instrument(skip(self, sources), fields(run_id))]
    fn run(&self, sources: &CatalogSources) -> ImportResult<RunReport> {
        let start = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let config = self.config.load_pipeline_config()?;
        info!(
            run_id = %run_id,
            performers = %sources.performers.display(),
            films = %sources.films.display(),
            castings = %sources.castings.display(),
            parallel = config.parallel_parse,
            batch_size = config.batch_size,
            "开始导入影片目录"
        );

        // === 步骤 1: 解析 ===
        let (performers, films, castings) = if config.parallel_parse {
            self.parse_parallel(sources)?
        } else {
            self.parse_sequential(sources)
        };

        let mut diagnostics = DiagnosticsLog::new();
        diagnostics.append(performers.log);
        diagnostics.append(films.log);
        diagnostics.append(castings.log);
        let statuses = vec![performers.status, films.status, castings.status];

        // === 步骤 2-3: 对账移交 + 代理键 ===
        let store = ReconciliationStore::new(performers.sink, films.sink, castings.sink);
        let assigner = SurrogateKeyAssigner::new(config.star_id_prefix.clone(), config.star_id_width);
        let dataset = store.finalize(&assigner);
        let stats = dataset.stats();
        info!(
            stars = stats.unique_stars,
            keyed_movies = stats.keyed_movies,
            unkeyed_movies = stats.unkeyed_movies,
            genres = stats.unique_genres,
            castings = stats.castings,
            "解析与对账完成"
        );

        // === 步骤 4: 落库 ===
        let outcome = match self
            .load_repo
            .load_dataset(&dataset, config.batch_size, &mut diagnostics)
        {
            Ok(summary) => LoadOutcome::Committed(summary),
            Err(e) => {
                error!(error = %e, "目录落库失败,事务已回滚");
                diagnostics.critical(
                    DiagnosticSource::Loader,
                    format!("目标库写入失败,事务已回滚,目标库未被修改: {}", e),
                );
                LoadOutcome::RolledBack {
                    error: e.to_string(),
                }
            }
        };
        drop(dataset);

        let finished_at = Utc::now();
        let elapsed_ms = start.elapsed().as_millis() as u64;
        if statuses.iter().any(|s| !s.parsed) {
            warn!(run_id = %run_id, "部分输入文件解析中止,结果为部分导入");
        }
        info!(
            run_id = %run_id,
            committed = outcome.is_committed(),
            anomalies = diagnostics.len(),
            elapsed_ms,
            "影片目录导入结束"
        );

        Ok(RunReport {
            run_id,
            started_at,
            finished_at,
            elapsed_ms,
            sources: statuses,
            dataset: stats,
            outcome,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::db::ensure_catalog_schema;
    use crate::repository::CatalogLoadRepositoryImpl;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn importer(config: PipelineConfig) -> CatalogImporterImpl<CatalogLoadRepositoryImpl, PipelineConfig> {
        let conn = Connection::open_in_memory().unwrap();
        ensure_catalog_schema(&conn).unwrap();
        let repo = CatalogLoadRepositoryImpl::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        CatalogImporterImpl::new(repo, config)
    }

    #[test]
    fn test_missing_file_does_not_stop_other_files() {
        let actors = write_temp("<actors><actor><stagename>Al Pacino</stagename><dob>1940</dob></actor></actors>");
        let casts = write_temp("<casts><m><f>F1</f><a>Al Pacino</a></m></casts>");
        let sources = CatalogSources::new(actors.path(), "does_not_exist_mains.xml", casts.path());

        let report = importer(PipelineConfig::default()).run(&sources).unwrap();

        assert!(report.outcome.is_committed());
        assert!(report.sources[0].parsed);
        assert!(!report.sources[1].parsed);
        assert_eq!(report.dataset.unique_stars, 1);
        assert!(report.diagnostics.contains_all(&["does_not_exist_mains.xml", "解析中止"]));
        // 影片缺失,出演关系引用未知影片
        assert_eq!(report.outcome.summary().unwrap().castings_unknown_movie, 1);
    }

    #[test]
    fn test_custom_key_format_is_applied() {
        let actors = write_temp("<actors><actor><stagename>A</stagename></actor></actors>");
        let films = write_temp("<movies></movies>");
        let casts = write_temp("<casts></casts>");
        let config = PipelineConfig {
            star_id_prefix: "st".to_string(),
            star_id_width: 3,
            ..PipelineConfig::default()
        };
        let importer = importer(config);

        importer
            .run(&CatalogSources::new(actors.path(), films.path(), casts.path()))
            .unwrap();
        assert_eq!(importer.load_repo().count_rows().unwrap().stars, 1);
    }
}
