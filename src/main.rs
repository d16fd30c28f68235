// ==========================================
// 影片目录 XML 导入 - 命令行入口
// ==========================================
// 用法:
//   movie-catalog-etl <actors.xml> <mains.xml> <casts.xml> <db_path> [report_path]
//
// 说明:
// - report_path 默认为 import_report.txt,同目录另写一份 .json
// - 落库回滚时以非零状态码退出
// - ETL_LOG_FORMAT=json 时输出 JSON 格式运行日志
// ==========================================

use anyhow::{bail, Context};
use movie_catalog_etl::config::{ConfigManager, PipelineConfigReader};
use movie_catalog_etl::db::{ensure_catalog_schema, open_sqlite_connection, read_schema_version};
use movie_catalog_etl::importer::{CatalogImporter, CatalogImporterImpl, CatalogSources};
use movie_catalog_etl::repository::CatalogLoadRepositoryImpl;
use movie_catalog_etl::{logging, APP_NAME, VERSION};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const DEFAULT_REPORT_PATH: &str = "import_report.txt";

fn main() -> anyhow::Result<()> {
    if std::env::var("ETL_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        logging::init_json();
    } else {
        logging::init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 4 {
        bail!(
            "用法: movie-catalog-etl <actors.xml> <mains.xml> <casts.xml> <db_path> [report_path]"
        );
    }

    let sources = CatalogSources::new(&args[0], &args[1], &args[2]);
    let db_path = &args[3];
    let report_path = PathBuf::from(args.get(4).map_or(DEFAULT_REPORT_PATH, String::as_str));

    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!(db_path = %db_path, "使用数据库");

    let conn = open_sqlite_connection(db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;
    ensure_catalog_schema(&conn).context("建立目录表结构失败")?;
    let schema_version = read_schema_version(&conn)?;
    tracing::info!(schema_version = ?schema_version, "目录表结构就绪");

    let conn = Arc::new(Mutex::new(conn));
    let config = ConfigManager::from_connection(conn.clone())?;
    let entry_limit = config.get_report_entry_limit()?;
    let repo = CatalogLoadRepositoryImpl::from_connection(conn)?;

    let importer = CatalogImporterImpl::new(repo, config);
    let report = importer.run(&sources)?;

    report
        .write_text(&report_path, entry_limit)
        .with_context(|| format!("写出报告失败: {}", report_path.display()))?;
    let json_path = report_path.with_extension("json");
    std::fs::write(&json_path, report.to_json()?)
        .with_context(|| format!("写出报告失败: {}", json_path.display()))?;

    tracing::info!(
        report = %report_path.display(),
        anomalies = report.diagnostics.len(),
        "运行报告已写出"
    );

    if !report.outcome.is_committed() {
        bail!("目录落库失败,目标库未被修改,详见 {}", report_path.display());
    }
    Ok(())
}
