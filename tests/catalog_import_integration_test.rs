// ==========================================
// CatalogImporter 集成测试
// ==========================================
// 测试目标: 验证 解析 → 对账 → 代理键 → 落库 → 报告 的完整流程
// ==========================================


use movie_catalog_etl::config::{ConfigManager, PipelineConfig};
use movie_catalog_etl::domain::{DiagnosticLevel, DiagnosticSource, LoadOutcome};
use movie_catalog_etl::importer::{CatalogImporter, CatalogImporterImpl};
use movie_catalog_etl::logging;
use movie_catalog_etl::repository::CatalogLoadRepositoryImpl;
use rusqlite::OptionalExtension;
use test_helpers::{
    create_test_db, open_test_conn, table_counts, write_sample_sources, write_sources,
    SAMPLE_ACTORS_XML, SAMPLE_CASTS_XML,
};

/// 创建测试用的 CatalogImporter 实例(配置来自 config_kv)
fn create_test_importer(db_path: &str) -> CatalogImporterImpl<CatalogLoadRepositoryImpl, ConfigManager> {
    let repo = CatalogLoadRepositoryImpl::new(db_path).expect("Failed to create CatalogLoadRepository");
    let config = ConfigManager::new(db_path).expect("Failed to create ConfigManager");
    CatalogImporterImpl::new(repo, config)
}

/// 创建测试用的 CatalogImporter 实例(固定配置)
fn create_importer_with_config(
    db_path: &str,
    config: PipelineConfig,
) -> CatalogImporterImpl<CatalogLoadRepositoryImpl, PipelineConfig> {
    let repo = CatalogLoadRepositoryImpl::new(db_path).expect("Failed to create CatalogLoadRepository");
    CatalogImporterImpl::new(repo, config)
}

#[test]
fn test_import_sample_catalog() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().unwrap();
    let (_dir, sources) = write_sample_sources().unwrap();

    let report = create_test_importer(&db_path).run(&sources).unwrap();

    // 解析汇总
    assert!(report.sources.iter().all(|s| s.parsed));
    assert_eq!(report.dataset.unique_stars, 3);
    assert_eq!(report.dataset.keyed_movies, 3);
    assert_eq!(report.dataset.unkeyed_movies, 1);
    assert_eq!(report.dataset.unique_genres, 3);
    assert_eq!(report.dataset.castings, 6);

    // 落库汇总
    let summary = match &report.outcome {
        LoadOutcome::Committed(summary) => *summary,
        LoadOutcome::RolledBack { error } => panic!("unexpected rollback: {}", error),
    };
    assert_eq!(summary.stars_inserted, 3);
    assert_eq!(summary.movies_inserted, 3);
    assert_eq!(summary.genres_inserted, 3);
    assert_eq!(summary.genre_links_inserted, 3);
    assert_eq!(summary.cast_links_inserted, 3);
    assert_eq!(summary.castings_unknown_actor, 1);
    assert_eq!(summary.castings_unknown_movie, 1);
    assert_eq!(summary.unkeyed_movies_skipped, 1);

    let conn = open_test_conn(&db_path);
    assert_eq!(table_counts(&conn), [3, 3, 3, 3, 3]);

    // 代理键按艺名有序分配
    let (id, birth_year): (String, Option<i32>) = conn
        .query_row(
            "SELECT id, birthYear FROM stars WHERE name = 'Al Pacino'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(id, "nm00001");
    assert_eq!(birth_year, Some(1941));

    let kilmer_year: Option<i32> = conn
        .query_row("SELECT birthYear FROM stars WHERE name = 'Val Kilmer'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(kilmer_year, None);

    // 罗马数字年份写入 0
    let thief_year: i32 = conn
        .query_row("SELECT year FROM movies WHERE id = 'F002'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(thief_year, 0);

    // 空标题影片不落库
    let f004: Option<String> = conn
        .query_row("SELECT title FROM movies WHERE id = 'F004'", [], |row| row.get(0))
        .optional()
        .unwrap();
    assert!(f004.is_none());
}

#[test]
fn test_group_director_wins_and_mismatch_is_logged() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let (_dir, sources) = write_sample_sources().unwrap();

    let report = create_test_importer(&db_path).run(&sources).unwrap();

    let conn = open_test_conn(&db_path);
    let director: Option<String> = conn
        .query_row("SELECT director FROM movies WHERE id = 'F003'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(director.as_deref(), Some("Smith"));
    assert!(report.diagnostics.contains_all(&["Smith", "Jones"]));
}

#[test]
fn test_diagnostics_cover_every_anomaly() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let (_dir, sources) = write_sample_sources().unwrap();

    let log = create_test_importer(&db_path).run(&sources).unwrap().diagnostics;

    assert!(log.contains_all(&["重复演员", "Al Pacino"]));
    assert!(log.contains_all(&["Val Kilmer", "19xx"]));
    assert!(log.contains_all(&["缺少艺名"]));
    assert!(log.contains_all(&["MCMLXXXI", "Thief"]));
    assert!(log.contains_all(&["bogus", "Thief"]));
    assert!(log.contains_all(&["Lost Reel", "FID"]));
    assert!(log.contains_all(&["缺少标题", "F004"]));
    assert!(log.contains_all(&["film FID", "Al Pacino"]));
    assert!(log.contains_all(&["F999", "Robert De Niro"]));
    assert!(log.contains_all(&["未落库", "Lost Reel"]));

    // 未知演员的出演关系静默跳过
    assert!(!log.contains_all(&["Unknown Person"]));
    // 空/NULL 类型 token 不记录
    assert!(!log.contains_all(&["NULL"]));
    assert_eq!(log.count_level(DiagnosticLevel::Critical), 0);

    // 合并顺序: 演员 → 影片 → 出演 → 落库
    let order: Vec<DiagnosticSource> = log.entries().iter().map(|e| e.source).collect();
    let rank = |s: &DiagnosticSource| match s {
        DiagnosticSource::Performers => 0,
        DiagnosticSource::Films => 1,
        DiagnosticSource::Castings => 2,
        DiagnosticSource::Loader => 3,
        DiagnosticSource::Pipeline => 4,
    };
    assert!(order.windows(2).all(|w| rank(&w[0]) <= rank(&w[1])));
}

#[test]
fn test_rerun_is_idempotent() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let (_dir, sources) = write_sample_sources().unwrap();
    let importer = create_test_importer(&db_path);

    importer.run(&sources).unwrap();
    let conn = open_test_conn(&db_path);
    let first = table_counts(&conn);

    let second_report = importer.run(&sources).unwrap();
    let summary = second_report.outcome.summary().copied().unwrap();
    assert_eq!(summary.stars_inserted, 0);
    assert_eq!(summary.movies_inserted, 0);
    assert_eq!(summary.genres_inserted, 0);
    assert_eq!(summary.genre_links_inserted, 0);
    assert_eq!(summary.cast_links_inserted, 0);
    assert_eq!(table_counts(&conn), first);
}

#[test]
fn test_write_failure_rolls_back_everything() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let (_dir, sources) = write_sample_sources().unwrap();

    let conn = open_test_conn(&db_path);
    conn.execute_batch(
        r#"
        INSERT INTO stars (id, name, birthYear) VALUES ('nm99999', 'Existing Star', 1900);
        INSERT INTO genres (name) VALUES ('Drama');
        CREATE TRIGGER fail_on_suspense BEFORE INSERT ON genres
        WHEN NEW.name = 'Suspense'
        BEGIN
            SELECT RAISE(ABORT, 'injected genre failure');
        END;
        "#,
    )
    .unwrap();
    let before = table_counts(&conn);

    let report = create_test_importer(&db_path).run(&sources).unwrap();

    match &report.outcome {
        LoadOutcome::RolledBack { error } => assert!(error.contains("injected genre failure")),
        LoadOutcome::Committed(_) => panic!("expected rollback"),
    }
    assert_eq!(table_counts(&conn), before);
    assert_eq!(report.diagnostics.count_level(DiagnosticLevel::Critical), 1);

    let text = report.render_text(None);
    assert!(text.contains("已回滚,目标库未被修改"));
    assert!(text.contains("injected genre failure"));
}

#[test]
fn test_malformed_file_keeps_partial_results() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let mains = "<movies><directorfilms><director><dirname>Smith</dirname></director><films>\
        <film><fid>F001</fid><t>Heat</t><year>1995</year></film>\
        <film><fid>F002</fid><t>Broken</t><year>1990</yr></film>\
        </films></directorfilms></movies>";
    let (_dir, sources) =
        write_sources(SAMPLE_ACTORS_XML.as_bytes(), mains.as_bytes(), SAMPLE_CASTS_XML.as_bytes()).unwrap();

    let report = create_test_importer(&db_path).run(&sources).unwrap();

    assert!(report.sources[0].parsed);
    assert!(!report.sources[1].parsed);
    assert!(report.sources[2].parsed);
    assert!(report.outcome.is_committed());
    assert_eq!(report.dataset.keyed_movies, 1);
    assert_eq!(report.diagnostics.count_level(DiagnosticLevel::Error), 1);
    assert!(report.render_text(None).contains("[中止]"));

    let conn = open_test_conn(&db_path);
    let movie_count: i64 = conn.query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0)).unwrap();
    assert_eq!(movie_count, 1);
}

#[test]
fn test_latin1_input_is_decoded() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let actors: &[u8] =
        b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><actors><actor><stagename>Ren\xe9 Clair</stagename><dob>1898</dob></actor></actors>";
    let (_dir, sources) = write_sources(actors, b"<movies></movies>", b"<casts></casts>").unwrap();

    create_test_importer(&db_path).run(&sources).unwrap();

    let conn = open_test_conn(&db_path);
    let name: String = conn
        .query_row("SELECT name FROM stars WHERE id = 'nm00001'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "Ren\u{e9} Clair");
}

#[test]
fn test_parallel_parse_matches_sequential() {
    let (_dir, sources) = write_sample_sources().unwrap();

    let (_seq_file, seq_db) = create_test_db().unwrap();
    let sequential = create_importer_with_config(&seq_db, PipelineConfig::default())
        .run(&sources)
        .unwrap();

    let (_par_file, par_db) = create_test_db().unwrap();
    let parallel_config = PipelineConfig {
        parallel_parse: true,
        ..PipelineConfig::default()
    };
    let parallel = create_importer_with_config(&par_db, parallel_config)
        .run(&sources)
        .unwrap();

    assert_eq!(sequential.diagnostics.entries(), parallel.diagnostics.entries());
    assert_eq!(sequential.dataset, parallel.dataset);
    assert_eq!(
        table_counts(&open_test_conn(&seq_db)),
        table_counts(&open_test_conn(&par_db))
    );
}

#[test]
fn test_report_files_are_written() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let (dir, sources) = write_sample_sources().unwrap();

    let report = create_test_importer(&db_path).run(&sources).unwrap();

    let report_path = dir.path().join("import_report.txt");
    report.write_text(&report_path, Some(3)).unwrap();
    let text = std::fs::read_to_string(&report_path).unwrap();
    assert!(text.contains("状态: 已提交"));
    assert!(text.contains("唯一演员数: 3"));
    assert!(text.contains(&format!("另有 {} 条未显示", report.diagnostics.len() - 3)));

    let json = report.to_json().unwrap();
    assert!(json.contains(&report.run_id));
}
