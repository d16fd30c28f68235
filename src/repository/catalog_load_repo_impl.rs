// ==========================================
// 影片目录 XML 导入 - 目录落库 Repository 实现
// ==========================================
// 职责: 按外键依赖顺序写入目录数据集(使用 rusqlite)
// 红线:
//   - 五个写入步骤严格串行,共用一个事务
//   - 任一写入失败 → 事务随 Transaction drop 回滚,目标库保持运行前状态
//   - 所有写入幂等(INSERT OR IGNORE / 先查后插)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::catalog::{MovieRecord, ReconciledDataset, StarRecord};
use crate::domain::diagnostics::{DiagnosticSource, DiagnosticsLog};
use crate::domain::report::LoadSummary;
use crate::repository::catalog_load_repo::{CatalogLoadRepository, CatalogRowCounts};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// 缺失年份写入值(movies.year 非空)
pub const MISSING_YEAR: i32 = 0;

// ==========================================
// CatalogLoadRepositoryImpl
// ==========================================
pub struct CatalogLoadRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogLoadRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建(与 ConfigManager 共用同一连接)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    // ===== 步骤 1: stars =====

    fn insert_stars_tx(
        tx: &Transaction,
        dataset: &ReconciledDataset,
        batch_size: usize,
    ) -> RepositoryResult<usize> {
        let rows: Vec<(&String, &StarRecord)> = dataset.stars.iter().collect();
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO stars (id, name, birthYear) VALUES (?1, ?2, ?3)")?;

        let mut inserted = 0;
        let mut written = 0;
        for chunk in rows.chunks(batch_size) {
            for (stage_name, star) in chunk {
                let star_id = dataset.star_ids.get(*stage_name).ok_or_else(|| {
                    RepositoryError::InconsistentDataset(format!("演员 '{}' 未分配代理键", stage_name))
                })?;
                inserted += stmt.execute(params![star_id, star.stage_name, star.birth_year])?;
            }
            written += chunk.len();
            tracing::info!(step = "stars", written, total = rows.len(), "批次写入完成");
        }

        Ok(inserted)
    }

    // ===== 步骤 2: movies =====

    fn insert_movies_tx(
        tx: &Transaction,
        dataset: &ReconciledDataset,
        batch_size: usize,
    ) -> RepositoryResult<usize> {
        let rows: Vec<(&String, &MovieRecord)> = dataset.keyed_movies.iter().collect();
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO movies (id, title, year, director) VALUES (?1, ?2, ?3, ?4)",
        )?;

        let mut inserted = 0;
        let mut written = 0;
        for chunk in rows.chunks(batch_size) {
            for (fid, movie) in chunk {
                inserted += stmt.execute(params![
                    fid.as_str(),
                    movie.title,
                    movie.year.unwrap_or(MISSING_YEAR),
                    movie.director,
                ])?;
            }
            written += chunk.len();
            tracing::info!(step = "movies", written, total = rows.len(), "批次写入完成");
        }

        Ok(inserted)
    }

    // ===== 步骤 3: genres =====

    /// 加载已有类型并插入缺失类型
    ///
    /// # 返回
    /// - (类型名 → id, 新增数)
    fn upsert_genres_tx(
        tx: &Transaction,
        dataset: &ReconciledDataset,
    ) -> RepositoryResult<(HashMap<String, i64>, usize)> {
        let mut genre_ids: HashMap<String, i64> = HashMap::new();
        {
            let mut stmt = tx.prepare("SELECT id, name FROM genres")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
            for row in rows {
                let (id, name) = row?;
                genre_ids.insert(name, id);
            }
        }

        let mut stmt = tx.prepare("INSERT INTO genres (name) VALUES (?1)")?;
        let mut inserted = 0;
        for name in &dataset.genres {
            if genre_ids.contains_key(name) {
                continue;
            }
            stmt.execute(params![name])?;
            genre_ids.insert(name.clone(), tx.last_insert_rowid());
            inserted += 1;
        }

        tracing::info!(step = "genres", inserted, known = genre_ids.len(), "类型写入完成");
        Ok((genre_ids, inserted))
    }

    // ===== 步骤 4: genres_in_movies =====

    fn insert_genre_links_tx(
        tx: &Transaction,
        dataset: &ReconciledDataset,
        genre_ids: &HashMap<String, i64>,
        batch_size: usize,
    ) -> RepositoryResult<usize> {
        let links: Vec<(&String, &String)> = dataset
            .keyed_movies
            .iter()
            .flat_map(|(fid, movie)| movie.genres.iter().map(move |genre| (fid, genre)))
            .collect();
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO genres_in_movies (genreId, movieId) VALUES (?1, ?2)")?;

        let mut inserted = 0;
        let mut written = 0;
        for chunk in links.chunks(batch_size) {
            for (fid, genre) in chunk {
                let genre_id = genre_ids.get(*genre).ok_or_else(|| {
                    RepositoryError::InconsistentDataset(format!("类型 '{}' 不在类型集合中", genre))
                })?;
                inserted += stmt.execute(params![*genre_id, fid.as_str()])?;
            }
            written += chunk.len();
            tracing::info!(step = "genres_in_movies", written, total = links.len(), "批次写入完成");
        }

        Ok(inserted)
    }

    // ===== 步骤 5: stars_in_movies =====

    fn insert_cast_links_tx(
        tx: &Transaction,
        dataset: &ReconciledDataset,
        batch_size: usize,
        summary: &mut LoadSummary,
        log: &mut DiagnosticsLog,
    ) -> RepositoryResult<usize> {
        let mut exists_stmt = tx.prepare("SELECT 1 FROM movies WHERE id = ?1")?;
        let mut insert_stmt =
            tx.prepare("INSERT OR IGNORE INTO stars_in_movies (starId, movieId) VALUES (?1, ?2)")?;
        let mut movie_known: HashMap<&str, bool> = HashMap::new();

        let mut inserted = 0;
        let mut written = 0;
        for chunk in dataset.castings.chunks(batch_size) {
            for casting in chunk {
                // 演员未知: 可能在演员文件中已被校验丢弃,静默跳过
                let Some(star_id) = dataset.star_ids.get(&casting.actor_name) else {
                    summary.castings_unknown_actor += 1;
                    continue;
                };

                let fid = casting.movie_fid.as_str();
                let known = match movie_known.get(fid) {
                    Some(known) => *known,
                    None => {
                        let known = dataset.keyed_movies.contains_key(fid)
                            || exists_stmt
                                .query_row(params![fid], |_row| Ok(()))
                                .optional()?
                                .is_some();
                        movie_known.insert(fid, known);
                        known
                    }
                };
                if !known {
                    summary.castings_unknown_movie += 1;
                    log.warn(
                        DiagnosticSource::Loader,
                        format!(
                            "出演关系引用未知影片 FID '{}' (演员 '{}'),已跳过",
                            fid, casting.actor_name
                        ),
                    );
                    continue;
                }

                inserted += insert_stmt.execute(params![star_id, fid])?;
            }
            written += chunk.len();
            tracing::info!(
                step = "stars_in_movies",
                written,
                total = dataset.castings.len(),
                "批次写入完成"
            );
        }

        Ok(inserted)
    }
}

impl CatalogLoadRepository for CatalogLoadRepositoryImpl {
    fn load_dataset(
        &self,
        dataset: &ReconciledDataset,
        batch_size: usize,
        log: &mut DiagnosticsLog,
    ) -> RepositoryResult<LoadSummary> {
        let start = Instant::now();
        let batch_size = batch_size.max(1);
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut summary = LoadSummary {
            unkeyed_movies_skipped: dataset.unkeyed_movies.len(),
            ..LoadSummary::default()
        };

        summary.stars_inserted = Self::insert_stars_tx(&tx, dataset, batch_size)?;
        summary.movies_inserted = Self::insert_movies_tx(&tx, dataset, batch_size)?;
        if !dataset.unkeyed_movies.is_empty() {
            let titles: Vec<&str> = dataset.unkeyed_movies.iter().map(|m| m.title.as_str()).collect();
            log.warn(
                DiagnosticSource::Loader,
                format!(
                    "{} 部无 FID 影片未落库: {}",
                    dataset.unkeyed_movies.len(),
                    titles.join("; ")
                ),
            );
        }

        let (genre_ids, genres_inserted) = Self::upsert_genres_tx(&tx, dataset)?;
        summary.genres_inserted = genres_inserted;
        summary.genre_links_inserted =
            Self::insert_genre_links_tx(&tx, dataset, &genre_ids, batch_size)?;
        let cast_links_inserted =
            Self::insert_cast_links_tx(&tx, dataset, batch_size, &mut summary, log)?;
        summary.cast_links_inserted = cast_links_inserted;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(
            stars = summary.stars_inserted,
            movies = summary.movies_inserted,
            genres = summary.genres_inserted,
            genre_links = summary.genre_links_inserted,
            cast_links = summary.cast_links_inserted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "目录落库事务已提交"
        );
        Ok(summary)
    }

    fn count_rows(&self) -> RepositoryResult<CatalogRowCounts> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count = |table: &str| -> RepositoryResult<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(CatalogRowCounts {
            stars: count("stars")?,
            movies: count("movies")?,
            genres: count("genres")?,
            genres_in_movies: count("genres_in_movies")?,
            stars_in_movies: count("stars_in_movies")?,
        })
    }
}
