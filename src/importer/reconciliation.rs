// ==========================================
// 影片目录 XML 导入 - 对账存储
// ==========================================
// 职责: 累积演员 / 影片 / 类型 / 出演关系,执行去重与缺失数据策略
// 策略:
//   - 演员: 以艺名为键,后出现者覆盖,每次覆盖记录一条
//   - 影片: 以 FID 为键,后出现者覆盖;无 FID 影片进入不可关联集合
//   - 出演关系: 不去重(由落库阶段的幂等写入过滤)
// 红线: 标题为空的影片不进入任一影片集合
// ==========================================

use crate::domain::catalog::{CastingRecord, MovieRecord, ReconciledDataset, StarRecord};
use crate::domain::diagnostics::{DiagnosticSource, DiagnosticsLog};
use crate::importer::catalog_importer_trait::KeyAssigner;
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// StarCollection - 演员集合
// ==========================================
#[derive(Debug, Default)]
pub struct StarCollection {
    stars: BTreeMap<String, StarRecord>,
}

impl StarCollection {
    /// 写入演员记录(同名覆盖)
    ///
    /// # 返回
    /// - true: 覆盖了已有记录
    pub fn upsert(&mut self, record: StarRecord, log: &mut DiagnosticsLog) -> bool {
        let stage_name = record.stage_name.clone();
        let new_year = record.birth_year;
        match self.stars.insert(stage_name.clone(), record) {
            Some(previous) => {
                log.warn(
                    DiagnosticSource::Performers,
                    format!(
                        "重复演员 '{}',以最后一次出现为准 (出生年份 {} → {})",
                        stage_name,
                        display_year(previous.birth_year),
                        display_year(new_year)
                    ),
                );
                true
            }
            None => false,
        }
    }

    pub fn get(&self, stage_name: &str) -> Option<&StarRecord> {
        self.stars.get(stage_name)
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

// ==========================================
// MovieCollection - 影片集合
// ==========================================
#[derive(Debug, Default)]
pub struct MovieCollection {
    keyed: BTreeMap<String, MovieRecord>,
    unkeyed: Vec<MovieRecord>,
    genres: BTreeSet<String>,
}

impl MovieCollection {
    /// 提交一部解析完成的影片
    ///
    /// # 返回
    /// - true: 已进入有 FID 或无 FID 集合
    /// - false: 标题为空,已丢弃
    pub fn commit(&mut self, movie: MovieRecord, log: &mut DiagnosticsLog) -> bool {
        if movie.title.trim().is_empty() {
            log.warn(
                DiagnosticSource::Films,
                format!(
                    "影片缺少标题,已跳过 (FID: {})",
                    movie.xml_fid.as_deref().unwrap_or("无")
                ),
            );
            return false;
        }

        if movie.director.is_none() {
            log.warn(
                DiagnosticSource::Films,
                format!("影片 '{}' 缺少导演", movie.title),
            );
        }

        match movie.xml_fid.clone() {
            Some(fid) => {
                let title = movie.title.clone();
                if let Some(previous) = self.keyed.insert(fid.clone(), movie) {
                    log.warn(
                        DiagnosticSource::Films,
                        format!(
                            "重复影片 FID '{}',以最后一次出现为准 ('{}' → '{}')",
                            fid, previous.title, title
                        ),
                    );
                }
            }
            None => {
                log.warn(
                    DiagnosticSource::Films,
                    format!("影片 '{}' 缺少 FID,无法关联出演关系", movie.title),
                );
                self.unkeyed.push(movie);
            }
        }
        true
    }

    /// 记录一个规范类型名
    pub fn add_genre(&mut self, name: &str) {
        if !self.genres.contains(name) {
            self.genres.insert(name.to_string());
        }
    }

    pub fn keyed(&self) -> &BTreeMap<String, MovieRecord> {
        &self.keyed
    }

    pub fn unkeyed(&self) -> &[MovieRecord] {
        &self.unkeyed
    }

    pub fn genres(&self) -> &BTreeSet<String> {
        &self.genres
    }
}

// ==========================================
// CastingCollection - 出演关系集合
// ==========================================
#[derive(Debug, Default)]
pub struct CastingCollection {
    castings: Vec<CastingRecord>,
}

impl CastingCollection {
    pub fn push(&mut self, record: CastingRecord) {
        self.castings.push(record);
    }

    pub fn records(&self) -> &[CastingRecord] {
        &self.castings
    }

    pub fn len(&self) -> usize {
        self.castings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.castings.is_empty()
    }
}

// ==========================================
// ReconciliationStore - 对账存储
// ==========================================
// 三个解析器各自填充一个集合,全部解析结束后由 finalize
// 一次性移交为 ReconciledDataset
#[derive(Debug, Default)]
pub struct ReconciliationStore {
    pub stars: StarCollection,
    pub movies: MovieCollection,
    pub castings: CastingCollection,
}

impl ReconciliationStore {
    pub fn new(stars: StarCollection, movies: MovieCollection, castings: CastingCollection) -> Self {
        Self {
            stars,
            movies,
            castings,
        }
    }

    /// 分配代理键并移交数据集
    pub fn finalize(self, assigner: &dyn KeyAssigner) -> ReconciledDataset {
        let stage_names: Vec<&str> = self.stars.stars.keys().map(String::as_str).collect();
        let star_ids = assigner.assign(&stage_names);

        ReconciledDataset {
            stars: self.stars.stars,
            keyed_movies: self.movies.keyed,
            unkeyed_movies: self.movies.unkeyed,
            genres: self.movies.genres,
            castings: self.castings.castings,
            star_ids,
        }
    }
}

fn display_year(year: Option<i32>) -> String {
    year.map_or_else(|| "空".to_string(), |y| y.to_string())
}
