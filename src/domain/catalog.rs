// ==========================================
// 影片目录 XML 导入 - 目录领域模型
// ==========================================
// 职责: 演员 / 影片 / 出演关系 的内存表示
// 生命周期: 解析阶段创建,对账后移交落库阶段(只读)
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// StarRecord - 演员记录
// ==========================================
// 主键: 艺名(区分大小写)
// 策略: 同名后出现者覆盖先出现者(last-write-wins)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRecord {
    pub stage_name: String,
    pub birth_year: Option<i32>,
}

// ==========================================
// MovieRecord - 影片记录
// ==========================================
// 红线: title 非空才会进入任一影片集合
// 说明: 无 xml_fid 的影片无法参与出演关系关联
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub xml_fid: Option<String>,
    pub title: String,
    pub year: Option<i32>,
    pub director: Option<String>,
    pub genres: Vec<String>, // 规范化后的类型名,允许同片内重复
}

// ==========================================
// CastingRecord - 出演关系
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastingRecord {
    pub movie_fid: String,
    pub actor_name: String,
}

// ==========================================
// ReconciledDataset - 对账完成的数据集
// ==========================================
// 由解析阶段构造,按值移交给落库阶段;落库阶段只借用
//
// 有序集合保证演员代理键的分配顺序在相同输入下可复现
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciledDataset {
    pub stars: BTreeMap<String, StarRecord>,
    pub keyed_movies: BTreeMap<String, MovieRecord>,
    pub unkeyed_movies: Vec<MovieRecord>,
    pub genres: BTreeSet<String>,
    pub castings: Vec<CastingRecord>,
    /// 艺名 → 演员代理键
    pub star_ids: BTreeMap<String, String>,
}

impl ReconciledDataset {
    /// 解析阶段统计(用于运行报告)
    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            unique_stars: self.stars.len(),
            keyed_movies: self.keyed_movies.len(),
            unkeyed_movies: self.unkeyed_movies.len(),
            unique_genres: self.genres.len(),
            castings: self.castings.len(),
        }
    }
}

/// 数据集规模统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub unique_stars: usize,
    pub keyed_movies: usize,
    pub unkeyed_movies: usize,
    pub unique_genres: usize,
    pub castings: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_stats_counts_each_collection() {
        let mut dataset = ReconciledDataset::default();
        dataset.stars.insert(
            "Al Pacino".to_string(),
            StarRecord {
                stage_name: "Al Pacino".to_string(),
                birth_year: Some(1940),
            },
        );
        dataset.unkeyed_movies.push(MovieRecord {
            xml_fid: None,
            title: "Untitled".to_string(),
            year: None,
            director: None,
            genres: vec![],
        });
        dataset.genres.insert("Drama".to_string());

        let stats = dataset.stats();
        assert_eq!(stats.unique_stars, 1);
        assert_eq!(stats.keyed_movies, 0);
        assert_eq!(stats.unkeyed_movies, 1);
        assert_eq!(stats.unique_genres, 1);
        assert_eq!(stats.castings, 0);
    }
}
