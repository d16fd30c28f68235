// ==========================================
// 影片目录 XML 导入 - 演员代理键分配
// ==========================================
// 格式: 固定前缀 + 定宽补零序号,序号从 1 开始
// 说明: 输入为有序艺名集合时,相同输入得到相同代理键
// ==========================================

use crate::importer::catalog_importer_trait::KeyAssigner;
use std::collections::BTreeMap;

pub const DEFAULT_STAR_ID_PREFIX: &str = "nm";
pub const DEFAULT_STAR_ID_WIDTH: usize = 5;

#[derive(Debug, Clone)]
pub struct SurrogateKeyAssigner {
    prefix: String,
    width: usize,
}

impl SurrogateKeyAssigner {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
        }
    }

    /// 格式化第 n 个代理键
    pub fn format_id(&self, sequence: usize) -> String {
        format!("{}{:0width$}", self.prefix, sequence, width = self.width)
    }
}

impl Default for SurrogateKeyAssigner {
    fn default() -> Self {
        Self::new(DEFAULT_STAR_ID_PREFIX, DEFAULT_STAR_ID_WIDTH)
    }
}

impl KeyAssigner for SurrogateKeyAssigner {
    fn assign(&self, stage_names: &[&str]) -> BTreeMap<String, String> {
        let mut ids = BTreeMap::new();
        let mut sequence = 0usize;

        for name in stage_names {
            if ids.contains_key(*name) {
                continue;
            }
            sequence += 1;
            ids.insert(name.to_string(), self.format_id(sequence));
        }

        tracing::debug!(assigned = sequence, prefix = %self.prefix, "演员代理键分配完成");
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_format() {
        let assigner = SurrogateKeyAssigner::default();
        assert_eq!(assigner.format_id(1), "nm00001");
        assert_eq!(assigner.format_id(12345), "nm12345");
        // 超出宽度时不截断
        assert_eq!(assigner.format_id(123456), "nm123456");
    }

    #[test]
    fn test_ids_are_unique_and_total() {
        let assigner = SurrogateKeyAssigner::default();
        let names = ["Al Pacino", "Robert De Niro", "Al Pacino", "Val Kilmer"];
        let ids = assigner.assign(&names);

        assert_eq!(ids.len(), 3);
        let distinct: HashSet<&String> = ids.values().collect();
        assert_eq!(distinct.len(), 3);
        assert_eq!(ids["Al Pacino"], "nm00001");
        assert_eq!(ids["Robert De Niro"], "nm00002");
        assert_eq!(ids["Val Kilmer"], "nm00003");
    }

    #[test]
    fn test_custom_prefix_and_width() {
        let assigner = SurrogateKeyAssigner::new("st", 3);
        let ids = assigner.assign(&["A", "B"]);
        assert_eq!(ids["A"], "st001");
        assert_eq!(ids["B"], "st002");
    }

    #[test]
    fn test_empty_input() {
        assert!(SurrogateKeyAssigner::default().assign(&[]).is_empty());
    }
}
