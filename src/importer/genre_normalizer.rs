// ==========================================
// 影片目录 XML 导入 - 类型规范化
// ==========================================
// 职责: 原始类型代码/名称 → 规范类型名,无法识别则拒绝
// 红线: 词表固定,进程内只初始化一次,不学习新类型
// 规则:
//   1. trim + 小写后查代码表
//   2. 未命中则与规范类型名集合做大小写不敏感比较
//   3. 均未命中则拒绝(由调用方记录诊断)
// ==========================================

use std::collections::HashMap;
use std::sync::OnceLock;

/// 代码 → 规范类型名
pub const GENRE_CODES: &[(&str, &str)] = &[
    ("susp", "Suspense"),
    ("cmr", "Crime"),
    ("cnr", "Cops and Robbers"),
    ("dram", "Drama"),
    ("west", "Western"),
    ("myst", "Mystery"),
    ("s.f.", "Sci-Fi"),
    ("scfi", "Sci-Fi"),
    ("advt", "Adventure"),
    ("horr", "Horror"),
    ("comd", "Comedy"),
    ("musc", "Musical"),
    ("docu", "Documentary"),
    ("porn", "Adult"),
    ("biop", "Biographical Picture"),
    ("tv", "TV Show"),
    ("tvs", "TV Series"),
    ("tvm", "TV Movie"),
    ("actn", "Action"),
    ("fant", "Fantasy"),
    ("romt", "Romance"),
    ("cart", "Animation"),
    ("hist", "Historical"),
    ("biog", "Biography"),
    ("epic", "Epic"),
    ("noir", "Film Noir"),
    ("fam", "Family"),
];

/// 已知规范类型名(可直接以全名出现)
pub const CANONICAL_GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Animation",
    "Biography",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Family",
    "Fantasy",
    "Film Noir",
    "Historical",
    "Horror",
    "Musical",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Suspense",
    "TV Show",
    "Western",
    "Adult",
    "Epic",
];

// ==========================================
// GenreVocabulary - 类型词表
// ==========================================
#[derive(Debug, Clone)]
pub struct GenreVocabulary {
    codes: HashMap<&'static str, &'static str>,
    canonical: HashMap<String, &'static str>, // 小写 → 规范名
}

impl GenreVocabulary {
    pub fn new(codes: &'static [(&'static str, &'static str)], names: &'static [&'static str]) -> Self {
        Self {
            codes: codes.iter().copied().collect(),
            canonical: names.iter().map(|n| (n.to_lowercase(), *n)).collect(),
        }
    }

    /// 标准词表(进程内共享)
    pub fn standard() -> &'static GenreVocabulary {
        static STANDARD: OnceLock<GenreVocabulary> = OnceLock::new();
        STANDARD.get_or_init(|| GenreVocabulary::new(GENRE_CODES, CANONICAL_GENRES))
    }
}

/// 规范化单个类型 token
///
/// # 返回
/// - Some(name): 规范类型名
/// - None: 无法识别(含空 token)
pub fn normalize_genre(raw: &str, vocabulary: &GenreVocabulary) -> Option<&'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lowered = trimmed.to_lowercase();
    if let Some(name) = vocabulary.codes.get(lowered.as_str()) {
        return Some(*name);
    }

    vocabulary.canonical.get(&lowered).copied()
}

/// 是否为应静默忽略的 token(空值或 "NULL")
pub fn is_blank_token(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_lookup_is_case_and_whitespace_insensitive() {
        let vocab = GenreVocabulary::standard();
        assert_eq!(normalize_genre("susp", vocab), Some("Suspense"));
        assert_eq!(normalize_genre("  Dram ", vocab), Some("Drama"));
        assert_eq!(normalize_genre("S.F.", vocab), Some("Sci-Fi"));
        assert_eq!(normalize_genre("porn", vocab), Some("Adult"));
        assert_eq!(normalize_genre("noir", vocab), Some("Film Noir"));
    }

    #[test]
    fn test_canonical_name_is_accepted() {
        let vocab = GenreVocabulary::standard();
        assert_eq!(normalize_genre("comedy", vocab), Some("Comedy"));
        assert_eq!(normalize_genre("WESTERN", vocab), Some("Western"));
        assert_eq!(normalize_genre("film noir", vocab), Some("Film Noir"));
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let vocab = GenreVocabulary::standard();
        assert_eq!(normalize_genre("xyzzy", vocab), None);
        assert_eq!(normalize_genre("", vocab), None);
        // 代码表中的目标名未必在规范名集合中
        assert_eq!(normalize_genre("TV Movie", vocab), None);
    }

    #[test]
    fn test_normalization_is_order_independent() {
        let vocab = GenreVocabulary::standard();
        let tokens = ["horr", "bogus", "Drama", "cart"];
        let forward: Vec<_> = tokens.iter().map(|t| normalize_genre(t, vocab)).collect();
        let backward: Vec<_> = tokens.iter().rev().map(|t| normalize_genre(t, vocab)).collect();
        let reversed_back: Vec<_> = backward.into_iter().rev().collect();
        assert_eq!(forward, reversed_back);
    }

    #[test]
    fn test_custom_vocabulary() {
        static CODES: &[(&str, &str)] = &[("x", "Experimental")];
        static NAMES: &[&str] = &["Experimental"];
        let vocab = GenreVocabulary::new(CODES, NAMES);
        assert_eq!(normalize_genre("X", &vocab), Some("Experimental"));
        assert_eq!(normalize_genre("dram", &vocab), None);
    }

    #[test]
    fn test_blank_token() {
        assert!(is_blank_token(" "));
        assert!(is_blank_token("NULL"));
        assert!(!is_blank_token("dram"));
    }
}
