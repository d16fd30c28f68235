// ==========================================
// 影片目录 XML 导入 - 字段清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 年份解析
// 规则: 解析失败一律返回 None 或拒绝原因,由调用方写诊断日志
// ==========================================

use crate::importer::catalog_importer_trait::{FieldCleaner as FieldCleanerTrait, YearRejection};

const ROMAN_DIGITS: &str = "MDCLXVI";

pub struct FieldCleaner;

impl FieldCleanerTrait for FieldCleaner {
    fn normalize_null(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn parse_film_year(&self, value: &str) -> Result<Option<i32>, YearRejection> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.eq_ignore_ascii_case("undated") {
            return Err(YearRejection::Placeholder);
        }
        if is_roman_numeral(trimmed) {
            return Err(YearRejection::RomanNumeral);
        }

        match trimmed.parse::<i32>() {
            Ok(0) => Err(YearRejection::Placeholder),
            Ok(year) => Ok(Some(year)),
            Err(_) => Err(YearRejection::NotANumber),
        }
    }

    fn parse_birth_year(&self, value: &str) -> Result<Option<i32>, ()> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse::<i32>().map(Some).map_err(|_| ())
    }
}

/// 判断是否为罗马数字(大小写不敏感)
fn is_roman_numeral(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| ROMAN_DIGITS.contains(c.to_ascii_uppercase()))
}
