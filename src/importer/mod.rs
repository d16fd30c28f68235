// ==========================================
// 影片目录 XML 导入 - 导入层
// ==========================================
// 职责: 流式解析三个 XML 文件,对账后单事务落库
// 组件: 流式分发器 / 字段清洗 / 类型规范化 / 对账存储 / 代理键 / 管道编排
// ==========================================

// 模块声明
pub mod casting_parser;
pub mod catalog_importer_impl;
pub mod catalog_importer_trait;
pub mod error;
pub mod field_cleaner;
pub mod film_parser;
pub mod genre_normalizer;
pub mod performer_parser;
pub mod reconciliation;
pub mod stream_parser;
pub mod surrogate_key;

// 重导出核心类型
pub use casting_parser::CastingParser;
pub use catalog_importer_impl::CatalogImporterImpl;
pub use error::{ImportError, ImportResult};
pub use field_cleaner::FieldCleaner as FieldCleanerImpl;
pub use film_parser::FilmParser;
pub use genre_normalizer::{normalize_genre, GenreVocabulary, CANONICAL_GENRES, GENRE_CODES};
pub use performer_parser::PerformerParser;
pub use reconciliation::{CastingCollection, MovieCollection, ReconciliationStore, StarCollection};
pub use stream_parser::{TagBinding, TagDispatcher};
pub use surrogate_key::SurrogateKeyAssigner;

// 重导出 Trait 接口
pub use catalog_importer_trait::{
    CatalogImporter, CatalogSources, DocumentParser, FieldCleaner, KeyAssigner, YearRejection,
};
