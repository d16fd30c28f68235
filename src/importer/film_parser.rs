// ==========================================
// 影片目录 XML 导入 - 影片文件解析器
// ==========================================
// 文档结构:
//   <movies>
//     <directorfilms>
//       <director><dirname/></director>
//       <films><film><fid/><t/><year/><dirs><dir><dirn/></dir></dirs><cats><cat/></cats></film></films>
//     </directorfilms>
//   </movies>
// 规则:
//   - 分组导演为组内每部影片的默认导演
//   - 影片内导演与分组导演不一致时记录,以分组导演为准
//   - 年份拒绝 空/0/undated/罗马数字,置空并记录原值
//   - 类型 token 逐个规范化,无法识别者丢弃并记录
// ==========================================

use crate::domain::catalog::MovieRecord;
use crate::domain::diagnostics::{DiagnosticSource, DiagnosticsLog};
use crate::domain::report::SourceKind;
use crate::importer::catalog_importer_trait::{DocumentParser, FieldCleaner as _};
use crate::importer::error::ImportResult;
use crate::importer::field_cleaner::FieldCleaner;
use crate::importer::genre_normalizer::{is_blank_token, normalize_genre, GenreVocabulary};
use crate::importer::reconciliation::MovieCollection;
use crate::importer::stream_parser::{TagBinding, TagDispatcher};
use std::io::BufRead;

const UNKNOWN_TITLE: &str = "未知片名";

// ===== 解析状态 =====

#[derive(Debug, Default)]
enum FilmScope {
    #[default]
    Outside,
    InGroup {
        director: Option<String>,
    },
    InFilm {
        director: Option<String>,
        draft: FilmDraft,
    },
}

#[derive(Debug, Default)]
struct FilmDraft {
    fid: Option<String>,
    title: Option<String>,
    year: Option<String>,
    local_directors: Vec<String>,
    genre_tokens: Vec<String>,
}

struct FilmState {
    scope: FilmScope,
    movies: MovieCollection,
    vocabulary: &'static GenreVocabulary,
}

// ===== 标签绑定 =====

fn open_group(state: &mut FilmState, _log: &mut DiagnosticsLog) {
    state.scope = FilmScope::InGroup { director: None };
}

fn close_group(state: &mut FilmState, _value: String, _log: &mut DiagnosticsLog) {
    state.scope = FilmScope::Outside;
}

fn set_group_director(state: &mut FilmState, value: String, _log: &mut DiagnosticsLog) {
    if let FilmScope::InGroup { director } = &mut state.scope {
        *director = FieldCleaner.normalize_null(&value);
    }
}

fn open_film(state: &mut FilmState, _log: &mut DiagnosticsLog) {
    let director = match std::mem::take(&mut state.scope) {
        FilmScope::InGroup { director } => director,
        FilmScope::InFilm { director, .. } => director,
        FilmScope::Outside => None,
    };
    state.scope = FilmScope::InFilm {
        director,
        draft: FilmDraft::default(),
    };
}

fn close_film(state: &mut FilmState, _value: String, log: &mut DiagnosticsLog) {
    let FilmScope::InFilm { director, draft } = std::mem::take(&mut state.scope) else {
        return;
    };

    let movie = finish_film(draft, director.as_deref(), state, log);
    state.movies.commit(movie, log);
    state.scope = FilmScope::InGroup { director };
}

fn set_fid(state: &mut FilmState, value: String, _log: &mut DiagnosticsLog) {
    if let FilmScope::InFilm { draft, .. } = &mut state.scope {
        draft.fid = FieldCleaner.normalize_null(&value);
    }
}

fn set_title(state: &mut FilmState, value: String, _log: &mut DiagnosticsLog) {
    if let FilmScope::InFilm { draft, .. } = &mut state.scope {
        draft.title = Some(value);
    }
}

fn set_year(state: &mut FilmState, value: String, _log: &mut DiagnosticsLog) {
    if let FilmScope::InFilm { draft, .. } = &mut state.scope {
        draft.year = Some(value);
    }
}

fn add_local_director(state: &mut FilmState, value: String, _log: &mut DiagnosticsLog) {
    if let FilmScope::InFilm { draft, .. } = &mut state.scope {
        if let Some(name) = FieldCleaner.normalize_null(&value) {
            draft.local_directors.push(name);
        }
    }
}

fn add_genre_token(state: &mut FilmState, value: String, _log: &mut DiagnosticsLog) {
    if let FilmScope::InFilm { draft, .. } = &mut state.scope {
        draft.genre_tokens.push(value);
    }
}

const BINDINGS: &[TagBinding<FilmState>] = &[
    TagBinding::scope(&["directorfilms"], open_group, close_group),
    TagBinding::close(&["director", "dirname"], set_group_director),
    TagBinding::scope(&["film"], open_film, close_film),
    TagBinding::close(&["film", "fid"], set_fid),
    TagBinding::close(&["film", "t"], set_title),
    TagBinding::close(&["film", "year"], set_year),
    TagBinding::close(&["dirn"], add_local_director),
    TagBinding::close(&["cat"], add_genre_token),
];

const DISPATCHER: TagDispatcher<FilmState> = TagDispatcher::new(DiagnosticSource::Films, BINDINGS);

// ===== 影片收尾 =====

/// 由草稿构造影片记录(年份 / 导演 / 类型在此处定稿)
fn finish_film(
    draft: FilmDraft,
    group_director: Option<&str>,
    state: &mut FilmState,
    log: &mut DiagnosticsLog,
) -> MovieRecord {
    let cleaner = FieldCleaner;
    let title = draft
        .title
        .as_deref()
        .and_then(|t| cleaner.normalize_null(t))
        .unwrap_or_default();
    let label = if title.is_empty() { UNKNOWN_TITLE } else { title.as_str() };

    // 年份
    let raw_year = draft.year.unwrap_or_default();
    let year = match cleaner.parse_film_year(&raw_year) {
        Ok(year) => year,
        Err(rejection) => {
            log.warn(
                DiagnosticSource::Films,
                format!(
                    "影片 '{}' 的年份无效 ({}): '{}',已置空",
                    label,
                    rejection.reason(),
                    raw_year.trim()
                ),
            );
            None
        }
    };

    // 导演: 分组导演优先
    let director = match group_director {
        Some(group) => {
            for local in draft.local_directors.iter().filter(|d| d.as_str() != group) {
                log.warn(
                    DiagnosticSource::Films,
                    format!(
                        "影片 '{}' 导演不一致: 分组导演 '{}',影片内导演 '{}',以分组导演为准",
                        label, group, local
                    ),
                );
            }
            Some(group.to_string())
        }
        None => draft.local_directors.into_iter().next(),
    };

    // 类型
    let mut genres = Vec::new();
    for token in draft.genre_tokens.iter().filter(|t| !is_blank_token(t)) {
        match normalize_genre(token, state.vocabulary) {
            Some(name) => {
                state.movies.add_genre(name);
                genres.push(name.to_string());
            }
            None => log.warn(
                DiagnosticSource::Films,
                format!("影片 '{}' 的类型无法识别: '{}',已丢弃", label, token.trim()),
            ),
        }
    }

    MovieRecord {
        xml_fid: draft.fid,
        title,
        year,
        director,
        genres,
    }
}

// ==========================================
// FilmParser - 影片文件解析器
// ==========================================
#[derive(Debug)]
pub struct FilmParser {
    vocabulary: &'static GenreVocabulary,
}

impl FilmParser {
    pub fn new(vocabulary: &'static GenreVocabulary) -> Self {
        Self { vocabulary }
    }
}

impl Default for FilmParser {
    fn default() -> Self {
        Self::new(GenreVocabulary::standard())
    }
}

impl DocumentParser for FilmParser {
    type Sink = MovieCollection;

    fn kind(&self) -> SourceKind {
        SourceKind::Films
    }

    fn parse_reader<R: BufRead>(
        &self,
        reader: R,
        sink: &mut MovieCollection,
        log: &mut DiagnosticsLog,
    ) -> ImportResult<()> {
        let mut state = FilmState {
            scope: FilmScope::Outside,
            movies: std::mem::take(sink),
            vocabulary: self.vocabulary,
        };
        let result = DISPATCHER.run(reader, &mut state, log);
        *sink = state.movies;
        result
    }
}
