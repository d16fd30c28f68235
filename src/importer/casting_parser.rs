// ==========================================
// 影片目录 XML 导入 - 出演关系文件解析器
// ==========================================
// 文档结构: <casts><dirfilms><filmc><m><f/><t/><a/></m></filmc></dirfilms></casts>
// 规则: <f>(影片 FID)与 <a>(演员艺名)缺一即丢弃,记录缺失的字段
// ==========================================

use crate::domain::catalog::CastingRecord;
use crate::domain::diagnostics::{DiagnosticSource, DiagnosticsLog};
use crate::domain::report::SourceKind;
use crate::importer::catalog_importer_trait::{DocumentParser, FieldCleaner as _};
use crate::importer::error::ImportResult;
use crate::importer::field_cleaner::FieldCleaner;
use crate::importer::reconciliation::CastingCollection;
use crate::importer::stream_parser::{TagBinding, TagDispatcher};
use std::io::BufRead;

#[derive(Debug, Default)]
enum CastScope {
    #[default]
    Outside,
    InEntry {
        movie_fid: Option<String>,
        actor_name: Option<String>,
    },
}

#[derive(Debug, Default)]
struct CastingState {
    scope: CastScope,
    castings: CastingCollection,
}

fn open_entry(state: &mut CastingState, _log: &mut DiagnosticsLog) {
    state.scope = CastScope::InEntry {
        movie_fid: None,
        actor_name: None,
    };
}

fn close_entry(state: &mut CastingState, _value: String, log: &mut DiagnosticsLog) {
    let CastScope::InEntry {
        movie_fid,
        actor_name,
    } = std::mem::take(&mut state.scope)
    else {
        return;
    };

    match (movie_fid, actor_name) {
        (Some(movie_fid), Some(actor_name)) => state.castings.push(CastingRecord {
            movie_fid,
            actor_name,
        }),
        (None, Some(actor_name)) => log.warn(
            DiagnosticSource::Castings,
            format!("出演记录缺少 film FID,已丢弃 (actor: '{}')", actor_name),
        ),
        (Some(movie_fid), None) => log.warn(
            DiagnosticSource::Castings,
            format!("出演记录缺少 actor name,已丢弃 (film: '{}')", movie_fid),
        ),
        (None, None) => log.warn(
            DiagnosticSource::Castings,
            "出演记录缺少 film FID 与 actor name,已丢弃",
        ),
    }
}

fn set_movie_fid(state: &mut CastingState, value: String, _log: &mut DiagnosticsLog) {
    if let CastScope::InEntry { movie_fid, .. } = &mut state.scope {
        *movie_fid = FieldCleaner.normalize_null(&value);
    }
}

fn set_actor_name(state: &mut CastingState, value: String, _log: &mut DiagnosticsLog) {
    if let CastScope::InEntry { actor_name, .. } = &mut state.scope {
        *actor_name = FieldCleaner.normalize_null(&value);
    }
}

const BINDINGS: &[TagBinding<CastingState>] = &[
    TagBinding::scope(&["m"], open_entry, close_entry),
    TagBinding::close(&["m", "f"], set_movie_fid),
    TagBinding::close(&["m", "a"], set_actor_name),
];

const DISPATCHER: TagDispatcher<CastingState> =
    TagDispatcher::new(DiagnosticSource::Castings, BINDINGS);

// ==========================================
// CastingParser - 出演关系文件解析器
// ==========================================
#[derive(Debug, Default)]
pub struct CastingParser;

impl DocumentParser for CastingParser {
    type Sink = CastingCollection;

    fn kind(&self) -> SourceKind {
        SourceKind::Castings
    }

    fn parse_reader<R: BufRead>(
        &self,
        reader: R,
        sink: &mut CastingCollection,
        log: &mut DiagnosticsLog,
    ) -> ImportResult<()> {
        let mut state = CastingState {
            scope: CastScope::Outside,
            castings: std::mem::take(sink),
        };
        let result = DISPATCHER.run(reader, &mut state, log);
        *sink = state.castings;
        result
    }
}
