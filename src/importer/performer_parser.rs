// ==========================================
// 影片目录 XML 导入 - 演员文件解析器
// ==========================================
// 文档结构: <actors><actor><stagename/><dob/></actor>...</actors>
// 规则:
//   - 缺少艺名的记录跳过并记录
//   - dob 非整数时出生年份置空,记录原值与演员名
// ==========================================

use crate::domain::catalog::StarRecord;
use crate::domain::diagnostics::{DiagnosticSource, DiagnosticsLog};
use crate::domain::report::SourceKind;
use crate::importer::catalog_importer_trait::{DocumentParser, FieldCleaner as _};
use crate::importer::error::ImportResult;
use crate::importer::field_cleaner::FieldCleaner;
use crate::importer::reconciliation::StarCollection;
use crate::importer::stream_parser::{TagBinding, TagDispatcher};
use std::io::BufRead;

// ===== 解析状态 =====

#[derive(Debug, Default)]
enum ActorScope {
    #[default]
    Outside,
    InActor(ActorDraft),
}

#[derive(Debug, Default)]
struct ActorDraft {
    stage_name: Option<String>,
    dob: Option<String>,
}

#[derive(Debug, Default)]
struct PerformerState {
    scope: ActorScope,
    stars: StarCollection,
}

// ===== 标签绑定 =====

fn open_actor(state: &mut PerformerState, _log: &mut DiagnosticsLog) {
    state.scope = ActorScope::InActor(ActorDraft::default());
}

fn close_actor(state: &mut PerformerState, _value: String, log: &mut DiagnosticsLog) {
    let ActorScope::InActor(draft) = std::mem::take(&mut state.scope) else {
        return;
    };

    let cleaner = FieldCleaner;
    let Some(stage_name) = draft.stage_name.as_deref().and_then(|v| cleaner.normalize_null(v)) else {
        log.warn(
            DiagnosticSource::Performers,
            format!(
                "演员记录缺少艺名,已跳过 (dob: '{}')",
                draft.dob.as_deref().unwrap_or("")
            ),
        );
        return;
    };

    let raw_dob = draft.dob.unwrap_or_default();
    let birth_year = match cleaner.parse_birth_year(&raw_dob) {
        Ok(year) => year,
        Err(()) => {
            log.warn(
                DiagnosticSource::Performers,
                format!(
                    "演员 '{}' 的出生年份无效: '{}',已置空",
                    stage_name,
                    raw_dob.trim()
                ),
            );
            None
        }
    };

    state.stars.upsert(
        StarRecord {
            stage_name,
            birth_year,
        },
        log,
    );
}

fn set_stage_name(state: &mut PerformerState, value: String, _log: &mut DiagnosticsLog) {
    if let ActorScope::InActor(draft) = &mut state.scope {
        draft.stage_name = Some(value);
    }
}

fn set_dob(state: &mut PerformerState, value: String, _log: &mut DiagnosticsLog) {
    if let ActorScope::InActor(draft) = &mut state.scope {
        draft.dob = Some(value);
    }
}

const BINDINGS: &[TagBinding<PerformerState>] = &[
    TagBinding::scope(&["actor"], open_actor, close_actor),
    TagBinding::close(&["actor", "stagename"], set_stage_name),
    TagBinding::close(&["actor", "dob"], set_dob),
];

const DISPATCHER: TagDispatcher<PerformerState> =
    TagDispatcher::new(DiagnosticSource::Performers, BINDINGS);

// ==========================================
// PerformerParser - 演员文件解析器
// ==========================================
#[derive(Debug, Default)]
pub struct PerformerParser;

impl DocumentParser for PerformerParser {
    type Sink = StarCollection;

    fn kind(&self) -> SourceKind {
        SourceKind::Performers
    }

    fn parse_reader<R: BufRead>(
        &self,
        reader: R,
        sink: &mut StarCollection,
        log: &mut DiagnosticsLog,
    ) -> ImportResult<()> {
        let mut state = PerformerState {
            scope: ActorScope::Outside,
            stars: std::mem::take(sink),
        };
        let result = DISPATCHER.run(reader, &mut state, log);
        *sink = state.stars;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ImportError;
    use std::io::Cursor;

    fn parse(xml: &str) -> (StarCollection, DiagnosticsLog, ImportResult<()>) {
        let mut stars = StarCollection::default();
        let mut log = DiagnosticsLog::new();
        let result = PerformerParser.parse_reader(Cursor::new(xml.as_bytes().to_vec()), &mut stars, &mut log);
        (stars, log, result)
    }

    #[test]
    fn test_parse_actors() {
        let xml = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<actors>
  <actor><stagename>Al Pacino</stagename><familyname>Pacino</familyname><dob>1940</dob></actor>
  <actor><stagename>Val Kilmer</stagename><dob></dob></actor>
</actors>"#;
        let (stars, log, result) = parse(xml);

        assert!(result.is_ok());
        assert_eq!(stars.len(), 2);
        assert_eq!(stars.get("Al Pacino").unwrap().birth_year, Some(1940));
        assert_eq!(stars.get("Val Kilmer").unwrap().birth_year, None);
        assert!(log.is_empty());
    }

    #[test]
    fn test_duplicate_actor_keeps_last_dob() {
        let xml = "<actors>\
            <actor><stagename>Al Pacino</stagename><dob>1940</dob></actor>\
            <actor><stagename>Al Pacino</stagename><dob>1941</dob></actor>\
            </actors>";
        let (stars, log, _) = parse(xml);

        assert_eq!(stars.len(), 1);
        assert_eq!(stars.get("Al Pacino").unwrap().birth_year, Some(1941));
        assert_eq!(log.len(), 1);
        assert!(log.contains_all(&["重复演员", "Al Pacino"]));
    }

    #[test]
    fn test_malformed_dob_logs_literal_value() {
        let xml = "<actors><actor><stagename>Jane Doe</stagename><dob>19xx</dob></actor></actors>";
        let (stars, log, _) = parse(xml);

        assert_eq!(stars.get("Jane Doe").unwrap().birth_year, None);
        assert!(log.contains_all(&["Jane Doe", "19xx"]));
    }

    #[test]
    fn test_missing_stage_name_is_skipped() {
        let xml = "<actors><actor><stagename> </stagename><dob>1950</dob></actor><actor><dob>1960</dob></actor></actors>";
        let (stars, log, _) = parse(xml);

        assert!(stars.is_empty());
        assert_eq!(log.len(), 2);
        assert!(log.contains_all(&["缺少艺名", "1960"]));
    }

    #[test]
    fn test_malformed_markup_keeps_earlier_records() {
        let xml = "<actors><actor><stagename>A</stagename></actor><actor><stagename>B</stage></actor></actors>";
        let (stars, _log, result) = parse(xml);

        assert!(matches!(result, Err(ImportError::XmlParseError { .. })));
        assert_eq!(stars.len(), 1);
        assert!(stars.get("A").is_some());
    }
}
