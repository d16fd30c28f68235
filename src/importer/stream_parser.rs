// ==========================================
// 影片目录 XML 导入 - 流式标签路径分发器
// ==========================================
// 职责: 单遍读取 XML 事件,按 (标签路径后缀 → 动作) 绑定表分发
// 约束: 只保留当前元素路径与当前元素文本,不构建 DOM
// 编码: 输入按 ISO-8859-1 解码(每个字节映射为同值码点)
// ==========================================

use crate::domain::diagnostics::{DiagnosticSource, DiagnosticsLog};
use crate::importer::error::{ImportError, ImportResult};
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// 元素开始时触发的动作
pub type OpenAction<S> = fn(&mut S, &mut DiagnosticsLog);

/// 元素结束时触发的动作(参数为已 trim 的元素文本)
pub type CloseAction<S> = fn(&mut S, String, &mut DiagnosticsLog);

// ==========================================
// TagBinding - 标签路径绑定
// ==========================================
// path 为小写的路径后缀,例如 ["director", "dirname"]
// 只在当前路径以该后缀结尾时触发
pub struct TagBinding<S> {
    pub path: &'static [&'static str],
    pub on_open: Option<OpenAction<S>>,
    pub on_close: Option<CloseAction<S>>,
}

impl<S> TagBinding<S> {
    pub const fn open(path: &'static [&'static str], action: OpenAction<S>) -> Self {
        Self {
            path,
            on_open: Some(action),
            on_close: None,
        }
    }

    pub const fn close(path: &'static [&'static str], action: CloseAction<S>) -> Self {
        Self {
            path,
            on_open: None,
            on_close: Some(action),
        }
    }

    pub const fn scope(
        path: &'static [&'static str],
        on_open: OpenAction<S>,
        on_close: CloseAction<S>,
    ) -> Self {
        Self {
            path,
            on_open: Some(on_open),
            on_close: Some(on_close),
        }
    }

    fn matches(&self, stack: &[String]) -> bool {
        if self.path.is_empty() || stack.len() < self.path.len() {
            return false;
        }
        let tail = &stack[stack.len() - self.path.len()..];
        tail.iter().zip(self.path.iter()).all(|(open, bound)| open == bound)
    }
}

// ==========================================
// TagDispatcher - 流式分发器
// ==========================================
// 三种文档共用同一分发循环,只有绑定表不同
pub struct TagDispatcher<S: 'static> {
    source: DiagnosticSource,
    bindings: &'static [TagBinding<S>],
}

impl<S: 'static> TagDispatcher<S> {
    pub const fn new(source: DiagnosticSource, bindings: &'static [TagBinding<S>]) -> Self {
        Self { source, bindings }
    }

    /// 读取整个文档并驱动状态机
    ///
    /// # 返回
    /// - Ok(()): 文档完整读取
    /// - Err: 首个结构错误(标记错误 / 读取错误 / 文档提前结束),
    ///   已经分发出去的记录保留在 state 中
    pub fn run<R: BufRead>(
        &self,
        source: R,
        state: &mut S,
        log: &mut DiagnosticsLog,
    ) -> ImportResult<()> {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut text = String::new();

        loop {
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    return Err(ImportError::XmlParseError {
                        position: reader.error_position() as u64,
                        message: e.to_string(),
                    })
                }
            };

            match event {
                Event::Start(e) => {
                    path.push(tag_name(e.name().as_ref()));
                    text.clear();
                    self.dispatch_open(&path, state, log);
                }
                Event::Empty(e) => {
                    path.push(tag_name(e.name().as_ref()));
                    text.clear();
                    self.dispatch_open(&path, state, log);
                    self.dispatch_close(&path, String::new(), state, log);
                    path.pop();
                }
                Event::End(_) => {
                    let value = text.trim().to_string();
                    self.dispatch_close(&path, value, state, log);
                    path.pop();
                    text.clear();
                }
                Event::Text(e) => {
                    let raw = decode_latin1(&e);
                    match unescape(&raw) {
                        Ok(unescaped) => text.push_str(&unescaped),
                        Err(err) => {
                            log.warn(
                                self.source,
                                format!("无法解析的实体引用 ({}),保留原文: '{}'", err, raw.trim()),
                            );
                            text.push_str(&raw);
                        }
                    }
                }
                Event::CData(e) => text.push_str(&decode_latin1(&e)),
                Event::Eof => break,
                _ => {}
            }

            buf.clear();
        }

        match path.last() {
            Some(open_tag) => Err(ImportError::UnexpectedEof {
                open_tag: open_tag.clone(),
            }),
            None => Ok(()),
        }
    }

    fn dispatch_open(&self, path: &[String], state: &mut S, log: &mut DiagnosticsLog) {
        for binding in self.bindings.iter().filter(|b| b.matches(path)) {
            if let Some(action) = binding.on_open {
                action(state, log);
            }
        }
    }

    fn dispatch_close(&self, path: &[String], value: String, state: &mut S, log: &mut DiagnosticsLog) {
        let mut bound = self
            .bindings
            .iter()
            .filter(|b| b.matches(path))
            .filter_map(|b| b.on_close)
            .peekable();

        while let Some(action) = bound.next() {
            // 通常只有一个绑定命中,最后一个直接移交所有权
            if bound.peek().is_some() {
                action(state, value.clone(), log);
            } else {
                action(state, value, log);
                break;
            }
        }
    }
}

/// 打开输入文件
pub fn open_source(path: &Path) -> ImportResult<BufReader<File>> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path)?;
    Ok(BufReader::new(file))
}

/// ISO-8859-1 解码
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn tag_name(raw: &[u8]) -> String {
    decode_latin1(raw).to_ascii_lowercase()
}
