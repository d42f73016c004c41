use std::fmt;

/// Kind of a structural event produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    StartTag,
    EndTag,
    Text,
    Comment,
    /// XML declaration, processing instruction, DOCTYPE or byte-order mark
    Directive,
}

/// 1-based source position of the first byte of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One structural token borrowed from the source document.
///
/// `raw` is the exact slice of source text the event covers, so writing the
/// `raw` of every event in order reproduces the document. A self-closing
/// element yields a start tag carrying the whole `<a/>` text followed by an
/// end tag with an empty `raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<'src> {
    pub kind: EventKind,
    pub name: &'src str,
    pub raw: &'src str,
    pub position: Position,
}

impl<'src> Event<'src> {
    pub fn is_start(&self, name: &str) -> bool {
        self.kind == EventKind::StartTag && self.name == name
    }

    pub fn is_end(&self, name: &str) -> bool {
        self.kind == EventKind::EndTag && self.name == name
    }

    /// Whitespace-only text or a comment: the interstitial material between siblings.
    pub fn is_separator(&self) -> bool {
        match self.kind {
            EventKind::Comment => true,
            EventKind::Text => is_xml_whitespace(self.raw),
            _ => false,
        }
    }
}

pub(crate) fn is_xml_whitespace(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}
