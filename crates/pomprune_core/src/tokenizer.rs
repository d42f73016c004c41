use log::trace;
use logos::Logos;

use crate::{
    error::{ParseError, ParseResult},
    event::{Event, EventKind, Position, is_xml_whitespace},
};

const BOM: char = '\u{feff}';

/// Raw markup tokens. Every byte of a well-formed document belongs to exactly one token.
///
/// Markup with an unbounded body matches only its opener; a callback then
/// extends the match to the terminator.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    #[regex(r"<[A-Za-z_:]", start_tag)]
    StartTag,

    #[regex(r"</[A-Za-z_:][A-Za-z0-9_:.\-]*\s*>")]
    EndTag,

    #[token("<!--", |lex| until(lex, "-->"))]
    Comment,

    #[token("<![CDATA[", |lex| until(lex, "]]>"))]
    CData,

    #[token("<?", |lex| until(lex, "?>"))]
    Instruction,

    #[regex(r"<!DOCTYPE[^>\[]*(\[[^\]]*\])?\s*>")]
    Doctype,

    #[regex(r"[^<]+")]
    Text,
}

/// Extends a start tag to its closing `>`. Quoted attribute values may
/// contain `>`; an unquoted `<` means the tag was never closed.
fn start_tag(lex: &mut logos::Lexer<Token>) -> bool {
    let mut quote: Option<u8> = None;
    for (i, b) in lex.remainder().bytes().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'<' => return false,
                b'>' => {
                    lex.bump(i + 1);
                    return true;
                }
                _ => {}
            },
        }
    }
    false
}

/// Extends the current token past the first `terminator`.
fn until(lex: &mut logos::Lexer<Token>, terminator: &str) -> bool {
    match lex.remainder().find(terminator) {
        Some(i) => {
            lex.bump(i + terminator.len());
            true
        }
        None => false,
    }
}

/// Forward-only structural event stream over an XML document.
///
/// The reader checks well-formedness while it streams: end tags must close the
/// innermost open element, the document must have exactly one root element and
/// no character data outside it, and the input must not end with elements still
/// open. After the first error the reader is exhausted.
pub struct EventReader<'src> {
    lexer: logos::Lexer<'src, Token>,
    bom: Option<&'src str>,
    cursor: Position,
    open: Vec<&'src str>,
    pending_end: Option<Event<'src>>,
    seen_root: bool,
    finished: bool,
}

impl<'src> EventReader<'src> {
    pub fn new(source: &'src str) -> Self {
        let (bom, body) = match source.strip_prefix(BOM) {
            Some(rest) => (Some(&source[..BOM.len_utf8()]), rest),
            None => (None, source),
        };
        Self {
            lexer: Token::lexer(body),
            bom,
            cursor: Position { line: 1, column: 1 },
            open: Vec::new(),
            pending_end: None,
            seen_root: false,
            finished: false,
        }
    }

    /// Moves the cursor past `raw` and returns the position where `raw` started.
    fn advance(&mut self, raw: &str) -> Position {
        let start = self.cursor;
        for c in raw.chars() {
            if c == '\n' {
                self.cursor.line += 1;
                self.cursor.column = 1;
            } else if c != BOM {
                self.cursor.column += 1;
            }
        }
        start
    }

    fn event_for(&mut self, token: Result<Token, ()>) -> ParseResult<Event<'src>> {
        let raw = self.lexer.slice();
        let position = self.advance(raw);
        let token = token.map_err(|_| {
            ParseError::malformed(position, format!("unrecognised markup {:?}", excerpt(raw)))
        })?;
        trace!("{:?} at {}: {:?}", token, position, excerpt(raw));

        let event = |kind, name| Event { kind, name, raw, position };
        match token {
            Token::StartTag => {
                let name = tag_name(&raw[1..]);
                if self.open.is_empty() && self.seen_root {
                    return Err(ParseError::malformed(
                        position,
                        format!("second root element <{}>", name),
                    ));
                }
                self.seen_root = true;
                if raw.ends_with("/>") {
                    self.pending_end = Some(Event {
                        kind: EventKind::EndTag,
                        name,
                        raw: &raw[raw.len()..],
                        position,
                    });
                } else {
                    self.open.push(name);
                }
                Ok(event(EventKind::StartTag, name))
            }
            Token::EndTag => {
                let name = tag_name(&raw[2..]);
                match self.open.pop() {
                    Some(open) if open == name => Ok(event(EventKind::EndTag, name)),
                    Some(open) => Err(ParseError::malformed(
                        position,
                        format!("</{}> does not close <{}>", name, open),
                    )),
                    None => Err(ParseError::malformed(position, format!("unexpected </{}>", name))),
                }
            }
            Token::Comment => Ok(event(EventKind::Comment, "")),
            Token::CData => {
                if self.open.is_empty() {
                    return Err(ParseError::malformed(position, "CDATA section outside root element"));
                }
                Ok(event(EventKind::Text, ""))
            }
            Token::Instruction | Token::Doctype => Ok(event(EventKind::Directive, "")),
            Token::Text => {
                if self.open.is_empty() && !is_xml_whitespace(raw) {
                    return Err(ParseError::malformed(
                        position,
                        format!("text {:?} outside root element", excerpt(raw)),
                    ));
                }
                Ok(event(EventKind::Text, ""))
            }
        }
    }

    fn finish(&self) -> Option<ParseError> {
        if let Some(name) = self.open.last() {
            Some(ParseError::unexpected_eof(format!("</{}>", name)))
        } else if !self.seen_root {
            Some(ParseError::unexpected_eof("a root element"))
        } else {
            None
        }
    }
}

impl<'src> Iterator for EventReader<'src> {
    type Item = ParseResult<Event<'src>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(end) = self.pending_end.take() {
            return Some(Ok(end));
        }
        if let Some(bom) = self.bom.take() {
            let position = self.advance(bom);
            return Some(Ok(Event { kind: EventKind::Directive, name: "", raw: bom, position }));
        }

        let result = match self.lexer.next() {
            Some(token) => self.event_for(token),
            None => {
                self.finished = true;
                return self.finish().map(Err);
            }
        };
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

fn tag_name(after_bracket: &str) -> &str {
    after_bracket.split(|c: char| c.is_whitespace() || c == '/' || c == '>').next().unwrap_or("")
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(32).collect()
}
