use std::io::{self, Write};

use crate::{error::ParseResult, event::Event};

/// Writes the source text of each event in order.
pub fn write_events<'src, W, I>(events: I, writer: &mut W) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = Event<'src>>,
{
    for event in events {
        writer.write_all(event.raw.as_bytes())?;
    }
    Ok(())
}

/// Drains a fallible event stream into a document.
///
/// Nothing is returned unless the whole stream succeeds, so a parse failure
/// part-way through never yields a truncated document.
pub fn render<'src, I>(events: I) -> ParseResult<String>
where
    I: IntoIterator<Item = ParseResult<Event<'src>>>,
{
    let mut out = String::new();
    for event in events {
        out.push_str(event?.raw);
    }
    Ok(out)
}
