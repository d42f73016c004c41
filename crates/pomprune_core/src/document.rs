use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use log::trace;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::PomError;

/// How far into the input the XML declaration is looked for
const DECLARATION_WINDOW: usize = 1024;

/// A descriptor's text together with the encoding it was stored in.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
    encoding: &'static Encoding,
}

impl Document {
    pub fn read(path: &Path) -> Result<Self, PomError> {
        let bytes =
            fs::read(path).map_err(|source| PomError::Io { path: path.to_path_buf(), source })?;
        Self::decode(&bytes, path)
    }

    /// Decodes `bytes` using the encoding named by its byte order mark or XML
    /// declaration, UTF-8 when neither is present.
    ///
    /// A byte order mark is kept in the text as U+FEFF so that encoding the
    /// text again reproduces it.
    pub fn decode(bytes: &[u8], path: &Path) -> Result<Self, PomError> {
        let encoding = detect_encoding(bytes, path)?;
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            return Err(PomError::InvalidEncoding {
                path: path.to_path_buf(),
                encoding: encoding.name(),
            });
        }
        trace!("Decoded {} as {}", path.display(), encoding.name());
        Ok(Self { path: path.to_path_buf(), text: text.into_owned(), encoding })
    }

    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Encodes `text` in this document's encoding.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        if self.encoding == UTF_16LE {
            text.encode_utf16().flat_map(u16::to_le_bytes).collect()
        } else if self.encoding == UTF_16BE {
            text.encode_utf16().flat_map(u16::to_be_bytes).collect()
        } else {
            let (bytes, _, _) = self.encoding.encode(text);
            bytes.into_owned()
        }
    }
}

fn detect_encoding(bytes: &[u8], path: &Path) -> Result<&'static Encoding, PomError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Ok(encoding);
    }
    // UTF-16 without a byte order mark, recognised by its "<?" prefix
    match bytes {
        [0x3C, 0x00, 0x3F, 0x00, ..] => return Ok(UTF_16LE),
        [0x00, 0x3C, 0x00, 0x3F, ..] => return Ok(UTF_16BE),
        _ => {}
    }

    let Some(label) = declared_encoding(bytes) else {
        return Ok(UTF_8);
    };
    match Encoding::for_label(label.as_bytes()) {
        // A single-byte declaration cannot describe a UTF-16 byte stream
        Some(encoding) if encoding == UTF_16LE || encoding == UTF_16BE => Ok(UTF_8),
        Some(encoding) => Ok(encoding),
        None => Err(PomError::UnsupportedEncoding { path: path.to_path_buf(), label }),
    }
}

/// The `encoding` pseudo-attribute of a leading `<?xml ...?>` declaration.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let window = &bytes[..bytes.len().min(DECLARATION_WINDOW)];
    let window = window.strip_prefix(b"<?xml")?;
    let end = window.windows(2).position(|w| w == b"?>")?;
    let declaration = String::from_utf8_lossy(&window[..end]);

    let (_, rest) = declaration.split_once("encoding")?;
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let value = &value[..value.find(quote)?];
    Some(value.trim().to_string())
}
