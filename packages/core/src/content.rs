//! Content read from and written to file handles.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Text encoding used by handles opened in text mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "ascii")]
    Ascii,
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl TextEncoding {
    pub fn decode(&self, bytes: &[u8]) -> std::result::Result<String, String> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string()),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(format!(
                    "byte 0x{:02x} at position {} is not ASCII",
                    bytes[pos], pos
                )),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    pub fn encode(&self, text: &str) -> std::result::Result<Vec<u8>, String> {
        let limit = match self {
            TextEncoding::Utf8 => return Ok(text.as_bytes().to_vec()),
            TextEncoding::Ascii => 0x7f,
            TextEncoding::Latin1 => 0xff,
        };
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                if (c as u32) <= limit {
                    Ok(c as u8)
                } else {
                    Err(format!("character {:?} at position {} is not {}", c, i, self))
                }
            })
            .collect()
    }

    /// Number of characters that start within `bytes`, counting one whose
    /// trailing bytes are still missing.
    pub(crate) fn char_starts(&self, bytes: &[u8]) -> usize {
        match self {
            TextEncoding::Utf8 => bytes.iter().filter(|&&b| b & 0xc0 != 0x80).count(),
            TextEncoding::Ascii | TextEncoding::Latin1 => bytes.len(),
        }
    }

    /// Length of the longest prefix of `bytes` that does not end inside a
    /// character. Invalid bytes are left for [`decode`](Self::decode) to
    /// report.
    pub(crate) fn complete_prefix_len(&self, bytes: &[u8]) -> usize {
        match self {
            TextEncoding::Utf8 => match std::str::from_utf8(bytes) {
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                _ => bytes.len(),
            },
            TextEncoding::Ascii | TextEncoding::Latin1 => bytes.len(),
        }
    }

    /// Number of bytes `text` occupies under this encoding.
    pub fn byte_len(&self, text: &str) -> usize {
        match self {
            TextEncoding::Utf8 => text.len(),
            TextEncoding::Ascii | TextEncoding::Latin1 => text.chars().count(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin-1",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TextEncoding {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            _ => Err(Error::InvalidContent {
                message: format!("unknown text encoding {:?}", name),
            }),
        }
    }
}

/// A block of file content.
///
/// Text handles produce `Text` and `Lines`; binary handles produce `Bytes`
/// and `ByteLines`. Lines keep their trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Bytes(Vec<u8>),
    Lines(Vec<String>),
    ByteLines(Vec<Vec<u8>>),
}

impl Content {
    pub fn is_lines(&self) -> bool {
        matches!(self, Content::Lines(_) | Content::ByteLines(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Content::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Convert to the bytes to hand to a file.
    ///
    /// Text going into a binary handle is encoded; bytes going into a text
    /// handle must decode under `encoding` or they are stored as base64 text
    /// instead. Encoding problems never fail the write; they are returned as
    /// warnings.
    pub(crate) fn into_file_bytes(
        self,
        binary: bool,
        encoding: TextEncoding,
        as_lines: bool,
    ) -> Result<(Vec<u8>, Vec<WriteWarning>)> {
        if as_lines != self.is_lines() {
            return Err(Error::InvalidContent {
                message: if as_lines {
                    "writing lines requires line content".to_string()
                } else {
                    "line content must be written with as_lines".to_string()
                },
            });
        }

        let mut out = Vec::new();
        let mut warnings = Vec::new();
        match self {
            Content::Text(text) => encode_text(&text, encoding, &mut out, &mut warnings),
            Content::Lines(lines) => {
                for line in &lines {
                    encode_text(line, encoding, &mut out, &mut warnings);
                }
            }
            Content::Bytes(bytes) => {
                encode_bytes(bytes, binary, encoding, &mut out, &mut warnings)
            }
            Content::ByteLines(lines) => {
                for line in lines {
                    encode_bytes(line, binary, encoding, &mut out, &mut warnings);
                }
            }
        }
        Ok((out, warnings))
    }
}

fn encode_text(
    text: &str,
    encoding: TextEncoding,
    out: &mut Vec<u8>,
    warnings: &mut Vec<WriteWarning>,
) {
    match encoding.encode(text) {
        Ok(bytes) => out.extend_from_slice(&bytes),
        Err(message) => {
            warnings.push(WriteWarning::EncodingFallback {
                encoding,
                fallback: "utf-8",
                message,
            });
            out.extend_from_slice(text.as_bytes());
        }
    }
}

fn encode_bytes(
    bytes: Vec<u8>,
    binary: bool,
    encoding: TextEncoding,
    out: &mut Vec<u8>,
    warnings: &mut Vec<WriteWarning>,
) {
    if binary {
        out.extend_from_slice(&bytes);
        return;
    }
    match encoding.decode(&bytes) {
        Ok(_) => out.extend_from_slice(&bytes),
        Err(message) => {
            warnings.push(WriteWarning::EncodingFallback {
                encoding,
                fallback: "base64",
                message,
            });
            let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
            out.extend_from_slice(encoded.as_bytes());
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(b: Vec<u8>) -> Self {
        Content::Bytes(b)
    }
}

impl From<&[u8]> for Content {
    fn from(b: &[u8]) -> Self {
        Content::Bytes(b.to_vec())
    }
}

impl From<Vec<String>> for Content {
    fn from(lines: Vec<String>) -> Self {
        Content::Lines(lines)
    }
}

impl From<Vec<&str>> for Content {
    fn from(lines: Vec<&str>) -> Self {
        Content::Lines(lines.into_iter().map(String::from).collect())
    }
}

/// Options for [`FileHandle::read`](crate::FileHandle::read).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Chars (text), bytes (binary) or lines (`as_lines`) to read. `None`
    /// reads the rest of the file.
    pub amount: Option<usize>,
    pub as_lines: bool,
    /// Seek here before reading.
    pub from_offset: Option<u64>,
}

impl ReadOptions {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn amount(mut self, amount: usize) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn lines(mut self) -> Self {
        self.as_lines = true;
        self
    }

    pub fn at(mut self, offset: u64) -> Self {
        self.from_offset = Some(offset);
        self
    }
}

/// Options for [`FileHandle::write`](crate::FileHandle::write).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Hand the bytes to the file before returning.
    pub flush: bool,
    pub as_lines: bool,
}

impl WriteOptions {
    /// Keep the bytes in the handle until the next flush.
    pub fn buffered() -> Self {
        Self {
            flush: false,
            as_lines: false,
        }
    }

    pub fn lines(mut self) -> Self {
        self.as_lines = true;
        self
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            flush: true,
            as_lines: false,
        }
    }
}

/// Non-fatal problems encountered while writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteWarning {
    /// Content could not be represented under `encoding` and was written
    /// using `fallback` instead.
    EncodingFallback {
        encoding: TextEncoding,
        fallback: &'static str,
        message: String,
    },
}

impl fmt::Display for WriteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteWarning::EncodingFallback {
                encoding,
                fallback,
                message,
            } => write!(
                f,
                "content not valid {} ({}), written as {}",
                encoding, message, fallback
            ),
        }
    }
}

/// Result of a successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub bytes_written: usize,
    pub warnings: Vec<WriteWarning>,
}
