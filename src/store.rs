//! Line store: the config file as an ordered sequence of lines plus an
//! unparsed remainder.
//!
//! The file is handled as raw bytes. Nickel does not guarantee UTF-8 in
//! sections it does not own (book titles, paths), and those bytes must come
//! back out exactly as they went in.
//!
//! Nothing is cached between calls. Every engine operation opens a fresh
//! [`LineStore`], walks it once, and either discards it (reads) or renders a
//! replacement file from a rewritten prefix and the verbatim tail (writes).

use std::fs;
use std::io;
use std::path::Path;

use crate::Result;

/// The full contents of the config file as it was on disk when opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStore {
    content: Vec<u8>,
}

/// One line of the store with its byte span.
///
/// `start..end` covers the line including its terminator, so
/// `remainder_from(line.end)` is everything after this line and
/// `remainder_from(line.start)` is this line and everything after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Line bytes without `\n` or `\r\n`
    pub text: &'a [u8],
    /// Byte offset of the first byte of the line
    pub start: usize,
    /// Byte offset just past the line terminator
    pub end: usize,
}

impl LineStore {
    /// Build a store from in-memory bytes.
    pub fn from_content(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Read the file at `path`.
    ///
    /// Returns `Ok(None)` if the file does not exist. Any other failure
    /// (permissions, path is a directory) is propagated.
    pub fn open(path: &Path) -> Result<Option<Self>> {
        match fs::read(path) {
            Ok(content) => Ok(Some(Self { content })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the file at `path`, treating a missing file as empty.
    pub fn open_or_empty(path: &Path) -> Result<Self> {
        Ok(Self::open(path)?.unwrap_or_default())
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Iterate over lines in file order.
    pub fn lines(&self) -> impl Iterator<Item = Line<'_>> {
        let mut offset = 0;
        self.content.split_inclusive(|&b| b == b'\n').map(move |raw| {
            let start = offset;
            offset += raw.len();
            let text = raw.strip_suffix(b"\n").unwrap_or(raw);
            let text = text.strip_suffix(b"\r").unwrap_or(text);
            Line {
                text,
                start,
                end: offset,
            }
        })
    }

    /// Everything from `offset` to end of file, verbatim.
    pub fn remainder_from(&self, offset: usize) -> &[u8] {
        self.content.get(offset..).unwrap_or(&[])
    }
}

/// Join rewritten prefix lines with `\n` and append the remainder untouched.
///
/// Every prefix line gets a terminator, so the remainder always starts on a
/// fresh line.
pub fn render<S: AsRef<[u8]>>(prefix: &[S], remainder: &[u8]) -> Vec<u8> {
    let capacity = prefix.iter().map(|l| l.as_ref().len() + 1).sum::<usize>() + remainder.len();
    let mut out = Vec::with_capacity(capacity);
    for line in prefix {
        out.extend_from_slice(line.as_ref());
        out.push(b'\n');
    }
    out.extend_from_slice(remainder);
    out
}

/// Truncate `path` and write `content` in its place.
///
/// Not atomic: a crash mid-write can leave a partial file.
pub fn write(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content)?;
    Ok(())
}
