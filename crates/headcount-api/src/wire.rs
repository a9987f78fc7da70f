//! Wire format of the camera's `videoStatServer.cgi` endpoints.
//!
//! Both endpoints speak the same record format: lines of `key=value`.
//! The `attach` endpoint wraps each record in a multipart part and
//! streams them forever; `getSummary` returns a single bare record.
//!
//! Splitting is two-phase. The boundary token comes from the response's
//! `Content-Type` header ([`boundary_from_content_type`]); once known,
//! [`MultipartSplitter`] cuts an append-only buffer at every occurrence,
//! independent of how the network happened to chunk the bytes.

use std::collections::HashMap;

use bytes::{Buf, Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;

use crate::error::Error;

/// Largest block the splitter buffers while waiting for a boundary.
pub const MAX_BLOCK_LEN: usize = 1024 * 1024;

/// A parsed `key=value` record.
pub type KeyValues = HashMap<String, String>;

// ── Record parsing ───────────────────────────────────────────────────

/// Parse a `key=value`-per-line record.
///
/// Blank lines and lines without `=` are skipped; each remaining line is
/// split on the first `=` and both halves are trimmed. Never fails: the
/// protocol is undocumented and devices occasionally emit partial lines.
pub fn parse_key_value_text(text: &str) -> KeyValues {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect()
}

// ── Boundary discovery ───────────────────────────────────────────────

/// Derive the on-wire boundary delimiter from a `Content-Type` header.
///
/// `multipart/x-mixed-replace; boundary=myboundary` yields `--myboundary`.
/// Quoted boundaries are unquoted. Returns `None` when no boundary is
/// declared.
pub fn boundary_from_content_type(content_type: &str) -> Option<Vec<u8>> {
    let (_, rest) = content_type.rsplit_once("boundary=")?;
    let token = rest.split(';').next().unwrap_or_default().trim();
    let token = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token);

    if token.is_empty() {
        return None;
    }

    let mut delimiter = Vec::with_capacity(token.len() + 2);
    delimiter.extend_from_slice(b"--");
    delimiter.extend_from_slice(token.as_bytes());
    Some(delimiter)
}

// ── Splitting ────────────────────────────────────────────────────────

/// Incremental multipart splitter over an append-only buffer.
///
/// Chunks are appended with [`push`](Self::push); every complete block
/// (the bytes before a boundary occurrence) is returned and removed from
/// the buffer, the remainder is kept for the next call. Until a boundary
/// is set the splitter only accumulates. Holding more than
/// [`MAX_BLOCK_LEN`] bytes fails with [`Error::BlockTooLarge`].
#[derive(Debug, Default)]
pub struct MultipartSplitter {
    boundary: Option<Vec<u8>>,
    buffer: BytesMut,
    /// Offset up to which `buffer` is known not to contain the boundary.
    scanned: usize,
}

impl MultipartSplitter {
    pub fn new(boundary: Option<Vec<u8>>) -> Self {
        Self {
            boundary: boundary.filter(|b| !b.is_empty()),
            buffer: BytesMut::new(),
            scanned: 0,
        }
    }

    /// Install the boundary once it has been discovered.
    ///
    /// Bytes buffered so far are not split until the next
    /// [`push`](Self::push) or [`drain`](Self::drain).
    pub fn set_boundary(&mut self, boundary: Vec<u8>) {
        if boundary.is_empty() {
            return;
        }
        self.boundary = Some(boundary);
        self.scanned = 0;
    }

    /// Number of bytes waiting for the next boundary.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Append a network chunk and return every block it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>, Error> {
        self.buffer.extend_from_slice(chunk);
        let blocks = self.drain();
        if self.buffer.len() > MAX_BLOCK_LEN {
            return Err(Error::BlockTooLarge {
                limit: MAX_BLOCK_LEN,
            });
        }
        Ok(blocks)
    }

    /// Cut every complete block out of the buffer.
    pub fn drain(&mut self) -> Vec<Bytes> {
        let Some(boundary) = self.boundary.as_deref() else {
            return Vec::new();
        };

        let mut blocks = Vec::new();
        loop {
            match find(&self.buffer[self.scanned..], boundary) {
                Some(offset) => {
                    let block = self.buffer.split_to(self.scanned + offset).freeze();
                    self.buffer.advance(boundary.len());
                    self.scanned = 0;
                    blocks.push(block);
                }
                None => {
                    // A boundary may straddle the end of the buffer; rescan
                    // the tail once more bytes arrive.
                    self.scanned = self.buffer.len().saturating_sub(boundary.len() - 1);
                    break;
                }
            }
        }
        blocks
    }
}

/// Split a chunked byte stream into multipart blocks.
///
/// The returned stream is infinite as long as `chunks` is, and is not
/// restartable: a new connection must rediscover its boundary. A chunk
/// error or an oversized block is yielded once and ends the stream.
pub fn split_multipart_blocks<S>(
    chunks: S,
    boundary: Option<Vec<u8>>,
) -> impl Stream<Item = Result<Bytes, Error>>
where
    S: Stream<Item = Result<Bytes, Error>>,
{
    async_stream::stream! {
        let mut splitter = MultipartSplitter::new(boundary);
        let mut chunks = std::pin::pin!(chunks);

        while let Some(chunk) = chunks.next().await {
            let blocks = match chunk.and_then(|bytes| splitter.push(&bytes)) {
                Ok(blocks) => blocks,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            for block in blocks {
                yield Ok(block);
            }
        }
    }
}

// ── Block bodies ─────────────────────────────────────────────────────

/// Extract the textual payload of one multipart block.
///
/// Skips the part headers up to the first empty line, trims the payload
/// and strips a trailing `--` terminator. Returns `None` for blocks that
/// are empty or have no header/body separator.
pub fn extract_block_body(raw: &[u8]) -> Option<String> {
    if raw.trim_ascii().is_empty() {
        return None;
    }

    let body = after_headers(raw)?.trim_ascii();
    let body = body
        .strip_suffix(b"--")
        .map_or(body, <[u8]>::trim_ascii_end);

    if body.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(body).into_owned())
}

/// Everything after the first `\r\n\r\n` or `\n\n`, whichever comes first.
fn after_headers(raw: &[u8]) -> Option<&[u8]> {
    let crlf = find(raw, b"\r\n\r\n").map(|i| (i, 4));
    let lf = find(raw, b"\n\n").map(|i| (i, 2));

    let (at, len) = [crlf, lf].into_iter().flatten().min_by_key(|(i, _)| *i)?;
    raw.get(at + len..)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ── Tests ────────────────────────────────────────────────────────────
