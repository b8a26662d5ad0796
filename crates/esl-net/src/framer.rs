use std::io::Read;

use esl_buffer::Buffer;

use crate::{NetError, Result};

/// Mirrors the handle's fixed-size per-read scratch buffer.
const SOCKET_BUF_SIZE: usize = 65_536;
/// Matches the header-block size the original handle carries inline.
const HEADER_SCRATCH_SIZE: usize = 1024 * 64;

/// One fully-assembled frame: the raw header-block text (still
/// containing its trailing single `\n`, with the blank-line terminator
/// already discarded) plus the `Content-Length` body bytes, if any.
#[derive(Debug, Clone)]
pub struct Packet {
    pub header_text: String,
    pub body: Option<Vec<u8>>,
}

/// Accumulates bytes read from a blocking stream into an
/// [`esl_buffer::Buffer`] and yields whole packets, handling the
/// `Content-Length` body follow-up read transparently.
pub struct Framer {
    buf: Buffer,
    scratch: [u8; SOCKET_BUF_SIZE],
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    pub fn new() -> Self {
        Self { buf: Buffer::create(0, 0, 0), scratch: [0u8; SOCKET_BUF_SIZE] }
    }

    /// Blocks on `stream` (a single, already-connected socket) until a
    /// complete packet is assembled, reading as many socket chunks as
    /// needed. Returns [`NetError::Disconnected`] on EOF.
    pub fn read_packet(&mut self, stream: &mut impl Read) -> Result<Packet> {
        let header_text = self.next_header_block(stream)?;
        let body = match content_length(&header_text) {
            Some(len) => Some(self.read_body(stream, len)?),
            None => None,
        };
        Ok(Packet { header_text, body })
    }

    fn next_header_block(&mut self, stream: &mut impl Read) -> Result<String> {
        let mut scratch = [0u8; HEADER_SCRATCH_SIZE];
        loop {
            let n = self.buf.read_packet(&mut scratch);
            if n > 0 {
                // Discard the blank line's second newline, left in the
                // buffer by design -- see esl_buffer's read_packet.
                self.buf.toss(1);
                return Ok(String::from_utf8_lossy(&scratch[..n]).into_owned());
            }
            self.fill(stream)?;
        }
    }

    fn read_body(&mut self, stream: &mut impl Read, len: usize) -> Result<Vec<u8>> {
        while self.buf.inuse() < len {
            self.fill(stream)?;
        }
        let mut body = vec![0u8; len];
        self.buf.read(&mut body);
        Ok(body)
    }

    fn fill(&mut self, stream: &mut impl Read) -> Result<()> {
        let n = stream.read(&mut self.scratch)?;
        if n == 0 {
            tracing::debug!("peer closed the connection mid-frame");
            return Err(NetError::Disconnected);
        }
        if self.buf.zwrite(&self.scratch[..n]) == 0 {
            tracing::warn!(bytes = n, "frame buffer exhausted while accumulating a packet");
            return Err(NetError::Io(std::io::Error::other("frame buffer exhausted")));
        }
        Ok(())
    }
}

/// Case-insensitive scan for a `Content-Length: N` header line.
fn content_length(header_text: &str) -> Option<usize> {
    for line in header_text.lines() {
        let Some((name, value)) = line.split_once(':') else { continue };
        if name.trim().eq_ignore_ascii_case("content-length") {
            return value.trim().parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_header_only_packet() {
        let mut stream = Cursor::new(b"Content-Type: text/disconnect-notice\n\n".to_vec());
        let mut framer = Framer::new();
        let packet = framer.read_packet(&mut stream).unwrap();
        assert_eq!(packet.header_text, "Content-Type: text/disconnect-notice\n");
        assert!(packet.body.is_none());
    }

    #[test]
    fn reads_header_and_content_length_body_across_chunks() {
        let mut stream =
            Cursor::new(b"Content-Type: api/response\nContent-Length: 7\n\nbody-42".to_vec());
        let mut framer = Framer::new();
        let packet = framer.read_packet(&mut stream).unwrap();
        assert_eq!(packet.body.as_deref(), Some(b"body-42".as_slice()));
    }

    #[test]
    fn disconnect_on_eof_before_full_packet() {
        let mut stream = Cursor::new(b"Content-Type: api/response\n".to_vec());
        let mut framer = Framer::new();
        let err = framer.read_packet(&mut stream).unwrap_err();
        assert!(matches!(err, NetError::Disconnected));
    }

    #[test]
    fn content_length_lookup_is_case_insensitive() {
        assert_eq!(content_length("content-length: 42\n"), Some(42));
        assert_eq!(content_length("Other-Header: x\n"), None);
    }
}
