//! A single-writer/single-reader growable byte buffer recognising
//! ESL's `\n\r?\n` packet boundary, used to accumulate inbound socket
//! bytes until a full header block (and, when present, its body) has
//! arrived.
//!
//! The buffer does not copy on read: it advances a `head` cursor into
//! an owned byte vector and decrements a `used` counter. When the
//! contiguous free space at the tail is insufficient for a write, the
//! buffer first rebases the live region back to the front (a `memmove`
//! equivalent) and only reallocates if that still isn't enough. This
//! two-phase strategy keeps memory bounded for streaming workloads
//! where the reader keeps up with the writer.

use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_ID: AtomicU32 = AtomicU32::new(0);

const DEFAULT_START_LEN: usize = 250;
const FREESPACE_UNBOUNDED_SENTINEL: usize = 1_000_000;

/// A growable byte region with write/read/seek/toss and ESL
/// packet-boundary scanning.
pub struct Buffer {
    data: Vec<u8>,
    head: usize,
    used: usize,
    actually_used: usize,
    max_len: usize,
    blocksize: usize,
    id: u32,
    loops: i32,
}

impl Buffer {
    /// Allocates a new buffer. `start_len` defaults to 250 bytes when
    /// zero; `blocksize` (the growth hint) defaults to `start_len` when
    /// zero. `max_len == 0` means unbounded.
    pub fn create(blocksize: usize, start_len: usize, max_len: usize) -> Self {
        let start_len = if start_len == 0 { DEFAULT_START_LEN } else { start_len };
        let blocksize = if blocksize == 0 { start_len } else { blocksize };

        Self {
            data: vec![0u8; start_len],
            head: 0,
            used: 0,
            actually_used: 0,
            max_len,
            blocksize,
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            loops: 0,
        }
    }

    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Total allocated capacity of the backing store.
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Bytes the caller may still write before hitting `max_len`, or a
    /// large sentinel when unbounded.
    pub const fn freespace(&self) -> usize {
        if self.max_len != 0 {
            if self.used >= self.max_len { 0 } else { self.max_len - self.used }
        } else {
            FREESPACE_UNBOUNDED_SENTINEL
        }
    }

    /// Bytes currently available to a reader.
    pub const fn inuse(&self) -> usize {
        self.used
    }

    pub fn set_loops(&mut self, loops: i32) {
        self.loops = loops;
    }

    /// Rebases `head` to `data + datalen` and recomputes `used`.
    pub fn seek(&mut self, datalen: usize) -> usize {
        if self.used < 1 {
            self.used = 0;
            return 0;
        }
        let reading = if self.used >= datalen { datalen } else { self.used };
        self.used = self.actually_used - reading;
        self.head = reading;
        reading
    }

    /// Like `read`, but discards bytes instead of returning them; does
    /// not touch `actually_used`.
    pub fn toss(&mut self, datalen: usize) -> usize {
        if self.used < 1 {
            self.used = 0;
            return 0;
        }
        let reading = if self.used >= datalen { datalen } else { self.used };
        self.used -= reading;
        self.head += reading;
        self.used
    }

    /// Copies up to `datalen` bytes into `dst`, advancing `head`.
    /// Returns the number of bytes copied.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        if self.used < 1 {
            self.used = 0;
            return 0;
        }
        let datalen = dst.len();
        let reading = if self.used >= datalen { datalen } else { self.used };
        dst[..reading].copy_from_slice(&self.data[self.head..self.head + reading]);
        self.used -= reading;
        self.head += reading;
        reading
    }

    /// Like `read`, but when short and `loops > 0`, rewinds to the
    /// start of the originally-written region and continues, consuming
    /// one loop per wrap.
    pub fn read_loop(&mut self, dst: &mut [u8]) -> usize {
        if dst.is_empty() {
            return 0;
        }
        let datalen = dst.len();
        let len = self.read(dst);
        if len < datalen {
            if self.loops == 0 {
                return len;
            }
            self.head = 0;
            self.used = self.actually_used;
            let more = self.read(&mut dst[len..]);
            self.loops -= 1;
            return len + more;
        }
        len
    }

    /// Scans `[head, head+used)` for non-overlapping `\n\r?\n`
    /// occurrences. Non-destructive.
    pub fn packet_count(&self) -> usize {
        find_packet_boundaries(&self.data[self.head..self.head + self.used]).count()
    }

    /// Extracts the first full header block (up through and including
    /// its terminating blank line) into `dst`, truncated at `dst.len()`.
    /// Returns 0 if no full packet is present yet.
    pub fn read_packet(&mut self, dst: &mut [u8]) -> usize {
        let live = &self.data[self.head..self.head + self.used];
        let Some(boundary_end) = find_packet_boundaries(live).next() else {
            return 0;
        };
        let datalen = boundary_end.min(dst.len());
        self.read(&mut dst[..datalen])
    }

    /// Appends `src` to the buffer, rebasing and/or growing as needed.
    /// Returns the new `used`, or 0 on cap/overflow/allocation failure
    /// (the buffer is left unmodified on failure).
    pub fn write(&mut self, src: &[u8]) -> usize {
        let datalen = src.len();
        if datalen == 0 {
            return self.used;
        }

        let total_len = self.data.len();
        if self.used > total_len || self.actually_used > total_len {
            return 0;
        }
        if self.max_len != 0 {
            if self.used > self.max_len {
                return 0;
            }
            if datalen > self.max_len - self.used {
                return 0;
            }
        }

        let actual_freespace = total_len - self.actually_used;
        if actual_freespace < datalen && (self.max_len == 0 || self.used + datalen <= self.max_len)
        {
            self.data.copy_within(self.head..self.head + self.used, 0);
            self.head = 0;
            self.actually_used = self.used;
        }

        let mut freespace = self.data.len() - self.used;
        if freespace < datalen {
            let Some(new_size) = self.data.len().checked_add(datalen) else {
                return 0;
            };
            let Some(new_block_size) = self.data.len().checked_add(self.blocksize) else {
                return 0;
            };
            let new_size = new_size.max(new_block_size);
            tracing::debug!(id = self.id, from = self.data.len(), to = new_size, "growing buffer");
            self.data.resize(new_size, 0);
            self.head = 0;
        }

        freespace = self.data.len() - self.used;
        if freespace < datalen {
            return 0;
        }

        self.data[self.head + self.used..self.head + self.used + datalen].copy_from_slice(src);
        self.used += datalen;
        self.actually_used += datalen;
        self.used
    }

    /// Resets all counters to 0 and rebases `head` to the front.
    pub fn zero(&mut self) {
        self.used = 0;
        self.actually_used = 0;
        self.head = 0;
    }

    /// `write`, but on failure zeroes the buffer and retries once.
    pub fn zwrite(&mut self, src: &[u8]) -> usize {
        let w = self.write(src);
        if w == 0 {
            self.zero();
            return self.write(src);
        }
        w
    }
}

/// Yields, for each non-overlapping `\n\r?\n` (or `\n\n`) occurrence in
/// `live`, the offset of the byte just past its terminating `\n`.
fn find_packet_boundaries(live: &[u8]) -> impl Iterator<Item = usize> + '_ {
    let mut p = 0;
    std::iter::from_fn(move || {
        while p < live.len() {
            if live[p] == b'\n' {
                let mut pe = p + 1;
                if pe >= live.len() {
                    return None;
                }
                if live[pe] == b'\r' {
                    pe += 1;
                    if pe >= live.len() {
                        return None;
                    }
                }
                if live[pe] == b'\n' {
                    p = pe + 1;
                    return Some(pe);
                }
            }
            p += 1;
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let mut buf = Buffer::create(0, 0, 0);
        assert_eq!(buf.write(b"hello world"), 11);
        let mut out = [0u8; 5];
        assert_eq!(buf.read(&mut out), 5);
        assert_eq!(&out, b"hello");
        assert_eq!(buf.inuse(), 6);
    }

    #[test]
    fn capped_buffer_rejects_overflowing_write() {
        let mut buf = Buffer::create(0, 16, 8);
        assert_eq!(buf.write(b"123456789"), 0);
        assert_eq!(buf.inuse(), 0);
        assert_eq!(buf.write(b"12345678"), 8);
    }

    #[test]
    fn packet_count_and_read_packet_find_blank_line() {
        // `read_packet` stops at the first `\n` of the blank-line pair;
        // the second `\n` (the pair's terminator) is left in the buffer
        // for the framing loop to `toss` before reading the body.
        let mut buf = Buffer::create(0, 0, 0);
        buf.write(b"Content-Type: api/response\nContent-Length: 7\n\nbody-42");
        assert_eq!(buf.packet_count(), 1);
        let mut out = [0u8; 64];
        let n = buf.read_packet(&mut out);
        assert_eq!(&out[..n], b"Content-Type: api/response\nContent-Length: 7\n");
        assert_eq!(buf.packet_count(), 0);
        assert_eq!(buf.toss(1), 7);
        let mut body = [0u8; 7];
        assert_eq!(buf.read(&mut body), 7);
        assert_eq!(&body, b"body-42");
    }

    #[test]
    fn read_packet_returns_zero_without_full_packet() {
        let mut buf = Buffer::create(0, 0, 0);
        buf.write(b"Content-Type: api/response\n");
        let mut out = [0u8; 64];
        assert_eq!(buf.read_packet(&mut out), 0);
    }

    #[test]
    fn toss_discards_without_touching_actually_used() {
        let mut buf = Buffer::create(0, 0, 0);
        buf.write(b"abcdef");
        assert_eq!(buf.toss(3), 3);
        let mut out = [0u8; 3];
        assert_eq!(buf.read(&mut out), 3);
        assert_eq!(&out, b"def");
    }

    #[test]
    fn read_loop_wraps_when_loops_set() {
        let mut buf = Buffer::create(0, 0, 0);
        buf.write(b"abc");
        buf.set_loops(1);
        let mut out = [0u8; 5];
        let n = buf.read_loop(&mut out);
        assert_eq!(n, 5);
        assert_eq!(&out, b"abcab");
    }

    #[test]
    fn zwrite_zeroes_and_retries_on_failure() {
        let mut buf = Buffer::create(0, 8, 4);
        buf.write(b"ab");
        assert_eq!(buf.zwrite(b"abcd"), 4);
        assert_eq!(buf.inuse(), 4);
    }

    #[test]
    fn grows_by_rebasing_before_reallocating() {
        let mut buf = Buffer::create(4, 8, 0);
        buf.write(b"1234");
        let mut out = [0u8; 2];
        buf.read(&mut out);
        // Freed up 2 bytes at the front; a further write that fits in
        // the rebased region should not need to grow `datalen`.
        let before = buf.len();
        buf.write(b"56");
        assert_eq!(buf.len(), before);
        buf.write(b"789012345");
        assert!(buf.len() > before);
    }
}
