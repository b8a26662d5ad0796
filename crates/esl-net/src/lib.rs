//! Blocking socket plumbing shared by the connection layer: a raw
//! `poll(2)` wrapper and an inbound framer that feeds socket bytes
//! into an [`esl_buffer::Buffer`] and yields complete packets, pairing
//! a header block with the `Content-Length` body bytes that follow it
//! when one is present.

mod framer;
mod poll;

pub use framer::{Framer, Packet};
pub use poll::{wait_sock, PollFlags};

use thiserror::Error;

/// Errors raised while framing bytes read off the wire. I/O errors
/// from the underlying socket are reported as-is; framing errors
/// indicate the peer sent something that doesn't parse as ESL's
/// `Content-Length`-prefixed text format.
#[derive(Debug, Error)]
pub enum NetError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed Content-Length header: {0:?}")]
    MalformedContentLength(String),

    #[error("peer closed the connection")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, NetError>;
