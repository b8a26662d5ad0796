//! A FreeSWITCH Event Socket Layer client: connect, authenticate,
//! issue commands, subscribe to events, and demultiplex the
//! full-duplex reply/event stream into synchronous replies and a
//! single-slot asynchronous event queue.

mod error;
mod handle;
mod listen;
mod logger;
mod shared;

pub use error::{EslError, EslStatus, Result};
pub use handle::{EventType, Handle};
pub use listen::{listen, listen_threaded, ListenCallback};
pub use logger::{log, set_logger, Level, LoggerFn};
pub use shared::SharedHandle;

pub use esl_event::{Event, EventError, EventFlags, EventId, HeaderValue, Priority, Stack};
