use thiserror::Error;

/// The connection layer's error taxonomy. `Timeout` deliberately has no
/// variant here: a bounded wait elapsing is success with a `None`
/// out-event, not a failure (see [`EslStatus`] for the handle's own
/// sticky-disconnect bookkeeping).
#[derive(Debug, Error)]
pub enum EslError {
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("resource exhausted: {0}")]
    Resource(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("handle is in an invalid state for this operation: {0}")]
    State(String),

    #[error(transparent)]
    Event(#[from] esl_event::EventError),
}

impl From<esl_net::NetError> for EslError {
    fn from(err: esl_net::NetError) -> Self {
        match err {
            esl_net::NetError::Io(e) => Self::Io(e),
            esl_net::NetError::Disconnected => Self::State("peer closed the connection".into()),
            esl_net::NetError::MalformedContentLength(s) => {
                Self::Protocol(format!("malformed Content-Length: {s:?}"))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EslError>;

/// Mirrors the wire protocol's own status vocabulary. Kept alongside
/// `Result<T, EslError>` (rather than instead of it) for parity with
/// the handle's sticky-disconnection bookkeeping: once a handle
/// observes `Disconnected`, every later operation short-circuits to it
/// without re-touching the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EslStatus {
    Success,
    Fail,
    Break,
    Disconnected,
    Generr,
}

impl EslStatus {
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl<T> From<&Result<T>> for EslStatus {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(EslError::State(_)) => Self::Disconnected,
            Err(_) => Self::Fail,
        }
    }
}
