/// Errors raised by the [`crate::Event`] builder and its codecs.
///
/// Mirrors the abstract Argument/Resource/Protocol kinds from the
/// surrounding connection's error taxonomy, scoped to what the Event
/// type itself can detect; I/O and State errors belong to the
/// connection layer, not here.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("header index out of range: {index} (max {max})")]
    HeaderIndexOutOfRange { index: i64, max: i64 },

    #[error("malformed header index suffix: {0:?}")]
    MalformedHeaderIndex(String),

    #[error("subclass_name is only legal for CUSTOM/CLONE events")]
    SubclassNotAllowed,

    #[error("body of {len} bytes exceeds the {max} byte limit")]
    BodyTooLarge { len: usize, max: usize },

    #[error("header name {0:?} exceeds {1} bytes")]
    HeaderNameTooLong(String, usize),

    #[error("string value exceeds {0} bytes")]
    StringTooLong(usize),

    #[error("JSON object carries {count} headers, exceeding the {max} limit")]
    TooManyHeaders { count: usize, max: usize },

    #[error("header {name:?} array carries {count} items, exceeding the {max} limit")]
    TooManyArrayItems { name: String, count: usize, max: usize },

    #[error("unrecognised event-name {0:?}")]
    UnknownEventName(String),

    #[error("JSON root is not an object")]
    JsonRootNotObject,

    #[error("member {0:?} has a null value or a type other than string/array")]
    InvalidMemberValue(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("malformed wire packet: {0}")]
    MalformedPacket(String),
}

pub type Result<T> = std::result::Result<T, EventError>;
