mod error;
mod event;
mod event_id;
mod flags;
mod header;
mod json;
mod priority;
mod wire;

pub use error::{EventError, Result};
pub use event::{Event, MAX_BODY_LENGTH};
pub use event_id::EventId;
pub use flags::EventFlags;
pub use header::{
    ci_hash, parse_header_index, split_indexed_name, HeaderRecord, HeaderValue, IndexError, Stack,
};
pub use json::{create_json, serialize_json, JSON_MAX_ARRAY_ITEMS, JSON_MAX_HEADERS, JSON_MAX_HEADER_NAME_LENGTH};
pub use priority::Priority;
pub use wire::{parse as parse_wire, serialize as serialize_wire};
