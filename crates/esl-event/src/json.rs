use serde_json::{Map, Value};

use crate::error::{EventError, Result};
use crate::event::{Event, MAX_BODY_LENGTH};
use crate::event_id::EventId;
use crate::header::Stack;

/// Ceiling on the number of top-level keys a decoded JSON object may
/// carry.
pub const JSON_MAX_HEADERS: usize = 4_096;
/// Ceiling on the number of elements in a single JSON array header.
pub const JSON_MAX_ARRAY_ITEMS: usize = 4_096;
/// Ceiling on a JSON object key's length.
pub const JSON_MAX_HEADER_NAME_LENGTH: usize = 1_024;
/// Ceiling shared by any individual JSON string value (header value,
/// array element, or body).
pub const JSON_MAX_STRING_LENGTH: usize = MAX_BODY_LENGTH;

/// Builds an [`Event`] from a JSON object: every string-valued key
/// becomes a scalar header, every array-valued key an indexed one
/// (pushed element by element), `_body` sets the body instead of
/// becoming a header, and `event-name` additionally drives
/// [`EventId::name_event`] resolution (the header is still stored).
/// A null member value, or a value of a type other than string/array,
/// fails the whole decode.
pub fn create_json(json: &str) -> Result<Event> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(root) = value else {
        return Err(EventError::JsonRootNotObject);
    };

    if root.len() > JSON_MAX_HEADERS {
        return Err(EventError::TooManyHeaders { count: root.len(), max: JSON_MAX_HEADERS });
    }

    let mut event = Event::new(EventId::Clone);
    for (name, value) in &root {
        if name.len() > JSON_MAX_HEADER_NAME_LENGTH {
            return Err(EventError::HeaderNameTooLong(name.clone(), JSON_MAX_HEADER_NAME_LENGTH));
        }

        match value {
            Value::String(text) => {
                if text.len() > JSON_MAX_STRING_LENGTH {
                    return Err(EventError::StringTooLong(JSON_MAX_STRING_LENGTH));
                }
                if name.eq_ignore_ascii_case("_body") {
                    event.set_body(text.clone().into_bytes())?;
                } else if name.eq_ignore_ascii_case("event-subclass") {
                    event.subclass_name = Some(text.clone());
                } else {
                    if name.eq_ignore_ascii_case("event-name") {
                        let _ = event.del_header("event-name");
                        match EventId::name_event(text) {
                            Some(id) => event.event_id = id,
                            None => return Err(EventError::UnknownEventName(text.clone())),
                        }
                    }
                    event.add_header_at(name, text.clone(), Stack::Bottom)?;
                }
            }
            Value::Array(items) => {
                if items.len() > JSON_MAX_ARRAY_ITEMS {
                    return Err(EventError::TooManyArrayItems {
                        name: name.clone(),
                        count: items.len(),
                        max: JSON_MAX_ARRAY_ITEMS,
                    });
                }
                for item in items {
                    let Value::String(text) = item else {
                        return Err(EventError::InvalidMemberValue(name.clone()));
                    };
                    if text.len() > JSON_MAX_STRING_LENGTH {
                        return Err(EventError::StringTooLong(JSON_MAX_STRING_LENGTH));
                    }
                    event.add_header_at(name, text.clone(), Stack::Push)?;
                }
            }
            _ => return Err(EventError::InvalidMemberValue(name.clone())),
        }
    }

    Ok(event)
}

/// Renders an [`Event`] to a JSON object: scalar headers become string
/// values, indexed headers become JSON arrays, and a present body is
/// emitted as a `Content-Length` string alongside a `_body` string
/// (mirroring [`create_json`]'s special-cased round trip).
pub fn serialize_json(event: &Event) -> Result<String> {
    let mut obj = Map::new();

    if let Some(subclass) = &event.subclass_name {
        obj.insert("Event-Subclass".to_string(), Value::String(subclass.clone()));
    }

    for header in event.headers() {
        if header.name.len() > JSON_MAX_HEADER_NAME_LENGTH {
            return Err(EventError::HeaderNameTooLong(header.name.clone(), JSON_MAX_HEADER_NAME_LENGTH));
        }
        match &header.value {
            crate::header::HeaderValue::Scalar(s) => {
                obj.insert(header.name.clone(), Value::String(s.clone()));
            }
            crate::header::HeaderValue::Array(items) => {
                if items.len() > JSON_MAX_ARRAY_ITEMS {
                    return Err(EventError::TooManyArrayItems {
                        name: header.name.clone(),
                        count: items.len(),
                        max: JSON_MAX_ARRAY_ITEMS,
                    });
                }
                let array = items.iter().cloned().map(Value::String).collect();
                obj.insert(header.name.clone(), Value::Array(array));
            }
        }
    }

    if let Some(body) = &event.body {
        if body.len() > MAX_BODY_LENGTH {
            return Err(EventError::BodyTooLarge { len: body.len(), max: MAX_BODY_LENGTH });
        }
        let text = String::from_utf8_lossy(body).into_owned();
        obj.insert("Content-Length".to_string(), Value::String(body.len().to_string()));
        obj.insert("_body".to_string(), Value::String(text));
    }

    Ok(serde_json::to_string(&Value::Object(obj))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_json_resolves_event_name_and_keeps_header() {
        let event = create_json(r#"{"Event-Name":"CHANNEL_ANSWER"}"#).unwrap();
        assert_eq!(event.event_id, EventId::ChannelAnswer);
        assert_eq!(event.get_header("Event-Name").as_deref(), Some("CHANNEL_ANSWER"));
    }

    #[test]
    fn create_json_sets_body_from_underscore_body_key() {
        let event = create_json(r#"{"_body":"hello"}"#).unwrap();
        assert_eq!(event.get_body(), Some(b"hello".as_slice()));
        assert!(event.get_header("_body").is_none());
    }

    #[test]
    fn create_json_builds_array_header_from_json_array() {
        let event = create_json(r#"{"List":["a","b","c"]}"#).unwrap();
        assert_eq!(event.get_header("List").as_deref(), Some("ARRAY::a|:b|:c"));
    }

    #[test]
    fn create_json_rejects_non_object_root() {
        assert!(create_json("[1,2,3]").is_err());
    }

    #[test]
    fn create_json_rejects_null_member_value() {
        assert!(create_json(r#"{"Foo":null}"#).is_err());
    }

    #[test]
    fn create_json_rejects_number_member_value() {
        assert!(create_json(r#"{"Foo":42}"#).is_err());
    }

    #[test]
    fn serialize_json_round_trips_scalar_and_body() {
        let mut event = Event::new(EventId::Custom);
        event.add_header("Foo", "bar").unwrap();
        event.set_body(b"payload".to_vec()).unwrap();
        let text = serialize_json(&event).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["Foo"], Value::String("bar".to_string()));
        assert_eq!(value["_body"], Value::String("payload".to_string()));
        assert_eq!(value["Content-Length"], Value::String("7".to_string()));
    }

    #[test]
    fn subclass_name_round_trips_through_serialize_json_and_create_json() {
        let event = Event::create_subclass("my::thing");
        let text = serialize_json(&event).unwrap();
        let parsed = create_json(&text).unwrap();
        assert_eq!(parsed.subclass_name.as_deref(), Some("my::thing"));
    }
}
