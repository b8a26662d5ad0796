use crate::error::{EventError, Result};
use crate::event_id::EventId;
use crate::flags::EventFlags;
use crate::header::{split_indexed_name, HeaderRecord, HeaderValue, IndexError, Stack, HEADER_INDEX_MAX};
use crate::priority::Priority;

/// Largest body a single event may carry.
pub const MAX_BODY_LENGTH: usize = 16 * 1024 * 1024;

/// An ordered bag of headers plus an optional opaque body, the unit of
/// exchange on the wire and across the JSON codec.
///
/// Header order is preserved and is observable (`serialize`/
/// `serialize_json` walk the list in insertion order), matching the
/// linked-list semantics of the system this was modelled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_id: EventId,
    pub subclass_name: Option<String>,
    pub priority: Priority,
    pub flags: EventFlags,
    headers: Vec<HeaderRecord>,
    pub body: Option<Vec<u8>>,
}

impl Event {
    /// A plain event of the given kind, with no subclass, body, or
    /// headers beyond what callers add.
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            subclass_name: None,
            priority: Priority::Normal,
            flags: EventFlags::empty(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A `CUSTOM` event carrying a `subclass_name`, the only legal way
    /// to attach one.
    pub fn create_subclass(subclass_name: impl Into<String>) -> Self {
        let mut event = Self::new(EventId::Custom);
        event.subclass_name = Some(subclass_name.into());
        event
    }

    pub fn headers(&self) -> &[HeaderRecord] {
        &self.headers
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.matches_name(name))
    }

    /// Sets `subclass_name`, rejecting anything but `CUSTOM`/`CLONE`
    /// events, mirroring the wire invariant that only those two kinds
    /// carry a free-form subclass.
    pub fn set_subclass_name(&mut self, subclass_name: impl Into<String>) -> Result<()> {
        if !matches!(self.event_id, EventId::Custom | EventId::Clone) {
            return Err(EventError::SubclassNotAllowed);
        }
        self.subclass_name = Some(subclass_name.into());
        Ok(())
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.add_header_at("priority", priority.as_str(), Stack::Top)
            .expect("priority is a plain scalar header name");
    }

    /// Scalar read: for an array-valued header this returns the
    /// `ARRAY::a|:b` rendering, same as the wire form.
    pub fn get_header(&self, name: &str) -> Option<String> {
        let (base, index) = split_indexed_name(name).ok()?;
        let record = self.headers.iter().find(|h| h.matches_name(base))?;
        match index {
            None => Some(record.value.rendered()),
            Some(idx) => match &record.value {
                HeaderValue::Scalar(s) => (idx == 0).then(|| s.clone()),
                HeaderValue::Array(items) => items.get(idx as usize).cloned(),
            },
        }
    }

    /// Element-indexed read, equivalent to `get_header("Name[idx]")`
    /// but without string formatting the index.
    pub fn get_header_idx(&self, name: &str, idx: i64) -> Option<String> {
        let record = self.headers.iter().find(|h| h.matches_name(name))?;
        match &record.value {
            HeaderValue::Scalar(s) => (idx == 0).then(|| s.clone()),
            HeaderValue::Array(items) => items.get(idx as usize).cloned(),
        }
    }

    pub fn get_body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn get_body_str(&self) -> Option<std::borrow::Cow<'_, str>> {
        self.body.as_deref().map(String::from_utf8_lossy)
    }

    /// Replaces the body outright, subject to the size limit.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) -> Result<()> {
        let body = body.into();
        if body.len() > MAX_BODY_LENGTH {
            return Err(EventError::BodyTooLarge {
                len: body.len(),
                max: MAX_BODY_LENGTH,
            });
        }
        self.body = Some(body);
        Ok(())
    }

    /// Appends to the existing body (or creates one), subject to the
    /// size limit on the combined length.
    pub fn add_body(&mut self, extra: &[u8]) -> Result<()> {
        let mut body = self.body.take().unwrap_or_default();
        if body.len() + extra.len() > MAX_BODY_LENGTH {
            let len = body.len() + extra.len();
            self.body = Some(body);
            return Err(EventError::BodyTooLarge { len, max: MAX_BODY_LENGTH });
        }
        body.extend_from_slice(extra);
        self.body = Some(body);
        Ok(())
    }

    /// Deletes a header (or, for `Name[idx]`, a single array element --
    /// deflating a 1-element array back to a scalar, removing the
    /// record entirely if the array becomes empty). No-op if absent.
    pub fn del_header(&mut self, name: &str) -> Result<()> {
        let (base, index) = match split_indexed_name(name) {
            Ok(v) => v,
            Err(IndexError::Malformed) => return Err(EventError::MalformedHeaderIndex(name.to_string())),
            Err(IndexError::OutOfRange(index)) => {
                return Err(EventError::HeaderIndexOutOfRange { index, max: HEADER_INDEX_MAX })
            }
        };
        let Some(pos) = self.find(base) else {
            return Ok(());
        };
        match index {
            None => {
                self.headers.remove(pos);
            }
            Some(idx) => {
                let idx = idx as usize;
                match &mut self.headers[pos].value {
                    HeaderValue::Scalar(_) => {
                        if idx == 0 {
                            self.headers.remove(pos);
                        }
                    }
                    HeaderValue::Array(items) => {
                        if idx < items.len() {
                            items.remove(idx);
                        }
                        match items.len() {
                            0 => {
                                self.headers.remove(pos);
                            }
                            1 => {
                                let only = items.remove(0);
                                self.headers[pos].value = HeaderValue::Scalar(only);
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Removes every record whose name matches `name` (case-insensitively)
    /// and whose rendered value either matches `value` or `value` is
    /// empty. Returns whether at least one record was removed.
    pub fn del_header_val(&mut self, name: &str, value: &str) -> bool {
        let before = self.headers.len();
        self.headers
            .retain(|h| !(h.matches_name(name) && (value.is_empty() || h.value.rendered() == value)));
        self.headers.len() != before
    }

    /// Adds (or replaces) a header with a plain string value, inserting
    /// at the head of the list. This is the common-case entry point;
    /// `add_header_at` exposes the full placement/indexing behaviour.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.add_header_at(name, value, Stack::Top)
    }

    /// Full port of the base header-insertion algorithm: handles plain
    /// names, `Name[idx]` indexed writes (growing an array and padding
    /// empty slots with `""` as needed), and the `Push`/`Unshift`
    /// variants used by array-builder callers. `UNIQ_HEADERS` makes a
    /// plain (non-indexed) add first delete any existing header of the
    /// same name before inserting the new one. The reserved name
    /// `_body` is never stored as a header: the value replaces the
    /// body instead. A `BOTTOM`/`TOP` add with an empty value behaves
    /// as `del_header`; re-adding a name that already holds an indexed
    /// array appends to it instead of creating a duplicate record.
    pub fn add_header_at(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        stack: Stack,
    ) -> Result<()> {
        let name = name.into();
        let value = value.into();
        if name.len() > 1024 {
            return Err(EventError::HeaderNameTooLong(name, 1024));
        }
        if name == "_body" {
            return self.set_body(value.into_bytes());
        }

        let (base, index) = match split_indexed_name(&name) {
            Ok(v) => v,
            Err(IndexError::Malformed) => return Err(EventError::MalformedHeaderIndex(name)),
            Err(IndexError::OutOfRange(index)) => {
                return Err(EventError::HeaderIndexOutOfRange { index, max: HEADER_INDEX_MAX })
            }
        };

        match (index, stack) {
            (None, Stack::Push) | (None, Stack::Unshift) => {
                // No explicit index: Push/Unshift append/prepend a
                // single-element array under this name.
                match self.find(base) {
                    Some(pos) => {
                        let items = self.promote_to_array(pos);
                        match stack {
                            Stack::Push => items.push(value),
                            Stack::Unshift => items.insert(0, value),
                            _ => unreachable!(),
                        }
                    }
                    None => {
                        self.insert_record(HeaderRecord::new(base, HeaderValue::Array(vec![value])), Stack::Top);
                    }
                }
                Ok(())
            }
            (None, place @ (Stack::Top | Stack::Bottom)) => {
                if value.is_empty() {
                    self.del_header(base)?;
                    return Ok(());
                }

                if self.flags.contains(EventFlags::UNIQ_HEADERS) {
                    if let Some(pos) = self.find(base) {
                        self.headers.remove(pos);
                    }
                } else if let Some(pos) = self.find(base) {
                    if matches!(self.headers[pos].value, HeaderValue::Array(_)) {
                        let additions: Vec<String> = match value.strip_prefix("ARRAY::") {
                            Some(joined) => esl_utils::url::separate_string_string(joined, "|:", usize::MAX)
                                .into_iter()
                                .map(String::from)
                                .collect(),
                            None => vec![value],
                        };
                        self.promote_to_array(pos).extend(additions);
                        return Ok(());
                    }
                }

                let header_value = match value.strip_prefix("ARRAY::") {
                    Some(joined) => HeaderValue::Array(
                        esl_utils::url::separate_string_string(joined, "|:", usize::MAX)
                            .into_iter()
                            .map(String::from)
                            .collect(),
                    ),
                    None => HeaderValue::Scalar(value),
                };
                self.insert_record(HeaderRecord::new(base, header_value), place);
                Ok(())
            }
            (Some(idx), _) => self.add_indexed(base, idx, value, stack),
        }
    }

    fn insert_record(&mut self, record: HeaderRecord, stack: Stack) {
        match stack {
            Stack::Top => self.headers.insert(0, record),
            _ => self.headers.push(record),
        }
    }

    fn promote_to_array(&mut self, pos: usize) -> &mut Vec<String> {
        if matches!(self.headers[pos].value, HeaderValue::Scalar(_)) {
            let HeaderValue::Scalar(s) = std::mem::replace(
                &mut self.headers[pos].value,
                HeaderValue::Array(Vec::new()),
            ) else {
                unreachable!()
            };
            self.headers[pos].value = HeaderValue::Array(vec![s]);
        }
        match &mut self.headers[pos].value {
            HeaderValue::Array(items) => items,
            HeaderValue::Scalar(_) => unreachable!(),
        }
    }

    fn add_indexed(&mut self, base: &str, idx: i64, value: String, stack: Stack) -> Result<()> {
        let idx = idx as usize;
        let pos = match self.find(base) {
            Some(pos) => pos,
            None => {
                self.insert_record(HeaderRecord::new(base, HeaderValue::Array(Vec::new())), Stack::Top);
                0
            }
        };
        let items = self.promote_to_array(pos);
        match stack {
            Stack::Unshift => items.insert(0, value),
            _ => {
                if idx >= items.len() {
                    items.resize(idx, String::new());
                    items.push(value);
                } else {
                    items[idx] = value;
                }
            }
        }
        Ok(())
    }

    /// Copies every header and the body into a fresh, independent
    /// event (user-data/bind-data/internal-key fields have no
    /// meaningful equivalent here and are simply absent).
    pub fn dup(&self) -> Self {
        self.clone()
    }

    /// Folds `other`'s headers into `self` (overwriting on name
    /// collision) and replaces the body if `other` has one.
    pub fn merge(&mut self, other: &Event) {
        for header in &other.headers {
            if let Some(pos) = self.find(&header.name) {
                self.headers[pos] = header.clone();
            } else {
                self.headers.push(header.clone());
            }
        }
        if other.body.is_some() {
            self.body = other.body.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get_scalar_header() {
        let mut event = Event::new(EventId::Custom);
        event.add_header("Foo", "bar").unwrap();
        assert_eq!(event.get_header("Foo").as_deref(), Some("bar"));
        assert_eq!(event.get_header("foo").as_deref(), Some("bar"));
    }

    #[test]
    fn uniq_headers_replaces_existing() {
        let mut event = Event::new(EventId::Custom);
        event.flags |= EventFlags::UNIQ_HEADERS;
        event.add_header("Foo", "one").unwrap();
        event.add_header("Foo", "two").unwrap();
        assert_eq!(event.headers().len(), 1);
        assert_eq!(event.get_header("Foo").as_deref(), Some("two"));
    }

    #[test]
    fn indexed_add_grows_array_and_pads_gaps() {
        let mut event = Event::new(EventId::Custom);
        event.add_header_at("List[2]", "c", Stack::Top).unwrap();
        assert_eq!(event.get_header("List[0]").as_deref(), Some(""));
        assert_eq!(event.get_header("List[1]").as_deref(), Some(""));
        assert_eq!(event.get_header("List[2]").as_deref(), Some("c"));
        assert_eq!(event.get_header("List").as_deref(), Some("ARRAY::|:|:c"));
    }

    #[test]
    fn push_and_unshift_build_arrays() {
        let mut event = Event::new(EventId::Custom);
        event.add_header_at("List", "a", Stack::Push).unwrap();
        event.add_header_at("List", "b", Stack::Push).unwrap();
        event.add_header_at("List", "z", Stack::Unshift).unwrap();
        assert_eq!(event.get_header("List").as_deref(), Some("ARRAY::z|:a|:b"));
    }

    #[test]
    fn del_header_deflates_single_item_array() {
        let mut event = Event::new(EventId::Custom);
        event.add_header_at("List", "a", Stack::Push).unwrap();
        event.add_header_at("List", "b", Stack::Push).unwrap();
        event.del_header("List[0]").unwrap();
        assert_eq!(event.get_header("List").as_deref(), Some("b"));
    }

    #[test]
    fn plain_add_decomposes_array_prefixed_value() {
        let mut event = Event::new(EventId::Custom);
        event.add_header("List", "ARRAY::a|:b|:c").unwrap();
        assert_eq!(event.get_header_idx("List", 0).as_deref(), Some("a"));
        assert_eq!(event.get_header_idx("List", 1).as_deref(), Some("b"));
        assert_eq!(event.get_header_idx("List", 2).as_deref(), Some("c"));
        assert_eq!(event.get_header("List").as_deref(), Some("ARRAY::a|:b|:c"));
    }

    #[test]
    fn bottom_add_with_empty_value_deletes_existing_header() {
        let mut event = Event::new(EventId::Custom);
        event.add_header("Foo", "bar").unwrap();
        event.add_header_at("Foo", "", Stack::Bottom).unwrap();
        assert!(event.get_header("Foo").is_none());
    }

    #[test]
    fn bottom_add_with_empty_value_and_no_existing_header_is_a_no_op() {
        let mut event = Event::new(EventId::Custom);
        event.add_header_at("Foo", "", Stack::Top).unwrap();
        assert!(event.get_header("Foo").is_none());
    }

    #[test]
    fn bottom_add_onto_existing_array_appends_instead_of_duplicating() {
        let mut event = Event::new(EventId::Custom);
        event.add_header_at("List", "a", Stack::Push).unwrap();
        event.add_header_at("List", "b", Stack::Push).unwrap();
        event.add_header_at("List", "c", Stack::Bottom).unwrap();
        assert_eq!(event.headers().len(), 1);
        assert_eq!(event.get_header("List").as_deref(), Some("ARRAY::a|:b|:c"));
    }

    #[test]
    fn add_header_routes_reserved_body_name_to_set_body() {
        let mut event = Event::new(EventId::Custom);
        event.add_header("_body", "hello").unwrap();
        assert_eq!(event.get_body(), Some(b"hello".as_slice()));
        assert!(event.get_header("_body").is_none());
    }

    #[test]
    fn indexed_add_beyond_max_is_out_of_range() {
        let mut event = Event::new(EventId::Custom);
        let err = event.add_header_at("List[4001]", "x", Stack::Top).unwrap_err();
        assert!(matches!(err, EventError::HeaderIndexOutOfRange { index: 4001, max: 4000 }));
    }

    #[test]
    fn indexed_add_at_max_succeeds() {
        let mut event = Event::new(EventId::Custom);
        event.add_header_at("List[4000]", "x", Stack::Top).unwrap();
        assert_eq!(event.get_header_idx("List", 4000).as_deref(), Some("x"));
    }

    #[test]
    fn del_header_val_removes_matching_value_only() {
        let mut event = Event::new(EventId::Custom);
        event.flags |= EventFlags::UNIQ_HEADERS;
        event.add_header_at("A", "1", Stack::Bottom).unwrap();
        event.flags.remove(EventFlags::UNIQ_HEADERS);
        event.headers.push(HeaderRecord::new("A", HeaderValue::Scalar("2".to_string())));
        assert!(!event.del_header_val("A", "no-match"));
        assert!(event.del_header_val("A", "1"));
        assert_eq!(event.headers().len(), 1);
        assert_eq!(event.get_header("A").as_deref(), Some("2"));
    }

    #[test]
    fn del_header_val_with_empty_value_removes_all_matching_names() {
        let mut event = Event::new(EventId::Custom);
        event.add_header_at("A", "1", Stack::Bottom).unwrap();
        event.headers.push(HeaderRecord::new("A", HeaderValue::Scalar("2".to_string())));
        assert!(event.del_header_val("A", ""));
        assert!(event.get_header("A").is_none());
    }

    #[test]
    fn subclass_name_rejected_outside_custom_clone() {
        let mut event = Event::new(EventId::Api);
        assert!(event.set_subclass_name("my::thing").is_err());
    }

    #[test]
    fn body_over_limit_rejected() {
        let mut event = Event::new(EventId::Custom);
        let huge = vec![0u8; MAX_BODY_LENGTH + 1];
        assert!(event.set_body(huge).is_err());
    }

    #[test]
    fn merge_overwrites_and_replaces_body() {
        let mut base = Event::new(EventId::Custom);
        base.add_header("A", "1").unwrap();
        base.set_body(b"old".to_vec()).unwrap();

        let mut incoming = Event::new(EventId::Custom);
        incoming.add_header("A", "2").unwrap();
        incoming.add_header("B", "3").unwrap();
        incoming.set_body(b"new".to_vec()).unwrap();

        base.merge(&incoming);
        assert_eq!(base.get_header("A").as_deref(), Some("2"));
        assert_eq!(base.get_header("B").as_deref(), Some("3"));
        assert_eq!(base.get_body(), Some(b"new".as_slice()));
    }
}
