use esl_utils::ascii::{eq_ignore_case, tolower};

/// Highest legal `[N]` header index suffix.
pub const HEADER_INDEX_MAX: i64 = 4_000;

/// Where a new header (or, for an indexed record, a new element) is
/// inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stack {
    /// Prepend a new header record to the list.
    Top,
    /// Append a new header record to the list.
    Bottom,
    /// Append an element to an existing indexed record (promoting a
    /// scalar to a 1-element array first), without moving the record.
    Push,
    /// Prepend an element to an existing indexed record, without moving
    /// the record.
    Unshift,
}

/// A header's value: either a single scalar string, or a contiguous,
/// zero-based array of strings (never both, never empty when indexed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Scalar(String),
    Array(Vec<String>),
}

impl HeaderValue {
    /// The wire rendering: the scalar string itself, or
    /// `ARRAY::a|:b|:c` when indexed (just `a` with no prefix when the
    /// array has exactly one element).
    pub fn rendered(&self) -> String {
        match self {
            Self::Scalar(s) => s.clone(),
            Self::Array(items) if items.len() == 1 => items[0].clone(),
            Self::Array(items) => format!("ARRAY::{}", items.join("|:")),
        }
    }

    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            Self::Array(items) => Some(items),
            Self::Scalar(_) => None,
        }
    }
}

/// A single header record: a case-insensitive name, a pre-computed
/// case-folded hash used as a fast-reject prefilter, and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub name: String,
    pub hash: u32,
    pub value: HeaderValue,
}

impl HeaderRecord {
    pub fn new(name: impl Into<String>, value: HeaderValue) -> Self {
        let name = name.into();
        let hash = ci_hash(&name);
        Self { name, hash, value }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        let hash = ci_hash(name);
        (self.hash == 0 || self.hash == hash) && eq_ignore_case(&self.name, name)
    }
}

/// The original's `hash = hash*33 + tolower(c)` rolling hash over the
/// header name, used purely as a cheap prefilter before the real
/// case-insensitive string comparison.
pub fn ci_hash(name: &str) -> u32 {
    let mut hash: u32 = 0;
    for &b in name.as_bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(u32::from(tolower(b)));
    }
    hash
}

/// Why a `Name[123]`-style index suffix was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    /// Not a decimal integer followed by exactly `]`.
    Malformed,
    /// Syntactically a valid integer, but outside `0..=HEADER_INDEX_MAX`.
    OutOfRange(i64),
}

/// Parses a `"123]"` header-index suffix (the text immediately after
/// the `[` in `Name[123]`): a non-negative decimal integer followed by
/// exactly `]` and nothing else, within `0..=HEADER_INDEX_MAX`.
pub fn parse_header_index(expr: &str) -> Result<i64, IndexError> {
    let digits = expr.strip_suffix(']').ok_or(IndexError::Malformed)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IndexError::Malformed);
    }
    let parsed: i64 = digits.parse().map_err(|_| IndexError::Malformed)?;
    if parsed < 0 || parsed > HEADER_INDEX_MAX {
        return Err(IndexError::OutOfRange(parsed));
    }
    Ok(parsed)
}

/// Splits `"Name[123]"` into `("Name", Some(123))`, or `(name, None)`
/// when there is no `[...]` suffix. Returns an error only when a `[` is
/// present but the suffix fails to parse.
pub fn split_indexed_name(header_name: &str) -> Result<(&str, Option<i64>), IndexError> {
    match header_name.find('[') {
        None => Ok((header_name, None)),
        Some(bracket) => {
            let index = parse_header_index(&header_name[bracket + 1..])?;
            Ok((&header_name[..bracket], Some(index)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_header_index_accepts_in_range_values() {
        assert_eq!(parse_header_index("4000]"), Ok(4000));
        assert_eq!(parse_header_index("4001]"), Err(IndexError::OutOfRange(4001)));
        assert_eq!(parse_header_index("-1]"), Err(IndexError::Malformed));
        assert_eq!(parse_header_index("12"), Err(IndexError::Malformed));
        assert_eq!(parse_header_index("12]x"), Err(IndexError::Malformed));
    }

    #[test]
    fn hash_is_case_insensitive() {
        assert_eq!(ci_hash("Content-Type"), ci_hash("content-type"));
    }

    #[test]
    fn split_indexed_name_parses_suffix() {
        assert_eq!(split_indexed_name("X-List[2]"), Ok(("X-List", Some(2))));
        assert_eq!(split_indexed_name("X-List"), Ok(("X-List", None)));
        assert_eq!(split_indexed_name("X-List[9999]"), Err(IndexError::OutOfRange(9999)));
    }
}
