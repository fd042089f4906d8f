//! Record-level text codec helpers.
//!
//! A wire record is the tag token followed by `;`-separated `key=value`
//! fields, e.g. `MW_STATUS;status=RUNNING;code=0`. These helpers build and
//! parse that flat shape; the per-message field layout lives in
//! [`Message`](crate::Message).

use std::fmt::Display;

use crate::constants::{FIELD_SEPARATOR, FRAME_SEPARATOR, KEY_VALUE_SEPARATOR};
use crate::error::ProtocolError;
use crate::types::{ActuationPoint, HandSide};

/// Escape the wire delimiters inside a field value so free-form strings
/// (error descriptions, version strings, MAC addresses) survive the record
/// shape unchanged. `%`, `;`, `=`, and `~` encode as `%25`, `%3B`, `%3D`,
/// and `%7E`; everything else passes through verbatim.
fn push_escaped(buf: &mut String, raw: &str) {
    for c in raw.chars() {
        match c {
            '%' => buf.push_str("%25"),
            FIELD_SEPARATOR => buf.push_str("%3B"),
            KEY_VALUE_SEPARATOR => buf.push_str("%3D"),
            FRAME_SEPARATOR => buf.push_str("%7E"),
            _ => buf.push(c),
        }
    }
}

/// Reverse [`push_escaped`]. A `%` that does not start a known escape
/// sequence is kept as-is.
pub(crate) fn unescape_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let (replacement, consumed) = match tail.get(..3) {
            Some("%25") => ('%', 3),
            Some("%3B") => (FIELD_SEPARATOR, 3),
            Some("%3D") => (KEY_VALUE_SEPARATOR, 3),
            Some("%7E") => (FRAME_SEPARATOR, 3),
            _ => ('%', 1),
        };
        out.push(replacement);
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    out
}

/// Builds a record string field by field.
///
/// Field order is fixed by the caller, which keeps encoding deterministic.
pub(crate) struct RecordBuilder {
    buf: String,
}

impl RecordBuilder {
    /// Start a record with the given tag.
    pub fn new(tag: &str) -> Self {
        RecordBuilder { buf: tag.to_string() }
    }

    /// Append one `key=value` field. The value is escaped, so it may
    /// contain the wire delimiters.
    pub fn field(mut self, key: &str, value: impl Display) -> Self {
        self.buf.push(FIELD_SEPARATOR);
        self.buf.push_str(key);
        self.buf.push(KEY_VALUE_SEPARATOR);
        push_escaped(&mut self.buf, &value.to_string());
        self
    }

    /// Finish and return the record text (without the frame separator).
    pub fn finish(self) -> String {
        self.buf
    }
}

/// Parsed view of one record: the tag plus its fields in wire order.
pub(crate) struct FieldMap<'a> {
    tag: &'a str,
    fields: Vec<(&'a str, &'a str)>,
}

impl<'a> FieldMap<'a> {
    /// Parse a record into tag and fields.
    ///
    /// Fields without a `=` are rejected; duplicate keys keep the first
    /// occurrence.
    pub fn parse(text: &'a str) -> Result<FieldMap<'a>, ProtocolError> {
        let mut parts = text.split(FIELD_SEPARATOR);
        let tag = parts.next().unwrap_or("");
        if tag.is_empty() || tag.contains(KEY_VALUE_SEPARATOR) {
            return Err(ProtocolError::MalformedRecord(text.to_string()));
        }

        let mut fields = Vec::new();
        for part in parts {
            match part.split_once(KEY_VALUE_SEPARATOR) {
                Some((key, value)) if !key.is_empty() => fields.push((key, value)),
                _ => return Err(ProtocolError::MalformedRecord(text.to_string())),
            }
        }

        Ok(FieldMap { tag, fields })
    }

    /// The record tag.
    pub fn tag(&self) -> &'a str {
        self.tag
    }

    /// Look up a field value by key.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Get a string field with escapes resolved, or a default when absent.
    pub fn str_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(raw) => unescape_value(raw),
            None => default.to_string(),
        }
    }

    /// Get a required field, reporting the record tag on absence.
    pub fn require(&self, tag: &'static str, field: &'static str) -> Result<&'a str, ProtocolError> {
        self.get(field)
            .ok_or(ProtocolError::MissingField { tag, field })
    }

    /// Parse a required field with the given converter.
    fn parse_with<T>(
        &self,
        tag: &'static str,
        field: &'static str,
        convert: impl Fn(&str) -> Option<T>,
    ) -> Result<T, ProtocolError> {
        let raw = self.require(tag, field)?;
        convert(raw).ok_or_else(|| ProtocolError::InvalidField {
            field: field.to_string(),
            value: raw.to_string(),
        })
    }

    /// Parse an optional field with the given converter, using a default
    /// when the key is absent. A present-but-unparseable value is an error.
    fn parse_or_with<T>(
        &self,
        field: &str,
        default: T,
        convert: impl Fn(&str) -> Option<T>,
    ) -> Result<T, ProtocolError> {
        match self.get(field) {
            None => Ok(default),
            Some(raw) => convert(raw).ok_or_else(|| ProtocolError::InvalidField {
                field: field.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    /// Required `f32` field.
    pub fn f32(&self, tag: &'static str, field: &'static str) -> Result<f32, ProtocolError> {
        self.parse_with(tag, field, |s| s.parse().ok())
    }

    /// Optional `f32` field with default.
    pub fn f32_or(&self, field: &str, default: f32) -> Result<f32, ProtocolError> {
        self.parse_or_with(field, default, |s| s.parse().ok())
    }

    /// Required `u16` field.
    pub fn u16(&self, tag: &'static str, field: &'static str) -> Result<u16, ProtocolError> {
        self.parse_with(tag, field, |s| s.parse().ok())
    }

    /// Optional `u8` field with default.
    pub fn u8_or(&self, field: &str, default: u8) -> Result<u8, ProtocolError> {
        self.parse_or_with(field, default, |s| s.parse().ok())
    }

    /// Optional `i32` field with default.
    pub fn i32_or(&self, field: &str, default: i32) -> Result<i32, ProtocolError> {
        self.parse_or_with(field, default, |s| s.parse().ok())
    }

    /// Optional `usize` field with default.
    pub fn usize_or(&self, field: &str, default: usize) -> Result<usize, ProtocolError> {
        self.parse_or_with(field, default, |s| s.parse().ok())
    }

    /// Optional boolean field (`true`/`false`) with default.
    pub fn bool_or(&self, field: &str, default: bool) -> Result<bool, ProtocolError> {
        self.parse_or_with(field, default, |s| match s {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    }

    /// Required hand-side field.
    pub fn hand(&self, tag: &'static str, field: &'static str) -> Result<HandSide, ProtocolError> {
        self.parse_with(tag, field, HandSide::from_wire_str)
    }

    /// Required actuation-point field.
    pub fn point(
        &self,
        tag: &'static str,
        field: &'static str,
    ) -> Result<ActuationPoint, ProtocolError> {
        self.parse_with(tag, field, ActuationPoint::from_wire_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_shape() {
        let record = RecordBuilder::new("MW_STATUS")
            .field("status", "RUNNING")
            .field("code", 0)
            .finish();
        assert_eq!(record, "MW_STATUS;status=RUNNING;code=0");
    }

    #[test]
    fn test_parse_tag_only() {
        let map = FieldMap::parse("EXIT").unwrap();
        assert_eq!(map.tag(), "EXIT");
        assert_eq!(map.get("anything"), None);
    }

    #[test]
    fn test_parse_fields() {
        let map = FieldMap::parse("MW_STATUS;status=RUNNING;code=0").unwrap();
        assert_eq!(map.tag(), "MW_STATUS");
        assert_eq!(map.get("status"), Some("RUNNING"));
        assert_eq!(map.i32_or("code", -1).unwrap(), 0);
    }

    #[test]
    fn test_parse_rejects_bare_field() {
        assert!(FieldMap::parse("MW_STATUS;status").is_err());
        assert!(FieldMap::parse("").is_err());
        assert!(FieldMap::parse("a=b;c=d").is_err());
    }

    #[test]
    fn test_empty_value_is_allowed() {
        let map = FieldMap::parse("MW_STATUS;error=").unwrap();
        assert_eq!(map.get("error"), Some(""));
    }

    #[test]
    fn test_delimiters_in_value_survive_round_trip() {
        let value = "50%; left=right ~ done";
        let record = RecordBuilder::new("MW_STATUS").field("error", value).finish();
        assert_eq!(record, "MW_STATUS;error=50%25%3B left%3Dright %7E done");

        let map = FieldMap::parse(&record).unwrap();
        assert_eq!(map.str_or("error", ""), value);
    }

    #[test]
    fn test_unescape_leaves_stray_percent() {
        assert_eq!(unescape_value("85% full"), "85% full");
        assert_eq!(unescape_value("%"), "%");
        assert_eq!(unescape_value("%3"), "%3");
    }

    #[test]
    fn test_invalid_typed_field() {
        let map = FieldMap::parse("FORCE;value=sticky").unwrap();
        let err = map.f32("FORCE", "value").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidField { .. }));
    }

    #[test]
    fn test_missing_required_field() {
        let map = FieldMap::parse("FORCE;hand=LEFT").unwrap();
        let err = map.f32("FORCE", "value").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MissingField { tag: "FORCE", field: "value" }
        );
    }
}
