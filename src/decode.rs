//! Field-coded record decoder.
//!
//! A raw reading for one of the [`Family`](crate::schema::Family) languages is
//! a slash-delimited list of positional fields, and several readings of the
//! same character are joined with `"; "`.  Decoding keeps the selected
//! non-empty fields, tags each with the script implied by its type, and falls
//! back to the raw text whenever the record is short or nothing was selected.
//!
//! # Guarantees
//! - **Pure**: same input, same output; no allocation beyond the result.
//! - **Order-preserving**: readings come out in input order, fields in schema order.
//! - **Pass-through**: a reading with fewer fields than the schema is returned verbatim.
//! - **Never blank**: a conforming reading with no emitted field is returned verbatim.

use crate::schema::{FieldMask, Schema, ScriptTag};
use memchr::memchr_iter;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;

/// Joins alternate readings (homographs) inside one raw string.
pub const READING_SEPARATOR: &str = "; ";
/// Joins the fields of one reading.
pub const FIELD_SEPARATOR: char = '/';

/// One emitted field of a decoded reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedField<'a> {
    pub field: &'static str,
    pub value: &'a str,
    pub script: ScriptTag,
}

/// Result of decoding one reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedReading<'a> {
    Fields(SmallVec<[DecodedField<'a>; 4]>),
    /// Short record, or nothing selected: the reading exactly as received.
    Verbatim(&'a str),
}

impl<'a> DecodedReading<'a> {
    #[inline]
    pub fn is_verbatim(&self) -> bool {
        matches!(self, DecodedReading::Verbatim(_))
    }

    pub fn fields(&self) -> &[DecodedField<'a>] {
        match self {
            DecodedReading::Fields(fields) => fields,
            DecodedReading::Verbatim(_) => &[],
        }
    }
}

/// Plain text: field values joined by `" / "`.
impl fmt::Display for DecodedReading<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedReading::Verbatim(raw) => f.write_str(raw),
            DecodedReading::Fields(fields) => {
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" / ")?;
                    }
                    f.write_str(field.value)?;
                }
                Ok(())
            }
        }
    }
}

/// Decode every reading in `raw`, in order.
pub fn decode<'a>(
    raw: &'a str,
    selected: FieldMask,
    schema: &Schema,
) -> SmallVec<[DecodedReading<'a>; 2]> {
    raw.split(READING_SEPARATOR)
        .map(|reading| decode_reading(reading, selected, schema))
        .collect()
}

/// Decode a single reading (no `"; "` inside).
pub fn decode_reading<'a>(raw: &'a str, selected: FieldMask, schema: &Schema) -> DecodedReading<'a> {
    // Count separators before touching the fields: short records are common.
    let field_count = memchr_iter(b'/', raw.as_bytes()).count() + 1;
    if field_count < schema.len() {
        return DecodedReading::Verbatim(raw);
    }

    let mut fields = SmallVec::new();
    for (index, value) in raw.split(FIELD_SEPARATOR).take(schema.len()).enumerate() {
        if value.is_empty() || !selected.contains(index) {
            continue;
        }
        let (Some(field), Some(kind)) = (schema.field(index), schema.field_type(index)) else {
            continue;
        };
        fields.push(DecodedField {
            field,
            value,
            script: kind.script(),
        });
    }

    if fields.is_empty() {
        DecodedReading::Verbatim(raw)
    } else {
        DecodedReading::Fields(fields)
    }
}

/// Joined HTML form: fields by `" / "`, readings by `"; "`, typed fields wrapped
/// in `<span lang="…">`.  Text is escaped; a lone verbatim reading without
/// markup-significant characters is returned borrowed.
pub fn decode_to_html<'a>(raw: &'a str, selected: FieldMask, schema: &Schema) -> Cow<'a, str> {
    let readings = decode(raw, selected, schema);
    if let [DecodedReading::Verbatim(only)] = readings.as_slice() {
        let only: &'a str = *only;
        return html_escape::encode_text(only);
    }

    let mut out = String::with_capacity(raw.len() * 2);
    for (i, reading) in readings.iter().enumerate() {
        if i > 0 {
            out.push_str(READING_SEPARATOR);
        }
        match reading {
            DecodedReading::Verbatim(text) => {
                html_escape::encode_text_to_string(text, &mut out);
            }
            DecodedReading::Fields(fields) => {
                for (j, field) in fields.iter().enumerate() {
                    if j > 0 {
                        out.push_str(" / ");
                    }
                    push_tagged(&mut out, field.value, field.script.lang(), None);
                }
            }
        }
    }
    Cow::Owned(out)
}

/// Fragment form used inside table cells: every field becomes
/// `<span title="FIELD" lang="TAG">value</span>`, joined by `/`.
pub fn reading_fragments_html(reading: &DecodedReading<'_>, out: &mut String) {
    match reading {
        DecodedReading::Verbatim(text) => {
            html_escape::encode_text_to_string(text, out);
        }
        DecodedReading::Fields(fields) => {
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(FIELD_SEPARATOR);
                }
                push_tagged(out, field.value, field.script.lang(), Some(field.field));
            }
        }
    }
}

pub(crate) fn push_tagged(out: &mut String, text: &str, lang: Option<&str>, title: Option<&str>) {
    if lang.is_none() && title.is_none() {
        html_escape::encode_text_to_string(text, out);
        return;
    }
    out.push_str("<span");
    if let Some(title) = title {
        out.push_str(" title=\"");
        html_escape::encode_double_quoted_attribute_to_string(title, out);
        out.push('"');
    }
    if let Some(lang) = lang {
        out.push_str(" lang=\"");
        out.push_str(lang);
        out.push('"');
    }
    out.push('>');
    html_escape::encode_text_to_string(text, out);
    out.push_str("</span>");
}
