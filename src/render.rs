//! Render-ready HTML for table cells.
//!
//! Cells of field-coded languages go through the decoder with the user's
//! field selection; every other cell is an IPA transcription.  Multiple
//! readings become one `<div>` each, followed by their note.

use crate::decode::{self, push_tagged, reading_fragments_html};
use crate::note::note_html;
use crate::rows::{Reading, TableRow};
use crate::schema::{FieldMask, Schema, ScriptTag, schema_for};
use crate::settings::FieldSelections;

/// Per-row rendering context: the row's schema (if field-coded) and mask.
#[derive(Debug, Clone, Copy)]
pub struct CellRenderer<'a> {
    language_abbr: &'a str,
    coded: Option<(&'static Schema, FieldMask)>,
}

impl<'a> CellRenderer<'a> {
    pub fn new(language_abbr: &'a str, fields: &FieldSelections) -> Self {
        let coded = schema_for(language_abbr).map(|schema| (schema, fields.mask(schema.family())));
        Self {
            language_abbr,
            coded,
        }
    }

    pub fn for_row(row: &'a TableRow, fields: &FieldSelections) -> Self {
        Self::new(&row.language_abbr, fields)
    }

    #[inline]
    pub fn is_field_coded(&self) -> bool {
        self.coded.is_some()
    }

    /// Inner HTML of one cell; empty for a missing reading.
    pub fn cell_html(&self, reading: Option<&Reading>) -> String {
        let mut out = String::new();
        match reading {
            None => {}
            Some(Reading::Single(value)) => self.push_value(value, &mut out),
            Some(Reading::MultipleReadings(items)) => {
                for item in items {
                    out.push_str("<div>");
                    self.push_value(&item.value, &mut out);
                    if let Some(note) = &item.note {
                        out.push(' ');
                        note_html(note, self.language_abbr, &mut out);
                    }
                    out.push_str("</div>");
                }
            }
        }
        out
    }

    /// Inner HTML for every column of `row`.
    pub fn row_html(&self, row: &TableRow) -> Vec<String> {
        row.cells.iter().map(|c| self.cell_html(c.as_ref())).collect()
    }

    fn push_value(&self, value: &str, out: &mut String) {
        match self.coded {
            Some((schema, mask)) => {
                for (i, reading) in decode::decode(value, mask, schema).iter().enumerate() {
                    if i > 0 {
                        out.push_str(decode::READING_SEPARATOR);
                    }
                    reading_fragments_html(reading, out);
                }
            }
            None => push_tagged(out, value, ScriptTag::Ipa.lang(), None),
        }
    }
}
