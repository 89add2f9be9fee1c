//! Comparison table: query results inverted into one row per language.

use crate::catalog::{LanguageId, ProcessedLanguage, Scalar, SortKey, skip_invalid};
use crate::decode::READING_SEPARATOR;
use serde::de::{self, Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// One `(language, reading, note)` triple of a query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PronunciationEntry {
    pub language_id: LanguageId,
    pub reading: String,
    pub note: Option<String>,
}

/// Every reading the database has for one queried character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterResult {
    pub character: String,
    pub entries: Vec<PronunciationEntry>,
}

impl<'de> Deserialize<'de> for PronunciationEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = PronunciationEntry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("[languageId, reading, note?]")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let id: Scalar = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let language_id = id
                    .as_id()
                    .ok_or_else(|| de::Error::custom("language id is not a non-negative integer"))?;
                let reading: Scalar = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let note = seq
                    .next_element::<Scalar>()?
                    .map(|n| n.text())
                    .filter(|n| !n.is_empty());
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(PronunciationEntry {
                    language_id,
                    reading: reading.text(),
                    note,
                })
            }
        }

        deserializer.deserialize_seq(EntryVisitor)
    }
}

impl Serialize for PronunciationEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.note.is_some() { 3 } else { 2 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.language_id)?;
        seq.serialize_element(&self.reading)?;
        if let Some(note) = &self.note {
            seq.serialize_element(note)?;
        }
        seq.end()
    }
}

/// Wire form `[character, …, [[id, reading, note?], …]]`: the entry list is the
/// last array element, anything between it and the character is ignored.
/// Unusable entries are skipped one by one.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawItem {
    Entries(#[serde(deserialize_with = "skip_invalid")] Vec<PronunciationEntry>),
    Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for CharacterResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultVisitor;

        impl<'de> Visitor<'de> for ResultVisitor {
            type Value = CharacterResult;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("[character, [entries]]")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let character: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let mut entries = Vec::new();
                while let Some(item) = seq.next_element::<RawItem>()? {
                    if let RawItem::Entries(found) = item {
                        entries = found;
                    }
                }
                Ok(CharacterResult { character, entries })
            }
        }

        deserializer.deserialize_seq(ResultVisitor)
    }
}

impl Serialize for CharacterResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.character)?;
        seq.serialize_element(&self.entries)?;
        seq.end()
    }
}

// ---------------------------------------------------------------------------
//    Readings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingItem {
    pub value: String,
    pub note: Option<String>,
}

/// What one language has for one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    /// A single reading without a note.
    Single(String),
    /// Several readings, or one carrying a note, in result order.
    MultipleReadings(Vec<ReadingItem>),
}

impl Reading {
    fn from_items(mut items: Vec<ReadingItem>) -> Self {
        if items.len() == 1 && items[0].note.is_none() {
            let only = items.remove(0);
            Reading::Single(only.value)
        } else {
            Reading::MultipleReadings(items)
        }
    }

    /// `(value, note)` pairs regardless of shape.
    pub fn items(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        let (single, many) = match self {
            Reading::Single(value) => (Some(value.as_str()), &[][..]),
            Reading::MultipleReadings(items) => (None, items.as_slice()),
        };
        single
            .map(|v| (v, None))
            .into_iter()
            .chain(many.iter().map(|i| (i.value.as_str(), i.note.as_deref())))
    }

    /// Legacy flat text: `value (note)` per item, joined by `"; "`.
    pub fn joined_text(&self) -> String {
        let mut out = String::new();
        for (i, (value, note)) in self.items().enumerate() {
            if i > 0 {
                out.push_str(READING_SEPARATOR);
            }
            out.push_str(value);
            if let Some(note) = note {
                out.push_str(" (");
                out.push_str(note);
                out.push(')');
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
//    Rows
// ---------------------------------------------------------------------------

/// One language's line of the comparison table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub language_id: LanguageId,
    pub language_name: String,
    pub language_abbr: String,
    pub color: String,
    pub region: String,
    pub sort_order: SortKey,
    /// Aligned with the query results: `cells[i]` belongs to the i-th character.
    pub cells: Vec<Option<Reading>>,
}

impl TableRow {
    #[inline]
    pub fn cell(&self, column: usize) -> Option<&Reading> {
        self.cells.get(column).and_then(Option::as_ref)
    }
}

/// Queried characters plus the rows built for them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn column_of(&self, character: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == character)
    }

    /// First column's reading for `character` in `row`.
    pub fn lookup<'t>(&self, row: &'t TableRow, character: &str) -> Option<&'t Reading> {
        self.column_of(character).and_then(|i| row.cell(i))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Invert results into rows for the selected, catalogued languages, sorted by
/// sort key (stable, so ties keep first-seen order).
pub fn build_table_rows(
    results: &[CharacterResult],
    catalog: &[ProcessedLanguage],
    selected: &BTreeSet<LanguageId>,
) -> Vec<TableRow> {
    let languages: HashMap<LanguageId, &ProcessedLanguage> =
        catalog.iter().map(|l| (l.id, l)).collect();

    // language id → per-column items, in order of first appearance
    let mut order: Vec<LanguageId> = Vec::new();
    let mut collected: HashMap<LanguageId, Vec<Vec<ReadingItem>>> = HashMap::new();
    for (column, result) in results.iter().enumerate() {
        for entry in &result.entries {
            let columns = collected.entry(entry.language_id).or_insert_with(|| {
                order.push(entry.language_id);
                vec![Vec::new(); results.len()]
            });
            columns[column].push(ReadingItem {
                value: entry.reading.clone(),
                note: entry.note.clone(),
            });
        }
    }

    let mut rows: Vec<TableRow> = order
        .into_iter()
        .filter(|id| selected.contains(id))
        .filter_map(|id| {
            let lang = languages.get(&id)?;
            let columns = collected.remove(&id)?;
            Some(TableRow {
                language_id: id,
                language_name: lang.name.clone(),
                language_abbr: lang.abbreviation.clone(),
                color: lang.color.clone(),
                region: lang.region.clone(),
                sort_order: lang.sort_order.clone(),
                cells: columns
                    .into_iter()
                    .map(|items| (!items.is_empty()).then(|| Reading::from_items(items)))
                    .collect(),
            })
        })
        .collect();

    rows.sort_by(|a, b| a.sort_order.cmp(&b.sort_order));
    rows
}

pub fn build_table(
    results: &[CharacterResult],
    catalog: &[ProcessedLanguage],
    selected: &BTreeSet<LanguageId>,
) -> Table {
    Table {
        columns: results.iter().map(|r| r.character.clone()).collect(),
        rows: build_table_rows(results, catalog, selected),
    }
}
