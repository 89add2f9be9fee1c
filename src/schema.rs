//! Field schemas for the language families whose readings arrive field-coded.
//!
//! A schema is a pair of parallel constant tables: the ordered field names and
//! a string of one-byte type tags, one tag per field.  Both tables are checked
//! for equal length when the schema constant is evaluated, so a mismatched
//! schema is a compile error rather than a runtime surprise.
//!
//! Type tags:
//!
//! | tag | meaning                       | script tag        |
//! |-----|-------------------------------|-------------------|
//! | `l` | romanization                  | `zh-Latn`         |
//! | `i` | IPA transcription             | `zh-Latn-fonipa`  |
//! | `c` | Cyrillic transliteration      | `zh-Cyrl`         |
//! | `h` | literal text (Hanzi)          | none              |
//! | `#` | other / untyped               | none              |

pub mod data;

pub use data::{DUNGAN, GUANGYUN, SCHEMA_TABLE, ZHONGYUAN, all_schemas, schema_for};

use std::fmt;

/// Schemas address their fields through a `u32` bit mask.
pub const MAX_FIELDS: usize = 32;

/// The three language families with field-coded readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// 廣韻, the Middle Chinese rhyme dictionary with its reconstructions.
    Guangyun,
    /// 中原音韻, the Old Mandarin rhyme book.
    Zhongyuan,
    /// 東干甘肅話, Gansu Dungan written in Cyrillic.
    Dungan,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Guangyun, Family::Zhongyuan, Family::Dungan];

    /// Language abbreviation the catalog uses for this family.
    #[inline]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Family::Guangyun => "廣韻",
            Family::Zhongyuan => "中原音韻",
            Family::Dungan => "東干甘肅話",
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Family::Guangyun => 0,
            Family::Zhongyuan => 1,
            Family::Dungan => 2,
        }
    }

    #[inline]
    pub fn schema(self) -> &'static Schema {
        match self {
            Family::Guangyun => &GUANGYUN,
            Family::Zhongyuan => &ZHONGYUAN,
            Family::Dungan => &DUNGAN,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Semantic type of one field, decoded from its tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Romanization,
    Ipa,
    Cyrillic,
    Literal,
    Other,
}

impl FieldType {
    #[inline]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'l' => Some(FieldType::Romanization),
            b'i' => Some(FieldType::Ipa),
            b'c' => Some(FieldType::Cyrillic),
            b'h' => Some(FieldType::Literal),
            b'#' => Some(FieldType::Other),
            _ => None,
        }
    }

    #[inline]
    pub const fn tag(self) -> char {
        match self {
            FieldType::Romanization => 'l',
            FieldType::Ipa => 'i',
            FieldType::Cyrillic => 'c',
            FieldType::Literal => 'h',
            FieldType::Other => '#',
        }
    }

    #[inline]
    pub const fn script(self) -> ScriptTag {
        match self {
            FieldType::Romanization => ScriptTag::Latin,
            FieldType::Ipa => ScriptTag::Ipa,
            FieldType::Cyrillic => ScriptTag::Cyrillic,
            FieldType::Literal | FieldType::Other => ScriptTag::Literal,
        }
    }
}

/// Markup identity attached to a decoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptTag {
    Ipa,
    Latin,
    Cyrillic,
    Literal,
}

impl ScriptTag {
    /// BCP 47 tag for the `lang` attribute; literal text carries none.
    #[inline]
    pub const fn lang(self) -> Option<&'static str> {
        match self {
            ScriptTag::Ipa => Some("zh-Latn-fonipa"),
            ScriptTag::Latin => Some("zh-Latn"),
            ScriptTag::Cyrillic => Some("zh-Cyrl"),
            ScriptTag::Literal => None,
        }
    }
}

/// Ordered field names plus their parallel type tags.
#[derive(Debug)]
pub struct Schema {
    family: Family,
    fields: &'static [&'static str],
    types: &'static str,
    defaults: &'static [&'static str],
}

impl Schema {
    /// Panics during constant evaluation when the tables disagree.
    pub const fn new(
        family: Family,
        fields: &'static [&'static str],
        types: &'static str,
        defaults: &'static [&'static str],
    ) -> Self {
        assert!(
            fields.len() == types.len(),
            "field list and type tags differ in length"
        );
        assert!(fields.len() <= MAX_FIELDS, "schema exceeds the field mask width");
        let tags = types.as_bytes();
        let mut i = 0;
        while i < tags.len() {
            assert!(FieldType::from_tag(tags[i]).is_some(), "unknown type tag");
            i += 1;
        }
        Self {
            family,
            fields,
            types,
            defaults,
        }
    }

    #[inline]
    pub fn family(&self) -> Family {
        self.family
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[inline]
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    #[inline]
    pub fn type_tags(&self) -> &'static str {
        self.types
    }

    #[inline]
    pub fn field(&self, index: usize) -> Option<&'static str> {
        self.fields.get(index).copied()
    }

    #[inline]
    pub fn field_type(&self, index: usize) -> Option<FieldType> {
        self.types
            .as_bytes()
            .get(index)
            .and_then(|&t| FieldType::from_tag(t))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|&f| f == name)
    }

    /// `(name, type)` in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FieldType)> + '_ {
        self.fields
            .iter()
            .zip(self.types.bytes())
            .filter_map(|(&name, tag)| FieldType::from_tag(tag).map(|t| (name, t)))
    }

    #[inline]
    pub fn defaults(&self) -> &'static [&'static str] {
        self.defaults
    }

    /// Mask of the named fields; names this schema does not know are skipped.
    pub fn mask<I, S>(&self, names: I) -> FieldMask
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|n| self.position(n.as_ref()))
            .fold(FieldMask::EMPTY, FieldMask::with)
    }

    pub fn default_mask(&self) -> FieldMask {
        self.mask(self.defaults.iter())
    }

    pub fn full_mask(&self) -> FieldMask {
        (0..self.len()).fold(FieldMask::EMPTY, FieldMask::with)
    }

    /// Field names selected by `mask`, in schema order.
    pub fn selected(&self, mask: FieldMask) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter(move |(i, _)| mask.contains(*i))
            .map(|(_, &name)| name)
    }
}

/// Set of field positions within one schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldMask(u32);

impl FieldMask {
    pub const EMPTY: FieldMask = FieldMask(0);

    #[inline]
    pub const fn contains(self, index: usize) -> bool {
        index < MAX_FIELDS && self.0 & (1 << index) != 0
    }

    #[inline]
    pub const fn with(self, index: usize) -> Self {
        if index < MAX_FIELDS {
            FieldMask(self.0 | (1 << index))
        } else {
            self
        }
    }

    #[inline]
    pub const fn without(self, index: usize) -> Self {
        if index < MAX_FIELDS {
            FieldMask(self.0 & !(1 << index))
        } else {
            self
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }
}
