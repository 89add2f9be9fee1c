//! Language catalog: the positional records served by `/list-langs/` and their
//! per-display-mode normalisation.

use serde::de::{self, Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub type LanguageId = u32;

/// Number of positional fields in a catalog record.
pub const LANGUAGE_INFO_LEN: usize = 14;

const ID: usize = 0;
const NAME: usize = 1;
const ABBREVIATION: usize = 2;
const LOCATION: usize = 12;
const COORDINATES: usize = 13;

static NULL: Scalar = Scalar::Null;

/// A scalar as it appears inside positional wire arrays.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Bool(bool),
    #[default]
    Null,
}

impl Scalar {
    /// Falsy values (null, false, empty string) become the empty string.
    pub fn text(&self) -> String {
        match self {
            Scalar::Number(n) => format_number(*n),
            Scalar::Text(s) => s.clone(),
            Scalar::Bool(true) => "true".to_owned(),
            Scalar::Bool(false) | Scalar::Null => String::new(),
        }
    }

    pub fn as_id(&self) -> Option<LanguageId> {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= LanguageId::MAX as f64 => {
                Some(*n as LanguageId)
            }
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Canonical decimal text for a number: integers print without a fraction.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// One element of a wire array that may or may not decode as `T`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(IgnoredAny),
}

/// A JSON array of `T` where undecodable elements are dropped (and counted in
/// a warning) instead of failing the whole array.
pub(crate) fn skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Vec::<Lenient<T>>::deserialize(deserializer)?;
    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|item| match item {
            Lenient::Valid(value) => Some(value),
            Lenient::Invalid(_) => None,
        })
        .collect();
    if kept.len() < total {
        log::warn!(
            "skipped {} malformed {} of {total}",
            total - kept.len(),
            std::any::type_name::<T>().rsplit("::").next().unwrap_or("item")
        );
    }
    Ok(kept)
}

/// The `/list-langs/` payload: records without a usable id are skipped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Catalog(#[serde(deserialize_with = "skip_invalid")] pub Vec<LanguageInfo>);

// ---------------------------------------------------------------------------
//    Display modes
// ---------------------------------------------------------------------------

/// One of the three sort/colour/region schemes layered over the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    /// 漢語方言地圖集 (second edition) ordering.
    #[default]
    #[serde(rename = "地圖集二")]
    Atlas2,
    /// Yindian's own ordering.
    #[serde(rename = "音典")]
    Yindian,
    /// 陳邡 ordering.
    #[serde(rename = "陳邡")]
    ChenFang,
}

/// Positions of one mode's fields inside a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayModeConfig {
    pub sort_index: usize,
    pub color_index: usize,
    pub region_index: usize,
}

pub static DISPLAY_MODE_CONFIGS: [DisplayModeConfig; 3] = [
    DisplayModeConfig {
        sort_index: 3,
        color_index: 4,
        region_index: 5,
    },
    DisplayModeConfig {
        sort_index: 6,
        color_index: 7,
        region_index: 8,
    },
    DisplayModeConfig {
        sort_index: 9,
        color_index: 10,
        region_index: 11,
    },
];

impl DisplayMode {
    pub const ALL: [DisplayMode; 3] = [DisplayMode::Atlas2, DisplayMode::Yindian, DisplayMode::ChenFang];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            DisplayMode::Atlas2 => 0,
            DisplayMode::Yindian => 1,
            DisplayMode::ChenFang => 2,
        }
    }

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Atlas2 => "地圖集二",
            DisplayMode::Yindian => "音典",
            DisplayMode::ChenFang => "陳邡",
        }
    }

    #[inline]
    pub fn config(self) -> &'static DisplayModeConfig {
        &DISPLAY_MODE_CONFIGS[self.index()]
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDisplayMode(pub String);

impl fmt::Display for UnknownDisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown display mode `{}`", self.0)
    }
}

impl std::error::Error for UnknownDisplayMode {}

impl FromStr for DisplayMode {
    type Err = UnknownDisplayMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownDisplayMode(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
//    Sort keys
// ---------------------------------------------------------------------------

/// Ordering token of a language under one display mode.
///
/// Numbers order numerically and text lexicographically.  Across kinds the
/// variant decides: every number sorts before every text token, and `Missing`
/// after everything.
#[derive(Debug, Clone, Default)]
pub enum SortKey {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl SortKey {
    pub fn from_scalar(value: &Scalar) -> Self {
        match value {
            Scalar::Number(n) if n.is_finite() => SortKey::Number(*n),
            Scalar::Text(s) if !s.is_empty() => SortKey::Text(s.clone()),
            _ => SortKey::Missing,
        }
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, SortKey::Missing)
    }

    #[inline]
    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Text(_) => 1,
            SortKey::Missing => 2,
        }
    }

    fn to_scalar(&self) -> Scalar {
        match self {
            SortKey::Number(n) => Scalar::Number(*n),
            SortKey::Text(s) => Scalar::Text(s.clone()),
            SortKey::Missing => Scalar::Null,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Number(n) => f.write_str(&format_number(*n)),
            SortKey::Text(s) => f.write_str(s),
            SortKey::Missing => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
//    Catalog records
// ---------------------------------------------------------------------------

/// Sort key, colour and region of a language under one display mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModeFields {
    pub sort_order: SortKey,
    pub color: String,
    pub region: String,
}

/// One catalog record with named fields.
///
/// On the wire this is a 14-element array:
/// `[id, name, abbreviation, (sort, color, region) × 3 modes, location, coordinates]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    pub id: LanguageId,
    pub name: String,
    pub abbreviation: String,
    pub modes: [ModeFields; 3],
    pub location: String,
    pub coordinates: Option<String>,
}

impl LanguageInfo {
    /// Build from positional scalars; absent positions read as null.
    /// `None` only when the id is unusable.
    pub fn from_scalars(values: &[Scalar]) -> Option<Self> {
        let at = |i: usize| values.get(i).unwrap_or(&NULL);
        let id = at(ID).as_id()?;
        let modes = DisplayMode::ALL.map(|mode| {
            let config = mode.config();
            ModeFields {
                sort_order: SortKey::from_scalar(at(config.sort_index)),
                color: at(config.color_index).text(),
                region: at(config.region_index).text(),
            }
        });
        let coordinates = at(COORDINATES).text();
        Some(Self {
            id,
            name: at(NAME).text(),
            abbreviation: at(ABBREVIATION).text(),
            modes,
            location: at(LOCATION).text(),
            coordinates: (!coordinates.is_empty()).then_some(coordinates),
        })
    }

    fn to_scalars(&self) -> [Scalar; LANGUAGE_INFO_LEN] {
        let mut out: [Scalar; LANGUAGE_INFO_LEN] = Default::default();
        out[ID] = Scalar::Number(f64::from(self.id));
        out[NAME] = Scalar::Text(self.name.clone());
        out[ABBREVIATION] = Scalar::Text(self.abbreviation.clone());
        for mode in DisplayMode::ALL {
            let config = mode.config();
            let fields = &self.modes[mode.index()];
            out[config.sort_index] = fields.sort_order.to_scalar();
            out[config.color_index] = Scalar::Text(fields.color.clone());
            out[config.region_index] = Scalar::Text(fields.region.clone());
        }
        out[LOCATION] = Scalar::Text(self.location.clone());
        out[COORDINATES] = self
            .coordinates
            .clone()
            .map_or(Scalar::Null, Scalar::Text);
        out
    }

    #[inline]
    pub fn mode(&self, mode: DisplayMode) -> &ModeFields {
        &self.modes[mode.index()]
    }
}

impl<'de> Deserialize<'de> for LanguageInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LanguageInfoVisitor;

        impl<'de> Visitor<'de> for LanguageInfoVisitor {
            type Value = LanguageInfo;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a positional language record")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::with_capacity(LANGUAGE_INFO_LEN);
                while let Some(value) = seq.next_element::<Scalar>()? {
                    values.push(value);
                }
                LanguageInfo::from_scalars(&values)
                    .ok_or_else(|| de::Error::custom("language record without a numeric id"))
            }
        }

        deserializer.deserialize_seq(LanguageInfoVisitor)
    }
}

impl Serialize for LanguageInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let values = self.to_scalars();
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in &values {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

/// A language resolved against one display mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedLanguage {
    pub id: LanguageId,
    pub name: String,
    pub abbreviation: String,
    pub sort_order: SortKey,
    pub color: String,
    pub region: String,
    pub location: String,
    pub coordinates: Option<String>,
}

impl ProcessedLanguage {
    pub fn parsed_coordinates(&self) -> Option<Coordinates> {
        self.coordinates.as_deref().and_then(Coordinates::parse)
    }
}

/// One `ProcessedLanguage` per input record, same order.
pub fn normalize(languages: &[LanguageInfo], mode: DisplayMode) -> Vec<ProcessedLanguage> {
    languages
        .iter()
        .map(|lang| {
            let fields = lang.mode(mode);
            ProcessedLanguage {
                id: lang.id,
                name: lang.name.clone(),
                abbreviation: lang.abbreviation.clone(),
                sort_order: fields.sort_order.clone(),
                color: fields.color.clone(),
                region: fields.region.clone(),
                location: lang.location.clone(),
                coordinates: lang.coordinates.clone(),
            }
        })
        .collect()
}

/// Languages grouped by region; groups ordered by their smallest sort key,
/// ties by first appearance.
pub fn group_by_region(languages: &[ProcessedLanguage]) -> Vec<(&str, Vec<&ProcessedLanguage>)> {
    let mut groups: Vec<(&str, Vec<&ProcessedLanguage>)> = Vec::new();
    for lang in languages {
        match groups.iter_mut().find(|(region, _)| *region == lang.region) {
            Some((_, members)) => members.push(lang),
            None => groups.push((lang.region.as_str(), vec![lang])),
        }
    }
    groups.sort_by_cached_key(|(_, members)| {
        members
            .iter()
            .map(|l| l.sort_order.clone())
            .min()
            .unwrap_or_default()
    });
    groups
}

/// Case-insensitive substring match over name and abbreviation; a blank term
/// keeps everything.
pub fn search<'a>(languages: &'a [ProcessedLanguage], term: &str) -> Vec<&'a ProcessedLanguage> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return languages.iter().collect();
    }
    languages
        .iter()
        .filter(|l| {
            l.name.to_lowercase().contains(&term) || l.abbreviation.to_lowercase().contains(&term)
        })
        .collect()
}

// ---------------------------------------------------------------------------
//    Coordinates
// ---------------------------------------------------------------------------

/// Degrees of the embedded map's bounding box around the marker.
const MAP_SPAN: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    /// Parses `"lng,lat"`.
    pub fn parse(text: &str) -> Option<Self> {
        let (lng, lat) = text.split_once(',')?;
        let longitude = lng.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        let latitude = lat.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(Self {
            longitude,
            latitude,
        })
    }

    /// OpenStreetMap embed URL centred on this point.
    pub fn map_embed_url(&self) -> String {
        let Coordinates {
            longitude: lng,
            latitude: lat,
        } = *self;
        format!(
            "https://www.openstreetmap.org/export/embed.html?bbox={},{},{},{}&layer=mapnik&marker={lat},{lng}",
            lng - MAP_SPAN,
            lat - MAP_SPAN,
            lng + MAP_SPAN,
            lat + MAP_SPAN,
        )
    }
}
