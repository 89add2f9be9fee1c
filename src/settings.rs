//! User settings and their persisted form.
//!
//! Every transition is a plain method on [`UserSettings`]; the caller persists
//! with [`UserSettings::save`] afterwards (the session does so after each one).

use crate::catalog::{DisplayMode, LanguageId};
use crate::schema::{Family, FieldMask};
use crate::storage::{KeyValueStore, read_json, read_string, write_json, write_string};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const SETTINGS_KEY: &str = "yindian-settings";
pub const UI_LANGUAGE_KEY: &str = "yindian-language";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Theme for a device that does (or does not) prefer a dark scheme.
    #[inline]
    pub fn from_preference(prefers_dark: bool) -> Self {
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }
}

/// Interface language (independent of the languages being compared).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UiLanguage {
    #[default]
    #[serde(rename = "zh_HK")]
    ZhHk,
    #[serde(rename = "zh_CN")]
    ZhCn,
    #[serde(rename = "ja")]
    Ja,
    #[serde(rename = "en_GB")]
    EnGb,
    #[serde(rename = "da")]
    Da,
}

impl UiLanguage {
    pub const ALL: [UiLanguage; 5] = [
        UiLanguage::ZhHk,
        UiLanguage::ZhCn,
        UiLanguage::Ja,
        UiLanguage::EnGb,
        UiLanguage::Da,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            UiLanguage::ZhHk => "zh_HK",
            UiLanguage::ZhCn => "zh_CN",
            UiLanguage::Ja => "ja",
            UiLanguage::EnGb => "en_GB",
            UiLanguage::Da => "da",
        }
    }

    /// BCP 47 form of [`code`](Self::code).
    pub const fn locale(self) -> &'static str {
        match self {
            UiLanguage::ZhHk => "zh-HK",
            UiLanguage::ZhCn => "zh-CN",
            UiLanguage::Ja => "ja",
            UiLanguage::EnGb => "en-GB",
            UiLanguage::Da => "da",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            UiLanguage::ZhHk => "中文（繁體）",
            UiLanguage::ZhCn => "中文（简体）",
            UiLanguage::Ja => "日本語",
            UiLanguage::EnGb => "English",
            UiLanguage::Da => "Dansk",
        }
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        read_string(store, UI_LANGUAGE_KEY)
            .and_then(|code| code.parse().ok())
            .unwrap_or_default()
    }

    pub fn save<S: KeyValueStore + ?Sized>(self, store: &S) {
        write_string(store, UI_LANGUAGE_KEY, self.code());
    }
}

impl fmt::Display for UiLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UiLanguage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UiLanguage::ALL.into_iter().find(|l| l.code() == s).ok_or(())
    }
}

/// Selected field names, one independent set per family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelections([BTreeSet<String>; 3]);

impl Default for FieldSelections {
    fn default() -> Self {
        Self(Family::ALL.map(|family| {
            family
                .schema()
                .defaults()
                .iter()
                .map(|&f| f.to_owned())
                .collect()
        }))
    }
}

impl FieldSelections {
    #[inline]
    pub fn get(&self, family: Family) -> &BTreeSet<String> {
        &self.0[family.index()]
    }

    /// Replace one family's selection; names outside its schema are dropped.
    pub fn set<I, S>(&mut self, family: Family, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schema = family.schema();
        self.0[family.index()] = names
            .into_iter()
            .map(Into::into)
            .filter(|n| schema.position(n).is_some())
            .collect();
    }

    #[inline]
    pub fn mask(&self, family: Family) -> FieldMask {
        family.schema().mask(self.get(family))
    }

    pub fn contains(&self, family: Family, field: &str) -> bool {
        self.get(family).contains(field)
    }

    /// Flip one field; `false` when the schema has no such field.
    pub fn toggle(&mut self, family: Family, field: &str) -> bool {
        if family.schema().position(field).is_none() {
            return false;
        }
        let set = &mut self.0[family.index()];
        if !set.remove(field) {
            set.insert(field.to_owned());
        }
        true
    }

    pub fn select_all(&mut self, family: Family) {
        self.0[family.index()] = family
            .schema()
            .fields()
            .iter()
            .map(|&f| f.to_owned())
            .collect();
    }

    pub fn clear(&mut self, family: Family) {
        self.0[family.index()].clear();
    }
}

/// Everything the user can change, as one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub display_mode: DisplayMode,
    pub selected_languages: BTreeSet<LanguageId>,
    pub fields: FieldSelections,
    pub theme: Theme,
    /// Set once the user (or the first catalog load) has chosen languages,
    /// even if the choice was later emptied.
    languages_chosen: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::with_theme(Theme::Light)
    }
}

impl UserSettings {
    pub fn with_theme(theme: Theme) -> Self {
        Self {
            display_mode: DisplayMode::default(),
            selected_languages: BTreeSet::new(),
            fields: FieldSelections::default(),
            theme,
            languages_chosen: false,
        }
    }

    /// Whether a language selection was ever made.  An explicitly emptied
    /// selection still counts.
    #[inline]
    pub fn has_language_selection(&self) -> bool {
        self.languages_chosen
    }

    /// Persisted settings, or defaults.  `prefers_dark` is the device preference
    /// consulted only when no theme was ever stored.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, prefers_dark: Option<bool>) -> Self {
        let device_theme = Theme::from_preference(prefers_dark.unwrap_or(false));
        match read_json::<PersistedSettings, _>(store, SETTINGS_KEY) {
            Some(saved) => saved.into_settings(device_theme),
            None => Self::with_theme(device_theme),
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S) {
        write_json(store, SETTINGS_KEY, &PersistedSettings::from(self));
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    pub fn toggle_language(&mut self, id: LanguageId) {
        if !self.selected_languages.remove(&id) {
            self.selected_languages.insert(id);
        }
        self.languages_chosen = true;
    }

    pub fn select_languages(&mut self, ids: impl IntoIterator<Item = LanguageId>) {
        self.selected_languages = ids.into_iter().collect();
        self.languages_chosen = true;
    }

    pub fn deselect_all_languages(&mut self) {
        self.selected_languages.clear();
        self.languages_chosen = true;
    }

    pub fn toggle_field(&mut self, family: Family, field: &str) -> bool {
        self.fields.toggle(family, field)
    }

    pub fn select_all_fields(&mut self, family: Family) {
        self.fields.select_all(family);
    }

    pub fn clear_fields(&mut self, family: Family) {
        self.fields.clear(family);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }
}

/// On-disk shape.  Every member is optional so a partial or older record
/// still loads, member by member.  An absent `selectedLanguages` means no
/// selection was ever made; an empty list is a deliberate "none".
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PersistedSettings {
    #[serde(rename = "displayMode", skip_serializing_if = "Option::is_none")]
    display_mode: Option<String>,
    #[serde(rename = "selectedLanguages", skip_serializing_if = "Option::is_none")]
    selected_languages: Option<Vec<LanguageId>>,
    #[serde(rename = "廣韻字段", skip_serializing_if = "Option::is_none")]
    guangyun: Option<Vec<String>>,
    #[serde(rename = "中原音韻字段", skip_serializing_if = "Option::is_none")]
    zhongyuan: Option<Vec<String>>,
    #[serde(rename = "東干甘肅話字段", skip_serializing_if = "Option::is_none")]
    dungan: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    theme: Option<String>,
}

impl PersistedSettings {
    fn into_settings(self, device_theme: Theme) -> UserSettings {
        let mut fields = FieldSelections::default();
        for (family, names) in [
            (Family::Guangyun, self.guangyun),
            (Family::Zhongyuan, self.zhongyuan),
            (Family::Dungan, self.dungan),
        ] {
            if let Some(names) = names {
                fields.set(family, names);
            }
        }
        UserSettings {
            display_mode: self
                .display_mode
                .and_then(|m| m.parse().ok())
                .unwrap_or_default(),
            languages_chosen: self.selected_languages.is_some(),
            selected_languages: self.selected_languages.into_iter().flatten().collect(),
            fields,
            theme: self
                .theme
                .and_then(|t| match t.as_str() {
                    "light" => Some(Theme::Light),
                    "dark" => Some(Theme::Dark),
                    _ => None,
                })
                .unwrap_or(device_theme),
        }
    }
}

impl From<&UserSettings> for PersistedSettings {
    fn from(settings: &UserSettings) -> Self {
        let names = |family: Family| -> Option<Vec<String>> {
            Some(settings.fields.get(family).iter().cloned().collect())
        };
        Self {
            display_mode: Some(settings.display_mode.as_str().to_owned()),
            selected_languages: settings
                .languages_chosen
                .then(|| settings.selected_languages.iter().copied().collect()),
            guangyun: names(Family::Guangyun),
            zhongyuan: names(Family::Zhongyuan),
            dungan: names(Family::Dungan),
            theme: Some(
                match settings.theme {
                    Theme::Light => "light",
                    Theme::Dark => "dark",
                }
                .to_owned(),
            ),
        }
    }
}
