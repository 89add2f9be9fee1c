use crate::schema::{Family, Schema};

use paste::paste;
use phf::{Map, phf_map};

/// ---------------------------------------------------------------------------
///    Macro – generates every schema constant and the lookup table
/// ---------------------------------------------------------------------------
macro_rules! define_schemas {
    ($(
        $ident:ident, $family:expr, $abbr:literal,
        types: $types:literal,
        fields: [ $($field:literal),* $(,)? ],
        defaults: [ $($default:literal),* $(,)? ]
    );* $(;)?) => {
        paste! {
            $(
                mod [<$ident:lower _data>] {
                    pub const FIELDS: &[&str] = &[$($field),*];
                    pub const DEFAULTS: &[&str] = &[$($default),*];
                }

                pub static $ident: Schema = Schema::new(
                    $family,
                    [<$ident:lower _data>]::FIELDS,
                    $types,
                    [<$ident:lower _data>]::DEFAULTS,
                );
            )*
        }

        /// Schemas keyed by the catalog abbreviation of their language.
        pub static SCHEMA_TABLE: Map<&'static str, &'static Schema> = phf_map! {
            $( $abbr => &$ident, )*
        };

        pub fn all_schemas() -> &'static [&'static Schema] {
            static ALL: &[&Schema] = &[$(&$ident),*];
            ALL
        }
    };
}

// ---------------------------------------------------------------------------
//    Schema definitions (single source of truth)
//    Field order matches the slash-delimited layout served by the database.
// ---------------------------------------------------------------------------
define_schemas! {
    GUANGYUN, Family::Guangyun, "廣韻",
    types: "lllliiiiiiiiiiiiiih#hhhh",
    fields: [
        "切韻拼音",
        "白一平轉寫",
        "古韻羅馬字",
        "有女羅馬字",
        "髙本漢擬音",
        "王力(1957)擬音",
        "王力(1985)擬音",
        "李榮擬音",
        "邵榮芬擬音",
        "蒲立本擬音",
        "鄭張尙芳擬音",
        "潘悟雲(2000)擬音",
        "潘悟雲(2013)擬音",
        "潘悟雲(2023)擬音",
        "unt(2020)擬音",
        "unt(2022)擬音",
        "unt通俗擬音",
        "msoeg擬音",
        "切韻音系描述",
        "攝",
        "方音字彙描述",
        "廣韻韻目原貌",
        "折合平水韻目原貌",
        "反切",
    ],
    defaults: ["切韻拼音", "切韻音系描述", "unt(2022)擬音", "反切"];

    ZHONGYUAN, Family::Zhongyuan, "中原音韻",
    types: "lihhh",
    fields: ["拼音", "擬音", "聲母", "韻部", "聲調"],
    defaults: ["拼音", "擬音"];

    DUNGAN, Family::Dungan, "東干甘肅話",
    types: "ci",
    fields: ["東干文", "國際音標"],
    defaults: ["東干文", "國際音標"];
}

/// Schema for a language, looked up by its catalog abbreviation.
#[inline]
pub fn schema_for(abbreviation: &str) -> Option<&'static Schema> {
    SCHEMA_TABLE.get(abbreviation).copied()
}
