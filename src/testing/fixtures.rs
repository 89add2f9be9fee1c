use crate::catalog::{LanguageInfo, ProcessedLanguage};
use serde_json::{Value, json};

/// 24 slash-joined tokens `prefix0/…/prefix23`.
pub(crate) fn guangyun_record(prefix: &str) -> String {
    (0..24)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join("/")
}

/// Catalog rows: id, name, abbreviation, three (sort, colour, region) groups,
/// location, coordinates.
pub(crate) fn catalog_json() -> Value {
    json!([
        [1, "廣韻", "廣韻", 1, "#EB0000", "中古漢語", "0001", "#EB0000", "中古", null, "", "", "", null],
        [2, "廣州", "廣州", 5, "#00A0E9", "粵語", "0103", "#00A0E9", "粵", 2, "#336699", "南方", "廣東省廣州市", "113.26,23.13"],
        [3, "北京", "北京", 3, "#FFEE99", "官話", "0102", "#FFEE99", "官", 1, "#FFEE99", "北方", "北京市", "116.40,39.90"],
        [4, "中原音韻", "中原音韻", 2, "#EB0000", "近代漢語", "0002", "#EB0000", "近代", null, "", "", "", ""],
        [5, "東干甘肅話", "東干甘肅話", "", "#99CC00", "官話", "0201", "#99CC00", "官", 3, "#99CC00", "北方", "", null]
    ])
}

pub(crate) fn envelope(version: Value, data: Value) -> String {
    json!({ "version": version, "data": data }).to_string()
}

pub(crate) fn catalog() -> Vec<LanguageInfo> {
    serde_json::from_value(catalog_json()).unwrap()
}

pub(crate) fn processed(mode: crate::catalog::DisplayMode) -> Vec<ProcessedLanguage> {
    crate::catalog::normalize(&catalog(), mode)
}

/// Results for "天地": Guangzhou has two readings of 地, one with a note.
pub(crate) fn query_json() -> Value {
    json!([
        ["天", [
            [1, guangyun_record("t")],
            [2, "tʰin˥"],
            [3, "tʰiɛn˥"],
            [999, "x"]
        ]],
        ["地", [
            [2, "tei˨", "~方"],
            [2, "ti˨"],
            [3, "ti˥˩"]
        ]]
    ])
}
