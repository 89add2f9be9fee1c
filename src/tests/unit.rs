#[cfg(test)]
mod unit_tests {

    use crate::catalog::{
        Coordinates, DisplayMode, LanguageInfo, SortKey, group_by_region, normalize, search,
    };
    use crate::rows::{Reading, ReadingItem, build_table, build_table_rows};
    use crate::schema::{DUNGAN, Family, GUANGYUN, ZHONGYUAN, all_schemas, schema_for};
    use crate::settings::{SETTINGS_KEY, Theme, UiLanguage, UserSettings};
    use crate::storage::{JsonFileStore, KeyValueStore, MemoryStore};
    use crate::testing::fixtures;
    use crate::{CharacterResult, LanguageId};
    use std::collections::BTreeSet;

    fn ids(rows: &[crate::TableRow]) -> Vec<LanguageId> {
        rows.iter().map(|r| r.language_id).collect()
    }

    fn all_ids() -> BTreeSet<LanguageId> {
        (1..=5).collect()
    }

    // ── schema ─────────────────────────────────────────────────────────────

    #[test]
    fn schemas_pair_names_with_tags() {
        for schema in all_schemas() {
            assert_eq!(schema.fields().len(), schema.type_tags().len());
            assert_eq!(schema.iter().count(), schema.len());
        }
        assert_eq!(GUANGYUN.len(), 24);
        assert_eq!(ZHONGYUAN.len(), 5);
        assert_eq!(DUNGAN.len(), 2);
    }

    #[test]
    fn schemas_are_found_by_abbreviation() {
        assert_eq!(schema_for("廣韻").map(|s| s.family()), Some(Family::Guangyun));
        assert_eq!(schema_for("中原音韻").map(|s| s.family()), Some(Family::Zhongyuan));
        assert_eq!(schema_for("東干甘肅話").map(|s| s.family()), Some(Family::Dungan));
        assert!(schema_for("廣州").is_none());
    }

    #[test]
    fn unknown_field_names_are_ignored_by_masks() {
        let mask = GUANGYUN.mask(["反切", "not a field"]);
        assert_eq!(mask.len(), 1);
        assert!(mask.contains(23));
        let names: Vec<_> = GUANGYUN.selected(GUANGYUN.default_mask()).collect();
        assert_eq!(names, ["切韻拼音", "unt(2022)擬音", "切韻音系描述", "反切"]);
    }

    // ── catalog ────────────────────────────────────────────────────────────

    #[test]
    fn language_info_reads_positional_scalars() {
        let catalog = fixtures::catalog();
        assert_eq!(catalog.len(), 5);
        let canton = &catalog[1];
        assert_eq!(canton.id, 2);
        assert_eq!(canton.abbreviation, "廣州");
        assert_eq!(canton.mode(DisplayMode::Atlas2).sort_order, SortKey::Number(5.0));
        assert_eq!(canton.mode(DisplayMode::Yindian).sort_order, SortKey::Text("0103".into()));
        assert_eq!(canton.mode(DisplayMode::ChenFang).region, "南方");
        assert_eq!(canton.coordinates.as_deref(), Some("113.26,23.13"));
    }

    #[test]
    fn short_and_odd_records_degrade_to_defaults() {
        let info: LanguageInfo = serde_json::from_str(r#"["7", "某地", null]"#).unwrap();
        assert_eq!(info.id, 7);
        assert_eq!(info.abbreviation, "");
        assert!(info.mode(DisplayMode::Atlas2).sort_order.is_missing());
        assert_eq!(info.coordinates, None);

        let bad = serde_json::from_str::<LanguageInfo>(r#"["x", "某地"]"#);
        assert!(bad.is_err());
    }

    #[test]
    fn language_info_survives_a_cache_round_trip() {
        let catalog = fixtures::catalog();
        let json = serde_json::to_string(&catalog).unwrap();
        let back: Vec<LanguageInfo> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn normalize_selects_the_mode_fields_in_input_order() {
        let atlas = fixtures::processed(DisplayMode::Atlas2);
        let chen = fixtures::processed(DisplayMode::ChenFang);
        assert_eq!(atlas.iter().map(|l| l.id).collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
        assert_eq!(atlas[1].region, "粵語");
        assert_eq!(chen[1].region, "南方");
        assert_eq!(chen[1].color, "#336699");
        assert_eq!(atlas[3].coordinates, None, "empty coordinates become None");
        assert_eq!(normalize(&fixtures::catalog(), DisplayMode::Atlas2), atlas);
    }

    #[test]
    fn sort_keys_order_numbers_text_and_missing() {
        let mut keys = vec![
            SortKey::Missing,
            SortKey::Number(10.0),
            SortKey::Text("b".into()),
            SortKey::Number(9.0),
            SortKey::Text("a".into()),
        ];
        keys.sort();
        assert_eq!(
            keys,
            [
                SortKey::Number(9.0),
                SortKey::Number(10.0),
                SortKey::Text("a".into()),
                SortKey::Text("b".into()),
                SortKey::Missing,
            ]
        );
        // across kinds every number sorts before every text token
        assert!(SortKey::Number(5.0) < SortKey::Text("3".into()));
        assert!(SortKey::Number(500.0) < SortKey::Text("0".into()));
        // text stays lexicographic even when it looks numeric
        assert!(SortKey::Text("10".into()) < SortKey::Text("9".into()));
    }

    #[test]
    fn regions_group_by_smallest_sort_key() {
        let langs = fixtures::processed(DisplayMode::Atlas2);
        let groups = group_by_region(&langs);
        let names: Vec<_> = groups.iter().map(|(r, _)| *r).collect();
        assert_eq!(names, ["中古漢語", "近代漢語", "官話", "粵語"]);
        let guanhua: Vec<_> = groups[2].1.iter().map(|l| l.id).collect();
        assert_eq!(guanhua, [3, 5]);
    }

    #[test]
    fn search_matches_name_or_abbreviation() {
        let langs = fixtures::processed(DisplayMode::Atlas2);
        let hits: Vec<_> = search(&langs, "廣").iter().map(|l| l.id).collect();
        assert_eq!(hits, [1, 2]);
        assert_eq!(search(&langs, "  ").len(), 5);
        assert!(search(&langs, "nowhere").is_empty());
    }

    #[test]
    fn coordinates_parse_lng_lat() {
        let c = Coordinates::parse("113.26, 23.13").unwrap();
        assert_eq!(c.longitude, 113.26);
        assert_eq!(c.latitude, 23.13);
        let url = c.map_embed_url();
        assert!(url.starts_with("https://www.openstreetmap.org/export/embed.html?bbox="));
        assert!(url.ends_with("&layer=mapnik&marker=23.13,113.26"));
        assert!(Coordinates::parse("").is_none());
        assert!(Coordinates::parse("113.26").is_none());
        assert!(Coordinates::parse("east,north").is_none());
    }

    // ── rows ───────────────────────────────────────────────────────────────

    fn results() -> Vec<CharacterResult> {
        serde_json::from_value(fixtures::query_json()).unwrap()
    }

    #[test]
    fn character_results_decode_entries_and_notes() {
        let results = results();
        assert_eq!(results[0].character, "天");
        assert_eq!(results[0].entries.len(), 4);
        assert_eq!(results[1].entries[0].note.as_deref(), Some("~方"));
        assert_eq!(results[1].entries[1].note, None);
    }

    #[test]
    fn character_results_tolerate_extra_items() {
        let raw = r#"["天", "tiān", [[3, "tʰiɛn˥", null], [2, "tʰin˥", ""]]]"#;
        let result: CharacterResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.entries.len(), 2);
        assert!(result.entries.iter().all(|e| e.note.is_none()));
    }

    #[test]
    fn rows_are_sorted_for_the_active_mode() {
        let results = results();
        let atlas = build_table_rows(&results, &fixtures::processed(DisplayMode::Atlas2), &all_ids());
        assert_eq!(ids(&atlas), [1, 3, 2]);
        let chen = build_table_rows(&results, &fixtures::processed(DisplayMode::ChenFang), &all_ids());
        assert_eq!(ids(&chen), [3, 2, 1]);
    }

    #[test]
    fn unknown_languages_are_dropped() {
        let rows = build_table_rows(&results(), &fixtures::processed(DisplayMode::Atlas2), &all_ids());
        assert!(rows.iter().all(|r| r.language_id != 999));
        let mut with_999 = all_ids();
        with_999.insert(999);
        let rows = build_table_rows(&results(), &fixtures::processed(DisplayMode::Atlas2), &with_999);
        assert!(rows.iter().all(|r| r.language_id != 999));
    }

    #[test]
    fn unselected_languages_are_dropped() {
        let selected: BTreeSet<_> = [1, 2].into();
        let rows = build_table_rows(&results(), &fixtures::processed(DisplayMode::Atlas2), &selected);
        assert_eq!(ids(&rows), [1, 2]);
        assert!(build_table_rows(&results(), &fixtures::processed(DisplayMode::Atlas2), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn multiple_readings_keep_order_and_notes() {
        let table = build_table(&results(), &fixtures::processed(DisplayMode::Atlas2), &all_ids());
        assert_eq!(table.columns, ["天", "地"]);
        let canton = table.rows.iter().find(|r| r.language_id == 2).unwrap();
        assert_eq!(table.lookup(canton, "天"), Some(&Reading::Single("tʰin˥".into())));
        assert_eq!(
            table.lookup(canton, "地"),
            Some(&Reading::MultipleReadings(vec![
                ReadingItem { value: "tei˨".into(), note: Some("~方".into()) },
                ReadingItem { value: "ti˨".into(), note: None },
            ]))
        );
        assert_eq!(table.lookup(canton, "地").unwrap().joined_text(), "tei˨ (~方); ti˨");
        let guangyun = table.rows.iter().find(|r| r.language_id == 1).unwrap();
        assert_eq!(guangyun.cell(1), None, "no reading of 地 for 廣韻");
    }

    #[test]
    fn a_single_reading_with_a_note_keeps_its_note() {
        let raw = serde_json::json!([["天", [[3, "tʰiɛn˥", "文讀"]]]]);
        let results: Vec<CharacterResult> = serde_json::from_value(raw).unwrap();
        let rows = build_table_rows(&results, &fixtures::processed(DisplayMode::Atlas2), &all_ids());
        assert!(matches!(rows[0].cell(0), Some(Reading::MultipleReadings(items)) if items.len() == 1));
    }

    #[test]
    fn repeated_characters_get_their_own_columns() {
        let raw = serde_json::json!([["天", [[3, "a"]]], ["天", [[3, "b"]]]]);
        let results: Vec<CharacterResult> = serde_json::from_value(raw).unwrap();
        let rows = build_table_rows(&results, &fixtures::processed(DisplayMode::Atlas2), &all_ids());
        assert_eq!(rows[0].cells, [Some(Reading::Single("a".into())), Some(Reading::Single("b".into()))]);
    }

    // ── settings & storage ─────────────────────────────────────────────────

    #[test]
    fn defaults_follow_the_device_theme() {
        let store = MemoryStore::new();
        assert_eq!(UserSettings::load(&store, Some(true)).theme, Theme::Dark);
        assert_eq!(UserSettings::load(&store, None).theme, Theme::Light);
        let defaults = UserSettings::load(&store, None);
        assert_eq!(defaults.display_mode, DisplayMode::Atlas2);
        assert!(defaults.fields.contains(Family::Guangyun, "反切"));
        assert_eq!(defaults.fields.get(Family::Zhongyuan).len(), 2);
    }

    #[test]
    fn settings_round_trip_through_the_store() {
        let store = MemoryStore::new();
        let mut settings = UserSettings::default();
        settings.set_display_mode(DisplayMode::ChenFang);
        settings.select_languages([3, 1]);
        settings.toggle_language(1);
        settings.toggle_language(2);
        settings.clear_fields(Family::Dungan);
        assert!(settings.toggle_field(Family::Dungan, "國際音標"));
        assert!(!settings.toggle_field(Family::Dungan, "反切"));
        settings.set_theme(Theme::Dark);
        settings.save(&store);

        let loaded = UserSettings::load(&store, Some(false));
        assert_eq!(loaded, settings);
        assert_eq!(loaded.selected_languages, BTreeSet::from([2, 3]));
        assert_eq!(loaded.fields.get(Family::Dungan).len(), 1);
    }

    #[test]
    fn corrupt_or_partial_settings_fall_back_member_by_member() {
        let store = MemoryStore::new();
        store.set(SETTINGS_KEY, "{not json").unwrap();
        assert_eq!(UserSettings::load(&store, None), UserSettings::default());

        store
            .set(
                SETTINGS_KEY,
                r#"{"displayMode":"火星","selectedLanguages":[4],"廣韻字段":["反切","bogus"],"theme":"sepia"}"#,
            )
            .unwrap();
        let loaded = UserSettings::load(&store, Some(true));
        assert_eq!(loaded.display_mode, DisplayMode::Atlas2);
        assert_eq!(loaded.selected_languages, BTreeSet::from([4]));
        assert_eq!(loaded.fields.get(Family::Guangyun), &BTreeSet::from(["反切".to_owned()]));
        assert_eq!(loaded.fields.get(Family::Zhongyuan), crate::settings::FieldSelections::default().get(Family::Zhongyuan));
        assert_eq!(loaded.theme, Theme::Dark);
    }

    #[test]
    fn ui_language_is_stored_separately() {
        let store = MemoryStore::new();
        assert_eq!(UiLanguage::load(&store), UiLanguage::ZhHk);
        UiLanguage::EnGb.save(&store);
        assert_eq!(UiLanguage::load(&store), UiLanguage::EnGb);
        store.set(crate::settings::UI_LANGUAGE_KEY, "tlh").unwrap();
        assert_eq!(UiLanguage::load(&store), UiLanguage::ZhHk);
        assert_eq!(UiLanguage::EnGb.locale(), "en-GB");
    }

    #[test]
    fn json_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("a", "1").unwrap();
            store.set("b", "2").unwrap();
            store.remove("a").unwrap();
        }
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn json_file_store_treats_corruption_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "garbage").unwrap();
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(JsonFileStore::open(&path).unwrap().get("k").unwrap().as_deref(), Some("v"));
    }

    // ── lenient wire decoding & selection memory ───────────────────────────

    fn keyed(id: LanguageId, sort_order: SortKey) -> crate::ProcessedLanguage {
        crate::ProcessedLanguage {
            id,
            name: String::new(),
            abbreviation: String::new(),
            sort_order,
            color: String::new(),
            region: String::new(),
            location: String::new(),
            coordinates: None,
        }
    }

    #[test]
    fn mixed_sort_keys_order_the_same_whatever_the_result_order() {
        let catalog = [
            keyed(0, SortKey::Number(10.0)),
            keyed(1, SortKey::Text("5".into())),
            keyed(2, SortKey::Number(9.0)),
        ];
        let selected: BTreeSet<LanguageId> = [0, 1, 2].into();
        let results = |order: [LanguageId; 3]| -> Vec<CharacterResult> {
            let entries: Vec<_> = order.iter().map(|id| serde_json::json!([id, "a"])).collect();
            serde_json::from_value(serde_json::json!([["天", entries]])).unwrap()
        };
        let forward = build_table_rows(&results([0, 1, 2]), &catalog, &selected);
        let backward = build_table_rows(&results([2, 1, 0]), &catalog, &selected);
        assert_eq!(ids(&forward), [2, 0, 1]);
        assert_eq!(ids(&backward), [2, 0, 1]);
    }

    #[test]
    fn malformed_entries_are_skipped_individually() {
        let results: Vec<CharacterResult> =
            serde_json::from_str(r#"[["天", [[1, "a"], ["?", "b"], [3]]]]"#).unwrap();
        assert_eq!(results[0].entries.len(), 1);
        assert_eq!(results[0].entries[0].language_id, 1);
        assert_eq!(results[0].entries[0].reading, "a");
    }

    #[test]
    fn catalog_records_without_an_id_are_skipped() {
        let raw = serde_json::json!([
            [1, "廣韻", "廣韻", 1, "#EB0000", "中古漢語", "0001", "", "", null, "", "", "", null],
            [null, "無名", "無名", 2, "", "", "", "", "", null, "", "", "", null],
            "not a record"
        ]);
        let crate::catalog::Catalog(langs) = serde_json::from_value(raw).unwrap();
        assert_eq!(langs.len(), 1);
        assert_eq!(langs[0].name, "廣韻");
    }

    #[test]
    fn an_emptied_selection_is_remembered() {
        let store = MemoryStore::new();
        let fresh = UserSettings::load(&store, None);
        assert!(!fresh.has_language_selection());

        let mut settings = fresh.clone();
        settings.select_languages([1, 2]);
        settings.deselect_all_languages();
        settings.save(&store);

        let loaded = UserSettings::load(&store, None);
        assert!(loaded.has_language_selection());
        assert!(loaded.selected_languages.is_empty());
        assert!(store.get(SETTINGS_KEY).unwrap().unwrap().contains(r#""selectedLanguages":[]"#));
    }

    #[test]
    fn settings_without_a_selection_omit_it() {
        let store = MemoryStore::new();
        UserSettings::default().save(&store);
        let saved = store.get(SETTINGS_KEY).unwrap().unwrap();
        assert!(!saved.contains("selectedLanguages"));
        assert!(!UserSettings::load(&store, None).has_language_selection());
    }
}
