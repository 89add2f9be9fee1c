// demos/query.rs
//! Example: query the live database and print the comparison table.
//!
//! ```text
//! cargo run --example query -- 天地
//! ```
//!
//! Settings and the catalog cache live in `yindian-store.json` in the
//! working directory, so a second run reuses the cached catalog.

use std::error::Error;
use yindian::schema::schema_for;
use yindian::{ClientConfig, Reading, Session, decode};

fn main() -> Result<(), Box<dyn Error>> {
    let input = std::env::args().skip(1).collect::<Vec<_>>().join("");
    let input = if input.is_empty() { "天地".to_owned() } else { input };

    let config = ClientConfig::builder().build();
    let mut session = Session::open_with_file(&config, "yindian-store.json", None)?;
    session.load_languages()?;
    println!(
        "{} languages, {} selected, mode {}",
        session.raw_languages().len(),
        session.settings().selected_languages.len(),
        session.settings().display_mode
    );

    session.set_query_input(input);
    let table = session.run_query()?;
    println!("{:<12}\t{}", "", table.columns.join("\t"));

    for row in &table.rows {
        let coded = schema_for(&row.language_abbr)
            .map(|schema| (schema, session.settings().fields.mask(schema.family())));
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| match (cell, coded) {
                (None, _) => "-".to_owned(),
                (Some(Reading::Single(raw)), Some((schema, mask))) => decode(raw, mask, schema)
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
                (Some(reading), _) => reading.joined_text(),
            })
            .collect();
        println!("{:<12}\t{}", row.language_name, cells.join("\t"));
    }

    if session.wait_for_refresh() {
        println!("catalog refreshed to version {:?}", session.client().cached_version());
    }
    Ok(())
}
