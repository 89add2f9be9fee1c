//! Client library for the Yindian (音典) pronunciation database.
//!
//! Given Chinese characters, the database returns every known reading across
//! a thousand-odd historical and modern varieties.  This crate fetches the
//! language catalog and readings, decodes the field-coded records of the
//! rhyme-book languages, and builds the character-by-language comparison
//! table.

pub mod api;
pub mod catalog;
pub mod color;
pub mod decode;
pub mod note;
pub mod render;
pub mod rows;
pub mod schema;
pub mod session;
pub mod settings;
pub mod storage;

pub use api::{ApiClient, ApiError, ApiResponse, ClientConfig, QueryResponse, Transport};
#[cfg(feature = "http")]
pub use api::HttpTransport;
pub use catalog::{DisplayMode, LanguageId, LanguageInfo, ProcessedLanguage, SortKey, normalize};
pub use decode::{DecodedField, DecodedReading, decode, decode_to_html};
pub use rows::{CharacterResult, Reading, Table, TableRow, build_table, build_table_rows};
pub use schema::{DUNGAN, Family, FieldMask, GUANGYUN, Schema, ScriptTag, ZHONGYUAN, schema_for};
pub use session::{QueryTicket, Session, SessionError};
pub use settings::{FieldSelections, Theme, UiLanguage, UserSettings};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests {
    include!("tests/unit.rs");
    include!("tests/integration.rs");
    include!("tests/proptest.rs");
}
