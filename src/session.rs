//! Application session: catalog, settings and the latest query, with derived
//! state (processed languages, table) recomputed wholesale on every change.

use crate::api::{ApiClient, ApiError, QueryResponse, RefreshHandle, Transport, normalize_query};
use crate::catalog::{self, DisplayMode, LanguageId, LanguageInfo, ProcessedLanguage};
use crate::rows::{self, CharacterResult, Table};
use crate::schema::Family;
use crate::settings::{Theme, UiLanguage, UserSettings};
use crate::storage::{KeyValueStore, StorageError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Identifies one query; only the newest ticket's response is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueryTicket(u64);

pub struct Session<T, S: ?Sized> {
    client: ApiClient<T, Arc<S>>,
    store: Arc<S>,
    settings: UserSettings,
    ui_language: UiLanguage,
    raw_languages: Vec<LanguageInfo>,
    processed: Vec<ProcessedLanguage>,
    query_input: String,
    query_results: Option<Vec<CharacterResult>>,
    latest_ticket: u64,
    pending_refresh: Option<RefreshHandle>,
}

#[cfg(feature = "http")]
impl Session<crate::api::HttpTransport, crate::storage::JsonFileStore> {
    /// Live API plus settings persisted in a JSON file at `path`.
    pub fn open_with_file(
        config: &crate::api::ClientConfig,
        path: impl Into<std::path::PathBuf>,
        prefers_dark: Option<bool>,
    ) -> Result<Self, SessionError> {
        let store = Arc::new(crate::storage::JsonFileStore::open(path)?);
        let transport = crate::api::HttpTransport::new(config)?;
        Ok(Self::open(transport, store, prefers_dark))
    }
}

impl<T: Transport + 'static, S: KeyValueStore + ?Sized + 'static> Session<T, S> {
    /// Settings and UI language come from `store`; `prefers_dark` is the
    /// device theme preference used when no theme was ever saved.
    pub fn open(transport: T, store: Arc<S>, prefers_dark: Option<bool>) -> Self {
        let settings = UserSettings::load(&*store, prefers_dark);
        let ui_language = UiLanguage::load(&*store);
        Self {
            client: ApiClient::new(transport, Arc::clone(&store)),
            store,
            settings,
            ui_language,
            raw_languages: Vec::new(),
            processed: Vec::new(),
            query_input: String::new(),
            query_results: None,
            latest_ticket: 0,
            pending_refresh: None,
        }
    }

    pub fn client(&self) -> &ApiClient<T, Arc<S>> {
        &self.client
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn ui_language(&self) -> UiLanguage {
        self.ui_language
    }

    pub fn raw_languages(&self) -> &[LanguageInfo] {
        &self.raw_languages
    }

    pub fn processed_languages(&self) -> &[ProcessedLanguage] {
        &self.processed
    }

    pub fn language(&self, id: LanguageId) -> Option<&ProcessedLanguage> {
        self.processed.iter().find(|l| l.id == id)
    }

    pub fn query_input(&self) -> &str {
        &self.query_input
    }

    pub fn set_query_input(&mut self, input: impl Into<String>) {
        self.query_input = input.into();
    }

    pub fn query_results(&self) -> Option<&[CharacterResult]> {
        self.query_results.as_deref()
    }

    // ── catalog ────────────────────────────────────────────────────────────

    /// Fetch (or reuse) the catalog.  If no language selection was ever made,
    /// every catalogued language becomes selected.
    pub fn load_languages(&mut self) -> Result<(), SessionError> {
        let languages = self.client.fetch_languages(false)?;
        self.apply_catalog(languages);
        Ok(())
    }

    /// Force a refetch, bypassing the version check.
    pub fn reload_languages(&mut self) -> Result<(), SessionError> {
        let languages = self.client.fetch_languages(true)?;
        self.apply_catalog(languages);
        Ok(())
    }

    fn apply_catalog(&mut self, languages: Vec<LanguageInfo>) {
        if !self.settings.has_language_selection() {
            self.settings.select_languages(languages.iter().map(|l| l.id));
            self.persist();
        }
        self.raw_languages = languages;
        self.reprocess();
    }

    fn reprocess(&mut self) {
        self.processed = catalog::normalize(&self.raw_languages, self.settings.display_mode);
    }

    /// Pick up a finished background refresh.  `true` when the catalog changed.
    pub fn poll_refresh(&mut self) -> bool {
        if !self.pending_refresh.as_ref().is_some_and(|h| h.is_finished()) {
            return false;
        }
        let Some(handle) = self.pending_refresh.take() else {
            return false;
        };
        self.finish_refresh(handle)
    }

    /// Block until a pending background refresh completes.
    pub fn wait_for_refresh(&mut self) -> bool {
        match self.pending_refresh.take() {
            Some(handle) => self.finish_refresh(handle),
            None => false,
        }
    }

    fn finish_refresh(&mut self, handle: RefreshHandle) -> bool {
        match handle.join() {
            Ok(Ok(languages)) => {
                self.apply_catalog(languages);
                true
            }
            Ok(Err(_)) => false,
            Err(_) => {
                log::error!("catalog refresh thread panicked");
                false
            }
        }
    }

    /// Forget the cached catalog; the next load goes to the network.
    pub fn clear_cache(&mut self) {
        self.client.clear_cache();
    }

    // ── queries ────────────────────────────────────────────────────────────

    /// Start a query; the ticket supersedes every earlier one.
    pub fn begin_query(&mut self) -> QueryTicket {
        self.latest_ticket += 1;
        QueryTicket(self.latest_ticket)
    }

    /// Store a response if its ticket is still the newest.  A stale response
    /// is dropped and `false` returned.
    pub fn accept_query(&mut self, ticket: QueryTicket, response: QueryResponse) -> bool {
        if let Some(handle) = response.refresh {
            self.pending_refresh = Some(handle);
        }
        if ticket.0 != self.latest_ticket {
            log::warn!(
                "discarding stale query response (ticket {}, latest {})",
                ticket.0,
                self.latest_ticket
            );
            return false;
        }
        self.query_results = Some(response.data);
        true
    }

    /// Query the current input synchronously and return the fresh table.
    pub fn run_query(&mut self) -> Result<Table, SessionError> {
        let chars = normalize_query(&self.query_input)?;
        let ticket = self.begin_query();
        let response = self.client.query_characters(&chars)?;
        self.accept_query(ticket, response);
        Ok(self.table().unwrap_or_default())
    }

    /// Table for the latest accepted results under current settings.
    pub fn table(&self) -> Option<Table> {
        self.query_results.as_ref().map(|results| {
            rows::build_table(results, &self.processed, &self.settings.selected_languages)
        })
    }

    // ── settings transitions (each persisted immediately) ─────────────────

    fn persist(&self) {
        self.settings.save(&*self.store);
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.settings.set_display_mode(mode);
        self.persist();
        self.reprocess();
    }

    pub fn toggle_language(&mut self, id: LanguageId) {
        self.settings.toggle_language(id);
        self.persist();
    }

    pub fn select_all_languages(&mut self) {
        self.settings
            .select_languages(self.raw_languages.iter().map(|l| l.id));
        self.persist();
    }

    pub fn deselect_all_languages(&mut self) {
        self.settings.deselect_all_languages();
        self.persist();
    }

    pub fn toggle_field(&mut self, family: Family, field: &str) -> bool {
        let known = self.settings.toggle_field(family, field);
        if known {
            self.persist();
        }
        known
    }

    pub fn select_all_fields(&mut self, family: Family) {
        self.settings.select_all_fields(family);
        self.persist();
    }

    pub fn clear_fields(&mut self, family: Family) {
        self.settings.clear_fields(family);
        self.persist();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.set_theme(theme);
        self.persist();
    }

    pub fn set_ui_language(&mut self, language: UiLanguage) {
        self.ui_language = language;
        language.save(&*self.store);
    }
}
