//! The browser as seen by the matcher
//!
//! `ChromeHost` implements this over the extension APIs; tests use an
//! in-memory fake.

use serde::Serialize;

use crate::config::MatcherConfig;
use crate::error::MatcherResult;
use crate::storage::StorageData;
use crate::tab_data::TabId;

/// What the confirmation overlay shows
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    /// Correlation id the overlay sends back with its answer
    pub id: String,
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

/// Collaborators the matcher drives: persisted rules, session markers,
/// the page script injector, the prompt overlay, and a clock.
///
/// Implementations run on a single-threaded event loop, so futures need
/// not be `Send`.
#[allow(async_fn_in_trait)]
pub trait BrowserHost {
    /// Read `sites` and `globalScripts` from persistent storage
    async fn load_storage(&self, config: &MatcherConfig) -> MatcherResult<StorageData>;

    /// Keys currently set in session storage
    async fn session_keys(&self) -> MatcherResult<Vec<String>>;

    async fn set_session_flag(&self, key: &str) -> MatcherResult<()>;

    async fn remove_session_flag(&self, key: &str) -> MatcherResult<()>;

    /// Execute `code` in the page's own script context
    async fn inject_script(&self, tab_id: TabId, code: &str) -> MatcherResult<()>;

    /// Render the confirmation overlay for `request` inside the tab
    async fn show_prompt(&self, tab_id: TabId, request: &PromptRequest) -> MatcherResult<()>;

    /// Remove the overlay for `prompt_id`, if it is still there
    async fn dismiss_prompt(&self, tab_id: TabId, prompt_id: &str) -> MatcherResult<()>;

    async fn tab_exists(&self, tab_id: TabId) -> bool;

    async fn sleep(&self, ms: u32);

    /// Milliseconds since an arbitrary epoch
    fn now_ms(&self) -> f64;
}
