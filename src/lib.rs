/// Launcher Matcher - background script engine for the launcher new-tab page
/// Built with Rust + WASM

mod bridge;
mod config;
mod domain;
mod error;
mod host;
mod matcher;
mod navigation;
mod pattern;
mod prompt;
mod rules;
mod storage;
mod tab_data;
mod timing;

#[cfg(test)]
mod testing;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

pub use bridge::ChromeHost;
pub use config::MatcherConfig;
pub use error::{MatcherError, MatcherResult};
pub use host::{BrowserHost, PromptRequest};
pub use matcher::ScriptMatcher;
pub use navigation::{NavigationTracker, NavigationType};
pub use pattern::{compile_pattern, matches};
pub use prompt::{PromptOutcome, PromptRegistry};
pub use storage::{GlobalScript, Script, ScriptSnippet, Site, StorageData, WhenToRun};
pub use tab_data::{ChangeInfo, TabId, TabInfo, TabUpdate};
pub use timing::ScriptTiming;

thread_local! {
    // The matcher for this service-worker lifetime
    static MATCHER: RefCell<Option<Rc<ScriptMatcher<ChromeHost>>>> = const { RefCell::new(None) };
}

fn matcher() -> Rc<ScriptMatcher<ChromeHost>> {
    MATCHER.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| Rc::new(ScriptMatcher::new(ChromeHost, MatcherConfig::default())))
            .clone()
    })
}

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Start a fresh matcher, optionally with config overrides
#[wasm_bindgen]
pub fn init_matcher(config: JsValue) -> Result<(), JsValue> {
    let config = if config.is_null() || config.is_undefined() {
        MatcherConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid matcher config: {}", e)))?
    };

    log::info!("Matcher started: {:?}", config);
    MATCHER.with(|slot| {
        *slot.borrow_mut() = Some(Rc::new(ScriptMatcher::new(ChromeHost, config)));
    });
    Ok(())
}

/// `chrome.tabs.onUpdated` listener body
#[wasm_bindgen]
pub fn on_tab_updated(tab_id: i32, change_info: JsValue, tab: JsValue) {
    let change_info: ChangeInfo = match serde_wasm_bindgen::from_value(change_info) {
        Ok(info) => info,
        Err(e) => {
            log::warn!("Ignoring update for tab {}: {}", tab_id, e);
            return;
        }
    };
    let tab: TabInfo = serde_wasm_bindgen::from_value(tab).unwrap_or_default();

    let update = TabUpdate::new(tab_id, change_info, tab);
    let matcher = matcher();
    spawn_local(async move {
        matcher.handle_tab_update(&update).await;
    });
}

/// `chrome.tabs.onRemoved` listener body
#[wasm_bindgen]
pub fn on_tab_removed(tab_id: i32) {
    matcher().handle_tab_removed(tab_id);
}

/// Answer from a confirmation overlay. Returns false if nobody was waiting.
#[wasm_bindgen]
pub fn resolve_prompt(prompt_id: &str, confirmed: bool) -> bool {
    matcher().prompts().resolve(prompt_id, confirmed)
}

/// Called by the grid page right before it opens a site
#[wasm_bindgen]
pub async fn mark_launcher_opened(site_id: String) -> Result<(), JsValue> {
    matcher()
        .mark_launcher_opened(&site_id)
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

// Re-export core matching functions for JavaScript access
#[wasm_bindgen]
pub fn matches_pattern(url: &str, pattern: &str) -> bool {
    matches(url, pattern)
}

#[wasm_bindgen]
pub fn is_valid_pattern(pattern: &str) -> bool {
    !pattern.trim().is_empty() && compile_pattern(pattern).is_ok()
}
