/// `BrowserHost` over the extension APIs, through the JS bridge
use wasm_bindgen::prelude::*;

use crate::config::MatcherConfig;
use crate::error::{MatcherError, MatcherResult};
use crate::host::{BrowserHost, PromptRequest};
use crate::storage::StorageData;
use crate::tab_data::TabId;

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getSessionKeys() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setSessionFlag(key: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeSessionFlag(key: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn injectMainWorld(tab_id: i32, code: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn showPrompt(tab_id: i32, request: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn dismissPrompt(tab_id: i32, prompt_id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn tabExists(tab_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = sleep)]
    async fn js_sleep(ms: u32) -> Result<(), JsValue>;
}

/// The real browser
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeHost;

impl BrowserHost for ChromeHost {
    async fn load_storage(&self, config: &MatcherConfig) -> MatcherResult<StorageData> {
        let keys = serde_wasm_bindgen::to_value(&[
            config.storage_key_sites.as_str(),
            config.storage_key_global_scripts.as_str(),
        ])?;

        let storage_js = getStorage(keys)
            .await
            .map_err(|e| MatcherError::Storage(format!("Failed to get storage: {:?}", e)))?;

        if storage_js.is_null() || storage_js.is_undefined() {
            return Ok(StorageData::new());
        }

        let mut raw: serde_json::Map<String, serde_json::Value> = serde_wasm_bindgen::from_value(storage_js)?;
        let sites = raw.remove(&config.storage_key_sites).unwrap_or_default();
        let global_scripts = raw.remove(&config.storage_key_global_scripts).unwrap_or_default();

        Ok(StorageData::from_records(sites, global_scripts))
    }

    async fn session_keys(&self) -> MatcherResult<Vec<String>> {
        let keys_js = getSessionKeys()
            .await
            .map_err(|e| MatcherError::Session(format!("Failed to read session: {:?}", e)))?;
        Ok(serde_wasm_bindgen::from_value(keys_js)?)
    }

    async fn set_session_flag(&self, key: &str) -> MatcherResult<()> {
        setSessionFlag(key)
            .await
            .map_err(|e| MatcherError::Session(format!("Failed to set {}: {:?}", key, e)))
    }

    async fn remove_session_flag(&self, key: &str) -> MatcherResult<()> {
        removeSessionFlag(key)
            .await
            .map_err(|e| MatcherError::Session(format!("Failed to remove {}: {:?}", key, e)))
    }

    async fn inject_script(&self, tab_id: TabId, code: &str) -> MatcherResult<()> {
        injectMainWorld(tab_id, code)
            .await
            .map_err(|e| MatcherError::Injection(format!("{:?}", e)))
    }

    async fn show_prompt(&self, tab_id: TabId, request: &PromptRequest) -> MatcherResult<()> {
        let request_js = serde_wasm_bindgen::to_value(request)?;
        showPrompt(tab_id, request_js)
            .await
            .map_err(|e| MatcherError::Prompt(format!("{:?}", e)))
    }

    async fn dismiss_prompt(&self, tab_id: TabId, prompt_id: &str) -> MatcherResult<()> {
        dismissPrompt(tab_id, prompt_id)
            .await
            .map_err(|e| MatcherError::Prompt(format!("{:?}", e)))
    }

    async fn tab_exists(&self, tab_id: TabId) -> bool {
        match tabExists(tab_id).await {
            Ok(exists) => exists.as_bool().unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn sleep(&self, ms: u32) {
        if let Err(e) = js_sleep(ms).await {
            log::debug!("Timer failed: {:?}", e);
        }
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}
