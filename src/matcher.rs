//! Navigation script matcher: tab events in, script injections out

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::MatcherConfig;
use crate::domain::is_web_url;
use crate::error::MatcherResult;
use crate::host::BrowserHost;
use crate::navigation::NavigationTracker;
use crate::prompt::{PromptRegistry, confirm};
use crate::rules::{LoadFacts, PlannedRule, plan_global_on_departure, plan_load};
use crate::storage::StorageData;
use crate::tab_data::{TabId, TabUpdate};
use crate::timing::wrap_for_timing;

/// One per browsing session. Owns the per-tab navigation registry and the
/// open prompts; everything else lives behind the host.
pub struct ScriptMatcher<H: BrowserHost> {
    host: H,
    config: MatcherConfig,
    tracker: RefCell<NavigationTracker>,
    prompts: Rc<PromptRegistry>,
}

impl<H: BrowserHost> ScriptMatcher<H> {
    pub fn new(host: H, config: MatcherConfig) -> Self {
        ScriptMatcher {
            host,
            config,
            tracker: RefCell::new(NavigationTracker::new()),
            prompts: Rc::new(PromptRegistry::new()),
        }
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn prompts(&self) -> &Rc<PromptRegistry> {
        &self.prompts
    }

    pub fn tracked_tabs(&self) -> usize {
        self.tracker.borrow().tab_count()
    }

    /// Entry point for `chrome.tabs.onUpdated`
    pub async fn handle_tab_update(&self, update: &TabUpdate) {
        if let Some(url) = update.change_info.url.as_deref() {
            self.handle_url_change(update.tab_id, url).await;
        }

        if update.change_info.is_complete() {
            if let Some(url) = update.loaded_url() {
                self.handle_load_complete(update.tab_id, url).await;
            }
        }
    }

    /// Entry point for `chrome.tabs.onRemoved`
    pub fn handle_tab_removed(&self, tab_id: TabId) {
        if self.tracker.borrow_mut().remove(tab_id) {
            log::debug!("Dropped navigation state for tab {} ({} tracked)", tab_id, self.tracked_tabs());
        }

        let cancelled = self.prompts.cancel_tab(tab_id);
        if cancelled > 0 {
            log::debug!("Cancelled {} open prompt(s) for closed tab {}", cancelled, tab_id);
        }
    }

    /// A tab's URL changed. Crossing to another host fires the
    /// `navigating_out` rules of the host being left.
    pub async fn handle_url_change(&self, tab_id: TabId, url: &str) {
        if !is_web_url(url) {
            return;
        }

        let change = self.tracker.borrow_mut().record_url_change(tab_id, url);
        let Some(departed) = change.departed_from() else {
            return;
        };

        let Some(storage) = self.read_storage().await else {
            return;
        };

        let rules = plan_global_on_departure(&storage.global_scripts, departed);
        if !rules.is_empty() {
            log::debug!("Tab {} leaving {}: {} rule(s)", tab_id, departed, rules.len());
            self.execute(tab_id, &rules).await;
        }
    }

    /// A page finished loading: run site scripts, then global scripts.
    pub async fn handle_load_complete(&self, tab_id: TabId, url: &str) {
        if !is_web_url(url) {
            return;
        }

        let load = self.tracker.borrow_mut().settle(tab_id, url);

        let Some(storage) = self.read_storage().await else {
            return;
        };

        let markers = match self.host.session_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("Could not read launcher markers: {}", e);
                Vec::new()
            }
        };

        let site_marker = storage
            .site_for_url(url)
            .map(|site| self.config.launcher_marker(&site.id))
            .filter(|key| markers.contains(key));
        let launcher_active = markers
            .iter()
            .any(|key| key.starts_with(&self.config.launcher_marker_prefix));

        let plan = plan_load(
            &storage,
            LoadFacts {
                url,
                nav_type: load.nav_type,
                opened_via_launcher: site_marker.is_some(),
                launcher_active,
            },
        );

        log::debug!(
            "Tab {} loaded {} ({:?}, from {:?}): {} rule(s)",
            tab_id,
            url,
            load.nav_type,
            load.previous_url,
            plan.rules.len()
        );

        // Consumed exactly once, whatever the rules end up doing
        if let Some(key) = site_marker {
            if let Err(e) = self.host.remove_session_flag(&key).await {
                log::warn!("Could not clear {}: {}", key, e);
            }
        }

        self.execute(tab_id, &plan.rules).await;
    }

    /// Record that `site_id` is being opened from the launcher grid
    pub async fn mark_launcher_opened(&self, site_id: &str) -> MatcherResult<()> {
        self.host
            .set_session_flag(&self.config.launcher_marker(site_id))
            .await
    }

    async fn read_storage(&self) -> Option<StorageData> {
        match self.host.load_storage(&self.config).await {
            Ok(storage) => Some(storage),
            Err(e) => {
                log::warn!("Skipping evaluation, rules unavailable: {}", e);
                None
            }
        }
    }

    /// Run planned rules in order. Returns the number of scripts injected.
    async fn execute(&self, tab_id: TabId, rules: &[PlannedRule]) -> usize {
        let mut injected = 0;

        for rule in rules {
            if rule.confirm {
                let outcome = confirm(&self.host, &self.prompts, &self.config, tab_id, rule).await;
                if !outcome.is_confirmed() {
                    continue;
                }
            }

            for script in &rule.scripts {
                let code = wrap_for_timing(&script.code, script.timing, &self.config);
                match self.host.inject_script(tab_id, &code).await {
                    Ok(()) => {
                        injected += 1;
                        log::info!(
                            "Injected {:?} script for {:?} into tab {}",
                            script.timing.as_str(),
                            rule.source,
                            tab_id
                        );
                    }
                    Err(e) => {
                        log::warn!("Injection for {:?} into tab {} failed: {}", rule.source, tab_id, e);
                    }
                }
            }
        }

        injected
    }
}
