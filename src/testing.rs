/// In-memory `BrowserHost` for unit tests
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use crate::config::MatcherConfig;
use crate::error::{MatcherError, MatcherResult};
use crate::host::{BrowserHost, PromptRequest};
use crate::prompt::PromptRegistry;
use crate::storage::StorageData;
use crate::tab_data::TabId;

/// Records every call; time only moves when something sleeps.
#[derive(Default)]
pub struct FakeHost {
    storage: RefCell<StorageData>,
    storage_fails: Cell<bool>,
    session: RefCell<BTreeSet<String>>,
    injected: RefCell<Vec<(TabId, String)>>,
    failing_code: RefCell<Option<String>>,
    prompts: RefCell<Vec<PromptRequest>>,
    prompts_fail: Cell<bool>,
    dismissed: RefCell<Vec<String>>,
    closed_tabs: RefCell<HashSet<TabId>>,
    clock: Cell<f64>,
    answer: RefCell<Option<(Rc<PromptRegistry>, PromptReply)>>,
}

/// What happens right after a prompt is shown
#[derive(Clone, Copy)]
enum PromptReply {
    Answer(bool),
    /// The tab closes while the overlay is up
    TabRemoved,
}

impl FakeHost {
    pub fn new() -> Self {
        FakeHost::default()
    }

    pub fn with_storage(storage: StorageData) -> Self {
        let host = FakeHost::new();
        *host.storage.borrow_mut() = storage;
        host
    }

    pub fn fail_storage(&self) {
        self.storage_fails.set(true);
    }

    /// Injections whose code contains `needle` are rejected
    pub fn fail_injections_containing(&self, needle: &str) {
        *self.failing_code.borrow_mut() = Some(needle.to_string());
    }

    pub fn fail_prompts(&self) {
        self.prompts_fail.set(true);
    }

    /// Answer every prompt as soon as it is shown
    pub fn answer_prompts(&self, registry: Rc<PromptRegistry>, confirmed: bool) {
        *self.answer.borrow_mut() = Some((registry, PromptReply::Answer(confirmed)));
    }

    /// Close the prompting tab as soon as a prompt is shown
    pub fn cancel_prompts_for_tab(&self, registry: Rc<PromptRegistry>) {
        *self.answer.borrow_mut() = Some((registry, PromptReply::TabRemoved));
    }

    pub fn close_tab(&self, tab_id: TabId) {
        self.closed_tabs.borrow_mut().insert(tab_id);
    }

    pub fn set_flag(&self, key: &str) {
        self.session.borrow_mut().insert(key.to_string());
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.session.borrow().contains(key)
    }

    pub fn injected(&self) -> Vec<(TabId, String)> {
        self.injected.borrow().clone()
    }

    /// Number of injected payloads containing `needle`
    pub fn injection_count(&self, needle: &str) -> usize {
        self.injected
            .borrow()
            .iter()
            .filter(|(_, code)| code.contains(needle))
            .count()
    }

    pub fn prompts_shown(&self) -> Vec<PromptRequest> {
        self.prompts.borrow().clone()
    }

    pub fn dismissed(&self) -> Vec<String> {
        self.dismissed.borrow().clone()
    }
}

impl BrowserHost for FakeHost {
    async fn load_storage(&self, _config: &MatcherConfig) -> MatcherResult<StorageData> {
        if self.storage_fails.get() {
            return Err(MatcherError::Storage("storage unavailable".to_string()));
        }
        Ok(self.storage.borrow().clone())
    }

    async fn session_keys(&self) -> MatcherResult<Vec<String>> {
        Ok(self.session.borrow().iter().cloned().collect())
    }

    async fn set_session_flag(&self, key: &str) -> MatcherResult<()> {
        self.set_flag(key);
        Ok(())
    }

    async fn remove_session_flag(&self, key: &str) -> MatcherResult<()> {
        self.session.borrow_mut().remove(key);
        Ok(())
    }

    async fn inject_script(&self, tab_id: TabId, code: &str) -> MatcherResult<()> {
        if let Some(needle) = self.failing_code.borrow().as_deref() {
            if code.contains(needle) {
                return Err(MatcherError::Injection("Cannot access contents of the page".to_string()));
            }
        }
        self.injected.borrow_mut().push((tab_id, code.to_string()));
        Ok(())
    }

    async fn show_prompt(&self, tab_id: TabId, request: &PromptRequest) -> MatcherResult<()> {
        if self.prompts_fail.get() {
            return Err(MatcherError::Prompt("overlay rejected".to_string()));
        }
        self.prompts.borrow_mut().push(request.clone());

        let answer = self.answer.borrow().clone();
        match answer {
            Some((registry, PromptReply::Answer(confirmed))) => {
                registry.resolve(&request.id, confirmed);
            }
            Some((registry, PromptReply::TabRemoved)) => {
                registry.cancel_tab(tab_id);
            }
            None => {}
        }
        Ok(())
    }

    async fn dismiss_prompt(&self, _tab_id: TabId, prompt_id: &str) -> MatcherResult<()> {
        self.dismissed.borrow_mut().push(prompt_id.to_string());
        Ok(())
    }

    async fn tab_exists(&self, tab_id: TabId) -> bool {
        !self.closed_tabs.borrow().contains(&tab_id)
    }

    async fn sleep(&self, ms: u32) {
        self.clock.set(self.clock.get() + f64::from(ms));
    }

    fn now_ms(&self) -> f64 {
        self.clock.get()
    }
}
