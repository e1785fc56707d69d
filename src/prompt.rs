/// Confirmation prompts: ask the user in-page before a gated rule runs
use std::cell::RefCell;
use std::collections::HashMap;

use futures::channel::oneshot;
use uuid::Uuid;

use crate::config::MatcherConfig;
use crate::host::{BrowserHost, PromptRequest};
use crate::rules::PlannedRule;
use crate::tab_data::TabId;

/// How a prompt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Confirmed,
    Cancelled,
    TimedOut,
    TabClosed,
    /// The overlay could not be shown
    Failed,
}

impl PromptOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PromptOutcome::Confirmed)
    }
}

/// Open prompts keyed by correlation id.
///
/// The overlay answers through the extension's message channel; the
/// worker hands the answer to `resolve`, which completes the one-shot the
/// waiting orchestrator holds. Dropping a sender without an answer tells
/// the waiter its tab went away.
#[derive(Debug, Default)]
pub struct PromptRegistry {
    pending: RefCell<HashMap<String, (TabId, oneshot::Sender<bool>)>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        PromptRegistry::default()
    }

    /// Register a new prompt for `tab_id` and get its id and response channel
    pub fn open(&self, tab_id: TabId) -> (String, oneshot::Receiver<bool>) {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().insert(id.clone(), (tab_id, tx));
        (id, rx)
    }

    /// Deliver the user's answer. Returns false for unknown or stale ids.
    pub fn resolve(&self, id: &str, confirmed: bool) -> bool {
        let sender = self.pending.borrow_mut().remove(id);
        match sender {
            Some((_, tx)) => tx.send(confirmed).is_ok(),
            None => {
                log::debug!("Answer for unknown prompt {}", id);
                false
            }
        }
    }

    pub fn discard(&self, id: &str) {
        self.pending.borrow_mut().remove(id);
    }

    /// Drop every prompt open in `tab_id`. Returns how many were dropped.
    pub fn cancel_tab(&self, tab_id: TabId) -> usize {
        let mut pending = self.pending.borrow_mut();
        let before = pending.len();
        pending.retain(|_, (owner, _)| *owner != tab_id);
        before - pending.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

/// Overlay text for a rule
pub fn prompt_request(id: &str, rule: &PlannedRule) -> PromptRequest {
    let count = rule.scripts.len();
    let noun = if count == 1 { "script" } else { "scripts" };
    let name = if rule.name.trim().is_empty() {
        "A launcher rule"
    } else {
        rule.name.as_str()
    };

    PromptRequest {
        id: id.to_string(),
        title: "Run script on this page?".to_string(),
        message: format!("{} wants to run {} {} on this page.", name, count, noun),
        confirm_label: "Confirm".to_string(),
        cancel_label: "Cancel".to_string(),
    }
}

/// Ask the user whether `rule` may run in `tab_id`.
///
/// Checks, every poll interval: the tab still exists, an answer arrived,
/// the timeout has not passed. Anything but an explicit confirm means the
/// rule is skipped.
pub async fn confirm<H: BrowserHost>(
    host: &H,
    registry: &PromptRegistry,
    config: &MatcherConfig,
    tab_id: TabId,
    rule: &PlannedRule,
) -> PromptOutcome {
    let (id, mut answer) = registry.open(tab_id);
    let request = prompt_request(&id, rule);

    if let Err(e) = host.show_prompt(tab_id, &request).await {
        log::warn!("Could not show prompt in tab {}: {}", tab_id, e);
        registry.discard(&id);
        return PromptOutcome::Failed;
    }

    let started = host.now_ms();
    let timeout = f64::from(config.prompt_timeout_ms);

    let outcome = loop {
        if !host.tab_exists(tab_id).await {
            break PromptOutcome::TabClosed;
        }

        match answer.try_recv() {
            Ok(Some(true)) => break PromptOutcome::Confirmed,
            Ok(Some(false)) => break PromptOutcome::Cancelled,
            Ok(None) => {}
            Err(oneshot::Canceled) => break PromptOutcome::TabClosed,
        }

        if host.now_ms() - started >= timeout {
            break PromptOutcome::TimedOut;
        }

        host.sleep(config.prompt_poll_interval_ms).await;
    };

    registry.discard(&id);

    if outcome != PromptOutcome::TabClosed {
        if let Err(e) = host.dismiss_prompt(tab_id, &id).await {
            log::debug!("Prompt cleanup in tab {} failed: {}", tab_id, e);
        }
    }

    log::info!(
        "Prompt for {:?} in tab {}: {:?} ({} still open)",
        rule.name,
        tab_id,
        outcome,
        registry.pending_count()
    );
    outcome
}
