/// Per-tab navigation history and classification
use std::collections::HashMap;

use crate::domain::extract_hostname;
use crate::tab_data::TabId;

/// How a tab arrived at its current URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationType {
    /// Same URL as before
    Refresh,
    /// Different hostname than before
    Navigation,
    /// Same hostname, different URL (or first URL seen on the tab)
    #[default]
    Direct,
}

/// Classify a move from `previous` to `next`.
///
/// Refresh wins over everything else; then the hostnames decide.
pub fn classify(previous: Option<&str>, next: &str) -> NavigationType {
    let Some(previous) = previous else {
        return NavigationType::Direct;
    };

    if previous == next {
        NavigationType::Refresh
    } else if extract_hostname(previous) != extract_hostname(next) {
        NavigationType::Navigation
    } else {
        NavigationType::Direct
    }
}

/// Result of observing a URL change on a tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlChange {
    pub nav_type: NavigationType,
    pub previous_url: Option<String>,
}

impl UrlChange {
    /// The URL being left when this change crosses to another host
    pub fn departed_from(&self) -> Option<&str> {
        match self.nav_type {
            NavigationType::Navigation => self.previous_url.as_deref(),
            _ => None,
        }
    }
}

/// What the load-complete handler knows about the load that just finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadContext {
    pub nav_type: NavigationType,
    pub previous_url: Option<String>,
}

#[derive(Debug, Clone)]
struct TabState {
    last_url: String,
    /// URL preceding the in-flight navigation, kept until its load completes
    in_flight_previous: Option<String>,
    nav_type: NavigationType,
    in_flight: bool,
}

/// Registry of per-tab navigation state.
///
/// Owned by the matcher for the lifetime of the browsing session. Entries
/// are created on the first URL seen for a tab and dropped when it closes.
#[derive(Debug, Default)]
pub struct NavigationTracker {
    tabs: HashMap<TabId, TabState>,
}

impl NavigationTracker {
    pub fn new() -> Self {
        NavigationTracker::default()
    }

    /// Record that `tab_id` is now heading to `url`.
    pub fn record_url_change(&mut self, tab_id: TabId, url: &str) -> UrlChange {
        let previous_url = self.tabs.get(&tab_id).map(|state| state.last_url.clone());
        let nav_type = classify(previous_url.as_deref(), url);

        log::debug!("Tab {} {:?}: {:?} -> {}", tab_id, nav_type, previous_url, url);

        self.tabs.insert(
            tab_id,
            TabState {
                last_url: url.to_string(),
                in_flight_previous: previous_url.clone(),
                nav_type,
                in_flight: true,
            },
        );

        UrlChange {
            nav_type,
            previous_url,
        }
    }

    /// Close out the load of `url` on `tab_id`.
    ///
    /// Returns the classification made when the URL changed and clears the
    /// in-flight slot. A load with no URL change before it is a reload when
    /// the URL is unchanged, otherwise it is classified on the spot.
    pub fn settle(&mut self, tab_id: TabId, url: &str) -> LoadContext {
        match self.tabs.get_mut(&tab_id) {
            Some(state) if state.in_flight && state.last_url == url => {
                state.in_flight = false;
                LoadContext {
                    nav_type: state.nav_type,
                    previous_url: state.in_flight_previous.take(),
                }
            }
            Some(state) => {
                let previous = std::mem::replace(&mut state.last_url, url.to_string());
                let nav_type = classify(Some(&previous), url);
                state.nav_type = nav_type;
                state.in_flight = false;
                state.in_flight_previous = None;
                LoadContext {
                    nav_type,
                    previous_url: Some(previous),
                }
            }
            None => {
                self.tabs.insert(
                    tab_id,
                    TabState {
                        last_url: url.to_string(),
                        in_flight_previous: None,
                        nav_type: NavigationType::Direct,
                        in_flight: false,
                    },
                );
                LoadContext {
                    nav_type: NavigationType::Direct,
                    previous_url: None,
                }
            }
        }
    }

    /// Forget everything about a closed tab
    pub fn remove(&mut self, tab_id: TabId) -> bool {
        self.tabs.remove(&tab_id).is_some()
    }

    /// Number of tabs with tracked state
    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }
}
