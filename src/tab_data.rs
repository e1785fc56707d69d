/// Tab lifecycle payloads delivered by chrome.tabs events
use serde::{Deserialize, Serialize};

/// Chrome tab ids are integers, reused across sessions
pub type TabId = i32;

/// The subset of `chrome.tabs.Tab` the matcher reads
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TabInfo {
    #[serde(default)]
    pub id: Option<TabId>,
    #[serde(default)]
    pub url: Option<String>,
}

/// `changeInfo` of `chrome.tabs.onUpdated`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangeInfo {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ChangeInfo {
    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some("complete")
    }
}

/// One `chrome.tabs.onUpdated` delivery
#[derive(Debug, Clone, PartialEq)]
pub struct TabUpdate {
    pub tab_id: TabId,
    pub change_info: ChangeInfo,
    pub tab: TabInfo,
}

impl TabUpdate {
    pub fn new(tab_id: TabId, change_info: ChangeInfo, tab: TabInfo) -> TabUpdate {
        TabUpdate {
            tab_id,
            change_info,
            tab,
        }
    }

    /// URL of the finished load: the tab's own URL, or the change's URL
    /// when the host omitted it from the tab object
    pub fn loaded_url(&self) -> Option<&str> {
        self.tab
            .url
            .as_deref()
            .or(self.change_info.url.as_deref())
    }
}
