/// Tunables for the matcher, overridable from the service worker
use serde::Deserialize;

/// Matcher settings.
///
/// Every field has a default, so the worker may pass a partial object
/// (or nothing at all) to `init_matcher`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatcherConfig {
    /// How often a pending confirmation is checked
    pub prompt_poll_interval_ms: u32,
    /// Unanswered confirmations resolve as cancelled after this long
    pub prompt_timeout_ms: u32,
    /// Extra wait after the DOM is interactive for `document_end` scripts
    pub document_end_delay_ms: u32,
    /// Extra wait after full load for `document_idle` scripts
    pub document_idle_delay_ms: u32,
    pub storage_key_sites: String,
    pub storage_key_global_scripts: String,
    pub launcher_marker_prefix: String,
}

impl MatcherConfig {
    /// Session key recording that `site_id` was opened from the launcher grid
    pub fn launcher_marker(&self, site_id: &str) -> String {
        format!("{}{}", self.launcher_marker_prefix, site_id)
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            prompt_poll_interval_ms: 100,
            prompt_timeout_ms: 30_000,
            document_end_delay_ms: 200,
            document_idle_delay_ms: 100,
            storage_key_sites: "sites".to_string(),
            storage_key_global_scripts: "globalScripts".to_string(),
            launcher_marker_prefix: "launcher_opened_".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatcherConfig::default();
        assert_eq!(config.prompt_poll_interval_ms, 100);
        assert_eq!(config.prompt_timeout_ms, 30_000);
        assert_eq!(config.launcher_marker("s1"), "launcher_opened_s1");
    }

    #[test]
    fn test_partial_override() {
        let config: MatcherConfig =
            serde_json::from_str(r#"{"promptTimeoutMs": 5000}"#).unwrap();
        assert_eq!(config.prompt_timeout_ms, 5000);
        assert_eq!(config.prompt_poll_interval_ms, 100);
        assert_eq!(config.storage_key_sites, "sites");
    }
}
