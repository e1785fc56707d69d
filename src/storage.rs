/// Persisted launcher configuration from chrome.storage.local

use crate::domain::origin;
use crate::timing::ScriptTiming;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_true() -> bool {
    true
}

/// A script bound to one launcher site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    #[serde(default)]
    pub timing: ScriptTiming,
    #[serde(default)]
    pub code: String,
    /// Older records have no flag; they always ran
    #[serde(default = "default_true")]
    pub run_always: bool,
    #[serde(default)]
    pub confirm_popup: bool,
}

/// A launcher grid entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Folders have no URL
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub scripts: Vec<Script>,
}

impl Site {
    /// Does this site own the page at `url`? Compared by exact origin.
    pub fn owns(&self, url: &str) -> bool {
        match (origin(&self.url), origin(url)) {
            (Some(site_origin), Some(page_origin)) => site_origin == page_origin,
            _ => false,
        }
    }
}

/// When a global script fires
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WhenToRun {
    /// Only when the browser was reached through the launcher
    OnSiteOpen,
    /// Every (non-refresh) load of a matching page
    #[default]
    NavigatingIn,
    /// When leaving a matching host for another host
    NavigatingOut,
}

/// Code and timing of one global script step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptSnippet {
    #[serde(default)]
    pub timing: ScriptTiming,
    #[serde(default)]
    pub code: String,
}

/// A script gated by a domain pattern rather than a launcher site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalScript {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub when_to_run: WhenToRun,
    pub domain_pattern: String,
    #[serde(default)]
    pub on_refresh: bool,
    #[serde(default)]
    pub confirm_popup: bool,
    #[serde(default)]
    pub scripts: Vec<ScriptSnippet>,
}

/// Root storage structure.
///
/// Each record is parsed on its own: one malformed entry is logged and
/// skipped instead of hiding every other rule.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageData {
    #[serde(default, deserialize_with = "deserialize_records")]
    pub sites: Vec<Site>,
    #[serde(default, deserialize_with = "deserialize_records")]
    pub global_scripts: Vec<GlobalScript>,
}

impl StorageData {
    pub fn new() -> Self {
        StorageData::default()
    }

    /// Build from the raw `sites` and `globalScripts` storage values
    pub fn from_records(sites: Value, global_scripts: Value) -> Self {
        StorageData {
            sites: parse_records(sites, "site"),
            global_scripts: parse_records(global_scripts, "global script"),
        }
    }

    /// The first site whose origin equals the page's origin
    pub fn site_for_url(&self, url: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.owns(url))
    }
}

fn parse_records<T: DeserializeOwned>(value: Value, kind: &str) -> Vec<T> {
    let records = match value {
        Value::Array(records) => records,
        Value::Null => return Vec::new(),
        other => {
            log::warn!("Ignoring {} list, expected an array: {}", kind, other);
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            serde_json::from_value(record)
                .map_err(|e| log::warn!("Skipping {} #{}: {}", kind, idx, e))
                .ok()
        })
        .collect()
}

fn deserialize_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(parse_records(Value::deserialize(deserializer)?, "stored"))
}

/// Ids written by the grid page may be strings or `Date.now()` numbers
fn id_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Some(i.to_string()),
            (_, Some(u), _) => Some(u.to_string()),
            (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
                Some(format!("{}", f as i64))
            }
            (_, _, Some(f)) => Some(f.to_string()),
            _ => None,
        },
        _ => None,
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_to_string(value.clone())
        .ok_or_else(|| de::Error::custom(format!("expected a string or number id, got {}", value)))
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => id_to_string(value.clone())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a string or number id, got {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_site(id: &str, url: &str, parent_id: Option<&str>) -> Site {
        Site {
            id: id.to_string(),
            name: id.to_uppercase(),
            url: url.to_string(),
            icon_url: None,
            parent_id: parent_id.map(str::to_string),
            scripts: Vec::new(),
        }
    }

    #[test]
    fn test_script_defaults_for_old_records() {
        let script: Script = serde_json::from_str(r#"{"timing":"document_end","code":"x()"}"#).unwrap();
        assert!(script.run_always);
        assert!(!script.confirm_popup);
        assert_eq!(script.timing, ScriptTiming::DocumentEnd);
    }

    #[test]
    fn test_script_explicit_flags() {
        let script: Script = serde_json::from_str(
            r#"{"timing":"document_start","code":"x()","runAlways":false,"confirmPopup":true}"#,
        )
        .unwrap();
        assert!(!script.run_always);
        assert!(script.confirm_popup);
    }

    #[test]
    fn test_global_script_parse() {
        let json = r#"{
            "id": "g1",
            "name": "Login helper",
            "whenToRun": "navigating_out",
            "domainPattern": "auth.example.com/login",
            "onRefresh": true,
            "confirmPopup": false,
            "scripts": [{"timing": "document_idle", "code": "go()"}]
        }"#;
        let global: GlobalScript = serde_json::from_str(json).unwrap();
        assert_eq!(global.when_to_run, WhenToRun::NavigatingOut);
        assert!(global.on_refresh);
        assert_eq!(global.scripts[0].timing, ScriptTiming::DocumentIdle);
    }

    #[test]
    fn test_storage_missing_keys() {
        let storage: StorageData = serde_json::from_str("{}").unwrap();
        assert!(storage.sites.is_empty());
        assert!(storage.global_scripts.is_empty());
    }

    #[test]
    fn test_site_for_url_by_origin() {
        let storage = StorageData {
            sites: vec![
                create_test_site("s1", "https://a.com", None),
                create_test_site("s2", "https://b.com/start", None),
            ],
            global_scripts: Vec::new(),
        };

        assert_eq!(storage.site_for_url("https://a.com/deep/page").map(|s| s.id.as_str()), Some("s1"));
        assert_eq!(storage.site_for_url("https://b.com/").map(|s| s.id.as_str()), Some("s2"));
        assert!(storage.site_for_url("http://a.com").is_none());
        assert!(storage.site_for_url("https://sub.a.com").is_none());
    }

    #[test]
    fn test_bad_records_are_skipped_not_fatal() {
        let json = r#"{
            "sites": [
                {"id": "s1", "url": "https://a.com", "scripts": [{"code": "x()"}]},
                {"id": 1700000000000, "name": "Folder"},
                {"name": "no id at all"},
                "not an object"
            ],
            "globalScripts": [
                {"id": "g1", "whenToRun": "on_full_moon", "domainPattern": "a.com"},
                {"id": 42, "whenToRun": "navigating_in", "domainPattern": "a.com"}
            ]
        }"#;

        let storage: StorageData = serde_json::from_str(json).unwrap();

        assert_eq!(storage.sites.len(), 2);
        assert_eq!(storage.sites[0].id, "s1");
        assert_eq!(storage.sites[1].id, "1700000000000");
        assert_eq!(storage.sites[1].url, "");
        assert_eq!(storage.site_for_url("https://a.com/").map(|s| s.id.as_str()), Some("s1"));

        assert_eq!(storage.global_scripts.len(), 1);
        assert_eq!(storage.global_scripts[0].id, "42");
    }

    #[test]
    fn test_folder_without_url_owns_nothing() {
        let folder: Site = serde_json::from_str(r#"{"id": "f", "name": "Work"}"#).unwrap();
        assert!(!folder.owns("https://a.com/"));
    }

    #[test]
    fn test_numeric_parent_id() {
        let site: Site = serde_json::from_str(
            r#"{"id": 5, "url": "https://a.com", "parentId": 1700000000000}"#,
        )
        .unwrap();
        assert_eq!(site.id, "5");
        assert_eq!(site.parent_id.as_deref(), Some("1700000000000"));

        let site: Site = serde_json::from_str(r#"{"id": "x", "url": "https://a.com", "parentId": null}"#).unwrap();
        assert_eq!(site.parent_id, None);
    }

    #[test]
    fn test_float_ids_from_js_numbers() {
        assert_eq!(id_to_string(serde_json::json!(1700000000000.0)), Some("1700000000000".to_string()));
        assert_eq!(id_to_string(serde_json::json!(true)), None);
    }

    #[test]
    fn test_from_records() {
        let storage = StorageData::from_records(
            serde_json::json!([{"id": "s1", "url": "https://a.com"}, {"url": 3}]),
            serde_json::Value::Null,
        );
        assert_eq!(storage.sites.len(), 1);
        assert!(storage.global_scripts.is_empty());

        let storage = StorageData::from_records(serde_json::json!({"oops": true}), serde_json::json!([]));
        assert!(storage.sites.is_empty());
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let mut site = create_test_site("s1", "https://a.com", Some("root"));
        site.scripts.push(Script {
            timing: ScriptTiming::DocumentStart,
            code: "1".to_string(),
            run_always: false,
            confirm_popup: true,
        });
        let storage = StorageData {
            sites: vec![site],
            global_scripts: Vec::new(),
        };

        let json = serde_json::to_string(&storage).unwrap();
        assert!(json.contains("\"parentId\":\"root\""));
        assert!(json.contains("\"runAlways\":false"));
        assert!(json.contains("\"globalScripts\":[]"));

        let deserialized: StorageData = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, storage);
    }
}
