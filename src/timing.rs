/// Injection timing and the wrapper that defers user code accordingly
use serde::{Deserialize, Serialize};

use crate::config::MatcherConfig;

/// When injected code should execute relative to the page lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScriptTiming {
    DocumentStart,
    DocumentEnd,
    #[default]
    DocumentIdle,
}

impl ScriptTiming {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptTiming::DocumentStart => "document_start",
            ScriptTiming::DocumentEnd => "document_end",
            ScriptTiming::DocumentIdle => "document_idle",
        }
    }
}

/// Wrap user code so it runs at the requested point of the page lifecycle.
///
/// - `document_start`: as-is, immediately
/// - `document_end`: once the DOM is built (`interactive`), plus a short delay
///   so late-inserted nodes exist
/// - `document_idle`: once the page and its subresources loaded (`complete`),
///   plus a shorter delay
///
/// User code always runs as a classic page script, so its top-level
/// declarations become page globals whatever the timing.
pub fn wrap_for_timing(code: &str, timing: ScriptTiming, config: &MatcherConfig) -> String {
    match timing {
        ScriptTiming::DocumentStart => code.to_string(),
        ScriptTiming::DocumentEnd => deferred(code, "DOMContentLoaded", "loading", config.document_end_delay_ms),
        ScriptTiming::DocumentIdle => deferred(code, "load", "complete", config.document_idle_delay_ms),
    }
}

/// Run `code` `delay_ms` after `event`, or right away (plus delay) when the
/// document already reached that state. For `DOMContentLoaded` the state
/// check is "still loading"; for `load` it is "not yet complete".
fn deferred(code: &str, event: &str, state: &str, delay_ms: u32) -> String {
    let pending_check = if event == "load" {
        format!("document.readyState !== '{}'", state)
    } else {
        format!("document.readyState === '{}'", state)
    };
    // JSON string literals are valid JS string literals
    let source = serde_json::Value::from(code).to_string();

    format!(
        "(function () {{\n\
         var source = {source};\n\
         var run = function () {{ setTimeout(function () {{\n\
         var el = document.createElement('script');\n\
         el.textContent = source;\n\
         (document.head || document.documentElement).appendChild(el);\n\
         el.remove();\n\
         }}, {delay_ms}); }};\n\
         if ({pending_check}) {{\n\
         window.addEventListener('{event}', run, {{ once: true }});\n\
         }} else {{\n\
         run();\n\
         }}\n\
         }})();"
    )
}
