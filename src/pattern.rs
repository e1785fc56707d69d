/// Wildcard domain patterns for global scripts
use regex::Regex;

use crate::domain::split_url;

/// Compile a user-authored wildcard pattern into an anchored regex.
///
/// Every character is taken literally except `*`, which matches any
/// sequence of characters (including none, and across `.` and `/`).
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    Regex::new(&format!("^{}$", body))
}

/// Does `pattern` contain a path component?
pub fn has_path(pattern: &str) -> bool {
    pattern.contains('/')
}

/// Check whether `url` satisfies `pattern`.
///
/// A pattern with a `/` is matched against `hostname + pathname`,
/// otherwise against the hostname alone:
/// - `*.example.com` matches `https://sub.example.com/anything`
/// - `auth.example.com/login` matches only that exact page
pub fn matches(url: &str, pattern: &str) -> bool {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return false;
    }

    let parts = split_url(url);
    let target = if has_path(pattern) {
        parts.host_and_path()
    } else {
        parts.hostname
    };

    match compile_pattern(pattern) {
        Ok(regex) => regex.is_match(&target),
        Err(e) => {
            log::warn!("Invalid domain pattern {:?}: {}", pattern, e);
            false
        }
    }
}
