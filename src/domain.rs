/// URL decomposition for rule matching
use url::Url;

/// Hostname and path of a URL, the two halves a rule can match against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub hostname: String,
    pub path: String,
}

impl UrlParts {
    /// `hostname + pathname`, the target of patterns that contain a `/`
    pub fn host_and_path(&self) -> String {
        format!("{}{}", self.hostname, self.path)
    }
}

/// Split a URL into hostname and pathname.
///
/// Parsing goes through `url::Url` first. Strings that do not parse
/// (bare hostnames, half-typed URLs) fall back to manual stripping:
/// 1. Drop an optional `scheme://` prefix
/// 2. Everything before the first `/` is the host (port removed)
/// 3. The rest, up to `?` or `#`, is the path
///
/// Examples:
/// - https://Sub.Example.com/a/b?q=1 → ("sub.example.com", "/a/b")
/// - example.com/login → ("example.com", "/login")
/// - example.com → ("example.com", "/")
pub fn split_url(url: &str) -> UrlParts {
    match Url::parse(url.trim()) {
        Ok(parsed) if parsed.host_str().is_some() => UrlParts {
            hostname: parsed.host_str().unwrap_or_default().to_lowercase(),
            path: parsed.path().to_string(),
        },
        _ => split_manual(url),
    }
}

fn split_manual(url: &str) -> UrlParts {
    let trimmed = url.trim();
    let without_scheme = match trimmed.find("://") {
        Some(idx) => &trimmed[idx + 3..],
        None => trimmed,
    };

    let (host_with_port, rest) = match without_scheme.find('/') {
        Some(idx) => (&without_scheme[..idx], &without_scheme[idx..]),
        None => (without_scheme, "/"),
    };

    // Drop any query or fragment that ended up in the host part
    let host_with_port = host_with_port
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let hostname = host_with_port
        .split(':')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let path = rest.split(['?', '#']).next().unwrap_or("/");
    let path = if path.is_empty() { "/" } else { path };

    UrlParts {
        hostname,
        path: path.to_string(),
    }
}

/// Hostname of a URL, `None` when there is nothing host-like in it
pub fn extract_hostname(url: &str) -> Option<String> {
    let hostname = split_url(url).hostname;
    if hostname.is_empty() {
        None
    } else {
        Some(hostname)
    }
}

/// Serialized origin (`scheme://host[:port]`) of an http(s) URL
pub fn origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed.origin().ascii_serialization()),
        _ => None,
    }
}

/// Only http(s) pages take part in matching; internal pages are ignored
pub fn is_web_url(url: &str) -> bool {
    Url::parse(url.trim())
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}
