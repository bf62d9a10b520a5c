//! URL patterns for navigation waits.

use serde::{Deserialize, Serialize};

/// Pattern for matching page URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(String),
    /// Glob pattern (e.g., "**/cart.html")
    Glob(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Glob pattern shorthand
    #[must_use]
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::Glob(pattern.into())
    }

    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern),
            Self::Contains(pattern) => url.contains(pattern),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
            Self::Glob(pattern) => glob_matches(pattern, strip_fragment(url)),
            Self::Any => true,
        }
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "url == {p}"),
            Self::Prefix(p) => write!(f, "url starts with {p}"),
            Self::Contains(p) => write!(f, "url contains {p}"),
            Self::Regex(p) => write!(f, "url =~ /{p}/"),
            Self::Glob(p) => write!(f, "url like {p}"),
            Self::Any => write!(f, "any url"),
        }
    }
}

fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

/// Glob matching where `*` (and `**`) match any run of characters.
///
/// The first literal segment is anchored at the start unless the pattern
/// begins with a wildcard, the last at the end unless the pattern ends with
/// one.
fn glob_matches(pattern: &str, url: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == url;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !url.starts_with(first) {
        return false;
    }
    let mut pos = first.len();

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match url[pos..].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    url.len() >= pos + last.len() && url.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_cart_page() {
        let pattern = UrlPattern::glob("**/cart.html");
        assert!(pattern.matches("https://www.demoblaze.com/cart.html"));
        assert!(pattern.matches("https://www.demoblaze.com/cart.html#"));
        assert!(!pattern.matches("https://www.demoblaze.com/index.html"));
        assert!(!pattern.matches("https://www.demoblaze.com/cart.html.bak"));
    }

    #[test]
    fn test_glob_index_page() {
        let pattern = UrlPattern::glob("**/index.html");
        assert!(pattern.matches("https://www.demoblaze.com/index.html"));
        assert!(!pattern.matches("https://www.demoblaze.com/"));
    }

    #[test]
    fn test_glob_middle_wildcard() {
        let pattern = UrlPattern::glob("https://*/prod.html?idp_=*");
        assert!(pattern.matches("https://www.demoblaze.com/prod.html?idp_=3"));
        assert!(!pattern.matches("http://www.demoblaze.com/prod.html?idp_=3"));
    }

    #[test]
    fn test_glob_without_wildcard_is_exact() {
        assert!(UrlPattern::glob("a").matches("a"));
        assert!(!UrlPattern::glob("a").matches("ab"));
    }

    #[test]
    fn test_other_patterns() {
        let url = "https://www.demoblaze.com/index.html";
        assert!(UrlPattern::Exact(url.to_string()).matches(url));
        assert!(UrlPattern::Prefix("https://www.demoblaze".to_string()).matches(url));
        assert!(UrlPattern::Contains("index".to_string()).matches(url));
        assert!(UrlPattern::Regex(r"/index\.html$".to_string()).matches(url));
        assert!(!UrlPattern::Regex("(".to_string()).matches(url));
        assert!(UrlPattern::Any.matches(""));
    }
}
