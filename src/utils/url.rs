// src/utils/url.rs

//! URL text manipulation utilities.

use url::Url;

use crate::error::Result;

/// Resolve a potentially relative redirect target against the URL that issued it.
///
/// # Examples
/// ```
/// use linkaudit::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://example.com/handle/1/2", "/items/abc").unwrap(),
///     "https://example.com/items/abc"
/// );
/// ```
pub fn resolve(base: &str, href: &str) -> Result<String> {
    Ok(Url::parse(base)?.join(href.trim())?.to_string())
}

/// Whether the URL's path starts with `prefix`.
pub fn has_path_prefix(url: &str, prefix: &str) -> bool {
    Url::parse(url)
        .map(|u| u.path().starts_with(prefix))
        .unwrap_or(false)
}

/// Normalize URL text copied out of an export so it matches what the oracle reports.
///
/// Un-escapes `&amp;`, drops stray quote characters and surrounding whitespace.
pub fn clean(raw: &str) -> String {
    raw.replace("&amp;", "&").replace('"', "").trim().to_string()
}

/// Split a multi-valued field into its non-empty values.
pub fn split_values<'a>(raw: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return vec![raw.trim()].into_iter().filter(|v| !v.is_empty()).collect();
    }
    raw.split(separator)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

/// Value of a query parameter, if present and non-empty.
pub fn query_param(url: &str, key: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

/// First non-empty path segment of a URL.
pub fn first_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Escape text for use inside HTML attribute values and element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute_target() {
        assert_eq!(
            resolve("https://hdl.test/1/2", "https://repo.test/handle/1/2").unwrap(),
            "https://repo.test/handle/1/2"
        );
    }

    #[test]
    fn test_resolve_rejects_garbage_base() {
        assert!(resolve("not a url", "/x").is_err());
    }

    #[test]
    fn test_has_path_prefix() {
        assert!(has_path_prefix("https://repo.test/items/abc", "/items/"));
        assert!(!has_path_prefix("https://repo.test/handle/1/2", "/items/"));
        assert!(!has_path_prefix("garbage", "/items/"));
    }

    #[test]
    fn test_clean_unescapes_and_strips_quotes() {
        assert_eq!(
            clean(" \"http://x.test/a?b=1&amp;c=2\" "),
            "http://x.test/a?b=1&c=2"
        );
    }

    #[test]
    fn test_split_values() {
        assert_eq!(
            split_values("http://a.test ; http://b.test;", ";"),
            vec!["http://a.test", "http://b.test"]
        );
        assert!(split_values("  ", ";").is_empty());
    }

    #[test]
    fn test_query_param_and_segment() {
        let url = "https://guides.test/c.php?g=G1&p=2";
        assert_eq!(query_param(url, "g"), Some("G1".to_string()));
        assert_eq!(query_param(url, "x"), None);
        assert_eq!(
            first_path_segment("https://guides.test/g-one/home"),
            Some("g-one".to_string())
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a?b=1&c=\"2\""), "a?b=1&amp;c=&quot;2&quot;");
    }
}
