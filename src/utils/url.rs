//! # URL Helpers

/// Joins a base URL and a relative path with exactly one `/` between them.
///
/// # Examples
///
/// ```rust
/// use consent_gateway::utils::url::join_url;
///
/// assert_eq!(join_url("https://a.io/", "/b/c"), "https://a.io/b/c");
/// assert_eq!(join_url("https://a.io", "b"), "https://a.io/b");
/// ```
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        return base.to_string();
    }
    format!("{base}/{path}")
}
