use url::Url;

/// Extracts the host from a URL, lowercased
///
/// # Examples
///
/// ```
/// use url::Url;
/// use rowcrawl::url::extract_domain;
///
/// let url = Url::parse("https://Blog.Example.COM/post").unwrap();
/// assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a host falls within an allowed-domains list
///
/// An entry matches the exact host or any subdomain of it, so
/// `example.com` admits both `example.com` and `shop.example.com`.
///
/// # Examples
///
/// ```
/// use rowcrawl::url::domain_allowed;
///
/// let allowed = vec!["example.com".to_string()];
/// assert!(domain_allowed(&allowed, "example.com"));
/// assert!(domain_allowed(&allowed, "shop.example.com"));
/// assert!(!domain_allowed(&allowed, "example.org"));
/// ```
pub fn domain_allowed(allowed: &[String], host: &str) -> bool {
    allowed.iter().any(|entry| {
        let entry = entry.to_lowercase();
        host == entry || host.ends_with(&format!(".{}", entry))
    })
}
