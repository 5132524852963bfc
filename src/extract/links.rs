//! Link extraction: the whole page plus nav/header/footer scopes

use scraper::{Html, Selector};
use url::Url;

/// One anchor found on a page
#[derive(Debug, Clone)]
pub struct ExtractedLink {
    /// Absolute URL after resolving against the page
    pub url: Url,

    /// Anchor text, whitespace-collapsed
    pub text: String,

    /// Whether the anchor itself carries rel="nofollow"
    pub nofollow: bool,
}

/// Extracts every followable anchor on the page, duplicates included
///
/// Duplicates matter: the output mirrors the page, and the frontier does
/// its own dedup.
pub fn extract_links(doc: &Html, base_url: &Url) -> Vec<ExtractedLink> {
    collect_links(doc, base_url, "a[href]")
}

/// Extracts anchors inside a container tag (`nav`, `header`, or `footer`)
pub fn extract_scoped_links(doc: &Html, base_url: &Url, scope: &str) -> Vec<ExtractedLink> {
    collect_links(doc, base_url, &format!("{} a[href]", scope))
}

fn collect_links(doc: &Html, base_url: &Url, selector: &str) -> Vec<ExtractedLink> {
    let selector = match Selector::parse(selector) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    for element in doc.select(&selector) {
        let href = match element.value().attr("href") {
            Some(href) => href,
            None => continue,
        };

        let url = match resolve_href(href, base_url) {
            Some(url) => url,
            None => continue,
        };

        let text = element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let nofollow = element
            .value()
            .attr("rel")
            .map(|rel| rel.split_whitespace().any(|token| token == "nofollow"))
            .unwrap_or(false);

        links.push(ExtractedLink { url, text, nofollow });
    }
    links
}

/// Resolves an href to an absolute HTTP(S) URL
///
/// Returns None for hrefs that aren't pages: javascript:/mailto:/tel:/data:
/// schemes, same-page fragments, and anything that fails to resolve.
fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute)
    } else {
        None
    }
}
