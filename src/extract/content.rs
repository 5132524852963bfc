//! Standard on-page content fields: document tags and body text

use crate::extract::record::MULTI_VALUE_SEP;
use scraper::{ElementRef, Html, Selector};

/// Tags whose direct text contributes to `body_text`
const BODY_TEXT_TAGS: &[&str] = &[
    "a", "abbr", "address", "b", "blockquote", "cite", "code", "dd", "del", "div", "dl", "dt",
    "em", "h1", "h2", "h3", "h4", "h5", "h6", "header", "i", "ins", "kbd", "li", "mark", "ol",
    "p", "pre", "q", "section", "small", "span", "strong", "sub", "sup", "time", "u", "ul",
];

/// Ancestors that take a subtree out of `body_text` entirely
const BODY_TEXT_EXCLUDED_ANCESTORS: &[&str] = &[
    "area", "aside", "audio", "button", "caption", "col", "colgroup", "datalist", "details",
    "embed", "fieldset", "footer", "form", "head", "iframe", "img", "input", "label", "legend",
    "link", "map", "meta", "nav", "noscript", "object", "optgroup", "option", "output", "param",
    "picture", "script", "select", "source", "style", "svg", "table", "tbody", "td", "textarea",
    "tfoot", "th", "thead", "title", "tr", "track", "video",
];

/// Extracts the standard document-tag fields in output order
///
/// Each entry is (column, value); empty values are omitted by the caller.
/// Repeated tags are joined with the multi-value separator.
pub fn extract_content_tags(doc: &Html) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();

    fields.push(("title", select_text(doc, "title")));
    fields.push(("meta_desc", select_attr(doc, r#"meta[name="description"]"#, "content")));
    fields.push(("viewport", select_attr(doc, r#"meta[name="viewport"]"#, "content")));
    fields.push(("charset", select_attr(doc, "meta[charset]", "charset")));

    for heading in ["h1", "h2", "h3", "h4", "h5", "h6"] {
        fields.push((heading, select_text(doc, heading)));
    }

    fields.push(("canonical", select_attr(doc, r#"link[rel="canonical"]"#, "href")));
    fields.push(("alt_href", select_attr(doc, r#"link[rel="alternate"]"#, "href")));
    fields.push((
        "alt_hreflang",
        select_attr(doc, r#"link[rel="alternate"]"#, "hreflang"),
    ));

    fields
}

/// Collects the page's readable text
///
/// Walks every element under `<body>` whose tag is a content tag and whose
/// ancestors stay clear of chrome/markup containers (tables, forms, nav,
/// script, ...), gathering the element's direct text nodes. Joined with
/// single spaces.
pub fn extract_body_text(doc: &Html) -> String {
    let body_selector = Selector::parse("body").expect("static selector");
    let body = match doc.select(&body_selector).next() {
        Some(body) => body,
        None => return String::new(),
    };

    let mut parts: Vec<String> = Vec::new();
    collect_body_text(body, &mut parts);
    parts.join(" ")
}

fn collect_body_text(element: ElementRef, parts: &mut Vec<String>) {
    let collects_text = BODY_TEXT_TAGS.contains(&element.value().name());

    for child in element.children() {
        if let scraper::Node::Text(text) = child.value() {
            if collects_text {
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !BODY_TEXT_EXCLUDED_ANCESTORS.contains(&child_el.value().name()) {
                collect_body_text(child_el, parts);
            }
        }
    }
}

/// Joins the text content of every match with the multi-value separator
fn select_text(doc: &Html, selector: &str) -> String {
    let selector = Selector::parse(selector).expect("static selector");
    doc.select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect::<Vec<_>>()
        .join(MULTI_VALUE_SEP)
}

/// Joins an attribute of every match with the multi-value separator
fn select_attr(doc: &Html, selector: &str, attr: &str) -> String {
    let selector = Selector::parse(selector).expect("static selector");
    doc.select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .collect::<Vec<_>>()
        .join(MULTI_VALUE_SEP)
}
