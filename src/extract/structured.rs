//! Structured-data blocks: Open Graph, Twitter Card, JSON-LD
//!
//! Repeated keys and blocks get numbered suffixes: the first occurrence is
//! unsuffixed, later ones get `_1`, `_2`, ... JSON-LD objects are flattened
//! with dot-joined keys. A JSON-LD block that fails to parse contributes an
//! error message without touching its siblings.

use scraper::{Html, Selector};
use serde_json::Value;

/// Extracts `og:*` properties, repeated properties numbered
pub fn extract_open_graph(doc: &Html) -> Vec<(String, String)> {
    extract_meta_pairs(doc, r#"meta[property^="og:"]"#, "property")
}

/// Extracts `twitter:*` properties, repeated properties numbered
pub fn extract_twitter_card(doc: &Html) -> Vec<(String, String)> {
    extract_meta_pairs(doc, r#"meta[name^="twitter:"]"#, "name")
}

fn extract_meta_pairs(doc: &Html, selector: &str, key_attr: &str) -> Vec<(String, String)> {
    let selector = Selector::parse(selector).expect("static selector");

    let pairs: Vec<(String, String)> = doc
        .select(&selector)
        .filter_map(|el| {
            let key = el.value().attr(key_attr)?;
            let content = el.value().attr("content")?;
            Some((key.to_string(), content.to_string()))
        })
        .collect();

    let keys: Vec<String> = pairs.iter().map(|(k, _)| k.clone()).collect();
    numbered_duplicates(&keys)
        .into_iter()
        .zip(pairs.into_iter().map(|(_, v)| v))
        .collect()
}

/// Result of JSON-LD extraction: flattened fields plus per-block errors
#[derive(Debug, Default)]
pub struct JsonLdFields {
    pub fields: Vec<(String, Value)>,
    pub errors: Vec<String>,
}

/// Extracts and flattens every `application/ld+json` block
///
/// Blocks are numbered by their position among the blocks that parsed:
/// `jsonld_*` for the first, `jsonld_1_*` for the second, and so on. An
/// invalid block is reported in `errors` and skipped.
pub fn extract_jsonld(doc: &Html) -> JsonLdFields {
    let selector =
        Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector");

    let mut result = JsonLdFields::default();
    let mut parsed_index = 0usize;

    for script in doc.select(&selector) {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                let prefix = if parsed_index == 0 {
                    "jsonld_".to_string()
                } else {
                    format!("jsonld_{}_", parsed_index)
                };
                // A top-level array is a list of records; flatten the first
                let value = match &value {
                    Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
                    _ => value,
                };
                flatten_value(&value, &prefix, &mut result.fields);
                parsed_index += 1;
            }
            Err(e) => {
                result.errors.push(e.to_string());
            }
        }
    }

    result
}

/// Flattens nested objects into dot-joined keys under the given prefix
fn flatten_value(value: &Value, prefix: &str, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                match nested {
                    Value::Object(_) => {
                        flatten_value(nested, &format!("{}{}.", prefix, key), out);
                    }
                    _ => {
                        out.push((format!("{}{}", prefix, key), nested.clone()));
                    }
                }
            }
        }
        Value::Null => {}
        _ => {
            // A bare scalar block still gets a column under its prefix
            out.push((prefix.trim_end_matches('_').to_string(), value.clone()));
        }
    }
}

/// Appends a number to duplicated items, first occurrence unsuffixed
///
/// `["og:site", "og:image", "og:image", "og:type", "og:image"]` becomes
/// `["og:site", "og:image", "og:image_1", "og:type", "og:image_2"]`.
pub fn numbered_duplicates(items: &[String]) -> Vec<String> {
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    items
        .iter()
        .map(|item| {
            let count = counts.entry(item.as_str()).or_insert(0);
            let numbered = if *count == 0 {
                item.clone()
            } else {
                format!("{}_{}", item, count)
            };
            *count += 1;
            numbered
        })
        .collect()
}
