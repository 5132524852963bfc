//! Custom field selectors
//!
//! Users name extra columns and point each at a CSS selector (with optional
//! `::text` / `::attr(name)` result modifiers) or at an XPath expression,
//! which is translated to the same representation up front. Compilation
//! happens once per job; failures are job-rejecting, never per-page.

use crate::config::CrawlJob;
use crate::extract::record::MULTI_VALUE_SEP;
use crate::extract::xpath::translate_xpath;
use crate::ConfigError;
use scraper::{Html, Selector};

/// What to take from each matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectMode {
    /// The element's outer HTML
    Element,
    /// The element's text content
    Text,
    /// One attribute's value
    Attr(String),
}

/// A compiled field selector: where to look and what to take
#[derive(Debug, Clone)]
pub struct FieldSelector {
    selector: Selector,
    mode: SelectMode,
}

impl FieldSelector {
    pub fn new(selector: Selector, mode: SelectMode) -> Self {
        Self { selector, mode }
    }

    /// Extracts the field from a document; None when nothing matched
    ///
    /// Multiple matches are joined with the multi-value separator.
    pub fn extract(&self, doc: &Html) -> Option<String> {
        let values: Vec<String> = doc
            .select(&self.selector)
            .filter_map(|el| match &self.mode {
                SelectMode::Element => Some(el.html()),
                SelectMode::Text => {
                    let text = el.text().collect::<String>().trim().to_string();
                    if text.is_empty() {
                        None
                    } else {
                        Some(text)
                    }
                }
                SelectMode::Attr(name) => el.value().attr(name).map(|v| v.to_string()),
            })
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(values.join(MULTI_VALUE_SEP))
        }
    }
}

/// Parses a CSS field selector with optional result modifier
///
/// `".price::text"` takes text, `"a.author::attr(href)"` takes an
/// attribute, a bare selector takes the matched element's HTML.
pub fn parse_css_selector(expr: &str) -> Result<FieldSelector, String> {
    let expr = expr.trim();

    let (css, mode) = if let Some(base) = expr.strip_suffix("::text") {
        (base, SelectMode::Text)
    } else if let Some(idx) = expr.rfind("::attr(") {
        let rest = &expr[idx + "::attr(".len()..];
        let attr = rest
            .strip_suffix(')')
            .ok_or_else(|| "unterminated ::attr( modifier".to_string())?;
        if attr.is_empty() {
            return Err("empty attribute name in ::attr()".to_string());
        }
        (&expr[..idx], SelectMode::Attr(attr.to_string()))
    } else {
        (expr, SelectMode::Element)
    };

    if css.trim().is_empty() {
        return Err("selector is empty".to_string());
    }

    let selector = Selector::parse(css.trim()).map_err(|e| e.to_string())?;
    Ok(FieldSelector::new(selector, mode))
}

/// All of a job's custom selectors, compiled, in stable column order
#[derive(Debug, Clone, Default)]
pub struct CompiledSelectors {
    fields: Vec<(String, FieldSelector)>,
}

impl CompiledSelectors {
    /// Compiles a job's css and xpath selector maps
    ///
    /// Column order is css selectors then xpath selectors, each sorted by
    /// name so output is deterministic across runs.
    pub fn from_job(job: &CrawlJob) -> Result<Self, ConfigError> {
        let mut fields = Vec::new();

        let mut css_names: Vec<&String> = job.css_selectors.keys().collect();
        css_names.sort();
        for name in css_names {
            let compiled = parse_css_selector(&job.css_selectors[name]).map_err(|message| {
                ConfigError::InvalidSelector {
                    name: name.clone(),
                    message,
                }
            })?;
            fields.push((name.clone(), compiled));
        }

        let mut xpath_names: Vec<&String> = job.xpath_selectors.keys().collect();
        xpath_names.sort();
        for name in xpath_names {
            let compiled = translate_xpath(&job.xpath_selectors[name]).map_err(|message| {
                ConfigError::InvalidSelector {
                    name: name.clone(),
                    message,
                }
            })?;
            fields.push((name.clone(), compiled));
        }

        Ok(Self { fields })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSelector)> {
        self.fields.iter().map(|(name, sel)| (name.as_str(), sel))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
