//! XPath-to-CSS translation for custom selectors
//!
//! No maintained crate evaluates XPath over an html5ever DOM, so the
//! expressions users actually write for field extraction are translated to
//! CSS selectors instead. The supported subset:
//!
//! - `//tag` and `/tag` steps (descendant and child axes)
//! - `*` wildcards
//! - `[@attr]` and `[@attr="value"]` predicates (multiple allowed)
//! - a trailing `/text()` or `/@attr` to pick the result
//!
//! Anything else (functions, positional predicates, other axes) is rejected
//! when the job is validated, never silently dropped.

use crate::extract::selectors::{FieldSelector, SelectMode};
use scraper::Selector;

/// Translates an XPath expression into a compiled field selector
pub fn translate_xpath(expr: &str) -> Result<FieldSelector, String> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err("xpath expression is empty".to_string());
    }
    if !expr.starts_with('/') {
        return Err("only absolute xpath expressions (starting with / or //) are supported"
            .to_string());
    }

    // Peel the result step off the end
    let (path, mode) = if let Some(base) = expr.strip_suffix("/text()") {
        (base, SelectMode::Text)
    } else if let Some(idx) = expr.rfind("/@") {
        let attr = &expr[idx + 2..];
        if attr.is_empty() || !attr.chars().all(is_name_char) {
            return Err(format!("unsupported attribute step '@{}'", attr));
        }
        (&expr[..idx], SelectMode::Attr(attr.to_string()))
    } else {
        (expr, SelectMode::Element)
    };

    if path.is_empty() {
        return Err("xpath has no element steps".to_string());
    }

    let css = steps_to_css(path)?;
    let selector = Selector::parse(&css)
        .map_err(|e| format!("translated selector '{}' is invalid: {}", css, e))?;
    Ok(FieldSelector::new(selector, mode))
}

fn steps_to_css(path: &str) -> Result<String, String> {
    let mut css = String::new();
    let mut rest = path;
    let mut first = true;

    while !rest.is_empty() {
        let descendant = if let Some(r) = rest.strip_prefix("//") {
            rest = r;
            true
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
            false
        } else {
            return Err(format!("expected '/' before '{}'", rest));
        };

        let step_end = rest.find('/').unwrap_or(rest.len());
        let step = &rest[..step_end];
        rest = &rest[step_end..];

        if step.is_empty() {
            return Err("empty step in xpath".to_string());
        }

        if !first {
            css.push_str(if descendant { " " } else { " > " });
        }
        first = false;

        css.push_str(&step_to_css(step)?);
    }

    Ok(css)
}

fn step_to_css(step: &str) -> Result<String, String> {
    let (name, mut predicates) = match step.find('[') {
        Some(idx) => (&step[..idx], &step[idx..]),
        None => (step, ""),
    };

    if name != "*" && (name.is_empty() || !name.chars().all(is_name_char)) {
        return Err(format!("unsupported step '{}'", step));
    }

    let mut css = name.to_string();

    while !predicates.is_empty() {
        let inner_end = predicates
            .find(']')
            .ok_or_else(|| format!("unterminated predicate in '{}'", step))?;
        let inner = &predicates[1..inner_end];
        predicates = &predicates[inner_end + 1..];

        let inner = inner
            .strip_prefix('@')
            .ok_or_else(|| format!("unsupported predicate '[{}]'", inner))?;

        match inner.find('=') {
            Some(eq) => {
                let attr = &inner[..eq];
                let value = inner[eq + 1..]
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .or_else(|| {
                        inner[eq + 1..]
                            .strip_prefix('\'')
                            .and_then(|v| v.strip_suffix('\''))
                    })
                    .ok_or_else(|| format!("predicate value must be quoted in '[{}]'", inner))?;
                if attr.is_empty() || !attr.chars().all(is_name_char) {
                    return Err(format!("unsupported attribute name '{}'", attr));
                }
                css.push_str(&format!("[{}=\"{}\"]", attr, value));
            }
            None => {
                if inner.is_empty() || !inner.chars().all(is_name_char) {
                    return Err(format!("unsupported attribute name '{}'", inner));
                }
                css.push_str(&format!("[{}]", inner));
            }
        }
    }

    Ok(css)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn doc() -> Html {
        Html::parse_document(
            r#"<html><head>
            <meta name="description" content="The description">
            <link rel="canonical" href="https://example.com/c">
            </head><body>
            <div><h1>Main Heading</h1></div>
            <p class="lead">Lead paragraph</p>
            <ul><li>one</li><li>two</li></ul>
            </body></html>"#,
        )
    }

    #[test]
    fn test_simple_element() {
        let sel = translate_xpath("//h1").unwrap();
        let html = sel.extract(&doc()).unwrap();
        assert!(html.contains("Main Heading"));
    }

    #[test]
    fn test_text_step() {
        let sel = translate_xpath("//h1/text()").unwrap();
        assert_eq!(sel.extract(&doc()).unwrap(), "Main Heading");
    }

    #[test]
    fn test_attr_step() {
        let sel = translate_xpath(r#"//link[@rel="canonical"]/@href"#).unwrap();
        assert_eq!(sel.extract(&doc()).unwrap(), "https://example.com/c");
    }

    #[test]
    fn test_attr_predicate_with_value() {
        let sel = translate_xpath(r#"//meta[@name="description"]/@content"#).unwrap();
        assert_eq!(sel.extract(&doc()).unwrap(), "The description");
    }

    #[test]
    fn test_single_quoted_predicate() {
        let sel = translate_xpath("//meta[@name='description']/@content").unwrap();
        assert_eq!(sel.extract(&doc()).unwrap(), "The description");
    }

    #[test]
    fn test_bare_attr_predicate() {
        let sel = translate_xpath("//p[@class]/text()").unwrap();
        assert_eq!(sel.extract(&doc()).unwrap(), "Lead paragraph");
    }

    #[test]
    fn test_child_axis() {
        let sel = translate_xpath("//ul/li/text()").unwrap();
        assert_eq!(sel.extract(&doc()).unwrap(), "one@@two");
    }

    #[test]
    fn test_descendant_axis() {
        let sel = translate_xpath("//div//h1/text()").unwrap();
        assert_eq!(sel.extract(&doc()).unwrap(), "Main Heading");
    }

    #[test]
    fn test_wildcard() {
        let sel = translate_xpath("//ul/*/text()").unwrap();
        assert_eq!(sel.extract(&doc()).unwrap(), "one@@two");
    }

    #[test]
    fn test_rejects_relative_expression() {
        assert!(translate_xpath("h1/text()").is_err());
    }

    #[test]
    fn test_rejects_functions() {
        assert!(translate_xpath("//div[contains(@class, 'x')]").is_err());
        assert!(translate_xpath("//p[1]").is_err());
    }

    #[test]
    fn test_rejects_other_axes() {
        assert!(translate_xpath("//p/following-sibling::div").is_err());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(translate_xpath("").is_err());
        assert!(translate_xpath("//").is_err());
    }
}
