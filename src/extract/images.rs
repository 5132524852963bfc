//! Image attribute extraction
//!
//! Every `<img>` attribute from the known set that appears on at least one
//! image becomes an `img_<attr>` column. Values are per-image slots joined
//! with the multi-value separator; an image missing the attribute
//! contributes an empty slot, so slots line up across columns.

use crate::extract::record::MULTI_VALUE_SEP;
use scraper::{Html, Selector};
use url::Url;

/// `<img>` attributes worth a column (global attributes like `style` are
/// not; a few deprecated ones are kept for audit completeness)
const IMG_ATTRS: &[&str] = &[
    "alt",
    "crossorigin",
    "height",
    "ismap",
    "loading",
    "referrerpolicy",
    "sizes",
    "src",
    "srcset",
    "usemap",
    "width",
    "align",
    "border",
    "hspace",
    "longdesc",
    "name",
    "vspace",
];

/// Extracts img_* columns in first-appearance attribute order
pub fn extract_images(doc: &Html, base_url: &Url) -> Vec<(String, String)> {
    let selector = Selector::parse("img").expect("static selector");
    let images: Vec<_> = doc.select(&selector).collect();
    if images.is_empty() {
        return Vec::new();
    }

    // Which known attributes appear, in order of first appearance
    let mut present: Vec<&str> = Vec::new();
    for img in &images {
        for (attr_name, _) in img.value().attrs() {
            if IMG_ATTRS.contains(&attr_name) && !present.contains(&attr_name) {
                present.push(attr_name);
            }
        }
    }

    present
        .into_iter()
        .map(|attr| {
            let slots: Vec<String> = images
                .iter()
                .map(|img| {
                    let value = img.value().attr(attr).unwrap_or("");
                    if attr == "src" && !value.is_empty() {
                        base_url
                            .join(value)
                            .map(|u| u.to_string())
                            .unwrap_or_else(|_| value.to_string())
                    } else {
                        value.to_string()
                    }
                })
                .collect();
            (format!("img_{}", attr), slots.join(MULTI_VALUE_SEP))
        })
        .collect()
}
