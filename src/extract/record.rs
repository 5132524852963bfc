use serde_json::{Map, Value};

/// Separator for elements that can appear multiple times on a page
///
/// Heading tags, links, image attributes and friends are joined into one
/// cell with this marker; consumers split on it to recover the list.
pub const MULTI_VALUE_SEP: &str = "@@";

/// Column names produced by the standard extraction pipeline
///
/// Custom selector names must not collide with any of these; the job is
/// rejected up front if they do.
pub const STANDARD_COLUMNS: &[&str] = &[
    "url",
    "title",
    "meta_desc",
    "viewport",
    "charset",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "canonical",
    "alt_href",
    "alt_hreflang",
    "body_text",
    "size",
    "status",
    "depth",
    "download_latency",
    "download_timeout",
    "redirect_times",
    "redirect_ttl",
    "redirect_urls",
    "redirect_reasons",
    "links_url",
    "links_text",
    "links_nofollow",
    "nav_links_url",
    "nav_links_text",
    "nav_links_nofollow",
    "header_links_url",
    "header_links_text",
    "header_links_nofollow",
    "footer_links_url",
    "footer_links_text",
    "footer_links_nofollow",
    "ip_address",
    "crawl_time",
    "errors",
    "jsonld_errors",
    "blocked_by_robotstxt",
];

/// Prefix families generated dynamically by the standard pipeline
const STANDARD_PREFIXES: &[&str] = &[
    "og:",
    "twitter:",
    "jsonld_",
    "img_",
    "resp_headers_",
    "request_headers_",
];

/// Checks whether a name belongs to the standard column set
pub fn is_standard_column(name: &str) -> bool {
    STANDARD_COLUMNS.contains(&name) || STANDARD_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// One output row: the extracted fields of a single fetched page
///
/// The field set varies per page (sparse schema), so a record is an ordered
/// mapping rather than a struct. Insertion order is preserved through to
/// the serialized JSON object.
#[derive(Debug, Clone, Default)]
pub struct PageRecord {
    fields: Map<String, Value>,
}

impl PageRecord {
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Inserts a value under the given column
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Inserts a string column, skipping empty values
    ///
    /// Absent and empty mean the same thing in the output: no column.
    pub fn insert_str(&mut self, key: impl Into<String>, value: impl AsRef<str>) {
        let value = value.as_ref();
        if !value.is_empty() {
            self.fields
                .insert(key.into(), Value::String(value.to_string()));
        }
    }

    /// Appends a failure message to an error column
    ///
    /// Extraction failures land in-row instead of dropping the record;
    /// multiple failures on one page accumulate in the same cell.
    pub fn append_error(&mut self, column: &str, message: &str) {
        match self.fields.get_mut(column) {
            Some(Value::String(existing)) => {
                existing.push_str("; ");
                existing.push_str(message);
            }
            _ => {
                self.fields
                    .insert(column.to_string(), Value::String(message.to_string()));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }
}
