//! Query-string parameters with browser `URLSearchParams` semantics.

use url::form_urlencoded;

pub const QUERY_PARAM: &str = "query";
pub const PAGE_PARAM: &str = "page";

/// Ordered, possibly repeated, `application/x-www-form-urlencoded` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string; a leading `?` is ignored.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: form_urlencoded::parse(query.as_bytes()).into_owned().collect(),
        }
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Replace the first `name` in place and drop the rest, or append.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| k == name) {
            Some(first) => {
                self.pairs[first].1 = value;
                let mut index = 0;
                self.pairs.retain(|(k, _)| {
                    let keep = index <= first || k != name;
                    index += 1;
                    keep
                });
            }
            None => self.pairs.push((name.to_string(), value)),
        }
    }

    /// Remove every `name`.
    pub fn delete(&mut self, name: &str) {
        self.pairs.retain(|(k, _)| k != name);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish()
    }
}

/// Parameters after the user settles on `term`: back to page 1, and the
/// search term set, or removed when empty. Other parameters are kept.
pub fn apply_search_term(current: &SearchParams, term: &str) -> SearchParams {
    let mut next = current.clone();
    next.set(PAGE_PARAM, "1");
    if term.is_empty() {
        next.delete(QUERY_PARAM);
    } else {
        next.set(QUERY_PARAM, term);
    }
    next
}

/// Path plus query parameters of the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub params: SearchParams,
}

impl Location {
    pub fn new(path: impl Into<String>, params: SearchParams) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }

    /// Split `"/path?a=b"` into path and parameters.
    pub fn parse(href: &str) -> Self {
        match href.split_once('?') {
            Some((path, query)) => Self::new(path, SearchParams::parse(query)),
            None => Self::new(href, SearchParams::new()),
        }
    }

    /// `path?query`, or just `path` when there are no parameters.
    pub fn href(&self) -> String {
        if self.params.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.params.to_query_string())
        }
    }
}
