//! Request query parameters.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FilterError;

lazy_static! {
    static ref BAD_ESCAPE: Regex =
        Regex::new(r"%(?:[0-9A-Fa-f][^0-9A-Fa-f]|[^0-9A-Fa-f]|[0-9A-Fa-f]?$)")
            .expect("valid escape regex");
}

/// Query parameters of a request, in the order they were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an url-encoded query string (without the leading `?`).
    ///
    /// Broken percent escapes and escapes that do not decode into UTF-8 are errors.
    pub fn parse(query: &str) -> Result<Self, FilterError> {
        if BAD_ESCAPE.is_match(query) {
            return Err(malformed(query, "invalid percent escape"));
        }

        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|err| malformed(query, &err.to_string()))?;

        // Undecodable bytes are replaced with U+FFFD while decoding.
        let decoded: usize = pairs
            .iter()
            .map(|(key, value)| replacement_chars(key) + replacement_chars(value))
            .sum();
        let given =
            replacement_chars(query) + query.to_ascii_uppercase().matches("%EF%BF%BD").count();
        if decoded > given {
            return Err(malformed(query, "invalid UTF-8"));
        }

        Ok(Self { pairs })
    }

    /// First value of the parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First value of the parameter, or `None` if it is absent or empty.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.is_empty())
    }

    /// Replaces all values of the parameter with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter().position(|(key, _)| key == name) {
            Some(index) => {
                self.pairs[index].1 = value;
                let mut seen = false;
                self.pairs.retain(|(key, _)| {
                    if key != name {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.pairs.push((name.to_string(), value)),
        }
    }

    /// Removes all values of the parameter.
    pub fn remove(&mut self, name: &str) {
        self.pairs.retain(|(key, _)| key != name);
    }

    /// Returns true if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Url-encoded query string.
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(&self.pairs).unwrap_or_default()
    }
}

fn malformed(query: &str, reason: &str) -> FilterError {
    log::debug!("Rejected query string {query:?}: {reason}");
    FilterError::Parse(format!("Malformed query string: {reason}"))
}

fn replacement_chars(s: &str) -> usize {
    s.matches('\u{FFFD}').count()
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
