//! The flat parameter map a request arrives with.

use std::collections::BTreeMap;
use std::collections::btree_map;

/// Key of the control that switches a request from rows to a count.
pub const COUNT_KEY: &str = "_count";

/// Query-string parameters, name → raw string value.
///
/// Keys are kept sorted so that everything derived from the map (filter
/// order, placeholder numbering) is deterministic. Duplicate keys keep the
/// last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    inner: BTreeMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored, so both `a=1&b=2` and `?a=1&b=2` work.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.inner.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.inner.remove(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Remove `_count` and report whether it was present (with any value).
    pub fn take_count_flag(&mut self) -> bool {
        self.inner.remove(COUNT_KEY).is_some()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.inner.insert(k.into(), v.into());
        }
    }
}

impl IntoIterator for QueryParams {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryParams {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decodes_percent_and_plus() {
        let params = QueryParams::parse("name=_lkjohn+doe_lk&city=S%C3%A3o%20Paulo");
        assert_eq!(params.get("name"), Some("_lkjohn doe_lk"));
        assert_eq!(params.get("city"), Some("São Paulo"));
    }

    #[test]
    fn parse_strips_leading_question_mark() {
        let params = QueryParams::parse("?_limit=10");
        assert_eq!(params.get("_limit"), Some("10"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn parse_keeps_encoded_commas_and_arrows() {
        let params = QueryParams::parse("status=1%2C2%2C_null&orders-%3Etotal=5");
        assert_eq!(params.get("status"), Some("1,2,_null"));
        assert_eq!(params.get("orders->total"), Some("5"));
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let params = QueryParams::parse("a=1&a=2");
        assert_eq!(params.get("a"), Some("2"));
    }

    #[test]
    fn take_count_flag_removes_key() {
        let mut params: QueryParams = [("_count", ""), ("age", "18")].into_iter().collect();
        assert!(params.take_count_flag());
        assert!(!params.contains_key("_count"));
        assert!(!params.take_count_flag());
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn empty_query_string_is_empty() {
        assert!(QueryParams::parse("").is_empty());
        assert!(QueryParams::parse("?").is_empty());
    }
}
