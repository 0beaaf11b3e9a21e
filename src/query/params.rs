use crate::error::{GranaryError, Result};
use indexmap::IndexMap;

/// Request parameters as received: each name maps to every value given for
/// it, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    inner: IndexMap<String, Vec<String>>,
}

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string
    /// (`q=fish&rows=5`), without the leading `?`.
    pub fn from_query_string(query: &str) -> Self {
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(name.into()).or_default().push(value.into());
    }

    /// Builder form of [`RawParams::push`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.inner.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The value of a parameter that may appear at most once.
    pub fn single(&self, name: &str) -> Result<Option<&str>> {
        match self.get_all(name) {
            [] => Ok(None),
            [value] => Ok(Some(value.as_str())),
            values => Err(GranaryError::invalid_parameter(
                name,
                format!("given {} times, expected at most once", values.len()),
            )),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = RawParams::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}
