use reqwest::Url;

/// Ordered set of query parameters whose values may be absent.
///
/// Parameters serialize in the order they were first set; unset ones are
/// skipped, so an all-empty query adds nothing to the URL. Percent-encoding
/// is left to [`Url`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(&'static str, Option<String>)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any earlier value while keeping its position.
    pub fn set(mut self, name: &'static str, value: Option<impl ToString>) -> Self {
        let value = value.map(|v| v.to_string());
        match self.params.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    pub fn param(self, name: &'static str, value: impl ToString) -> Self {
        self.set(name, Some(value))
    }

    /// Set a string parameter, treating the empty string as unset.
    pub fn non_empty(self, name: &'static str, value: &str) -> Self {
        self.set(name, Some(value).filter(|v| !v.is_empty()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Parameters that will be serialized, in order.
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.params
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().next().is_none()
    }

    pub fn apply_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let mut serializer = url.query_pairs_mut();
        for (key, value) in self.pairs() {
            serializer.append_pair(key, value);
        }
    }
}
