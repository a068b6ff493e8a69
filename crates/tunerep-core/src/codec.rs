//! Wire encoding of query parameters.
//!
//! The codec knows nothing about validation: it maps logical parameter
//! names to the query-string pairs the reporting service expects.

/// A single logical parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    List(Vec<String>),
    /// Ordered field -> direction pairs, encoded as `name[field]=DIR`.
    Sort(Vec<(String, String)>),
    Bool(bool),
    Integer(i64),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Insertion-ordered parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value; an existing key keeps its position and gets the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<QueryValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&QueryValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns the value of a `Text` parameter.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(QueryValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Expands every parameter into wire-format `(name, value)` pairs.
    pub fn encode(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            match value {
                QueryValue::Text(text) => pairs.push((name.clone(), text.clone())),
                QueryValue::List(items) => pairs.push((name.clone(), items.join(","))),
                QueryValue::Sort(entries) => {
                    for (field, direction) in entries {
                        pairs.push((format!("{name}[{field}]"), direction.clone()));
                    }
                }
                QueryValue::Bool(flag) => pairs.push((name.clone(), flag.to_string())),
                QueryValue::Integer(number) => pairs.push((name.clone(), number.to_string())),
            }
        }
        pairs
    }

    /// Percent-encoded `a=1&b=2` form of [`encode`](Self::encode).
    pub fn to_query_string(&self) -> String {
        self.encode()
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
