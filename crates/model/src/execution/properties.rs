use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PropertiesError {
    #[error("Malformed property entry (expected key=value): {0}")]
    MalformedEntry(String),

    #[error("Empty property key in entry: {0}")]
    EmptyKey(String),
}

/// String-keyed settings handed to a consistency algorithm (e.g. `chunk-size`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmProperties {
    inner: BTreeMap<String, String>,
}

impl AlgorithmProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    /// `None` when the key is absent, otherwise the parse outcome of the trimmed value.
    pub fn parse<T: FromStr>(&self, key: &str) -> Option<Result<T, T::Err>> {
        self.get(key).map(|raw| raw.trim().parse::<T>())
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
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AlgorithmProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = AlgorithmProperties::new();
        for (key, value) in iter {
            props.insert(key, value);
        }
        props
    }
}

impl FromStr for AlgorithmProperties {
    type Err = PropertiesError;

    /// Parses `key=value,key=value`. Blank entries are skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut props = AlgorithmProperties::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| PropertiesError::MalformedEntry(entry.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(PropertiesError::EmptyKey(entry.to_string()));
            }
            props.insert(key, value.trim());
        }
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line_syntax() {
        let props: AlgorithmProperties = "chunk-size=500, mode = fast".parse().unwrap();
        assert_eq!(props.get("chunk-size"), Some("500"));
        assert_eq!(props.get("mode"), Some("fast"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        assert_eq!(
            "chunk-size".parse::<AlgorithmProperties>(),
            Err(PropertiesError::MalformedEntry("chunk-size".into()))
        );
        assert!(matches!(
            "=5".parse::<AlgorithmProperties>(),
            Err(PropertiesError::EmptyKey(_))
        ));
        assert!("".parse::<AlgorithmProperties>().unwrap().is_empty());
    }

    #[test]
    fn test_typed_parse() {
        let props: AlgorithmProperties = [("chunk-size", "42"), ("bad", "x")].into_iter().collect();
        assert_eq!(props.parse::<u32>("chunk-size"), Some(Ok(42)));
        assert!(matches!(props.parse::<u32>("bad"), Some(Err(_))));
        assert!(props.parse::<u32>("missing").is_none());
    }
}
