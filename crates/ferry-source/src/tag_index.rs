use std::collections::BTreeMap;

use crate::normalize_semver;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Tag name to archive URL mapping, keyed by canonical `v<semver>` names.
///
/// Names that are not semantic versions are kept verbatim so they stay
/// visible in listings, but they can never match a classified token.
pub struct TagIndex {
    entries: BTreeMap<String, String>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, archive_url: impl Into<String>) {
        let key = normalize_semver(name).unwrap_or_else(|| name.trim().to_string());
        self.entries.insert(key, archive_url.into());
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries.get(tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for TagIndex
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index = TagIndex::new();
        for (name, url) in iter {
            index.insert(name.as_ref(), url);
        }
        index
    }
}
