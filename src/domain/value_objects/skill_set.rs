use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Unordered set of normalized skill strings (trimmed, lowercased,
/// inner whitespace collapsed). Iteration order is lexical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSet(BTreeSet<String>);

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(raw: &str) -> Option<String> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        }
    }

    /// Parses a comma-joined skills field such as `"Python, SQL ,aws"`.
    pub fn from_comma_separated(raw: &str) -> Self {
        raw.split(',').collect()
    }

    pub fn insert(&mut self, raw: &str) -> bool {
        match Self::normalize(raw) {
            Some(skill) => self.0.insert(skill),
            None => false,
        }
    }

    pub fn contains(&self, skill: &str) -> bool {
        Self::normalize(skill).is_some_and(|s| self.0.contains(&s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    pub fn join(&self, separator: &str) -> String {
        self.to_vec().join(separator)
    }
}

impl<S: AsRef<str>> FromIterator<S> for SkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SkillSet::new();
        for skill in iter {
            set.insert(skill.as_ref());
        }
        set
    }
}

impl<'a> IntoIterator for &'a SkillSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_and_deduplicates() {
        let skills: SkillSet = ["Python", " python ", "Machine   Learning", ""].into_iter().collect();
        assert_eq!(skills.len(), 2);
        assert!(skills.contains("PYTHON"));
        assert!(skills.contains("machine learning"));
    }

    #[test]
    fn test_comma_separated_field() {
        let skills = SkillSet::from_comma_separated("Python, SQL ,aws,, ");
        assert_eq!(skills.to_vec(), vec!["aws", "python", "sql"]);
        assert_eq!(skills.join(", "), "aws, python, sql");
    }

    #[test]
    fn test_empty_field_gives_empty_set() {
        assert!(SkillSet::from_comma_separated("").is_empty());
        assert!(SkillSet::from_comma_separated(" , ,").is_empty());
    }
}
