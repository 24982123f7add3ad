use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

/// Unordered set of unique resource tags.
///
/// Backed by a [`BTreeSet`] so iteration (and therefore display and serialization)
/// is always sorted, which keeps matching and logging deterministic. Deserialization goes
/// through [`Tags::insert`], so blank entries are dropped there too.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(BTreeSet<String>);

impl Tags {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns `true` if no tags are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Insert a tag. Blank tags are ignored.
    pub fn insert(&mut self, tag: impl Into<String>) -> &mut Self {
        let tag = tag.into();
        let trimmed = tag.trim();
        if !trimmed.is_empty() {
            self.0.insert(trimmed.to_string());
        }
        self
    }

    /// Returns `true` if the tag is present.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Conjunctive match: `true` when every tag in `required` is present in `self`.
    ///
    /// An empty `required` set is matched by any tag set.
    pub fn is_superset_of(&self, required: &Tags) -> bool {
        self.0.is_superset(&required.0)
    }

    /// Iterate over tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for t in iter {
            tags.insert(t);
        }
        tags
    }
}

impl From<Vec<String>> for Tags {
    fn from(tags: Vec<String>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0.into_iter().collect()
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for t in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(t)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Tags;

    #[test]
    fn empty_requirement_is_matched_by_anything() {
        let have: Tags = ["gpu", "prod"].into_iter().collect();
        assert!(have.is_superset_of(&Tags::new()));
        assert!(Tags::new().is_superset_of(&Tags::new()));
    }

    #[test]
    fn superset_is_conjunctive() {
        let have: Tags = ["gpu", "prod"].into_iter().collect();
        let want_one: Tags = ["gpu"].into_iter().collect();
        let want_both: Tags = ["prod", "gpu"].into_iter().collect();
        let want_missing: Tags = ["gpu", "test"].into_iter().collect();

        assert!(have.is_superset_of(&want_one));
        assert!(have.is_superset_of(&want_both));
        assert!(!have.is_superset_of(&want_missing));
    }

    #[test]
    fn blank_tags_are_dropped_and_display_is_sorted() {
        let tags: Tags = ["  ", "b", "a ", "b"].into_iter().collect();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.to_string(), "a,b");
    }

    #[test]
    fn serde_is_a_plain_array() {
        let tags: Tags = serde_json::from_str(r#"["prod","gpu"]"#).unwrap();
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["gpu","prod"]"#);
    }

    #[test]
    fn deserialization_trims_and_drops_blanks() {
        let tags: Tags = serde_json::from_str(r#"[" gpu ", "  ", ""]"#).unwrap();
        assert_eq!(tags.len(), 1);
        assert!(tags.contains("gpu"));
    }
}
