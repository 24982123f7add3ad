use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Tags,
    error::{ModelError, ModelResult},
    resource::CatalogResource,
};

/// A set of attribute and tag constraints used to filter catalog resources.
///
/// Every field is optional, but at least one must be present: an all-empty
/// criterion is rejected at construction (and during deserialization).
///
/// Blank strings are treated as absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", try_from = "CriterionFields")]
pub struct Criterion {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    tags: Tags,
}

impl Criterion {
    /// Start building a criterion.
    pub fn builder() -> CriterionBuilder {
        CriterionBuilder::default()
    }

    /// Shorthand for a tag-only criterion.
    ///
    /// ```rust
    /// use binder_model::Criterion;
    ///
    /// let c = Criterion::with_tags(["gpu", "prod"]).unwrap();
    /// assert_eq!(c.tags().len(), 2);
    /// ```
    pub fn with_tags<I, S>(tags: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder().tags(tags).build()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Returns `true` if `resource` satisfies every constraint of this criterion.
    ///
    /// - `id`, `name`, `version` must be equal when set;
    /// - `status` is compared case-insensitively when set;
    /// - the resource tags must contain every criterion tag.
    pub fn matches<R: CatalogResource + ?Sized>(&self, resource: &R) -> bool {
        if self.id().is_some_and(|id| id != resource.id()) {
            return false;
        }
        if self.name().is_some_and(|name| name != resource.name()) {
            return false;
        }
        if self.version().is_some_and(|v| v != resource.version()) {
            return false;
        }
        if self
            .status()
            .is_some_and(|s| !s.eq_ignore_ascii_case(resource.status_str()))
        {
            return false;
        }
        resource.tags().is_superset_of(&self.tags)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(5);
        if let Some(v) = &self.id {
            parts.push(format!("id={v}"));
        }
        if let Some(v) = &self.name {
            parts.push(format!("name={v}"));
        }
        if let Some(v) = &self.version {
            parts.push(format!("version={v}"));
        }
        if let Some(v) = &self.status {
            parts.push(format!("status={v}"));
        }
        if !self.tags.is_empty() {
            parts.push(format!("tags=[{}]", self.tags));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Builder for [`Criterion`]; validation happens in [`CriterionBuilder::build`].
#[derive(Clone, Debug, Default)]
pub struct CriterionBuilder {
    fields: CriterionFields,
}

impl CriterionBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.fields.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.fields.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.fields.version = Some(version.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.fields.status = Some(status.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.fields.tags.insert(tag);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for t in tags {
            self.fields.tags.insert(t);
        }
        self
    }

    /// Validate and build the criterion.
    pub fn build(self) -> ModelResult<Criterion> {
        Criterion::try_from(self.fields)
    }
}

/// Raw, unvalidated criterion fields (deserialization target).
#[derive(Clone, Debug, Default, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
struct CriterionFields {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    tags: Tags,
}

impl TryFrom<CriterionFields> for Criterion {
    type Error = ModelError;

    fn try_from(f: CriterionFields) -> ModelResult<Self> {
        let c = Criterion {
            id: non_blank(f.id),
            name: non_blank(f.name),
            version: non_blank(f.version),
            status: non_blank(f.status),
            tags: f.tags,
        };
        if c.id.is_none()
            && c.name.is_none()
            && c.version.is_none()
            && c.status.is_none()
            && c.tags.is_empty()
        {
            return Err(ModelError::CriteriaInvalid(
                "criterion must set at least one of id, name, version, status or tags".into(),
            ));
        }
        Ok(c)
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
