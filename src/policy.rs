use {
    crate::{Condition, Context, Resource},
    derive_builder::Builder,
    serde::{Deserialize, Serialize},
    std::fmt::{Display, Formatter, Result as FmtResult},
};

/// What a policy does when it applies: grant or refuse.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

impl Display for Effect {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Deny => f.write_str("deny"),
        }
    }
}

/// A policy: a permission granted or refused to every subject in the
/// inheritance closure of `subject_scope` over every object in the closure of
/// `object_scope`, optionally guarded by a condition.
///
/// A policy without a condition applies unconditionally.
#[derive(Builder, Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Policy {
    #[builder(setter(into))]
    permission_name: String,

    subject_scope: Resource,

    object_scope: Resource,

    effect: Effect,

    #[builder(setter(strip_option), default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<Condition>,
}

impl Policy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    #[inline]
    pub fn permission_name(&self) -> &str {
        &self.permission_name
    }

    #[inline]
    pub fn subject_scope(&self) -> &Resource {
        &self.subject_scope
    }

    #[inline]
    pub fn object_scope(&self) -> &Resource {
        &self.object_scope
    }

    #[inline]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    #[inline]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Evaluate this policy's condition against the request context. No
    /// condition means the policy applies unconditionally.
    pub fn condition_matches(&self, context: &Context) -> bool {
        match &self.condition {
            Some(condition) => condition.matches(context),
            None => true,
        }
    }

    /// Collapse empty-named scopes onto the root singleton.
    pub fn normalized(mut self) -> Self {
        self.subject_scope = self.subject_scope.normalized();
        self.object_scope = self.object_scope.normalized();
        self
    }
}

display_json!(Policy);
from_str_json!(Policy);

/// A permission a subject currently holds over a concrete object, as reported
/// by the granted-permissions query.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct GrantedPermission {
    permission_name: String,
    object: Resource,
}

impl GrantedPermission {
    pub fn new<P: Into<String>>(permission_name: P, object: Resource) -> Self {
        Self {
            permission_name: permission_name.into(),
            object,
        }
    }

    #[inline]
    pub fn permission_name(&self) -> &str {
        &self.permission_name
    }

    #[inline]
    pub fn object(&self) -> &Resource {
        &self.object
    }
}
