use {
    lazy_static::lazy_static,
    serde::{Deserialize, Serialize},
    std::fmt::{Display, Formatter, Result as FmtResult},
};

lazy_static! {
    /// The implicit root resource. Ancestor of every resource; carries global policies.
    static ref ROOT: Resource = Resource {
        kind: String::new(),
        name: String::new(),
    };
}

/// A resource identity. Resources are identified by their `(kind, name)` pair;
/// attributes live in the repository's keyed table, not on the identity.
///
/// `kind` is a free-form classifier ("user", "namespace"). `name` is a
/// path-like identifier whose dotted segments encode the scope hierarchy:
/// `"x.y.z"` lies in the scope of `"x.y"`, `"x"`, and the root.
///
/// The empty name denotes the root resource, which exists implicitly and is
/// kind-agnostic.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Resource {
    kind: String,
    name: String,
}

impl Resource {
    pub fn new<K, N>(kind: K, name: N) -> Self
    where
        K: Into<String>,
        N: Into<String>,
    {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Return the root resource.
    pub fn root() -> Self {
        ROOT.clone()
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indicates whether this is the root resource. Any empty-named resource
    /// denotes the root, whatever its kind.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// Collapse empty-named aliases onto the root singleton.
    pub fn normalized(self) -> Self {
        if self.name.is_empty() {
            Self::root()
        } else {
            self
        }
    }

    /// The scope rule: `self` is in the scope of `other` iff `other`'s name is
    /// a dotted-segment prefix of `self`'s name and the kinds agree. The root
    /// scopes everything.
    pub fn in_scope_of(&self, other: &Resource) -> bool {
        if other.is_root() {
            return true;
        }
        if self.kind != other.kind {
            return false;
        }
        match self.name.strip_prefix(other.name.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }

    /// The next resource up the scope hierarchy: strip the last dotted segment,
    /// ending at the root. The root has no scope parent.
    pub fn scope_parent(&self) -> Option<Resource> {
        if self.is_root() {
            return None;
        }
        match self.name.rfind('.') {
            Some(split) => Some(Resource::new(self.kind.clone(), &self.name[..split])),
            None => Some(Resource::root()),
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            write!(f, "{}:{}", self.kind, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::Resource,
        pretty_assertions::{assert_eq, assert_ne},
    };

    #[test_log::test]
    fn test_identity() {
        let a = Resource::new("user", "alice");
        let b = Resource::new("user", "alice");
        let c = Resource::new("group", "alice");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.kind(), "user");
        assert_eq!(a.name(), "alice");
        assert_eq!(a.to_string(), "user:alice");
    }

    #[test_log::test]
    fn test_root() {
        let root = Resource::root();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "<root>");
        assert_eq!(root.scope_parent(), None);

        // An empty-named resource of any kind denotes the root.
        assert!(Resource::new("user", "").is_root());
        assert_eq!(Resource::new("user", "").normalized(), root);
        assert_eq!(Resource::new("ns", "prod").normalized(), Resource::new("ns", "prod"));
    }

    #[test_log::test]
    fn test_scope_rule() {
        let deep = Resource::new("ns", "x.y.z");
        assert!(deep.in_scope_of(&Resource::new("ns", "x.y.z")));
        assert!(deep.in_scope_of(&Resource::new("ns", "x.y")));
        assert!(deep.in_scope_of(&Resource::new("ns", "x")));
        assert!(deep.in_scope_of(&Resource::root()));

        // Segment-wise, not character-wise.
        assert!(!Resource::new("ns", "x.yz").in_scope_of(&Resource::new("ns", "x.y")));
        // Kinds must agree except against the root.
        assert!(!deep.in_scope_of(&Resource::new("user", "x.y")));
        // The rule is not symmetric.
        assert!(!Resource::new("ns", "x").in_scope_of(&deep));
    }

    #[test_log::test]
    fn test_scope_parent_chain() {
        let deep = Resource::new("ns", "x.y.z");
        let parent = deep.scope_parent().unwrap();
        assert_eq!(parent, Resource::new("ns", "x.y"));
        let grandparent = parent.scope_parent().unwrap();
        assert_eq!(grandparent, Resource::new("ns", "x"));
        assert_eq!(grandparent.scope_parent().unwrap(), Resource::root());
    }

    #[test_log::test]
    fn test_serde() {
        let resource = Resource::new("user", "alice");
        let json = serde_json::to_string(&resource).unwrap();
        assert_eq!(json, r#"{"kind":"user","name":"alice"}"#);
        assert_eq!(serde_json::from_str::<Resource>(&json).unwrap(), resource);
    }
}
