use {
    crate::{Context, Effect, EvalResult, Policy},
    serde::{Deserialize, Serialize},
    std::{
        cmp::Ordering,
        fmt::{Display, Formatter, Result as FmtResult},
    },
};

/// How an ancestor was reached during the graph walk. Explicit inheritance
/// edges order before dotted-name scope stripping at equal distance; a path
/// counts as `Inheritance` only when every step of it is an explicit edge.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Inheritance,
    Scope,
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Inheritance => f.write_str("inheritance"),
            Self::Scope => f.write_str("scope"),
        }
    }
}

/// The distance at which an ancestor was discovered: steps taken (edges
/// traversed plus name segments stripped) and the path's origin class.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Distance {
    hops: u32,
    origin: Origin,
}

impl Distance {
    pub fn new(hops: u32, origin: Origin) -> Self {
        Self {
            hops,
            origin,
        }
    }

    #[inline]
    pub fn hops(&self) -> u32 {
        self.hops
    }

    #[inline]
    pub fn origin(&self) -> Origin {
        self.origin
    }
}

/// The priority of a hierarchy entry: the distances at which the policy's
/// subject and object scopes were discovered.
///
/// Ordering is lexicographic with the subject dominating: subject hops,
/// then object hops, then the origin tie-break on each side. Smaller orders
/// first, so the most specific entry is the least element.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Priority {
    subject: Distance,
    object: Distance,
}

impl Priority {
    pub fn new(subject: Distance, object: Distance) -> Self {
        Self {
            subject,
            object,
        }
    }

    #[inline]
    pub fn subject(&self) -> Distance {
        self.subject
    }

    #[inline]
    pub fn object(&self) -> Distance {
        self.object
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.subject.hops, self.object.hops, self.subject.origin, self.object.origin).cmp(&(
            other.subject.hops,
            other.object.hops,
            other.subject.origin,
            other.object.origin,
        ))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One applicable policy together with the priority it was discovered at.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HierarchyEntry {
    policy: Policy,
    priority: Priority,
}

impl HierarchyEntry {
    pub fn new(policy: Policy, priority: Priority) -> Self {
        Self {
            policy,
            priority,
        }
    }

    #[inline]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }
}

/// Every policy applicable to a concrete `(subject, object, permission)`
/// query, ordered ascending by priority with the most specific entry first.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PermissionHierarchy {
    entries: Vec<HierarchyEntry>,
}

impl PermissionHierarchy {
    /// Build a hierarchy from unordered entries, sorting them by priority.
    pub fn from_entries(mut entries: Vec<HierarchyEntry>) -> Self {
        entries.sort_by_key(HierarchyEntry::priority);
        Self {
            entries,
        }
    }

    pub fn entries(&self) -> &Vec<HierarchyEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the hierarchy against a request context.
    ///
    /// Entries are walked in contiguous bands of equal priority, most
    /// specific band first. Within a band every condition is evaluated; an
    /// effective deny wins the band, otherwise an effective allow does, and a
    /// band with neither passes resolution to the next. An exhausted
    /// hierarchy abstains.
    pub fn eval(&self, context: &Context) -> EvalResult {
        let mut start = 0;
        while start < self.entries.len() {
            let priority = self.entries[start].priority();
            let mut end = start;
            while end < self.entries.len() && self.entries[end].priority() == priority {
                end += 1;
            }

            let mut allowed = false;
            for entry in &self.entries[start..end] {
                if !entry.policy().condition_matches(context) {
                    continue;
                }
                match entry.policy().effect() {
                    Effect::Deny => {
                        log::debug!("deny from {} at priority band starting {}", entry.policy().permission_name(), start);
                        return EvalResult::Denied;
                    }
                    Effect::Allow => allowed = true,
                }
            }
            if allowed {
                return EvalResult::Allowed;
            }

            start = end;
        }

        EvalResult::Abstain
    }
}

impl From<Vec<HierarchyEntry>> for PermissionHierarchy {
    fn from(entries: Vec<HierarchyEntry>) -> Self {
        Self::from_entries(entries)
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{
            AttrRef, Attribute, CompareOp, Condition, Context, Distance, Effect, EvalResult, HierarchyEntry, Origin,
            PermissionHierarchy, Policy, Priority, Resource,
        },
        pretty_assertions::assert_eq,
    };

    fn policy(effect: Effect, condition: Option<Condition>) -> Policy {
        let mut builder = Policy::builder();
        builder
            .permission_name("read")
            .subject_scope(Resource::root())
            .object_scope(Resource::root())
            .effect(effect);
        if let Some(condition) = condition {
            builder.condition(condition);
        }
        builder.build().unwrap()
    }

    fn priority(subject_hops: u32, object_hops: u32) -> Priority {
        Priority::new(
            Distance::new(subject_hops, Origin::Inheritance),
            Distance::new(object_hops, Origin::Inheritance),
        )
    }

    #[test_log::test]
    fn test_priority_ordering() {
        // Subject distance dominates.
        assert!(priority(0, 5) < priority(1, 0));
        // Object distance breaks subject ties.
        assert!(priority(1, 0) < priority(1, 2));
        // Inheritance orders before scope at equal hops, subject side first.
        let inherited = Priority::new(Distance::new(1, Origin::Inheritance), Distance::new(0, Origin::Inheritance));
        let stripped = Priority::new(Distance::new(1, Origin::Scope), Distance::new(0, Origin::Inheritance));
        assert!(inherited < stripped);

        let object_inherited = Priority::new(Distance::new(1, Origin::Scope), Distance::new(1, Origin::Inheritance));
        let object_stripped = Priority::new(Distance::new(1, Origin::Scope), Distance::new(1, Origin::Scope));
        assert!(object_inherited < object_stripped);

        assert_eq!(priority(1, 1), priority(1, 1));
    }

    #[test_log::test]
    fn test_from_entries_sorts() {
        let broad = HierarchyEntry::new(policy(Effect::Allow, None), priority(2, 2));
        let narrow = HierarchyEntry::new(policy(Effect::Deny, None), priority(0, 1));
        let hierarchy = PermissionHierarchy::from_entries(vec![broad.clone(), narrow.clone()]);
        assert_eq!(hierarchy.entries(), &vec![narrow, broad]);
        assert_eq!(hierarchy.len(), 2);
        assert!(!hierarchy.is_empty());
    }

    #[test_log::test]
    fn test_empty_hierarchy_abstains() {
        let hierarchy = PermissionHierarchy::default();
        assert_eq!(hierarchy.eval(&Context::default()), EvalResult::Abstain);
        assert!(!hierarchy.eval(&Context::default()).is_allowed());
    }

    #[test_log::test]
    fn test_deny_beats_allow_within_band() {
        let hierarchy = PermissionHierarchy::from_entries(vec![
            HierarchyEntry::new(policy(Effect::Allow, None), priority(1, 1)),
            HierarchyEntry::new(policy(Effect::Deny, None), priority(1, 1)),
        ]);
        assert_eq!(hierarchy.eval(&Context::default()), EvalResult::Denied);
    }

    #[test_log::test]
    fn test_specific_band_overrides_broader() {
        // A more specific allow beats a broader deny.
        let hierarchy = PermissionHierarchy::from_entries(vec![
            HierarchyEntry::new(policy(Effect::Deny, None), priority(3, 3)),
            HierarchyEntry::new(policy(Effect::Allow, None), priority(0, 1)),
        ]);
        assert_eq!(hierarchy.eval(&Context::default()), EvalResult::Allowed);
    }

    #[test_log::test]
    fn test_unmatched_condition_passes_band() {
        let guarded = policy(
            Effect::Deny,
            Some(Condition::compare(AttrRef::subject("role"), CompareOp::Eq, "intern")),
        );
        let hierarchy = PermissionHierarchy::from_entries(vec![
            HierarchyEntry::new(guarded, priority(0, 0)),
            HierarchyEntry::new(policy(Effect::Allow, None), priority(2, 0)),
        ]);

        // The deny's condition does not hold, so the broader allow decides.
        let context = Context::new(vec![Attribute::new("role", "admin")], vec![], vec![]);
        assert_eq!(hierarchy.eval(&context), EvalResult::Allowed);

        // When it holds, the specific band decides first.
        let context = Context::new(vec![Attribute::new("role", "intern")], vec![], vec![]);
        assert_eq!(hierarchy.eval(&context), EvalResult::Denied);
    }

    #[test_log::test]
    fn test_all_conditions_unmatched_abstains() {
        let hierarchy = PermissionHierarchy::from_entries(vec![HierarchyEntry::new(
            policy(Effect::Allow, Some(Condition::Literal(false))),
            priority(0, 0),
        )]);
        assert_eq!(hierarchy.eval(&Context::default()), EvalResult::Abstain);
    }

    #[test_log::test]
    fn test_origin_split_bands() {
        // Same hop counts, different origins: the inheritance entry forms its
        // own, earlier band.
        let inherited = Priority::new(Distance::new(1, Origin::Inheritance), Distance::new(0, Origin::Inheritance));
        let stripped = Priority::new(Distance::new(1, Origin::Scope), Distance::new(0, Origin::Inheritance));
        let hierarchy = PermissionHierarchy::from_entries(vec![
            HierarchyEntry::new(policy(Effect::Deny, None), stripped),
            HierarchyEntry::new(policy(Effect::Allow, None), inherited),
        ]);
        assert_eq!(hierarchy.eval(&Context::default()), EvalResult::Allowed);
    }
}
