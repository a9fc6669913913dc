use {
    crate::{attribute, Attribute, AttributeValue, Scope},
    derive_builder::Builder,
    std::fmt::{Display, Formatter, Result as FmtResult},
};

/// The attribute bags a single evaluation runs against: the subject's
/// attributes, the object's attributes, and the caller-supplied environment.
///
/// The bags are immutable for the duration of the evaluation; predicate
/// evaluation reads them and nothing else.
#[derive(Builder, Clone, Debug, Default, PartialEq)]
pub struct Context {
    #[builder(setter(into), default)]
    subject: Vec<Attribute>,
    #[builder(setter(into), default)]
    object: Vec<Attribute>,
    #[builder(setter(into), default)]
    env: Vec<Attribute>,
}

impl Context {
    pub fn new(subject: Vec<Attribute>, object: Vec<Attribute>, env: Vec<Attribute>) -> Self {
        Self {
            subject,
            object,
            env,
        }
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    #[inline]
    pub fn subject(&self) -> &Vec<Attribute> {
        &self.subject
    }

    #[inline]
    pub fn object(&self) -> &Vec<Attribute> {
        &self.object
    }

    #[inline]
    pub fn env(&self) -> &Vec<Attribute> {
        &self.env
    }

    /// Look up an attribute in the bag a reference points at.
    pub fn get(&self, scope: Scope, id: &str) -> Option<&AttributeValue> {
        let bag = match scope {
            Scope::Subject => &self.subject,
            Scope::Object => &self.object,
            Scope::Env => &self.env,
        };
        attribute::find(bag, id)
    }
}

/// The outcome of resolving a permission hierarchy.
///
/// `Abstain` means no applicable policy matched; callers treat it as a
/// denial (closed-world default), but it is distinct from an explicit
/// `Denied`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EvalResult {
    Allowed,
    Denied,
    Abstain,
}

impl EvalResult {
    /// The final authorization boolean: `true` only for `Allowed`.
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl Display for EvalResult {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Allowed => f.write_str("Allowed"),
            Self::Denied => f.write_str("Denied"),
            Self::Abstain => f.write_str("Abstain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{Attribute, AttributeValue, Context, EvalResult, Scope},
        pretty_assertions::assert_eq,
    };

    #[test_log::test]
    fn test_context_builder() {
        let c1 = Context::builder()
            .subject(vec![Attribute::new("role", "admin")])
            .env(vec![Attribute::new("mfa", true)])
            .build()
            .unwrap();
        let c2 = Context::new(vec![Attribute::new("role", "admin")], vec![], vec![Attribute::new("mfa", true)]);
        assert_eq!(c1, c2);
        assert_eq!(c1, c1.clone());
    }

    #[test_log::test]
    fn test_bags_are_independent() {
        let context = Context::new(
            vec![Attribute::new("id", "subject-side")],
            vec![Attribute::new("id", "object-side")],
            vec![],
        );
        assert_eq!(context.get(Scope::Subject, "id"), Some(&AttributeValue::from("subject-side")));
        assert_eq!(context.get(Scope::Object, "id"), Some(&AttributeValue::from("object-side")));
        assert_eq!(context.get(Scope::Env, "id"), None);
    }

    #[test_log::test]
    fn test_eval_result() {
        assert!(EvalResult::Allowed.is_allowed());
        assert!(!EvalResult::Denied.is_allowed());
        assert!(!EvalResult::Abstain.is_allowed());

        assert_eq!(format!("{}", EvalResult::Allowed), "Allowed");
        assert_eq!(format!("{}", EvalResult::Denied), "Denied");
        assert_eq!(format!("{}", EvalResult::Abstain), "Abstain");
    }
}
