use {
    crate::{AttributeValue, Context, RhabacError},
    serde::{Deserialize, Serialize},
    std::{
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

/// The attribute bag a comparison reads from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Subject,
    Object,
    Env,
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Subject => f.write_str("subject"),
            Self::Object => f.write_str("object"),
            Self::Env => f.write_str("env"),
        }
    }
}

/// A reference to an attribute: which bag to look in and the attribute id.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct AttrRef {
    scope: Scope,
    id: String,
}

impl AttrRef {
    pub fn new<I: Into<String>>(scope: Scope, id: I) -> Self {
        Self {
            scope,
            id: id.into(),
        }
    }

    pub fn subject<I: Into<String>>(id: I) -> Self {
        Self::new(Scope::Subject, id)
    }

    pub fn object<I: Into<String>>(id: I) -> Self {
        Self::new(Scope::Object, id)
    }

    pub fn env<I: Into<String>>(id: I) -> Self {
        Self::new(Scope::Env, id)
    }

    #[inline]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for AttrRef {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}.{}", self.scope, self.id)
    }
}

/// Comparison operator names as they appear on the wire.
const COMPARE_OP_DISPLAY_NAMES: [&str; 8] = ["==", "!=", "<", "<=", ">", ">=", "in", "contains"];

/// A comparison operator. Ordered operators apply to `int` and `float` values;
/// `in` and `contains` apply to strings.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum CompareOp {
    Eq = 0,
    Ne = 1,
    Lt = 2,
    Le = 3,
    Gt = 4,
    Ge = 5,
    In = 6,
    Contains = 7,
}

impl CompareOp {
    fn display_name(&self) -> &'static str {
        COMPARE_OP_DISPLAY_NAMES[*self as usize]
    }
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.display_name())
    }
}

impl FromStr for CompareOp {
    type Err = RhabacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "in" => Ok(Self::In),
            "contains" => Ok(Self::Contains),
            _ => Err(RhabacError::InvalidArgument(format!("unknown comparison operator: {}", s))),
        }
    }
}

impl<'de> Deserialize<'de> for CompareOp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CompareOp::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for CompareOp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

/// A single attribute comparison: `reference op literal`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Comparison {
    reference: AttrRef,
    op: CompareOp,
    value: AttributeValue,
}

impl Comparison {
    pub fn new<V: Into<AttributeValue>>(reference: AttrRef, op: CompareOp, value: V) -> Self {
        Self {
            reference,
            op,
            value: value.into(),
        }
    }

    #[inline]
    pub fn reference(&self) -> &AttrRef {
        &self.reference
    }

    #[inline]
    pub fn op(&self) -> CompareOp {
        self.op
    }

    #[inline]
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Evaluate this comparison against the request context. A missing
    /// attribute or a kind mismatch yields `false`, never an error.
    pub fn matches(&self, context: &Context) -> bool {
        let value = match context.get(self.reference.scope(), self.reference.id()) {
            Some(value) => value,
            None => {
                log::trace!("reference={} is absent; comparison is false", self.reference);
                return false;
            }
        };

        let result = compare(value, self.op, &self.value);
        log::trace!("reference={} op={} literal={} value={} result={}", self.reference, self.op, self.value, value, result);
        result
    }
}

fn compare(value: &AttributeValue, op: CompareOp, literal: &AttributeValue) -> bool {
    match (value, literal) {
        (AttributeValue::String(value), AttributeValue::String(literal)) => string_match(value, op, literal),
        (AttributeValue::Bool(value), AttributeValue::Bool(literal)) => match op {
            CompareOp::Eq => value == literal,
            CompareOp::Ne => value != literal,
            _ => false,
        },
        (AttributeValue::Int(value), AttributeValue::Int(literal)) => ordered_match(value, op, literal),
        (AttributeValue::Float(value), AttributeValue::Float(literal)) => ordered_match(value, op, literal),
        _ => false,
    }
}

fn string_match(value: &str, op: CompareOp, literal: &str) -> bool {
    match op {
        CompareOp::Eq => value == literal,
        CompareOp::Ne => value != literal,
        CompareOp::In => literal.contains(value),
        CompareOp::Contains => value.contains(literal),
        _ => false,
    }
}

fn ordered_match<T: PartialOrd>(value: &T, op: CompareOp, literal: &T) -> bool {
    match op {
        CompareOp::Eq => value == literal,
        CompareOp::Ne => value != literal,
        CompareOp::Lt => value < literal,
        CompareOp::Le => value <= literal,
        CompareOp::Gt => value > literal,
        CompareOp::Ge => value >= literal,
        _ => false,
    }
}

/// A predicate over the subject, object, and environment attribute bags.
///
/// Evaluation is a pure recursive walk and never fails: absent attributes and
/// ill-typed comparisons evaluate to `false`. Negation of such a comparison
/// yields `true`, so absence never grants but can be tested for explicitly.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Literal(bool),
    Compare(Comparison),
    Not(Box<Condition>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    /// Build a comparison leaf.
    pub fn compare<V: Into<AttributeValue>>(reference: AttrRef, op: CompareOp, value: V) -> Self {
        Self::Compare(Comparison::new(reference, op, value))
    }

    pub fn not(condition: Condition) -> Self {
        Self::Not(Box::new(condition))
    }

    /// Evaluate against the request context.
    pub fn matches(&self, context: &Context) -> bool {
        match self {
            Self::Literal(value) => *value,
            Self::Compare(comparison) => comparison.matches(context),
            Self::Not(inner) => !inner.matches(context),
            Self::And(inner) => inner.iter().all(|c| c.matches(context)),
            Self::Or(inner) => inner.iter().any(|c| c.matches(context)),
        }
    }
}

display_json!(Condition);
from_str_json!(Condition);

#[cfg(test)]
mod tests {
    use {
        crate::{AttrRef, Attribute, CompareOp, Condition, Context},
        pretty_assertions::assert_eq,
        std::str::FromStr,
    };

    fn context() -> Context {
        Context::new(
            vec![Attribute::new("role", "admin"), Attribute::new("age", 30i64)],
            vec![Attribute::new("classification", "public.internal")],
            vec![Attribute::new("mfa", true), Attribute::new("risk", 0.25f64)],
        )
    }

    #[test_log::test]
    fn test_compare_op_tokens() {
        for token in ["==", "!=", "<", "<=", ">", ">=", "in", "contains"] {
            let op = CompareOp::from_str(token).unwrap();
            assert_eq!(op.to_string(), token);
        }
        assert!(CompareOp::from_str("~=").is_err());
    }

    #[test_log::test]
    fn test_string_comparisons() {
        let ctx = context();
        assert!(Condition::compare(AttrRef::subject("role"), CompareOp::Eq, "admin").matches(&ctx));
        assert!(!Condition::compare(AttrRef::subject("role"), CompareOp::Eq, "user").matches(&ctx));
        assert!(Condition::compare(AttrRef::subject("role"), CompareOp::Ne, "user").matches(&ctx));
        // "admin" occurs within the literal.
        assert!(Condition::compare(AttrRef::subject("role"), CompareOp::In, "admin,operator").matches(&ctx));
        assert!(!Condition::compare(AttrRef::subject("role"), CompareOp::In, "operator").matches(&ctx));
        // The attribute contains the literal.
        assert!(Condition::compare(AttrRef::object("classification"), CompareOp::Contains, "internal").matches(&ctx));
        // Ordered operators do not apply to strings.
        assert!(!Condition::compare(AttrRef::subject("role"), CompareOp::Lt, "zzz").matches(&ctx));
    }

    #[test_log::test]
    fn test_numeric_comparisons() {
        let ctx = context();
        assert!(Condition::compare(AttrRef::subject("age"), CompareOp::Ge, 18i64).matches(&ctx));
        assert!(Condition::compare(AttrRef::subject("age"), CompareOp::Lt, 65i64).matches(&ctx));
        assert!(!Condition::compare(AttrRef::subject("age"), CompareOp::Gt, 30i64).matches(&ctx));
        assert!(Condition::compare(AttrRef::env("risk"), CompareOp::Le, 0.5f64).matches(&ctx));
        // in/contains do not apply to numbers.
        assert!(!Condition::compare(AttrRef::subject("age"), CompareOp::In, 30i64).matches(&ctx));
    }

    #[test_log::test]
    fn test_bool_comparisons() {
        let ctx = context();
        assert!(Condition::compare(AttrRef::env("mfa"), CompareOp::Eq, true).matches(&ctx));
        assert!(!Condition::compare(AttrRef::env("mfa"), CompareOp::Ne, true).matches(&ctx));
        assert!(!Condition::compare(AttrRef::env("mfa"), CompareOp::Lt, true).matches(&ctx));
    }

    #[test_log::test]
    fn test_missing_attribute_is_false_and_not_inverts() {
        let ctx = context();
        let absent = Condition::compare(AttrRef::subject("team"), CompareOp::Eq, "core");
        assert!(!absent.matches(&ctx));
        assert!(Condition::not(absent).matches(&ctx));
    }

    #[test_log::test]
    fn test_kind_mismatch_is_false() {
        let ctx = context();
        // Attribute is a string, literal an int; false for every operator,
        // including !=.
        assert!(!Condition::compare(AttrRef::subject("role"), CompareOp::Eq, 1i64).matches(&ctx));
        assert!(!Condition::compare(AttrRef::subject("role"), CompareOp::Ne, 1i64).matches(&ctx));
        // int and float are distinct kinds.
        assert!(!Condition::compare(AttrRef::subject("age"), CompareOp::Eq, 30.0f64).matches(&ctx));
    }

    #[test_log::test]
    fn test_logical_connectives() {
        let ctx = context();
        let admin = Condition::compare(AttrRef::subject("role"), CompareOp::Eq, "admin");
        let mfa = Condition::compare(AttrRef::env("mfa"), CompareOp::Eq, true);
        let minor = Condition::compare(AttrRef::subject("age"), CompareOp::Lt, 18i64);

        assert!(Condition::And(vec![admin.clone(), mfa.clone()]).matches(&ctx));
        assert!(!Condition::And(vec![admin.clone(), minor.clone()]).matches(&ctx));
        assert!(Condition::Or(vec![minor.clone(), mfa.clone()]).matches(&ctx));
        assert!(!Condition::Or(vec![minor.clone(), Condition::Literal(false)]).matches(&ctx));
        assert!(Condition::And(vec![]).matches(&ctx));
        assert!(!Condition::Or(vec![]).matches(&ctx));
    }

    #[test_log::test]
    fn test_literals() {
        let ctx = Context::default();
        assert!(Condition::Literal(true).matches(&ctx));
        assert!(!Condition::Literal(false).matches(&ctx));
    }

    #[test_log::test]
    fn test_serde() {
        let condition = Condition::And(vec![
            Condition::compare(AttrRef::subject("role"), CompareOp::Eq, "admin"),
            Condition::not(Condition::compare(AttrRef::env("risk"), CompareOp::Gt, 0.5f64)),
        ]);
        let json = serde_json::to_string(&condition).unwrap();
        assert_eq!(Condition::from_str(&json).unwrap(), condition);

        let compare_json = r#"{"compare":{"reference":{"scope":"subject","id":"role"},"op":"==","value":{"string":"admin"}}}"#;
        assert_eq!(
            Condition::from_str(compare_json).unwrap(),
            Condition::compare(AttrRef::subject("role"), CompareOp::Eq, "admin")
        );
    }
}
