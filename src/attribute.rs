use {
    serde::{Deserialize, Serialize},
    std::fmt::{Display, Formatter, Result as FmtResult},
};

/// An attribute value, tagged with its kind. Comparison operators dispatch on
/// the variant; comparing values of different kinds yields no match rather
/// than an error.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl AttributeValue {
    /// The name of this value's kind, as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::String(value) => f.write_str(value),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A named attribute attached to a resource. `id` is unique within the owning
/// resource; writing an attribute with an existing id replaces its value.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Attribute {
    id: String,
    value: AttributeValue,
}

impl Attribute {
    pub fn new<I, V>(id: I, value: V) -> Self
    where
        I: Into<String>,
        V: Into<AttributeValue>,
    {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }
}

/// Look up an attribute by id within a bag.
pub(crate) fn find<'a>(attributes: &'a [Attribute], id: &str) -> Option<&'a AttributeValue> {
    attributes.iter().find(|a| a.id == id).map(|a| &a.value)
}
