/// Implement Display for a given class by formatting it as pretty-printed JSON.
#[macro_export]
macro_rules! display_json {
    ($cls:ident) => {
        impl std::fmt::Display for $cls {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                let buf = Vec::new();
                let serde_formatter = ::serde_json::ser::PrettyFormatter::with_indent(b"    ");
                let mut ser = ::serde_json::Serializer::with_formatter(buf, serde_formatter);
                match ::serde::Serialize::serialize(self, &mut ser) {
                    Ok(()) => (),
                    Err(e) => {
                        ::log::error!("Failed to serialize: {}", e);
                        return Err(::std::fmt::Error {});
                    }
                };
                match std::str::from_utf8(&ser.into_inner()) {
                    Ok(s) => write!(f, "{}", s),
                    Err(e) => {
                        ::log::error!("JSON serialization contained non-UTF-8 characters: {}", e);
                        Err(::std::fmt::Error {})
                    }
                }
            }
        }
    };
}

/// Implement FromStr for a given class by parsing it as JSON.
#[macro_export]
macro_rules! from_str_json {
    ($cls:ident) => {
        impl ::std::str::FromStr for $cls {
            type Err = ::serde_json::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match ::serde_json::from_str::<Self>(s) {
                    Ok(result) => Ok(result),
                    Err(e) => {
                        ::log::debug!("Failed to parse: {}: {:?}", s, e);
                        Err(e)
                    }
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use {
        crate::{Effect, Policy, Resource},
        pretty_assertions::assert_eq,
        std::str::FromStr,
    };

    fn policy() -> Policy {
        Policy::builder()
            .permission_name("read")
            .subject_scope(Resource::root())
            .object_scope(Resource::new("doc", "x"))
            .effect(Effect::Allow)
            .build()
            .unwrap()
    }

    #[test_log::test]
    fn test_display_from_str_round_trip() {
        let policy = policy();
        let text = policy.to_string();
        assert!(text.contains('\n'), "Display output is pretty-printed");
        assert_eq!(Policy::from_str(&text).unwrap(), policy);
    }

    #[test_log::test]
    fn test_from_str_rejects_garbage() {
        assert!(Policy::from_str("not json").is_err());
    }
}
