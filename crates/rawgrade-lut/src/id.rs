//! LUT identifier namespace.

use std::fmt;

const BUNDLE_PREFIX: &str = "bundle:";
const IMPORT_PREFIX: &str = "import:";

/// Parsed LUT identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LutId {
    /// No LUT (`"none"`).
    None,
    /// Shipped preset (`"bundle:<name>"`).
    Bundle(String),
    /// User import (`"import:<uuid>"`).
    Import(String),
}

impl LutId {
    /// Parses an identifier string. Returns `None` for anything outside the namespace.
    pub fn parse(id: &str) -> Option<Self> {
        if id == "none" {
            return Some(Self::None);
        }
        if let Some(name) = id.strip_prefix(BUNDLE_PREFIX) {
            return (!name.is_empty()).then(|| Self::Bundle(name.to_string()));
        }
        if let Some(uuid) = id.strip_prefix(IMPORT_PREFIX) {
            return (!uuid.is_empty()).then(|| Self::Import(uuid.to_string()));
        }
        None
    }

    /// True for `"none"`.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for LutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Bundle(name) => write!(f, "{BUNDLE_PREFIX}{name}"),
            Self::Import(uuid) => write!(f, "{IMPORT_PREFIX}{uuid}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespace() {
        assert_eq!(LutId::parse("none"), Some(LutId::None));
        assert_eq!(LutId::parse("bundle:Warm"), Some(LutId::Bundle("Warm".into())));
        assert_eq!(
            LutId::parse("import:0b5c"),
            Some(LutId::Import("0b5c".into()))
        );
        assert_eq!(LutId::parse("bundle:"), None);
        assert_eq!(LutId::parse("file:/tmp/x.cube"), None);
        assert_eq!(LutId::parse(""), None);
    }

    #[test]
    fn test_display_roundtrip() {
        for raw in ["none", "bundle:Teal Orange", "import:1234-abcd"] {
            let id = LutId::parse(raw).unwrap();
            assert_eq!(id.to_string(), raw);
        }
    }
}
