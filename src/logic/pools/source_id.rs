use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Identifier of a source (one ledger / chain hosting pools), e.g. `"base"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_serde_is_transparent() {
        let id = SourceId::from("polygon");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"polygon\"");
        let back: SourceId = serde_json::from_str("\"polygon\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(back.to_string(), "polygon");
    }

    #[test]
    fn test_empty() {
        assert!(SourceId::from("  ").is_empty());
        assert!(!SourceId::from("base").is_empty());
    }
}
