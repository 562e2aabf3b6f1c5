//! Facilitation strategy tag.

use serde::{Deserialize, Serialize};

/// Facilitation strategy recorded on a session.
///
/// Only the Double Diamond is implemented. Unknown tags are preserved on the
/// session record but scheduled as Double Diamond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    DoubleDiamond,
}

impl Strategy {
    pub const DOUBLE_DIAMOND_TAG: &'static str = "double_diamond";

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::DoubleDiamond => Self::DOUBLE_DIAMOND_TAG,
        }
    }

    /// Resolve a stored tag; `None` means the tag is unsupported.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            Self::DOUBLE_DIAMOND_TAG => Some(Strategy::DoubleDiamond),
            _ => None,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(
            Strategy::from_tag("double_diamond"),
            Some(Strategy::DoubleDiamond)
        );
        assert_eq!(Strategy::from_tag("six_hats"), None);
    }
}
