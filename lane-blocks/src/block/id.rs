//! Block identity

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier assigned to a block when it is registered
///
/// Identities are process-wide and never reused, so per-request dedup can key
/// on them without coordinating across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(Uuid);

impl BlockId {
    /// Generate a new random block ID
    pub fn new() -> Self {
        BlockId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = BlockId::new();
        let b = BlockId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_is_hyphenated_uuid() {
        let id = BlockId::new();
        let shown = id.to_string();
        assert_eq!(shown.len(), 36);
        assert_eq!(Uuid::parse_str(&shown).unwrap(), *id.as_uuid());
    }
}
