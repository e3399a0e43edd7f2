//! Domain identifier types with validation
//!
//! This module provides the two identities every record carries:
//! - [`EntityId`] - the remote-source identifier used to issue sub-queries
//! - [`EntityKey`] - the checkpoint identity used to skip already written entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Remote-source identifier newtype wrapper
///
/// Page identifiers are integers on the remote source. Surrounding whitespace
/// is tolerated when parsing.
///
/// # Examples
///
/// ```
/// use revstats::domain::ids::EntityId;
/// use std::str::FromStr;
///
/// let id = EntityId::from_str(" 50 ").unwrap();
/// assert_eq!(id.value(), 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(i64);

impl EntityId {
    /// Creates a new EntityId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("identifier cannot be empty".to_string());
        }
        trimmed
            .parse::<i64>()
            .map(Self)
            .map_err(|_| format!("identifier '{trimmed}' is not an integer"))
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i32> for EntityId {
    fn from(id: i32) -> Self {
        Self(i64::from(id))
    }
}

/// Checkpoint identity of an entity
///
/// Derived from the language tag and the display name. The same derivation is
/// applied to input records and to rows read back from the output, which is
/// what makes a resumed run skip exactly the entities already written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    lang: String,
    name: String,
}

impl EntityKey {
    /// Derives the key from a language tag and a name
    pub fn new(lang: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            name: name.into(),
        }
    }

    /// Language tag part of the key
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Name part of the key
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.lang, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_parse() {
        assert_eq!(EntityId::from_str("50").unwrap(), EntityId::new(50));
        assert_eq!(EntityId::from_str("  7 ").unwrap().value(), 7);
    }

    #[test]
    fn test_entity_id_rejects_garbage() {
        assert!(EntityId::from_str("").is_err());
        assert!(EntityId::from_str("abc").is_err());
        assert!(EntityId::from_str("1.5").is_err());
    }

    #[test]
    fn test_entity_key_equality() {
        let a = EntityKey::new("en", "Ada Lovelace");
        let b = EntityKey::new("en".to_string(), "Ada Lovelace".to_string());
        let c = EntityKey::new("fr", "Ada Lovelace");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "en:Ada Lovelace");
    }

    #[test]
    fn test_entity_key_parts_do_not_collide() {
        // "a:b" + "c" must differ from "a" + "b:c"
        let a = EntityKey::new("a:b", "c");
        let b = EntityKey::new("a", "b:c");
        assert_ne!(a, b);
    }
}
