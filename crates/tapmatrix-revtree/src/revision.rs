//! Revision identifiers and lineage
//!
//! A [`RevisionId`] is `<generation>-<hash>`. A [`RevisionLineage`] is the
//! explicit ancestor chain attached to a revision when history is written
//! verbatim: `ids[0]` is the revision's own hash at generation `start`,
//! `ids[k]` its ancestor at generation `start - k`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors parsing or assembling revision metadata
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevisionParseError {
    /// No `-` separator between generation and hash
    #[error("revision {0:?} has no generation separator")]
    MissingSeparator(String),

    /// Generation is not a positive integer
    #[error("revision {0:?} has an invalid generation")]
    InvalidGeneration(String),

    /// Hash part is empty
    #[error("revision {0:?} has an empty hash")]
    EmptyHash(String),

    /// Lineage has no entries
    #[error("lineage must contain at least one id")]
    EmptyLineage,

    /// Lineage is longer than its start generation allows
    #[error("lineage of {len} ids cannot start at generation {start}")]
    LineageTooLong {
        /// Declared generation of the first id
        start: u64,
        /// Number of ids
        len: usize,
    },

    /// Revision is already at the last representable generation
    #[error("revision {0} has no next generation")]
    GenerationExhausted(String),
}

/// Highest generation accepted from text or lineages
pub const MAX_GENERATION: u64 = u64::MAX >> 1;

/// Identifier of one document revision
///
/// Ordering is by generation, then hash; the greatest leaf wins.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionId {
    generation: u64,
    hash: String,
}

impl RevisionId {
    /// Build a revision id
    ///
    /// # Panics
    /// Panics if `generation` is zero or `hash` is empty; use
    /// [`str::parse`] for untrusted input.
    #[must_use]
    pub fn new(generation: u64, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        assert!(generation > 0, "revision generation starts at 1");
        assert!(!hash.is_empty(), "revision hash must not be empty");
        Self { generation, hash }
    }

    /// Generation number
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Hash part
    #[inline]
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Generation of a direct child, if one can exist
    #[inline]
    #[must_use]
    pub fn child_generation(&self) -> Option<u64> {
        self.generation
            .checked_add(1)
            .filter(|g| *g <= MAX_GENERATION)
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.generation, self.hash)
    }
}

impl FromStr for RevisionId {
    type Err = RevisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (generation, hash) = s
            .split_once('-')
            .ok_or_else(|| RevisionParseError::MissingSeparator(s.to_string()))?;
        let generation: u64 = generation
            .parse()
            .ok()
            .filter(|g| (1..=MAX_GENERATION).contains(g))
            .ok_or_else(|| RevisionParseError::InvalidGeneration(s.to_string()))?;
        if hash.is_empty() {
            return Err(RevisionParseError::EmptyHash(s.to_string()));
        }
        Ok(Self {
            generation,
            hash: hash.to_string(),
        })
    }
}

impl TryFrom<String> for RevisionId {
    type Error = RevisionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RevisionId> for String {
    fn from(value: RevisionId) -> Self {
        value.to_string()
    }
}

/// Explicit ancestor chain of a revision, child first
///
/// Always holds at least one id; deserialization applies the same checks
/// as [`RevisionLineage::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLineage")]
pub struct RevisionLineage {
    start: u64,
    ids: Vec<String>,
}

#[derive(Deserialize)]
struct RawLineage {
    start: u64,
    ids: Vec<String>,
}

impl TryFrom<RawLineage> for RevisionLineage {
    type Error = RevisionParseError;

    fn try_from(raw: RawLineage) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.ids)
    }
}

impl RevisionLineage {
    /// Build a lineage
    ///
    /// # Errors
    /// Rejects an empty `ids` list, chains that would run below
    /// generation 1 and starts past [`MAX_GENERATION`].
    pub fn new(start: u64, ids: Vec<String>) -> Result<Self, RevisionParseError> {
        if ids.is_empty() {
            return Err(RevisionParseError::EmptyLineage);
        }
        if start > MAX_GENERATION {
            return Err(RevisionParseError::InvalidGeneration(start.to_string()));
        }
        if u64::try_from(ids.len()).map_or(true, |len| start < len) {
            return Err(RevisionParseError::LineageTooLong {
                start,
                len: ids.len(),
            });
        }
        Ok(Self { start, ids })
    }

    /// Lineage linking `child` directly to `parent`
    ///
    /// # Errors
    /// Fails when `child` is a root (generation 1).
    pub fn linking(child: &RevisionId, parent: &RevisionId) -> Result<Self, RevisionParseError> {
        Self::new(
            child.generation(),
            vec![child.hash().to_string(), parent.hash().to_string()],
        )
    }

    /// Generation of the first id
    #[inline]
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Hashes, child first
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Full revision ids, child first, generations strictly decreasing
    #[must_use]
    pub fn revision_ids(&self) -> Vec<RevisionId> {
        self.ids
            .iter()
            .zip((1..=self.start).rev())
            .map(|(hash, generation)| RevisionId {
                generation,
                hash: hash.clone(),
            })
            .collect()
    }

    /// The revision this lineage describes
    #[must_use]
    pub fn head(&self) -> Option<RevisionId> {
        self.ids.first().map(|hash| RevisionId {
            generation: self.start,
            hash: hash.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_textual_form() {
        let rev: RevisionId = "3-abc".parse().unwrap();
        assert_eq!(rev.generation(), 3);
        assert_eq!(rev.hash(), "abc");
        assert_eq!(rev.to_string(), "3-abc");
    }

    #[test]
    fn hash_may_contain_dashes() {
        let rev: RevisionId = "2-a-b".parse().unwrap();
        assert_eq!(rev.hash(), "a-b");
    }

    #[test]
    fn rejects_malformed_revisions() {
        assert!(matches!("abc".parse::<RevisionId>(), Err(RevisionParseError::MissingSeparator(_))));
        assert!(matches!("x-abc".parse::<RevisionId>(), Err(RevisionParseError::InvalidGeneration(_))));
        assert!(matches!("0-abc".parse::<RevisionId>(), Err(RevisionParseError::InvalidGeneration(_))));
        assert!(matches!("1-".parse::<RevisionId>(), Err(RevisionParseError::EmptyHash(_))));
    }

    #[test]
    fn rejects_generations_past_the_limit() {
        let max = format!("{MAX_GENERATION}-a");
        assert_eq!(max.parse::<RevisionId>().unwrap().child_generation(), None);
        assert!(matches!(
            "18446744073709551615-a".parse::<RevisionId>(),
            Err(RevisionParseError::InvalidGeneration(_))
        ));
        assert!(matches!(
            "18446744073709551616-a".parse::<RevisionId>(),
            Err(RevisionParseError::InvalidGeneration(_))
        ));
        assert_eq!(RevisionId::new(u64::MAX, "a").child_generation(), None);
        assert_eq!(RevisionId::new(4, "a").child_generation(), Some(5));
    }

    #[test]
    fn ordering_is_generation_then_hash() {
        let a = RevisionId::new(2, "a");
        let b = RevisionId::new(2, "b");
        let c = RevisionId::new(3, "0");
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn lineage_generations_strictly_decrease() {
        let lineage = RevisionLineage::new(4, vec!["d".into(), "c".into(), "b".into()]).unwrap();
        let gens: Vec<u64> = lineage.revision_ids().iter().map(RevisionId::generation).collect();
        assert_eq!(gens, vec![4, 3, 2]);
        assert_eq!(lineage.head(), Some(RevisionId::new(4, "d")));
    }

    #[test]
    fn lineage_rejects_impossible_chains() {
        assert_eq!(RevisionLineage::new(1, vec![]), Err(RevisionParseError::EmptyLineage));
        assert_eq!(
            RevisionLineage::new(1, vec!["b".into(), "a".into()]),
            Err(RevisionParseError::LineageTooLong { start: 1, len: 2 })
        );
    }

    #[test]
    fn deserialized_lineage_is_validated() {
        let err = serde_json::from_str::<RevisionLineage>(r#"{"start":1,"ids":[]}"#).unwrap_err();
        assert!(err.to_string().contains("at least one id"), "{err}");

        let err = serde_json::from_str::<RevisionLineage>(r#"{"start":1,"ids":["b","a"]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("cannot start at generation 1"), "{err}");

        let lineage: RevisionLineage =
            serde_json::from_str(r#"{"start":2,"ids":["b","a"]}"#).unwrap();
        assert_eq!(lineage.head(), Some(RevisionId::new(2, "b")));
    }

    #[test]
    fn revision_id_serializes_as_string() {
        let rev = RevisionId::new(1, "abc");
        assert_eq!(serde_json::to_string(&rev).unwrap(), "\"1-abc\"");
        let back: RevisionId = serde_json::from_str("\"1-abc\"").unwrap();
        assert_eq!(back, rev);
    }
}
