// Canonical position codes, the synonym table that collapses raw labels, and
// the exclusion set for specialist roles.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::ReferenceDataError;

// ---------------------------------------------------------------------------
// Static tables
// ---------------------------------------------------------------------------

/// Built-in synonyms, raw label -> canonical code.
///
/// Defensive-line designations are scored in the more specific tackle bucket.
pub const BUILTIN_SYNONYMS: &[(&str, &str)] = &[("DL", "DT")];

/// Specialist codes left out of baselines and scores unless configured
/// otherwise: kicker, punter, long snapper.
pub const DEFAULT_EXCLUDED: &[&str] = &["K", "P", "LS"];

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A canonical position code. Two raw labels that canonicalize to the same
/// code are the same bucket for every downstream computation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    /// Wrap a code that is already canonical (e.g. read back from a summary
    /// table this crate wrote). Raw board labels go through
    /// [`normalize_position`] or [`PositionSynonyms::canonicalize`].
    pub fn from_canonical(code: impl Into<String>) -> Self {
        Position(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Position {
    fn borrow(&self) -> &str {
        &self.0
    }
}

fn clean_label(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Canonicalize a raw position label with the built-in synonym table:
/// trim, uppercase, then collapse synonyms (`DL` -> `DT`).
pub fn normalize_position(raw: &str) -> Position {
    let label = clean_label(raw);
    match BUILTIN_SYNONYMS.iter().find(|(from, _)| *from == label) {
        Some((_, to)) => Position((*to).to_string()),
        None => Position(label),
    }
}

// ---------------------------------------------------------------------------
// Synonym table
// ---------------------------------------------------------------------------

/// Raw-label -> canonical-code table. Chains are resolved when entries are
/// added, so no target is ever itself a key and canonicalization stays
/// idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSynonyms {
    map: BTreeMap<String, String>,
}

impl Default for PositionSynonyms {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PositionSynonyms {
    /// The built-in table only.
    pub fn builtin() -> Self {
        let map = BUILTIN_SYNONYMS
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        Self { map }
    }

    /// Merge extra entries over the current table. Labels and targets are
    /// cleaned the same way raw board labels are; identity entries are
    /// dropped. Fails if the merged table contains a cycle.
    pub fn with_entries<I, K, V>(mut self, entries: I) -> Result<Self, ReferenceDataError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (from, to) in entries {
            let from = clean_label(from.as_ref());
            let to = clean_label(to.as_ref());
            if from == to {
                self.map.remove(&from);
            } else {
                self.map.insert(from, to);
            }
        }
        self.resolve_chains()?;
        Ok(self)
    }

    fn resolve_chains(&mut self) -> Result<(), ReferenceDataError> {
        let mut resolved = BTreeMap::new();
        for (from, first) in &self.map {
            let mut seen = BTreeSet::new();
            seen.insert(from.as_str());
            let mut target = first;
            while let Some(next) = self.map.get(target) {
                if !seen.insert(target.as_str()) {
                    return Err(ReferenceDataError::SynonymCycle {
                        label: from.clone(),
                    });
                }
                target = next;
            }
            resolved.insert(from.clone(), target.clone());
        }
        self.map = resolved;
        Ok(())
    }

    /// Canonicalize a raw label against this table.
    pub fn canonicalize(&self, raw: &str) -> Position {
        let label = clean_label(raw);
        match self.map.get(&label) {
            Some(target) => Position(target.clone()),
            None => Position(label),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries in label order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Exclusion set
// ---------------------------------------------------------------------------

/// Positions removed from both the historical table and the new class
/// before baselines and scores are computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet(BTreeSet<Position>);

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED)
    }
}

impl ExclusionSet {
    /// Build from raw codes; each is canonicalized with the built-in table so
    /// the set lines up with canonical board positions.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            codes
                .into_iter()
                .map(|c| normalize_position(c.as_ref()))
                .collect(),
        )
    }

    /// Build from raw codes canonicalized through `synonyms`, the same table
    /// the boards were parsed with.
    pub fn with_synonyms<I, S>(codes: I, synonyms: &PositionSynonyms) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            codes
                .into_iter()
                .map(|c| synonyms.canonicalize(c.as_ref()))
                .collect(),
        )
    }

    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, position: &Position) -> bool {
        self.0.contains(position)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.0.iter()
    }
}
