//! Normalized screening input model.
//!
//! Entities arrive already normalized (tokenized, lowercased, morphology
//! resolved) from the upstream text pipeline. This module defines the
//! documented shape the funnel consumes; nothing here assumes how the fields
//! were produced.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Script/language hint attached by upstream normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Cyrillic input.
    Ru,
    /// Latin input.
    #[default]
    En,
    /// Mixed-script input (typically transliteration artifacts).
    Mixed,
    /// Anything else.
    Other,
}

impl Language {
    /// Stable short code, used in the cache key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::En => "en",
            Self::Mixed => "mixed",
            Self::Other => "other",
        }
    }
}

/// Kind of regulatory identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    /// Russian taxpayer number.
    Inn,
    /// Russian company registration number.
    Ogrn,
    /// Passport number.
    Passport,
    /// SWIFT/BIC bank code.
    SwiftBic,
    /// Any identifier the upstream pipeline could not classify.
    Other,
}

impl IdKind {
    /// Stable uppercase tag, shared with the index payload schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inn => "INN",
            Self::Ogrn => "OGRN",
            Self::Passport => "PASSPORT",
            Self::SwiftBic => "SWIFT_BIC",
            Self::Other => "OTHER",
        }
    }
}

/// A typed regulatory identifier with a normalized value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub kind: IdKind,
    /// Uppercased, separator-free value.
    pub value: String,
}

impl Identifier {
    /// Builds an identifier, normalizing the raw value: uppercased, with
    /// whitespace and common separators stripped.
    pub fn new(kind: IdKind, raw: &str) -> Self {
        let value = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(|c| c.to_uppercase())
            .collect();
        Self { kind, value }
    }

    /// Canonical `KIND:VALUE` tag used for exact lookups and hashing.
    pub fn tag(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.value)
    }
}

/// Feature toggles that travel with a single request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PolicyFlag {
    /// Apply the stricter stopword list during matching.
    StrictStopwords,
    /// Input is known-ASCII; transliteration variants can be skipped.
    AsciiFastPath,
    /// Skip the blocking tier entirely.
    DisableBlocking,
    /// Do not write this result back to the cache.
    NoCache,
    /// Request shadow-mode comparison even if globally disabled.
    ShadowCompare,
}

impl PolicyFlag {
    /// Stable code, used in the cache key and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrictStopwords => "strict_stopwords",
            Self::AsciiFastPath => "ascii_fast_path",
            Self::DisableBlocking => "disable_blocking",
            Self::NoCache => "no_cache",
            Self::ShadowCompare => "shadow_compare",
        }
    }
}

/// Immutable set of policy flags.
///
/// Iteration order is sorted and stable, so the set can feed the cache key
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyFlags(BTreeSet<PolicyFlag>);

impl PolicyFlags {
    /// The empty flag set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a copy with `flag` enabled.
    #[must_use]
    pub fn with(mut self, flag: PolicyFlag) -> Self {
        self.0.insert(flag);
        self
    }

    /// Whether `flag` is enabled.
    #[inline]
    pub fn contains(&self, flag: PolicyFlag) -> bool {
        self.0.contains(&flag)
    }

    /// Sorted iteration over enabled flags.
    pub fn iter(&self) -> impl Iterator<Item = PolicyFlag> + '_ {
        self.0.iter().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<PolicyFlag> for PolicyFlags {
    fn from_iter<T: IntoIterator<Item = PolicyFlag>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Verdict of the upstream pre-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefilterVerdict {
    /// Input contains an identifiable entity; screen it.
    #[default]
    Entity,
    /// Input judged to contain no identifiable entity; screening is skipped.
    NoEntity,
}

/// Upstream pre-filter evidence, consumed opaquely by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrefilterSignal {
    pub verdict: PrefilterVerdict,
    /// Pre-filter confidence that the input names a listed-entity shape, in [0, 1].
    pub signal: f32,
    /// Evidence that the input denotes a natural person, in [0, 1].
    pub person_evidence: f32,
    /// Evidence that the input denotes an organization, in [0, 1].
    pub org_evidence: f32,
}

impl Default for PrefilterSignal {
    fn default() -> Self {
        Self {
            verdict: PrefilterVerdict::Entity,
            signal: 0.0,
            person_evidence: 0.0,
            org_evidence: 0.0,
        }
    }
}

/// A fully normalized entity ready for screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEntity {
    /// Normalized name tokens, in original order. Last token is treated as
    /// the surname for person inputs.
    pub tokens: Vec<String>,
    pub language: Language,
    /// Date of birth, when known.
    pub dob: Option<NaiveDate>,
    /// Typed regulatory identifiers, values already normalized.
    pub identifiers: Vec<Identifier>,
    pub policy_flags: PolicyFlags,
    /// Upstream pre-filter evidence.
    pub prefilter: PrefilterSignal,
}

impl NormalizedEntity {
    pub fn new(tokens: Vec<String>, language: Language) -> Self {
        Self {
            tokens,
            language,
            dob: None,
            identifiers: Vec::new(),
            policy_flags: PolicyFlags::empty(),
            prefilter: PrefilterSignal::default(),
        }
    }

    #[must_use]
    pub fn with_dob(mut self, dob: NaiveDate) -> Self {
        self.dob = Some(dob);
        self
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        self.identifiers.push(identifier);
        self
    }

    #[must_use]
    pub fn with_policy_flags(mut self, flags: PolicyFlags) -> Self {
        self.policy_flags = flags;
        self
    }

    #[must_use]
    pub fn with_prefilter(mut self, prefilter: PrefilterSignal) -> Self {
        self.prefilter = prefilter;
        self
    }

    /// The full name as a single space-joined string.
    pub fn joined_name(&self) -> String {
        self.tokens.join(" ")
    }

    /// Joined name, defensively lowercased and whitespace-collapsed.
    ///
    /// Idempotent for input that upstream already normalized; keeps matching
    /// honest when it did not.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.joined_name())
    }

    /// True when there is no usable name text.
    pub fn has_blank_name(&self) -> bool {
        self.tokens.is_empty() || self.tokens.iter().all(|t| t.trim().is_empty())
    }

    /// Surname token (by convention the last name token).
    pub fn surname(&self) -> Option<&str> {
        self.tokens.iter().rev().find(|t| !t.trim().is_empty()).map(String::as_str)
    }

    /// First character of the first non-blank token.
    pub fn first_initial(&self) -> Option<char> {
        self.tokens
            .iter()
            .find(|t| !t.trim().is_empty())
            .and_then(|t| t.chars().next())
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.dob.map(|d| d.year())
    }
}

/// Lowercases and collapses internal whitespace.
///
/// The same routine is applied to index-side patterns, so both sides of every
/// comparison share one canonical form.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
