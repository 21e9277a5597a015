use std::collections::HashMap;

use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{RetrievedPoint, ScoredPoint, Value};
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, CandidateMetadata, EntityType, SourceTier};
use crate::matchers::PhoneticCode;

/// A blocking key, as generated from the input entity.
///
/// `as_index_key` must stay in lockstep with the ingestion side: records are
/// indexed under exactly these string forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingKey {
    /// Surname phonetic code, indexed as `sx:<CODE>`.
    Phonetic(PhoneticCode),
    /// First-name initial, indexed as `fi:<char>`.
    Initial(char),
    /// Birth year, indexed as `by:<year>`.
    BirthYear(i32),
}

impl BlockingKey {
    /// The string form this key is indexed under.
    pub fn as_index_key(&self) -> String {
        match self {
            Self::Phonetic(code) => format!("sx:{}", code),
            Self::Initial(initial) => format!("fi:{}", initial),
            Self::BirthYear(year) => format!("by:{}", year),
        }
    }
}

impl std::fmt::Display for BlockingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_index_key())
    }
}

/// A watchlist record as stored in the index payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Stable watchlist entry key.
    pub entry_id: String,
    /// Normalized canonical name.
    pub name: String,
    pub entity_type: EntityType,
    /// Normalized aliases and transliterations.
    pub aliases: Vec<String>,
    /// Canonical `KIND:VALUE` identifier tags.
    pub identifiers: Vec<String>,
    /// Originating list, e.g. `ofac_sdn`.
    pub source: Option<String>,
    /// Sanction program designation.
    pub program: Option<String>,
    /// Birth year, when the list publishes one.
    pub dob_year: Option<i32>,
    /// Blocking keys the record was indexed under.
    pub blocking_keys: Vec<String>,
}

impl RawRecord {
    pub fn new(
        entry_id: impl Into<String>,
        name: impl Into<String>,
        entity_type: EntityType,
    ) -> Self {
        Self {
            entry_id: entry_id.into(),
            name: name.into(),
            entity_type,
            aliases: Vec::new(),
            identifiers: Vec::new(),
            source: None,
            program: None,
            dob_year: None,
            blocking_keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    #[must_use]
    pub fn with_identifiers(mut self, identifiers: Vec<String>) -> Self {
        self.identifiers = identifiers;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    #[must_use]
    pub fn with_dob_year(mut self, year: i32) -> Self {
        self.dob_year = Some(year);
        self
    }

    #[must_use]
    pub fn with_blocking_keys(mut self, keys: Vec<String>) -> Self {
        self.blocking_keys = keys;
        self
    }

    /// Extracts a record from an index payload. Records missing required
    /// fields are skipped rather than failing the whole response.
    pub fn from_payload(payload: &HashMap<String, Value>) -> Option<Self> {
        let entry_id = payload_str(payload, "entry_id")?;
        let name = payload_str(payload, "name")?;
        let entity_type = match payload_str(payload, "entity_type")?.as_str() {
            "person" => EntityType::Person,
            "organization" | "org" => EntityType::Organization,
            _ => return None,
        };

        Some(Self {
            entry_id,
            name,
            entity_type,
            aliases: payload_str_list(payload, "aliases"),
            identifiers: payload_str_list(payload, "identifiers"),
            source: payload_str(payload, "source"),
            program: payload_str(payload, "program"),
            dob_year: payload_i64(payload, "dob_year").map(|y| y as i32),
            blocking_keys: payload_str_list(payload, "blocking_keys"),
        })
    }

    pub fn from_retrieved_point(point: RetrievedPoint) -> Option<Self> {
        Self::from_payload(&point.payload)
    }

    /// Base conversion into a candidate. Tiers refine the matched fields.
    pub fn to_candidate(&self, source_tier: SourceTier, raw_score: f32) -> Candidate {
        Candidate::new(
            self.entry_id.clone(),
            self.name.clone(),
            self.entity_type,
            source_tier,
            raw_score,
        )
        .with_metadata(CandidateMetadata {
            source: self.source.clone(),
            program: self.program.clone(),
            aliases: self.aliases.clone(),
            identifiers: self.identifiers.clone(),
            dob_year: self.dob_year,
            blocking_keys: self.blocking_keys.clone(),
        })
    }
}

/// A record with its vector-search similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: RawRecord,
    /// Cosine similarity reported by the index.
    pub score: f32,
}

impl ScoredRecord {
    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let record = RawRecord::from_payload(&point.payload)?;
        Some(Self {
            record,
            score: point.score,
        })
    }
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn payload_i64(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
    payload.get(key).and_then(|v| v.as_integer())
}

fn payload_str_list(payload: &HashMap<String, Value>, key: &str) -> Vec<String> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::ListValue(list)) => list
            .values
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::ListValue;

    fn list_value(items: &[&str]) -> Value {
        Value {
            kind: Some(Kind::ListValue(ListValue {
                values: items.iter().map(|s| Value::from(*s)).collect(),
            })),
        }
    }

    fn payload() -> HashMap<String, Value> {
        let mut payload = HashMap::new();
        payload.insert("entry_id".to_string(), Value::from("OFAC-9214"));
        payload.insert("name".to_string(), Value::from("ivan petrov"));
        payload.insert("entity_type".to_string(), Value::from("person"));
        payload.insert("aliases".to_string(), list_value(&["ivan petroff"]));
        payload.insert(
            "identifiers".to_string(),
            list_value(&["INN:1234567890"]),
        );
        payload.insert("source".to_string(), Value::from("ofac_sdn"));
        payload.insert("dob_year".to_string(), Value::from(1980i64));
        payload.insert(
            "blocking_keys".to_string(),
            list_value(&["sx:P361", "fi:i", "by:1980"]),
        );
        payload
    }

    #[test]
    fn test_from_payload_full_record() {
        let record = RawRecord::from_payload(&payload()).expect("should parse");

        assert_eq!(record.entry_id, "OFAC-9214");
        assert_eq!(record.name, "ivan petrov");
        assert_eq!(record.entity_type, EntityType::Person);
        assert_eq!(record.aliases, vec!["ivan petroff"]);
        assert_eq!(record.identifiers, vec!["INN:1234567890"]);
        assert_eq!(record.source.as_deref(), Some("ofac_sdn"));
        assert_eq!(record.dob_year, Some(1980));
        assert_eq!(record.blocking_keys.len(), 3);
    }

    #[test]
    fn test_from_payload_missing_required_field() {
        let mut incomplete = payload();
        incomplete.remove("name");

        assert!(RawRecord::from_payload(&incomplete).is_none());
    }

    #[test]
    fn test_from_payload_unknown_entity_type() {
        let mut unknown = payload();
        unknown.insert("entity_type".to_string(), Value::from("vessel"));

        assert!(RawRecord::from_payload(&unknown).is_none());
    }

    #[test]
    fn test_blocking_key_index_forms() {
        use crate::matchers::soundex;

        let phonetic = BlockingKey::Phonetic(soundex("petrov").expect("code"));
        assert_eq!(phonetic.as_index_key(), "sx:P361");

        assert_eq!(BlockingKey::Initial('i').as_index_key(), "fi:i");
        assert_eq!(BlockingKey::BirthYear(1980).as_index_key(), "by:1980");
    }

    #[test]
    fn test_to_candidate_carries_metadata() {
        let record = RawRecord::from_payload(&payload()).expect("should parse");
        let candidate = record.to_candidate(SourceTier::Blocking, 0.67);

        assert_eq!(candidate.id, "OFAC-9214");
        assert_eq!(candidate.matched_text, "ivan petrov");
        assert_eq!(candidate.source_tier, SourceTier::Blocking);
        assert_eq!(candidate.raw_score, 0.67);
        assert_eq!(candidate.metadata.identifiers, vec!["INN:1234567890"]);
        assert_eq!(candidate.metadata.dob_year, Some(1980));
    }
}
