use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::OncoError;

/// OncoTree code: a letter followed by letters, digits or underscores.
///
/// Codes are case-sensitive in every file this crate writes; only the join
/// against cBioPortal `cancerTypeId` values ignores case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct OncotreeCode(String);

impl OncotreeCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key used to match cohort statistics.
    pub fn cohort_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for OncotreeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for OncotreeCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OncotreeCode {
    type Error = OncoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for OncotreeCode {
    type Err = OncoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let mut chars = trimmed.chars();
        let is_valid = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic())
            && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !is_valid {
            return Err(OncoError::InvalidCode(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub code: OncotreeCode,
    pub name: String,
}

/// Layout of `oncotree_codes.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyFile {
    #[serde(default)]
    pub oncotree_entries: Vec<TaxonomyEntry>,
}

/// Structured reply expected from the language model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneRecommendations {
    #[serde(default)]
    pub mutation_based: Vec<String>,
    #[serde(default)]
    pub expression_based: Vec<String>,
    #[serde(default)]
    pub pathways: Vec<String>,
}

/// Recommendation lists as persisted in the output files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(rename = "Mutation-Based", default)]
    pub mutation_based: Vec<String>,
    #[serde(rename = "Expression-Based", default)]
    pub expression_based: Vec<String>,
    #[serde(rename = "Pathways", default)]
    pub pathways: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Recommendations {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

impl From<GeneRecommendations> for Recommendations {
    fn from(value: GeneRecommendations) -> Self {
        Self {
            mutation_based: value.mutation_based,
            expression_based: value.expression_based,
            pathways: value.pathways,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub name: String,
    pub sample_count: u64,
    pub recommendations: Recommendations,
}

/// Insertion-ordered mapping keyed by OncoTree code.
///
/// Serializes as a JSON object whose key order is the insertion order, so
/// count-sorted files stay sorted on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeMap<V> {
    entries: IndexMap<OncotreeCode, V>,
}

pub type SampleCounts = CodeMap<u64>;
pub type RecommendationSet = CodeMap<RecommendationRecord>;

impl<V> Default for CodeMap<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V> CodeMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&V> {
        self.entries.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Replaces the value in place when the code is already present.
    pub fn insert(&mut self, code: OncotreeCode, value: V) {
        self.entries.insert(code, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OncotreeCode, &V)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &OncotreeCode> {
        self.entries.keys()
    }
}

impl<V> FromIterator<(OncotreeCode, V)> for CodeMap<V> {
    fn from_iter<I: IntoIterator<Item = (OncotreeCode, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_code_valid() {
        let code: OncotreeCode = " BRCA ".parse().unwrap();
        assert_eq!(code.as_str(), "BRCA");
        assert_eq!(code.cohort_key(), "brca");
        assert!("Breast_2".parse::<OncotreeCode>().is_ok());
    }

    #[test]
    fn parse_code_rejects_punctuation() {
        let err = "BRCA;1".parse::<OncotreeCode>().unwrap_err();
        assert_matches!(err, OncoError::InvalidCode(_));
        assert!("1BRCA".parse::<OncotreeCode>().is_err());
        assert!("".parse::<OncotreeCode>().is_err());
        assert!("BR-CA".parse::<OncotreeCode>().is_err());
    }

    #[test]
    fn code_map_keeps_insertion_order() {
        let mut map = SampleCounts::new();
        map.insert("LUAD".parse().unwrap(), 40);
        map.insert("BRCA".parse().unwrap(), 30);
        map.insert("LUAD".parse().unwrap(), 45);

        let keys = map.keys().map(|code| code.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["LUAD", "BRCA"]);
        assert_eq!(map.get("LUAD"), Some(&45));

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"LUAD":45,"BRCA":30}"#);
    }

    #[test]
    fn code_map_lookup_by_str_and_validated_keys() {
        let counts: SampleCounts =
            serde_json::from_str(r#"{"BRCA": 500, "LUAD": 300}"#).unwrap();
        assert!(counts.contains("BRCA"));
        assert_eq!(counts.get("LUAD"), Some(&300));
        assert_eq!(counts.get("brca"), None);

        assert!(serde_json::from_str::<SampleCounts>(r#"{"BRCA;1": 5}"#).is_err());
        let entry = serde_json::from_str::<TaxonomyEntry>(r#"{"code": "1X", "name": "Bad"}"#);
        assert!(entry.is_err());
    }

    #[test]
    fn failed_recommendations_carry_error() {
        let recs = Recommendations::failed("timeout");
        let json = serde_json::to_value(&recs).unwrap();
        assert_eq!(json["error"], "timeout");
        assert_eq!(json["Pathways"], serde_json::json!([]));
        assert!(recs.is_failed());
    }
}
