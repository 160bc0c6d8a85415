//! CONSTRUCT result validation.
//!
//! Users declare patterns they expect a CONSTRUCT query to produce; after a
//! successful run every pattern is checked against the returned triples.

use serde::{Deserialize, Serialize};

/// One RDF triple with plain string terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// Subject IRI or blank node label
    pub subject: String,
    /// Predicate IRI
    pub predicate: String,
    /// Object IRI, blank node label, or literal lexical form
    pub object: String,
}

impl Triple {
    /// Creates a triple.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// An expected triple shape.
///
/// Each position is a literal value, `*`, or a prefix followed by `*`.
/// Absent and empty positions match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPattern {
    /// Subject pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Predicate pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    /// Object pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ValidationPattern {
    /// Sets the subject pattern.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the predicate pattern.
    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Sets the object pattern.
    #[must_use]
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }
}

/// Outcome of checking one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// The pattern checked
    pub pattern: ValidationPattern,
    /// Whether at least one triple matched
    pub found: bool,
    /// All matching triples
    pub matching_triples: Vec<Triple>,
}

/// Checks every pattern against the triples.
#[must_use]
pub fn validate(triples: &[Triple], patterns: &[ValidationPattern]) -> Vec<ValidationResult> {
    patterns
        .iter()
        .map(|pattern| {
            let matching_triples: Vec<Triple> = triples
                .iter()
                .filter(|triple| matches_pattern(triple, pattern))
                .cloned()
                .collect();
            ValidationResult {
                pattern: pattern.clone(),
                found: !matching_triples.is_empty(),
                matching_triples,
            }
        })
        .collect()
}

/// Returns true if every present position of the pattern matches the triple.
#[must_use]
pub fn matches_pattern(triple: &Triple, pattern: &ValidationPattern) -> bool {
    position_matches(&triple.subject, pattern.subject.as_deref())
        && position_matches(&triple.predicate, pattern.predicate.as_deref())
        && position_matches(&triple.object, pattern.object.as_deref())
}

fn position_matches(value: &str, pattern: Option<&str>) -> bool {
    match pattern {
        None | Some("" | "*") => true,
        Some(pattern) if value == pattern => true,
        Some(pattern) => pattern
            .strip_suffix('*')
            .is_some_and(|prefix| value.starts_with(prefix)),
    }
}
