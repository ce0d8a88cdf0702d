//! Fact extraction from untrusted LLM output.
//!
//! The extraction prompt requests strict JSON, but models pad responses
//! with prose, so only the substring from the first `{` to the last `}` is
//! treated as candidate JSON. Parsing yields a tagged [`ParseOutcome`]
//! instead of an error: the merge step branches on a value, and a single
//! malformed response never aborts a batch.

use serde::Deserialize;

use nebulus_types::memory::{Entity, Relation};

/// Instruction sent once per memory item, with the item's content appended.
pub const EXTRACTION_PROMPT: &str = r#"Analyze the following text and extract key entities and relationships.
Return ONLY a JSON object with this structure:
{
    "entities": [{"id": "EntityName", "type": "EntityType"}],
    "relations": [
        {"source": "EntityName", "target": "TargetEntity",
          "relation": "RELATION_TYPE"}
    ]
}

Text: "#;

/// Build the user-message content for one memory item.
pub fn extraction_prompt(content: &str) -> String {
    format!("{EXTRACTION_PROMPT}\"{content}\"")
}

/// An entity record as the model returned it, before validation.
///
/// Fields are optional so that a record missing `id` is skipped with a
/// warning rather than failing the whole response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntity {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
}

impl RawEntity {
    /// Validate into an [`Entity`]. A missing id is unrecoverable; a
    /// missing type falls back to "Unknown".
    pub fn into_entity(self) -> Option<Entity> {
        let id = self.id.filter(|id| !id.is_empty())?;
        Some(Entity::new(
            id,
            self.entity_type.unwrap_or_else(|| "Unknown".to_string()),
        ))
    }
}

/// A relation record as the model returned it, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRelation {
    pub source: Option<String>,
    pub target: Option<String>,
    pub relation: Option<String>,
}

impl RawRelation {
    /// Validate into a [`Relation`] with the default weight.
    pub fn into_relation(self) -> Option<Relation> {
        let source = self.source.filter(|s| !s.is_empty())?;
        let target = self.target.filter(|t| !t.is_empty())?;
        let relation = self.relation.filter(|r| !r.is_empty())?;
        Some(Relation::new(source, target, relation))
    }
}

/// The fact set extracted from one response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FactSet {
    #[serde(default)]
    pub entities: Vec<RawEntity>,
    #[serde(default)]
    pub relations: Vec<RawRelation>,
}

/// Result of defensively parsing one raw response.
#[derive(Debug)]
pub enum ParseOutcome {
    Facts(FactSet),
    Malformed(String),
}

/// Parse the substring between the first `{` and the last `}` as a fact set.
///
/// Absent braces or invalid JSON produce [`ParseOutcome::Malformed`] with
/// the reason; the caller decides to log and degrade to an empty fact set.
pub fn parse_extraction(raw: &str) -> ParseOutcome {
    let Some(start) = raw.find('{') else {
        return ParseOutcome::Malformed("no JSON object in response".to_string());
    };
    let Some(end) = raw.rfind('}') else {
        return ParseOutcome::Malformed("no JSON object in response".to_string());
    };
    if end < start {
        return ParseOutcome::Malformed("no JSON object in response".to_string());
    }

    match serde_json::from_str::<FactSet>(&raw[start..=end]) {
        Ok(facts) => ParseOutcome::Facts(facts),
        Err(e) => ParseOutcome::Malformed(format!("invalid JSON in response: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strict_json() {
        let raw = r#"{"entities": [{"id": "prod-1", "type": "Server"}],
                      "relations": [{"source": "prod-1", "target": "10.0.0.1", "relation": "HAS_IP"}]}"#;
        let ParseOutcome::Facts(facts) = parse_extraction(raw) else {
            panic!("expected facts");
        };
        assert_eq!(facts.entities.len(), 1);
        assert_eq!(facts.relations.len(), 1);
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let raw = concat!(
            "Sure! Here is the extraction you asked for:\n",
            r#"{"entities": [{"id": "Alice", "type": "Person"}], "relations": []}"#,
            "\nLet me know if you need anything else."
        );
        let ParseOutcome::Facts(facts) = parse_extraction(raw) else {
            panic!("expected facts");
        };
        assert_eq!(facts.entities[0].id.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_parse_no_braces_is_malformed() {
        let outcome = parse_extraction("I cannot extract entities from this.");
        assert!(matches!(outcome, ParseOutcome::Malformed(_)));
    }

    #[test]
    fn test_parse_broken_json_is_malformed() {
        let outcome = parse_extraction(r#"{"entities": [{"id": }"#);
        assert!(matches!(outcome, ParseOutcome::Malformed(_)));
    }

    #[test]
    fn test_parse_reversed_braces_is_malformed() {
        let outcome = parse_extraction("} nothing here {");
        assert!(matches!(outcome, ParseOutcome::Malformed(_)));
    }

    #[test]
    fn test_parse_missing_lists_default_empty() {
        let ParseOutcome::Facts(facts) = parse_extraction("{}") else {
            panic!("expected facts");
        };
        assert!(facts.entities.is_empty());
        assert!(facts.relations.is_empty());
    }

    #[test]
    fn test_raw_entity_without_id_is_rejected() {
        let raw = RawEntity {
            id: None,
            entity_type: Some("Server".to_string()),
        };
        assert!(raw.into_entity().is_none());
    }

    #[test]
    fn test_raw_entity_without_type_defaults_unknown() {
        let raw = RawEntity {
            id: Some("prod-1".to_string()),
            entity_type: None,
        };
        let entity = raw.into_entity().unwrap();
        assert_eq!(entity.entity_type, "Unknown");
    }

    #[test]
    fn test_raw_relation_missing_field_is_rejected() {
        let raw = RawRelation {
            source: Some("a".to_string()),
            target: None,
            relation: Some("REL".to_string()),
        };
        assert!(raw.into_relation().is_none());
    }

    #[test]
    fn test_raw_relation_defaults_weight() {
        let raw = RawRelation {
            source: Some("a".to_string()),
            target: Some("b".to_string()),
            relation: Some("REL".to_string()),
        };
        assert_eq!(raw.into_relation().unwrap().weight, 1.0);
    }
}
