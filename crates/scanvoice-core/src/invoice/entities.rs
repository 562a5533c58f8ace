//! Named-entity fallback for the vendor field.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::ConfidenceTier;

use super::rules::patterns::ORGANIZATION_PATTERN;
use super::rules::{is_valid_vendor_name, most_frequent};

/// Entity categories a recognizer may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLabel {
    Organization,
    Person,
    Location,
    Other,
}

/// A recognized entity span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Named-entity recognition capability.
pub trait EntityRecognizer: Send + Sync {
    /// Recognizer name, recorded on the candidates it produces.
    fn name(&self) -> &str;

    /// Entities in document order.
    fn entities(&self, text: &str) -> Vec<Entity>;
}

/// Tags capitalized word runs ending in a corporate suffix as organizations.
#[derive(Debug, Default)]
pub struct PatternEntityRecognizer;

impl PatternEntityRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl EntityRecognizer for PatternEntityRecognizer {
    fn name(&self) -> &str {
        "pattern"
    }

    fn entities(&self, text: &str) -> Vec<Entity> {
        ORGANIZATION_PATTERN
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| Entity::new(m.as_str().trim(), EntityLabel::Organization))
            .collect()
    }
}

/// Vendor chosen by entity recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityVendor {
    pub name: Option<String>,
    pub occurrences: usize,
    pub tier: ConfidenceTier,
}

/// Picks the most frequent valid organization among recognized entities.
pub struct EntityFallbackExtractor<'a> {
    recognizer: &'a dyn EntityRecognizer,
}

impl<'a> EntityFallbackExtractor<'a> {
    pub fn new(recognizer: &'a dyn EntityRecognizer) -> Self {
        Self { recognizer }
    }

    /// `high` when the winner occurs more than once, `medium` when once,
    /// `low` with no vendor when nothing valid was recognized.
    pub fn extract(&self, text: &str) -> EntityVendor {
        let entities = self.recognizer.entities(text);
        let organizations = entities
            .iter()
            .filter(|e| e.label == EntityLabel::Organization)
            .map(|e| e.text.trim())
            .filter(|name| is_valid_vendor_name(name));

        match most_frequent(organizations) {
            Some((name, occurrences)) => {
                debug!(
                    "Entity fallback ({}) chose {:?} ({} occurrences)",
                    self.recognizer.name(),
                    name,
                    occurrences
                );
                let tier = if occurrences > 1 {
                    ConfidenceTier::High
                } else {
                    ConfidenceTier::Medium
                };
                EntityVendor {
                    name: Some(name),
                    occurrences,
                    tier,
                }
            }
            None => EntityVendor {
                name: None,
                occurrences: 0,
                tier: ConfidenceTier::Low,
            },
        }
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct ListRecognizer(Vec<Entity>);

    impl EntityRecognizer for ListRecognizer {
        fn name(&self) -> &str {
            "list"
        }

        fn entities(&self, _text: &str) -> Vec<Entity> {
            self.0.clone()
        }
    }

    fn org(name: &str) -> Entity {
        Entity::new(name, EntityLabel::Organization)
    }

    #[test]
    fn test_single_valid_organization_is_medium() {
        let recognizer = ListRecognizer(vec![
            org("INVOICE"),
            org("Acme Corp"),
            Entity::new("Jane Doe", EntityLabel::Person),
        ]);
        let vendor = EntityFallbackExtractor::new(&recognizer).extract("");

        assert_eq!(vendor.name.as_deref(), Some("Acme Corp"));
        assert_eq!(vendor.occurrences, 1);
        assert_eq!(vendor.tier, ConfidenceTier::Medium);
    }

    #[test]
    fn test_repeated_organization_is_high() {
        let recognizer = ListRecognizer(vec![org("Globex Ltd"), org("Acme Corp"), org("Acme Corp")]);
        let vendor = EntityFallbackExtractor::new(&recognizer).extract("");

        assert_eq!(vendor.name.as_deref(), Some("Acme Corp"));
        assert_eq!(vendor.tier, ConfidenceTier::High);
    }

    #[test]
    fn test_no_valid_organization_is_low() {
        let recognizer = ListRecognizer(vec![org("Total Due"), Entity::new("Berlin", EntityLabel::Location)]);
        let vendor = EntityFallbackExtractor::new(&recognizer).extract("");

        assert_eq!(vendor.name, None);
        assert_eq!(vendor.tier, ConfidenceTier::Low);
    }

    #[test]
    fn test_pattern_recognizer_tags_corporate_suffixes() {
        let entities = PatternEntityRecognizer::new()
            .entities("Remit to Initech Holdings\nShipped by Acme Widgets Inc. via Bob");

        assert_eq!(
            entities,
            vec![
                org("Initech Holdings"),
                org("Acme Widgets Inc."),
            ]
        );
    }
}
