use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::vendors::ServiceType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientRequirement {
    /// Guest headcount per sub-event, e.g. "ceremony" and "reception".
    pub guest_counts: BTreeMap<String, u32>,
    pub total_budget: f64,
    #[serde(default)]
    pub vision_text: String,
    #[serde(default)]
    pub preferred_venue_types: Vec<String>,
    #[serde(default)]
    pub preferred_cuisines: Vec<String>,
    #[serde(default)]
    pub preferred_styles: Vec<String>,
    #[serde(default)]
    pub essential_amenities: Vec<String>,
    #[serde(default)]
    pub dietary_requirements: Vec<String>,
    #[serde(default)]
    pub bar_service: bool,
    #[serde(default)]
    pub priority_weights: BTreeMap<ServiceType, f64>,
    /// Keyword categories for style/setting/mood. Supplied directly by an
    /// upstream extraction service, or mined from the vision text via
    /// [`ClientRequirement::mine_soft_preferences`] when left empty.
    #[serde(default)]
    pub soft_preferences: SoftPreferences,
}

#[derive(Debug, Error, PartialEq)]
pub enum RequirementError {
    #[error("no guest counts provided")]
    NoGuests,
    #[error("guest count for {0} must be at least 1")]
    GuestCountZero(String),
    #[error("total budget must be positive, got {0}")]
    NonPositiveBudget(f64),
}

impl ClientRequirement {
    pub fn validate(&self) -> Result<(), RequirementError> {
        if self.guest_counts.is_empty() {
            return Err(RequirementError::NoGuests);
        }
        for (sub_event, count) in &self.guest_counts {
            if *count == 0 {
                return Err(RequirementError::GuestCountZero(sub_event.clone()));
            }
        }
        if self.total_budget <= 0.0 {
            return Err(RequirementError::NonPositiveBudget(self.total_budget));
        }
        Ok(())
    }

    /// Peak headcount across sub-events; venue capacity and catering are
    /// sized against this.
    pub fn max_guest_count(&self) -> u32 {
        self.guest_counts.values().copied().max().unwrap_or(1)
    }

    /// Mines the vision text for soft preferences when none were supplied.
    /// Explicitly provided preferences always win over mined keywords.
    pub fn mine_soft_preferences(&mut self) {
        if !self.soft_preferences.is_empty() || self.vision_text.trim().is_empty() {
            return;
        }
        self.soft_preferences =
            extract_or_default(&KeywordExtractor::with_defaults(), &self.vision_text);
    }

    pub fn sample() -> Self {
        let mut guest_counts = BTreeMap::new();
        guest_counts.insert("ceremony".to_string(), 180);
        guest_counts.insert("reception".to_string(), 250);
        Self {
            guest_counts,
            total_budget: 1_500_000.0,
            vision_text: "An elegant garden wedding with candid photography".to_string(),
            preferred_venue_types: vec!["garden".to_string(), "palace".to_string()],
            preferred_cuisines: vec!["north_indian".to_string(), "continental".to_string()],
            preferred_styles: vec!["candid".to_string(), "traditional".to_string()],
            essential_amenities: vec!["parking".to_string(), "air_conditioning".to_string()],
            dietary_requirements: vec!["vegetarian".to_string()],
            bar_service: true,
            priority_weights: BTreeMap::new(),
            soft_preferences: SoftPreferences::default(),
        }
    }
}

/// Keyword categories extracted from free text, e.g.
/// `{"style": ["candid"], "setting": ["garden"]}`. Plain data only; the
/// extraction service behind it is out of scope for the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SoftPreferences {
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

impl SoftPreferences {
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(|v| v.is_empty())
    }

    pub fn all_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self
            .categories
            .values()
            .flatten()
            .map(|t| t.trim().to_ascii_lowercase())
            .collect();
        terms.sort();
        terms.dedup();
        terms
    }
}

pub trait PreferenceExtractor {
    fn extract(&self, text: &str) -> anyhow::Result<SoftPreferences>;
}

/// Best-effort extraction: an extractor failure degrades to empty
/// preferences rather than failing the plan.
pub fn extract_or_default(extractor: &dyn PreferenceExtractor, text: &str) -> SoftPreferences {
    match extractor.extract(text) {
        Ok(preferences) => preferences,
        Err(err) => {
            warn!("preference extraction failed, continuing without: {err}");
            SoftPreferences::default()
        }
    }
}

/// Deterministic fallback extractor: scans the text for terms from a fixed
/// vocabulary, bucketed by category.
pub struct KeywordExtractor {
    vocabulary: BTreeMap<String, Vec<String>>,
}

impl KeywordExtractor {
    pub fn new(vocabulary: BTreeMap<String, Vec<String>>) -> Self {
        Self { vocabulary }
    }

    pub fn with_defaults() -> Self {
        let mut vocabulary = BTreeMap::new();
        vocabulary.insert(
            "style".to_string(),
            vec![
                "candid".to_string(),
                "traditional".to_string(),
                "cinematic".to_string(),
                "vintage".to_string(),
                "modern".to_string(),
            ],
        );
        vocabulary.insert(
            "setting".to_string(),
            vec![
                "garden".to_string(),
                "palace".to_string(),
                "beach".to_string(),
                "ballroom".to_string(),
                "rooftop".to_string(),
            ],
        );
        vocabulary.insert(
            "mood".to_string(),
            vec![
                "luxury".to_string(),
                "elegant".to_string(),
                "intimate".to_string(),
                "festive".to_string(),
            ],
        );
        Self { vocabulary }
    }
}

impl PreferenceExtractor for KeywordExtractor {
    fn extract(&self, text: &str) -> anyhow::Result<SoftPreferences> {
        let haystack = text.to_ascii_lowercase();
        let mut categories = BTreeMap::new();
        for (category, terms) in &self.vocabulary {
            let hits: Vec<String> = terms
                .iter()
                .filter(|term| haystack.contains(term.as_str()))
                .cloned()
                .collect();
            if !hits.is_empty() {
                categories.insert(category.clone(), hits);
            }
        }
        Ok(SoftPreferences { categories })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        extract_or_default, ClientRequirement, KeywordExtractor, PreferenceExtractor,
        RequirementError, SoftPreferences,
    };

    #[test]
    fn validates_structural_invariants() {
        let mut requirement = ClientRequirement::sample();
        assert!(requirement.validate().is_ok());

        requirement.total_budget = -5.0;
        assert_eq!(
            requirement.validate(),
            Err(RequirementError::NonPositiveBudget(-5.0))
        );

        let mut requirement = ClientRequirement::sample();
        requirement.guest_counts.insert("sangeet".to_string(), 0);
        assert!(matches!(
            requirement.validate(),
            Err(RequirementError::GuestCountZero(_))
        ));
    }

    #[test]
    fn keyword_extractor_buckets_terms() {
        let extractor = KeywordExtractor::with_defaults();
        let prefs = extractor
            .extract("a luxury garden wedding with candid photos")
            .expect("extraction failed");
        assert_eq!(
            prefs.categories.get("style"),
            Some(&vec!["candid".to_string()])
        );
        assert_eq!(
            prefs.categories.get("setting"),
            Some(&vec!["garden".to_string()])
        );
    }

    #[test]
    fn failed_extraction_degrades_to_empty() {
        struct Broken;
        impl PreferenceExtractor for Broken {
            fn extract(&self, _text: &str) -> anyhow::Result<SoftPreferences> {
                Err(anyhow::anyhow!("model unavailable"))
            }
        }
        let prefs = extract_or_default(&Broken, "anything");
        assert!(prefs.is_empty());
    }

    #[test]
    fn mining_fills_only_empty_preferences() {
        let mut requirement = ClientRequirement::sample();
        requirement.mine_soft_preferences();
        assert_eq!(
            requirement.soft_preferences.categories.get("style"),
            Some(&vec!["candid".to_string()])
        );
        assert_eq!(
            requirement.soft_preferences.categories.get("setting"),
            Some(&vec!["garden".to_string()])
        );

        // Explicit preferences are never overwritten by mined ones.
        let mut explicit = ClientRequirement::sample();
        explicit
            .soft_preferences
            .categories
            .insert("style".to_string(), vec!["vintage".to_string()]);
        explicit.mine_soft_preferences();
        assert_eq!(
            explicit.soft_preferences.categories.get("style"),
            Some(&vec!["vintage".to_string()])
        );
    }
}
