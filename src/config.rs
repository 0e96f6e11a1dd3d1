use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fitness: FitnessConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub keywords: KeywordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_beam_width")]
    pub beam_width: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_early_stop_threshold")]
    pub early_stop_threshold: f64,
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,
    #[serde(default = "default_per_service_cap")]
    pub per_service_cap: usize,
    #[serde(default = "default_max_combinations")]
    pub max_combinations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessConfig {
    #[serde(default = "default_budget_weight")]
    pub budget_weight: f64,
    #[serde(default = "default_preference_weight")]
    pub preference_weight: f64,
    #[serde(default = "default_compatibility_weight")]
    pub compatibility_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_max_venue_hours")]
    pub max_venue_hours: f64,
    #[serde(default = "default_max_photographer_hours")]
    pub max_photographer_hours: f64,
}

/// Vocabulary used by event classification and strategy self-scoring.
/// Heuristic data, not contract; override per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default = "default_luxury_keywords")]
    pub luxury: Vec<String>,
    #[serde(default = "default_intimate_keywords")]
    pub intimate: Vec<String>,
    #[serde(default = "default_venue_emphasis_keywords")]
    pub venue_emphasis: Vec<String>,
    #[serde(default = "default_experience_emphasis_keywords")]
    pub experience_emphasis: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<String>,
    pub beam_width: Option<usize>,
    pub max_iterations: Option<u32>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/wedding-oracle/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(beam_width) = overrides.beam_width {
            self.search.beam_width = beam_width.max(1);
        }
        if let Some(max_iterations) = overrides.max_iterations {
            self.search.max_iterations = max_iterations.max(1);
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_catalog_path(&self) -> PathBuf {
        expand_tilde(&self.catalog.path)
    }

    pub fn default_template() -> String {
        let template = r#"[catalog]
path = "~/.local/share/wedding-oracle/vendors.json"

[search]
beam_width = 5
max_iterations = 3
early_stop_threshold = 0.85
acceptance_threshold = 0.6
per_service_cap = 3
max_combinations = 50

[fitness]
budget_weight = 0.40
preference_weight = 0.45
compatibility_weight = 0.15

[timeline]
max_venue_hours = 12.0
max_photographer_hours = 8.0

[keywords]
luxury = ["luxury", "opulent", "grand", "lavish", "extravagant", "five-star"]
intimate = ["intimate", "cozy", "small", "private", "minimal", "close-knit"]
venue_emphasis = ["garden", "palace", "beach", "ballroom", "scenic", "outdoor"]
experience_emphasis = ["photo", "candid", "memories", "album", "makeup", "glamour"]
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            search: SearchConfig::default(),
            fitness: FitnessConfig::default(),
            timeline: TimelineConfig::default(),
            keywords: KeywordConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            beam_width: default_beam_width(),
            max_iterations: default_max_iterations(),
            early_stop_threshold: default_early_stop_threshold(),
            acceptance_threshold: default_acceptance_threshold(),
            per_service_cap: default_per_service_cap(),
            max_combinations: default_max_combinations(),
        }
    }
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            budget_weight: default_budget_weight(),
            preference_weight: default_preference_weight(),
            compatibility_weight: default_compatibility_weight(),
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            max_venue_hours: default_max_venue_hours(),
            max_photographer_hours: default_max_photographer_hours(),
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            luxury: default_luxury_keywords(),
            intimate: default_intimate_keywords(),
            venue_emphasis: default_venue_emphasis_keywords(),
            experience_emphasis: default_experience_emphasis_keywords(),
        }
    }
}

fn default_catalog_path() -> String {
    "~/.local/share/wedding-oracle/vendors.json".to_string()
}

fn default_beam_width() -> usize {
    5
}

fn default_max_iterations() -> u32 {
    3
}

fn default_early_stop_threshold() -> f64 {
    0.85
}

fn default_acceptance_threshold() -> f64 {
    0.6
}

fn default_per_service_cap() -> usize {
    3
}

fn default_max_combinations() -> usize {
    50
}

fn default_budget_weight() -> f64 {
    0.40
}

fn default_preference_weight() -> f64 {
    0.45
}

fn default_compatibility_weight() -> f64 {
    0.15
}

fn default_max_venue_hours() -> f64 {
    12.0
}

fn default_max_photographer_hours() -> f64 {
    8.0
}

fn default_luxury_keywords() -> Vec<String> {
    ["luxury", "opulent", "grand", "lavish", "extravagant", "five-star"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_intimate_keywords() -> Vec<String> {
    ["intimate", "cozy", "small", "private", "minimal", "close-knit"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_venue_emphasis_keywords() -> Vec<String> {
    ["garden", "palace", "beach", "ballroom", "scenic", "outdoor"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_experience_emphasis_keywords() -> Vec<String> {
    ["photo", "candid", "memories", "album", "makeup", "glamour"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn template_round_trips_through_defaults() {
        let parsed: Config =
            toml::from_str(&Config::default_template()).expect("template should parse");
        let defaults = Config::default();
        assert_eq!(parsed.search.beam_width, defaults.search.beam_width);
        assert!((parsed.fitness.budget_weight - defaults.fitness.budget_weight).abs() < 1e-9);
        assert_eq!(parsed.keywords.luxury, defaults.keywords.luxury);
    }
}
