pub mod evaluator;
pub mod recommendations;

use serde::{Deserialize, Serialize};

/// Weighted [0,1] score for one vendor combination, with the component
/// breakdown that produced it. Fully recomputed on each evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FitnessResult {
    pub overall_fitness_score: f64,
    pub component_scores: ComponentScores,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ComponentScores {
    pub budget_fitness: f64,
    pub preference_fitness: f64,
    pub compatibility_fitness: f64,
}
