use crate::fitness::ComponentScores;

/// Threshold-rule advice attached to every fitness result. Text only;
/// downstream rendering and delivery are out of scope.
pub fn build_recommendations(components: &ComponentScores, overall: f64) -> Vec<String> {
    let mut recommendations = Vec::new();

    if components.budget_fitness < 0.7 {
        recommendations.push(
            "Budget pressure: consider a different allocation strategy or cheaper vendors for the over-budget services.".to_string(),
        );
    }
    if components.preference_fitness < 0.6 {
        recommendations.push(
            "Weak preference match: broaden vendor sourcing or relax style and amenity requirements.".to_string(),
        );
    }
    if components.compatibility_fitness < 1.0 {
        recommendations.push(
            "Vendors are spread across cities; expect travel coordination overhead.".to_string(),
        );
    }
    if overall >= 0.8 {
        recommendations.push("Highly recommended combination.".to_string());
    } else if overall < 0.5 {
        recommendations
            .push("Weak overall match; broaden sourcing before committing.".to_string());
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::build_recommendations;
    use crate::fitness::ComponentScores;

    #[test]
    fn strong_result_is_recommended() {
        let components = ComponentScores {
            budget_fitness: 0.9,
            preference_fitness: 0.85,
            compatibility_fitness: 1.0,
        };
        let recs = build_recommendations(&components, 0.88);
        assert!(recs.iter().any(|r| r.contains("Highly recommended")));
        assert!(!recs.iter().any(|r| r.contains("Budget pressure")));
    }

    #[test]
    fn budget_pressure_triggers_reallocation_hint() {
        let components = ComponentScores {
            budget_fitness: 0.55,
            preference_fitness: 0.8,
            compatibility_fitness: 0.9,
        };
        let recs = build_recommendations(&components, 0.68);
        assert!(recs.iter().any(|r| r.contains("Budget pressure")));
        assert!(recs.iter().any(|r| r.contains("spread across cities")));
    }
}
