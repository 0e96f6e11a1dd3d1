use tracing::debug;

use crate::budget::AllocationStrategy;
use crate::config::FitnessConfig;
use crate::fitness::recommendations::build_recommendations;
use crate::fitness::{ComponentScores, FitnessResult};
use crate::requirements::ClientRequirement;
use crate::vendors::{ServiceType, VendorCombination, VendorRecord};

/// Neutral contribution when a price, allocation entry, or attribute is
/// missing. Missing data degrades the score; it never aborts scoring.
const NEUTRAL: f64 = 0.5;

/// Pure, deterministic scorer: identical inputs always yield an identical
/// result, which the beam search relies on for reproducible ordering.
pub fn evaluate(
    combination: &VendorCombination,
    requirement: &ClientRequirement,
    allocation: &AllocationStrategy,
    config: &FitnessConfig,
) -> FitnessResult {
    let budget = budget_fitness(combination, requirement, allocation);
    let preference = preference_fitness(combination, requirement);
    let compatibility = compatibility_fitness(combination);

    let overall = round4(
        (config.budget_weight * budget
            + config.preference_weight * preference
            + config.compatibility_weight * compatibility)
            .clamp(0.0, 1.0),
    );

    let component_scores = ComponentScores {
        budget_fitness: round4(budget),
        preference_fitness: round4(preference),
        compatibility_fitness: round4(compatibility),
    };

    FitnessResult {
        overall_fitness_score: overall,
        recommendations: build_recommendations(&component_scores, overall),
        component_scores,
    }
}

/// Per-service price vs allocated amount: unused budget is rewarded up to
/// 1.5x per service, overage penalized linearly down to zero at 100% over.
fn budget_fitness(
    combination: &VendorCombination,
    requirement: &ClientRequirement,
    allocation: &AllocationStrategy,
) -> f64 {
    let guests = requirement.max_guest_count();
    let mut contributions = Vec::with_capacity(combination.vendors.len());

    for (service, vendor) in &combination.vendors {
        let Some(allocated) = allocation.amounts.get(service).copied() else {
            debug!("no allocation entry for {service}, scoring neutral");
            contributions.push(NEUTRAL);
            continue;
        };
        if allocated <= 0.0 {
            contributions.push(NEUTRAL);
            continue;
        }
        let Some(price) = vendor.effective_price(guests) else {
            debug!("vendor {} has no price, scoring neutral", vendor.id);
            contributions.push(NEUTRAL);
            continue;
        };

        if price <= allocated {
            let savings_ratio = (allocated - price) / allocated;
            contributions.push(1.0 + savings_ratio * 0.5);
        } else {
            let overage_ratio = (price - allocated) / allocated;
            contributions.push((1.0 - overage_ratio).max(0.0));
        }
    }

    average(&contributions).clamp(0.0, 1.0)
}

/// Weighted mean of the per-service preference scores. Client priority
/// weights tilt the mean; an absent or non-positive weight counts as 1.0.
fn preference_fitness(combination: &VendorCombination, requirement: &ClientRequirement) -> f64 {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (service, vendor) in &combination.vendors {
        let score = match service {
            ServiceType::Venue => venue_preference(vendor, requirement),
            ServiceType::Caterer => caterer_preference(vendor, requirement),
            ServiceType::Photographer => photographer_preference(vendor, requirement),
            ServiceType::MakeupArtist => makeup_preference(vendor, requirement),
        };
        let weight = requirement
            .priority_weights
            .get(service)
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(1.0);
        weighted_sum += weight * score;
        total_weight += weight;
    }
    if total_weight <= 0.0 {
        return NEUTRAL;
    }
    (weighted_sum / total_weight).clamp(0.0, 1.0)
}

fn venue_preference(vendor: &VendorRecord, requirement: &ClientRequirement) -> f64 {
    let type_score = match &vendor.venue_type {
        Some(venue_type) if !requirement.preferred_venue_types.is_empty() => {
            if contains_ci(&requirement.preferred_venue_types, venue_type) {
                1.0
            } else {
                0.3
            }
        }
        _ => NEUTRAL,
    };
    let amenity_score =
        overlap_ratio(&requirement.essential_amenities, &vendor.amenities).unwrap_or(NEUTRAL);
    let capacity =
        capacity_score(requirement.max_guest_count(), vendor.capacity);
    average(&[type_score, amenity_score, capacity])
}

fn caterer_preference(vendor: &VendorRecord, requirement: &ClientRequirement) -> f64 {
    let cuisine_score =
        overlap_ratio(&requirement.preferred_cuisines, &vendor.cuisines).unwrap_or(NEUTRAL);
    let dietary_score = overlap_ratio(&requirement.dietary_requirements, &vendor.dietary_options)
        .unwrap_or(NEUTRAL);
    if !requirement.bar_service {
        return average(&[cuisine_score, dietary_score]);
    }
    let bar_score = if vendor
        .amenities
        .iter()
        .any(|a| a.to_ascii_lowercase().contains("bar"))
    {
        1.0
    } else {
        0.3
    };
    average(&[cuisine_score, dietary_score, bar_score])
}

fn photographer_preference(vendor: &VendorRecord, requirement: &ClientRequirement) -> f64 {
    let style_score =
        overlap_ratio(&requirement.preferred_styles, &vendor.styles).unwrap_or(NEUTRAL);
    let soft_terms = requirement.soft_preferences.all_terms();
    let deliverable_score = overlap_ratio(&soft_terms, &vendor.deliverables).unwrap_or(NEUTRAL);
    average(&[style_score, deliverable_score])
}

fn makeup_preference(vendor: &VendorRecord, requirement: &ClientRequirement) -> f64 {
    let style_score =
        overlap_ratio(&requirement.preferred_styles, &vendor.styles).unwrap_or(NEUTRAL);
    let soft_terms = requirement.soft_preferences.all_terms();
    let soft_score = overlap_ratio(&soft_terms, &vendor.styles).unwrap_or(NEUTRAL);
    average(&[style_score, soft_score])
}

/// Occupancy sweet spot: 70-95% of capacity scores highest, with partial
/// credit on either side and a sharp drop past full capacity.
fn capacity_score(guests: u32, capacity: Option<u32>) -> f64 {
    let Some(capacity) = capacity else {
        return NEUTRAL;
    };
    if capacity == 0 {
        return NEUTRAL;
    }
    let utilization = f64::from(guests) / f64::from(capacity);
    if utilization > 1.0 {
        0.1
    } else if utilization > 0.95 {
        0.8
    } else if utilization >= 0.70 {
        1.0
    } else if utilization >= 0.40 {
        0.7
    } else {
        0.4
    }
}

/// 1.0 when every vendor shares a city, 0.9 across two cities, 0.7 for
/// three or more. Date-availability slots in as a further multiplicative
/// factor once a source for it exists; until then it is 1.0.
fn compatibility_fitness(combination: &VendorCombination) -> f64 {
    let city_factor = match combination.cities().len() {
        0 | 1 => 1.0,
        2 => 0.9,
        _ => 0.7,
    };
    let availability_factor = 1.0;
    city_factor * availability_factor
}

/// Share of `wanted` that the vendor offers; `None` when the client asked
/// for nothing, so the caller can substitute the neutral default.
fn overlap_ratio(wanted: &[String], offered: &[String]) -> Option<f64> {
    if wanted.is_empty() {
        return None;
    }
    let offered_lower: Vec<String> = offered
        .iter()
        .map(|o| o.trim().to_ascii_lowercase())
        .collect();
    let hits = wanted
        .iter()
        .filter(|w| offered_lower.contains(&w.trim().to_ascii_lowercase()))
        .count();
    Some(hits as f64 / wanted.len() as f64)
}

fn contains_ci(list: &[String], candidate: &str) -> bool {
    let needle = candidate.trim().to_ascii_lowercase();
    list.iter()
        .any(|item| item.trim().to_ascii_lowercase() == needle)
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return NEUTRAL;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{capacity_score, evaluate, overlap_ratio};
    use crate::budget::allocator::build_strategies;
    use crate::budget::StrategyKind;
    use crate::config::FitnessConfig;
    use crate::requirements::ClientRequirement;
    use crate::vendors::{ServiceType, VendorCombination, VendorRecord};

    fn fixture() -> (VendorCombination, ClientRequirement) {
        let requirement = ClientRequirement::sample();
        let guests = requirement.max_guest_count();

        let mut venue = VendorRecord::new("ven-1", "Rose Palace", ServiceType::Venue, "Jaipur")
            .with_price(250_000.0)
            .with_capacity(300)
            .with_rating(4.7);
        venue.venue_type = Some("palace".to_string());
        venue.amenities = vec!["parking".to_string(), "air_conditioning".to_string()];

        let mut caterer =
            VendorRecord::new("cat-1", "Spice Route", ServiceType::Caterer, "Jaipur")
                .with_price(1_400.0)
                .with_rating(4.5);
        caterer.cuisines = vec!["north_indian".to_string(), "continental".to_string()];
        caterer.dietary_options = vec!["vegetarian".to_string(), "vegan".to_string()];

        let mut photographer =
            VendorRecord::new("pho-1", "Lens Loft", ServiceType::Photographer, "Jaipur")
                .with_price(120_000.0)
                .with_rating(4.8);
        photographer.styles = vec!["candid".to_string(), "traditional".to_string()];

        let mut makeup =
            VendorRecord::new("mua-1", "Glow Studio", ServiceType::MakeupArtist, "Jaipur")
                .with_price(40_000.0)
                .with_rating(4.6);
        makeup.styles = vec!["traditional".to_string()];

        let mut vendors = BTreeMap::new();
        vendors.insert(ServiceType::Venue, venue);
        vendors.insert(ServiceType::Caterer, caterer);
        vendors.insert(ServiceType::Photographer, photographer);
        vendors.insert(ServiceType::MakeupArtist, makeup);

        (
            VendorCombination::from_vendors("combo-1", vendors, guests),
            requirement,
        )
    }

    #[test]
    fn same_inputs_score_identically() {
        let (combination, requirement) = fixture();
        let strategies =
            build_strategies(&requirement, &ServiceType::ALL).expect("allocation failed");
        let config = FitnessConfig::default();

        let first = evaluate(&combination, &requirement, &strategies[0], &config);
        for _ in 0..5 {
            let next = evaluate(&combination, &requirement, &strategies[0], &config);
            assert_eq!(next, first);
        }
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let (combination, requirement) = fixture();
        let strategies =
            build_strategies(&requirement, &ServiceType::ALL).expect("allocation failed");
        let config = FitnessConfig::default();

        for strategy in &strategies {
            let result = evaluate(&combination, &requirement, strategy, &config);
            let c = result.component_scores;
            for score in [
                result.overall_fitness_score,
                c.budget_fitness,
                c.preference_fitness,
                c.compatibility_fitness,
            ] {
                assert!((0.0..=1.0).contains(&score), "out of range: {score}");
            }
        }
    }

    #[test]
    fn affordable_single_city_combination_scores_well() {
        // Venue at 250k against a 300k venue allocation, overlapping
        // preferences, everyone in one city.
        let (combination, requirement) = fixture();
        let mut strategy = build_strategies(&requirement, &ServiceType::ALL)
            .expect("allocation failed")
            .into_iter()
            .find(|s| s.kind == StrategyKind::Balanced)
            .expect("missing balanced strategy");
        strategy
            .amounts
            .insert(ServiceType::Venue, 300_000.0);

        let config = FitnessConfig::default();
        let result = evaluate(&combination, &requirement, &strategy, &config);
        assert!(result.component_scores.budget_fitness > 0.5);
        assert!((result.component_scores.compatibility_fitness - 1.0).abs() < 1e-9);
    }

    #[test]
    fn split_cities_reduce_compatibility() {
        let (mut combination, requirement) = fixture();
        if let Some(photographer) = combination.vendors.get_mut(&ServiceType::Photographer) {
            photographer.location_city = "Udaipur".to_string();
        }
        let strategies =
            build_strategies(&requirement, &ServiceType::ALL).expect("allocation failed");
        let result = evaluate(
            &combination,
            &requirement,
            &strategies[0],
            &FitnessConfig::default(),
        );
        assert!((result.component_scores.compatibility_fitness - 0.9).abs() < 1e-9);
    }

    #[test]
    fn missing_price_scores_neutral_not_fatal() {
        let (mut combination, requirement) = fixture();
        if let Some(venue) = combination.vendors.get_mut(&ServiceType::Venue) {
            venue.price = None;
        }
        let strategies =
            build_strategies(&requirement, &ServiceType::ALL).expect("allocation failed");
        let result = evaluate(
            &combination,
            &requirement,
            &strategies[0],
            &FitnessConfig::default(),
        );
        assert!(result.overall_fitness_score > 0.0);
    }

    #[test]
    fn priority_weights_tilt_preference_scoring() {
        let (combination, mut requirement) = fixture();
        let strategies =
            build_strategies(&requirement, &ServiceType::ALL).expect("allocation failed");
        let config = FitnessConfig::default();

        let base = evaluate(&combination, &requirement, &strategies[0], &config);
        // The fixture venue is a perfect match; weighting it up must raise
        // the blended preference score.
        requirement.priority_weights.insert(ServiceType::Venue, 4.0);
        let tilted = evaluate(&combination, &requirement, &strategies[0], &config);
        assert!(
            tilted.component_scores.preference_fitness > base.component_scores.preference_fitness
        );
    }

    #[test]
    fn bar_service_request_rewards_equipped_caterers() {
        let (mut combination, requirement) = fixture();
        assert!(requirement.bar_service);
        let strategies =
            build_strategies(&requirement, &ServiceType::ALL).expect("allocation failed");
        let config = FitnessConfig::default();

        let without_bar = evaluate(&combination, &requirement, &strategies[0], &config);
        if let Some(caterer) = combination.vendors.get_mut(&ServiceType::Caterer) {
            caterer.amenities = vec!["bar_service".to_string()];
        }
        let with_bar = evaluate(&combination, &requirement, &strategies[0], &config);
        assert!(
            with_bar.component_scores.preference_fitness
                > without_bar.component_scores.preference_fitness
        );
    }

    #[test]
    fn capacity_sweet_spot_curve() {
        assert_eq!(capacity_score(240, Some(300)), 1.0); // 80%
        assert_eq!(capacity_score(290, Some(300)), 0.8); // 96.7%
        assert_eq!(capacity_score(330, Some(300)), 0.1); // over capacity
        assert_eq!(capacity_score(150, Some(300)), 0.7); // half full
        assert_eq!(capacity_score(60, Some(300)), 0.4); // mostly empty
        assert_eq!(capacity_score(100, None), 0.5);
    }

    #[test]
    fn overlap_ratio_is_share_of_wants_met() {
        let wanted = vec!["parking".to_string(), "pool".to_string()];
        let offered = vec!["Parking".to_string(), "garden".to_string()];
        assert_eq!(overlap_ratio(&wanted, &offered), Some(0.5));
        assert_eq!(overlap_ratio(&[], &offered), None);
    }
}
