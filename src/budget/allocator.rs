use std::collections::BTreeMap;

use tracing::debug;

use crate::budget::{AllocationError, AllocationStrategy, EventClass, StrategyKind};
use crate::config::KeywordConfig;
use crate::requirements::ClientRequirement;
use crate::vendors::ServiceType;

/// Base percentage template per event class, over the full service set.
/// Renormalized later over only the requested services.
fn base_percentages(class: EventClass) -> BTreeMap<ServiceType, f64> {
    let raw = match class {
        EventClass::Luxury => [0.45, 0.35, 0.12, 0.08],
        EventClass::Intimate => [0.35, 0.45, 0.15, 0.05],
        EventClass::Standard => [0.40, 0.40, 0.15, 0.05],
    };
    ServiceType::ALL.into_iter().zip(raw).collect()
}

pub fn classify_event(requirement: &ClientRequirement, keywords: &KeywordConfig) -> EventClass {
    let vision = requirement.vision_text.to_ascii_lowercase();
    let guests = requirement.max_guest_count();

    let mentions_any = |terms: &[String]| terms.iter().any(|t| vision.contains(t.as_str()));

    if guests > 500 || mentions_any(&keywords.luxury) {
        EventClass::Luxury
    } else if guests < 200 || mentions_any(&keywords.intimate) {
        EventClass::Intimate
    } else {
        EventClass::Standard
    }
}

/// Builds the three allocation variants for the requested services, ranked
/// by their self-fitness score (best first).
pub fn build_strategies(
    requirement: &ClientRequirement,
    services: &[ServiceType],
) -> Result<Vec<AllocationStrategy>, AllocationError> {
    build_strategies_with_keywords(requirement, services, &KeywordConfig::default())
}

pub fn build_strategies_with_keywords(
    requirement: &ClientRequirement,
    services: &[ServiceType],
    keywords: &KeywordConfig,
) -> Result<Vec<AllocationStrategy>, AllocationError> {
    requirement.validate()?;
    if services.is_empty() {
        return Err(AllocationError::NoServices);
    }

    let event_class = classify_event(requirement, keywords);
    debug!("classified event as {event_class} for {} guests", requirement.max_guest_count());

    let base = normalized_base(event_class, services);
    let mut strategies: Vec<AllocationStrategy> = StrategyKind::ALL
        .into_iter()
        .map(|kind| {
            let percentages = derive_variant(kind, &base);
            let amounts = percentages
                .iter()
                .map(|(service, pct)| (*service, pct * requirement.total_budget))
                .collect();
            AllocationStrategy {
                kind,
                event_class,
                amounts,
                self_fitness: strategy_self_fitness(kind, requirement, keywords),
            }
        })
        .collect();

    strategies.sort_by(|a, b| {
        b.self_fitness
            .partial_cmp(&a.self_fitness)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(strategies)
}

/// Base template restricted to the requested services and renormalized to
/// sum to 1.0.
fn normalized_base(class: EventClass, services: &[ServiceType]) -> BTreeMap<ServiceType, f64> {
    let template = base_percentages(class);
    let mut restricted: BTreeMap<ServiceType, f64> = services
        .iter()
        .filter_map(|s| template.get(s).map(|pct| (*s, *pct)))
        .collect();
    let total: f64 = restricted.values().sum();
    if total > 0.0 {
        for pct in restricted.values_mut() {
            *pct /= total;
        }
    }
    restricted
}

/// Applies the variant's percentage-point shifts, keeping the map summing
/// to 1.0 over the present services.
fn derive_variant(
    kind: StrategyKind,
    base: &BTreeMap<ServiceType, f64>,
) -> BTreeMap<ServiceType, f64> {
    let mut shifted = base.clone();
    match kind {
        StrategyKind::Balanced => {}
        StrategyKind::VenueFocused => {
            if shifted.contains_key(&ServiceType::Venue) {
                let boost = 0.10;
                let others_total: f64 = shifted
                    .iter()
                    .filter(|(s, _)| **s != ServiceType::Venue)
                    .map(|(_, pct)| *pct)
                    .sum();
                if others_total > 0.0 {
                    for (service, pct) in shifted.iter_mut() {
                        if *service == ServiceType::Venue {
                            *pct += boost;
                        } else {
                            *pct -= boost * (*pct / others_total);
                        }
                    }
                }
            }
        }
        StrategyKind::ExperienceFocused => {
            let mut boost = 0.0;
            if let Some(pct) = shifted.get_mut(&ServiceType::Photographer) {
                *pct += 0.05;
                boost += 0.05;
            }
            if let Some(pct) = shifted.get_mut(&ServiceType::MakeupArtist) {
                *pct += 0.03;
                boost += 0.03;
            }
            let donors = [ServiceType::Venue, ServiceType::Caterer];
            let donor_count = donors.iter().filter(|s| shifted.contains_key(s)).count();
            if donor_count > 0 && boost > 0.0 {
                let per_donor = boost / donor_count as f64;
                for donor in donors {
                    if let Some(pct) = shifted.get_mut(&donor) {
                        *pct = (*pct - per_donor).max(0.0);
                    }
                }
            }
        }
    }

    // Subtraction floors can leave a small drift; renormalize.
    let total: f64 = shifted.values().sum();
    if total > 0.0 {
        for pct in shifted.values_mut() {
            *pct /= total;
        }
    }
    shifted
}

/// Heuristic match between the client's vision and what the strategy
/// emphasizes. Ranks strategies only; never fed into combination fitness.
fn strategy_self_fitness(
    kind: StrategyKind,
    requirement: &ClientRequirement,
    keywords: &KeywordConfig,
) -> f64 {
    let vision = requirement.vision_text.to_ascii_lowercase();
    let guests = requirement.max_guest_count();
    let mentions_any = |terms: &[String]| terms.iter().any(|t| vision.contains(t.as_str()));

    let mut score: f64 = match kind {
        StrategyKind::Balanced => 0.60,
        StrategyKind::VenueFocused => {
            let mut s = 0.55;
            if mentions_any(&keywords.venue_emphasis) {
                s += 0.20;
            }
            s
        }
        StrategyKind::ExperienceFocused => {
            let mut s = 0.55;
            if mentions_any(&keywords.experience_emphasis) {
                s += 0.20;
            }
            s
        }
    };

    // Large events lean on venue and catering capacity; small ones can
    // spend on the experience services instead.
    if guests >= 300 {
        if matches!(kind, StrategyKind::Balanced | StrategyKind::VenueFocused) {
            score += 0.10;
        }
    } else if guests < 150 && matches!(kind, StrategyKind::ExperienceFocused) {
        score += 0.10;
    }

    round4(score.clamp(0.0, 1.0))
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
