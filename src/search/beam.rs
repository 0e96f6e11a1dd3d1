use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::budget::allocator::build_strategies_with_keywords;
use crate::budget::AllocationStrategy;
use crate::config::Config;
use crate::fitness::evaluator::evaluate;
use crate::requirements::ClientRequirement;
use crate::search::generator::generate;
use crate::search::{BeamState, PlanOption, PlanReport, SearchDecision, SearchError};
use crate::timeline::conflicts::detect;
use crate::timeline::Timeline;
use crate::vendors::catalog::{VendorQuery, VendorSource};
use crate::vendors::{ScoredCombination, ServiceType};

/// Scores every current candidate, keeps the top `beam_width`, and bumps
/// the iteration counter. Scoring is an order-preserving map and the sort
/// is stable, so identical inputs always come back in identical order.
pub fn run_iteration(
    state: &mut BeamState,
    requirement: &ClientRequirement,
    allocation: &AllocationStrategy,
    config: &Config,
) -> Vec<ScoredCombination> {
    let scored: Vec<ScoredCombination> = state
        .candidates
        .iter()
        .map(|combination| ScoredCombination {
            combination: combination.clone(),
            fitness: evaluate(combination, requirement, allocation, &config.fitness),
        })
        .collect();

    let retained = retain_top(scored, state.beam_width);
    state.candidates = retained
        .iter()
        .map(|entry| entry.combination.clone())
        .collect();
    state.iteration_count += 1;
    retained
}

/// Top `beam_width` by overall score, stable: ties keep input order, and a
/// lower-scored candidate is never retained over a higher-scored one.
pub fn retain_top(
    mut scored: Vec<ScoredCombination>,
    beam_width: usize,
) -> Vec<ScoredCombination> {
    scored.sort_by(|a, b| {
        b.fitness
            .overall_fitness_score
            .partial_cmp(&a.fitness.overall_fitness_score)
            .unwrap_or(Ordering::Equal)
    });
    scored.truncate(beam_width.max(1));
    scored
}

pub fn should_continue(state: &BeamState, best_score: Option<f64>, config: &Config) -> SearchDecision {
    if state.iteration_count >= state.max_iterations {
        return SearchDecision::PresentOptions;
    }
    if let Some(best) = best_score {
        if best >= config.search.early_stop_threshold {
            debug!("early stop: best score {best} cleared threshold");
            return SearchDecision::PresentOptions;
        }
    }
    SearchDecision::Searching
}

/// Final feasibility pass over the retained beam. Options below the
/// acceptance threshold are flagged but stay in the shortlist.
pub fn finalize(
    retained: Vec<ScoredCombination>,
    event_date: NaiveDate,
    timeline: &Timeline,
    config: &Config,
) -> Vec<PlanOption> {
    retained
        .into_iter()
        .map(|entry| {
            let conflicts = detect(&entry.combination, event_date, timeline, &config.timeline);
            let flagged = conflicts.feasibility_score < config.search.acceptance_threshold;
            if flagged {
                warn!(
                    "combination {} feasibility {} below acceptance threshold",
                    entry.combination.combination_id, conflicts.feasibility_score
                );
            }
            PlanOption {
                combination: entry.combination,
                fitness: entry.fitness,
                conflicts,
                flagged,
            }
        })
        .collect()
}

/// Full pipeline: allocate, source, generate, iterate the beam, then run
/// the feasibility pass. Sourcing broadens between iterations by raising
/// the per-service cap; the beam itself never sources.
pub async fn run_plan(
    source: &dyn VendorSource,
    requirement: &ClientRequirement,
    services: &[ServiceType],
    event_date: NaiveDate,
    timeline: &Timeline,
    config: &Config,
) -> Result<PlanReport, SearchError> {
    requirement.validate()?;
    // Vision text backfills soft preferences so sourcing and scoring see
    // them even when the caller supplied none.
    let mut requirement = requirement.clone();
    requirement.mine_soft_preferences();
    let requirement = &requirement;
    let strategies =
        build_strategies_with_keywords(requirement, services, &config.keywords)?;
    let strategy = strategies
        .into_iter()
        .next()
        .ok_or(SearchError::Allocation(
            crate::budget::AllocationError::NoServices,
        ))?;

    let mut state = BeamState::new(
        Vec::new(),
        config.search.beam_width,
        config.search.max_iterations,
    );
    let mut seen: BTreeSet<String> = BTreeSet::new();

    let retained = loop {
        let round = state.iteration_count;
        let cap = config.search.per_service_cap + 2 * round as usize;
        let sourced = source_round(source, requirement, services, &strategy, cap).await?;
        let generated = generate(
            &sourced,
            requirement.max_guest_count(),
            cap,
            config.search.max_combinations,
        )?;

        let mut fresh = 0usize;
        for combination in generated {
            if seen.insert(combination.vendor_key()) {
                state.candidates.push(combination);
                fresh += 1;
            }
        }
        info!(
            "iteration {}: {} candidates ({fresh} new)",
            round + 1,
            state.candidates.len()
        );

        let retained = run_iteration(&mut state, requirement, &strategy, config);
        let best = retained.first().map(|c| c.fitness.overall_fitness_score);
        if should_continue(&state, best, config) == SearchDecision::PresentOptions {
            break retained;
        }
    };

    let options = finalize(retained, event_date, timeline, config);
    let low_confidence = !options
        .iter()
        .any(|o| o.conflicts.feasibility_score >= config.search.acceptance_threshold);
    if low_confidence {
        warn!("search converged without any option clearing the acceptance threshold");
    }

    Ok(PlanReport {
        strategy,
        options,
        iterations: state.iteration_count,
        low_confidence,
    })
}

async fn source_round(
    source: &dyn VendorSource,
    requirement: &ClientRequirement,
    services: &[ServiceType],
    strategy: &AllocationStrategy,
    cap: usize,
) -> Result<BTreeMap<ServiceType, Vec<crate::vendors::VendorRecord>>, SearchError> {
    let guests = requirement.max_guest_count();
    let mut sourced = BTreeMap::new();
    for service in services {
        // Budget ceiling as a hard filter, loosened by 2x so near-misses
        // stay visible to the scorer instead of vanishing at the source.
        let allocated = strategy.amounts.get(service).copied();
        let max_price = allocated.map(|amount| {
            if service.priced_per_guest() {
                2.0 * amount / f64::from(guests.max(1))
            } else {
                2.0 * amount
            }
        });
        let query = VendorQuery {
            city: None,
            max_price,
            min_capacity: matches!(service, ServiceType::Venue).then_some(guests),
            soft: requirement.soft_preferences.clone(),
            limit: cap,
        };
        let vendors = source.query(*service, &query).await?;
        sourced.insert(*service, vendors);
    }
    Ok(sourced)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use super::{finalize, retain_top, run_plan, should_continue};
    use crate::config::Config;
    use crate::fitness::{ComponentScores, FitnessResult};
    use crate::requirements::ClientRequirement;
    use crate::search::{BeamState, SearchDecision};
    use crate::timeline::Timeline;
    use crate::vendors::catalog::CatalogSource;
    use crate::vendors::{ScoredCombination, ServiceType, VendorCombination, VendorRecord};

    fn scored(id: &str, score: f64) -> ScoredCombination {
        let mut vendors = BTreeMap::new();
        vendors.insert(
            ServiceType::Venue,
            VendorRecord::new(id, id, ServiceType::Venue, "Jaipur").with_price(100_000.0),
        );
        ScoredCombination {
            combination: VendorCombination::from_vendors(id, vendors, 200),
            fitness: FitnessResult {
                overall_fitness_score: score,
                component_scores: ComponentScores {
                    budget_fitness: score,
                    preference_fitness: score,
                    compatibility_fitness: 1.0,
                },
                recommendations: Vec::new(),
            },
        }
    }

    #[test]
    fn retains_exactly_the_top_k_in_order() {
        let scores = [0.9, 0.85, 0.8, 0.75, 0.7, 0.65, 0.6, 0.55, 0.5, 0.45];
        for _ in 0..3 {
            let pool: Vec<ScoredCombination> = scores
                .iter()
                .enumerate()
                // Shuffle-free adversarial order: ascending input.
                .rev()
                .map(|(i, s)| scored(&format!("c{i}"), *s))
                .collect();
            let retained = retain_top(pool, 3);
            let kept: Vec<f64> = retained
                .iter()
                .map(|c| c.fitness.overall_fitness_score)
                .collect();
            assert_eq!(kept, vec![0.9, 0.85, 0.8]);
        }
    }

    #[test]
    fn beam_never_exceeds_width_and_ties_keep_input_order() {
        let pool = vec![
            scored("first", 0.8),
            scored("second", 0.8),
            scored("third", 0.9),
        ];
        let retained = retain_top(pool, 2);
        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].combination.combination_id, "third");
        assert_eq!(retained[1].combination.combination_id, "first");
    }

    #[test]
    fn stops_at_max_iterations_or_high_confidence() {
        let config = Config::default();
        let mut state = BeamState::new(Vec::new(), 3, 3);

        state.iteration_count = 1;
        assert_eq!(
            should_continue(&state, Some(0.5), &config),
            SearchDecision::Searching
        );
        assert_eq!(
            should_continue(&state, Some(0.9), &config),
            SearchDecision::PresentOptions
        );
        state.iteration_count = 3;
        assert_eq!(
            should_continue(&state, Some(0.1), &config),
            SearchDecision::PresentOptions
        );
    }

    #[test]
    fn low_feasibility_options_are_flagged_not_dropped() {
        let mut config = Config::default();
        config.search.acceptance_threshold = 2.0; // everything fails
        let options = finalize(
            vec![scored("c1", 0.9)],
            NaiveDate::from_ymd_opt(2026, 11, 14).expect("bad date"),
            &Timeline::default(),
            &config,
        );
        assert_eq!(options.len(), 1);
        assert!(options[0].flagged);
    }

    #[tokio::test]
    async fn full_plan_is_reproducible() {
        let source = CatalogSource::sample();
        let requirement = ClientRequirement::sample();
        let config = Config::default();
        let date = NaiveDate::from_ymd_opt(2026, 11, 14).expect("bad date");
        let timeline = Timeline::default();

        let first = run_plan(
            &source,
            &requirement,
            &ServiceType::ALL,
            date,
            &timeline,
            &config,
        )
        .await
        .expect("plan failed");
        assert!(!first.options.is_empty());
        assert!(first.options.len() <= config.search.beam_width);

        let second = run_plan(
            &source,
            &requirement,
            &ServiceType::ALL,
            date,
            &timeline,
            &config,
        )
        .await
        .expect("plan failed");
        let keys =
            |report: &crate::search::PlanReport| -> Vec<(String, f64)> {
                report
                    .options
                    .iter()
                    .map(|o| (o.combination.vendor_key(), o.fitness.overall_fitness_score))
                    .collect()
            };
        assert_eq!(keys(&first), keys(&second));
    }

    #[tokio::test]
    async fn vision_text_fills_empty_soft_preferences() {
        let source = CatalogSource::sample();
        let config = Config::default();
        let date = NaiveDate::from_ymd_opt(2026, 11, 14).expect("bad date");
        let timeline = Timeline::default();

        let mut plain = ClientRequirement::sample();
        plain.vision_text.clear();
        let mut visionary = ClientRequirement::sample();
        visionary.vision_text = "a traditional ceremony in a palace".to_string();
        assert!(plain.soft_preferences.is_empty());
        assert!(visionary.soft_preferences.is_empty());

        let base = run_plan(&source, &plain, &ServiceType::ALL, date, &timeline, &config)
            .await
            .expect("plan failed");
        let mined = run_plan(&source, &visionary, &ServiceType::ALL, date, &timeline, &config)
            .await
            .expect("plan failed");

        // The mined keywords reach the scorer, so the shortlist scores
        // shift relative to the keyword-free run.
        assert!(!mined.options.is_empty());
        let scores = |report: &crate::search::PlanReport| -> Vec<f64> {
            report
                .options
                .iter()
                .map(|o| o.fitness.overall_fitness_score)
                .collect()
        };
        assert_ne!(scores(&base), scores(&mined));
    }

    #[tokio::test]
    async fn unreachable_acceptance_marks_plan_low_confidence() {
        let source = CatalogSource::sample();
        let mut config = Config::default();
        config.search.acceptance_threshold = 2.0; // nothing can clear this
        let report = run_plan(
            &source,
            &ClientRequirement::sample(),
            &ServiceType::ALL,
            NaiveDate::from_ymd_opt(2026, 11, 14).expect("bad date"),
            &Timeline::default(),
            &config,
        )
        .await
        .expect("plan failed");
        assert!(report.low_confidence);
        assert!(report.options.iter().all(|o| o.flagged));
        assert!(!report.options.is_empty());
    }

    #[tokio::test]
    async fn empty_catalog_reports_no_candidates() {
        let source = CatalogSource::from_vendors(Vec::new());
        let requirement = ClientRequirement::sample();
        let result = run_plan(
            &source,
            &requirement,
            &ServiceType::ALL,
            NaiveDate::from_ymd_opt(2026, 11, 14).expect("bad date"),
            &Timeline::default(),
            &Config::default(),
        )
        .await;
        assert!(matches!(
            result,
            Err(crate::search::SearchError::NoCandidates { .. })
        ));
    }
}
