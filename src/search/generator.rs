use std::collections::BTreeMap;

use tracing::debug;

use crate::search::SearchError;
use crate::vendors::{ServiceType, VendorCombination, VendorRecord};

/// Bounded cross-product of per-service ranked lists. Each list is
/// truncated to `per_service_cap` BEFORE combining, which is the real
/// complexity control; `max_combinations` is only a final cutoff.
///
/// Iteration order is fixed: the first service type is the outermost loop,
/// so truncation at the cutoff is reproducible.
pub fn generate(
    ranked: &BTreeMap<ServiceType, Vec<VendorRecord>>,
    guest_count: u32,
    per_service_cap: usize,
    max_combinations: usize,
) -> Result<Vec<VendorCombination>, SearchError> {
    if ranked.is_empty() {
        return Err(SearchError::NoCandidates {
            service: ServiceType::Venue,
        });
    }
    let cap = per_service_cap.max(1);

    let mut services = Vec::with_capacity(ranked.len());
    let mut pools: Vec<&[VendorRecord]> = Vec::with_capacity(ranked.len());
    for (service, vendors) in ranked {
        if vendors.is_empty() {
            return Err(SearchError::NoCandidates { service: *service });
        }
        services.push(*service);
        pools.push(&vendors[..vendors.len().min(cap)]);
    }

    let mut combinations = Vec::new();
    let mut indices = vec![0usize; pools.len()];
    'outer: loop {
        if combinations.len() >= max_combinations.max(1) {
            debug!("combination cutoff reached at {}", combinations.len());
            break;
        }

        let vendors: BTreeMap<ServiceType, VendorRecord> = services
            .iter()
            .zip(&pools)
            .zip(&indices)
            .map(|((service, pool), idx)| (*service, pool[*idx].clone()))
            .collect();
        let id = format!("combo-{:04}", combinations.len() + 1);
        combinations.push(VendorCombination::from_vendors(id, vendors, guest_count));

        // Odometer increment, last position fastest.
        let mut position = indices.len();
        loop {
            if position == 0 {
                break 'outer;
            }
            position -= 1;
            indices[position] += 1;
            if indices[position] < pools[position].len() {
                break;
            }
            indices[position] = 0;
        }
    }

    Ok(combinations)
}
