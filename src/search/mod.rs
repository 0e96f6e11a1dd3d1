pub mod beam;
pub mod generator;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::budget::{AllocationError, AllocationStrategy};
use crate::fitness::FitnessResult;
use crate::requirements::RequirementError;
use crate::timeline::ConflictReport;
use crate::vendors::{ServiceType, VendorCombination};

/// State the beam controller mutates between iterations. Candidates are
/// whatever sourcing has produced so far; the controller only scores and
/// prunes, it never sources vendors itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamState {
    pub candidates: Vec<VendorCombination>,
    pub beam_width: usize,
    pub iteration_count: u32,
    pub max_iterations: u32,
}

impl BeamState {
    pub fn new(candidates: Vec<VendorCombination>, beam_width: usize, max_iterations: u32) -> Self {
        Self {
            candidates,
            beam_width: beam_width.max(1),
            iteration_count: 0,
            max_iterations: max_iterations.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDecision {
    Searching,
    PresentOptions,
}

/// One shortlist entry: the combination, its score, and the final
/// feasibility pass. Low-feasibility entries are flagged, never dropped;
/// the caller decides whether to substitute or warn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOption {
    pub combination: VendorCombination,
    pub fitness: FitnessResult,
    pub conflicts: ConflictReport,
    pub flagged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    pub strategy: AllocationStrategy,
    pub options: Vec<PlanOption>,
    pub iterations: u32,
    /// Set when the search exhausted its iterations without any option
    /// clearing the acceptance threshold. Reported, not fatal.
    pub low_confidence: bool,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no candidate combinations: {service} has no ranked vendors")]
    NoCandidates { service: ServiceType },
    #[error("invalid requirement: {0}")]
    InvalidRequirement(#[from] RequirementError),
    #[error("budget allocation failed: {0}")]
    Allocation(#[from] AllocationError),
    #[error("vendor sourcing failed: {0}")]
    Source(#[from] anyhow::Error),
}
