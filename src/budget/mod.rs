pub mod allocator;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vendors::ServiceType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventClass {
    Luxury,
    Standard,
    Intimate,
}

impl Display for EventClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Luxury => "luxury",
            Self::Standard => "standard",
            Self::Intimate => "intimate",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Balanced,
    VenueFocused,
    ExperienceFocused,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Balanced,
        StrategyKind::VenueFocused,
        StrategyKind::ExperienceFocused,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::VenueFocused => "venue_focused",
            Self::ExperienceFocused => "experience_focused",
        }
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

/// One named way of splitting the budget across the requested services.
/// The self-fitness score ranks strategies against each other; it is not
/// the search objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationStrategy {
    pub kind: StrategyKind,
    pub event_class: EventClass,
    pub amounts: BTreeMap<ServiceType, f64>,
    pub self_fitness: f64,
}

impl AllocationStrategy {
    pub fn total_allocated(&self) -> f64 {
        self.amounts.values().sum()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("no service types requested")]
    NoServices,
    #[error("invalid requirement: {0}")]
    InvalidRequirement(#[from] crate::requirements::RequirementError),
}
