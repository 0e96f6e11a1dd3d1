pub mod catalog;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fitness::FitnessResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Venue,
    Caterer,
    Photographer,
    MakeupArtist,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Venue,
        ServiceType::Caterer,
        ServiceType::Photographer,
        ServiceType::MakeupArtist,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Venue => "venue",
            Self::Caterer => "caterer",
            Self::Photographer => "photographer",
            Self::MakeupArtist => "makeup_artist",
        }
    }

    /// Caterers quote per head; everyone else quotes a flat engagement fee.
    pub fn priced_per_guest(&self) -> bool {
        matches!(self, Self::Caterer)
    }
}

impl Display for ServiceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Venue => "Venue",
            Self::Caterer => "Caterer",
            Self::Photographer => "Photographer",
            Self::MakeupArtist => "Makeup Artist",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown service type: {0}")]
pub struct ServiceTypeParseError(pub String);

impl FromStr for ServiceType {
    type Err = ServiceTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "venue" => Ok(Self::Venue),
            "caterer" | "catering" => Ok(Self::Caterer),
            "photographer" | "photography" => Ok(Self::Photographer),
            "makeup_artist" | "makeup" => Ok(Self::MakeupArtist),
            _ => Err(ServiceTypeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Availability {
    #[serde(default)]
    pub blackout_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub restricted_weekdays: Vec<Weekday>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorRecord {
    pub id: String,
    pub name: String,
    pub service_type: ServiceType,
    pub location_city: String,
    /// Flat fee, except caterers where this is the per-guest plate price.
    pub price: Option<f64>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub venue_type: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub dietary_options: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub availability: Option<Availability>,
}

impl VendorRecord {
    pub fn new(id: &str, name: &str, service_type: ServiceType, city: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            service_type,
            location_city: city.to_string(),
            price: None,
            capacity: None,
            venue_type: None,
            amenities: Vec::new(),
            cuisines: Vec::new(),
            dietary_options: Vec::new(),
            styles: Vec::new(),
            deliverables: Vec::new(),
            rating: None,
            availability: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Price the combination actually pays for this vendor, or `None` when
    /// the quote is missing.
    pub fn effective_price(&self, guest_count: u32) -> Option<f64> {
        let price = self.price?;
        if self.service_type.priced_per_guest() {
            Some(price * f64::from(guest_count))
        } else {
            Some(price)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorCombination {
    pub combination_id: String,
    pub vendors: BTreeMap<ServiceType, VendorRecord>,
    pub total_cost: f64,
}

impl VendorCombination {
    pub fn from_vendors(
        combination_id: impl Into<String>,
        vendors: BTreeMap<ServiceType, VendorRecord>,
        guest_count: u32,
    ) -> Self {
        let total_cost = vendors
            .values()
            .filter_map(|v| v.effective_price(guest_count))
            .sum();
        Self {
            combination_id: combination_id.into(),
            vendors,
            total_cost,
        }
    }

    pub fn cities(&self) -> BTreeSet<String> {
        self.vendors
            .values()
            .map(|v| v.location_city.trim().to_ascii_lowercase())
            .collect()
    }

    /// Stable identity key over the member vendors, independent of the
    /// generated `combination_id`. Used to dedupe across sourcing rounds.
    pub fn vendor_key(&self) -> String {
        self.vendors
            .values()
            .map(|v| v.id.as_str())
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// A combination paired with its score. Scoring never mutates the
/// combination itself; it returns this annotated pairing instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCombination {
    pub combination: VendorCombination,
    pub fitness: FitnessResult,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use super::{ServiceType, VendorCombination, VendorRecord};

    #[test]
    fn parses_service_type_aliases() {
        assert_eq!(
            ServiceType::from_str("makeup").expect("parse failed"),
            ServiceType::MakeupArtist
        );
        assert_eq!(
            ServiceType::from_str("Photography").expect("parse failed"),
            ServiceType::Photographer
        );
        assert!(ServiceType::from_str("florist").is_err());
    }

    #[test]
    fn caterer_price_scales_with_guests() {
        let caterer =
            VendorRecord::new("cat-1", "Spice Route", ServiceType::Caterer, "Jaipur")
                .with_price(1_200.0);
        assert_eq!(caterer.effective_price(250), Some(300_000.0));

        let venue = VendorRecord::new("ven-1", "Rose Palace", ServiceType::Venue, "Jaipur")
            .with_price(400_000.0);
        assert_eq!(venue.effective_price(250), Some(400_000.0));
    }

    #[test]
    fn total_cost_sums_effective_prices() {
        let mut vendors = BTreeMap::new();
        vendors.insert(
            ServiceType::Venue,
            VendorRecord::new("ven-1", "Rose Palace", ServiceType::Venue, "Jaipur")
                .with_price(400_000.0),
        );
        vendors.insert(
            ServiceType::Caterer,
            VendorRecord::new("cat-1", "Spice Route", ServiceType::Caterer, "Jaipur")
                .with_price(1_000.0),
        );
        let combo = VendorCombination::from_vendors("combo-1", vendors, 200);
        assert!((combo.total_cost - 600_000.0).abs() < 1e-9);
        assert_eq!(combo.vendor_key(), "ven-1+cat-1");
    }
}
