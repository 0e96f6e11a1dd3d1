use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::requirements::SoftPreferences;
use crate::vendors::{Availability, ServiceType, VendorRecord};

/// Hard filters exclude; soft preferences only reorder. Ranked results,
/// top `limit` returned.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VendorQuery {
    pub city: Option<String>,
    pub max_price: Option<f64>,
    pub min_capacity: Option<u32>,
    #[serde(default)]
    pub soft: SoftPreferences,
    pub limit: usize,
}

/// Seam to the external vendor repository. The core only ever sees the
/// materialized records this returns.
#[async_trait]
pub trait VendorSource: Send + Sync {
    async fn query(
        &self,
        service_type: ServiceType,
        query: &VendorQuery,
    ) -> Result<Vec<VendorRecord>>;
}

/// File-backed source: a JSON array of vendor records, filtered and ranked
/// in memory. Stands in for the real repository in the CLI and in tests.
pub struct CatalogSource {
    vendors: Vec<VendorRecord>,
}

impl CatalogSource {
    pub fn from_vendors(vendors: Vec<VendorRecord>) -> Self {
        Self { vendors }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading vendor catalog: {}", path.display()))?;
        let vendors: Vec<VendorRecord> = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing vendor catalog: {}", path.display()))?;
        Ok(Self { vendors })
    }

    pub fn sample() -> Self {
        let mut vendors = Vec::new();

        let mut v = VendorRecord::new("ven-rose", "Rose Palace", ServiceType::Venue, "Jaipur")
            .with_price(400_000.0)
            .with_capacity(350)
            .with_rating(4.7);
        v.venue_type = Some("palace".to_string());
        v.amenities = vec!["parking".to_string(), "air_conditioning".to_string()];
        vendors.push(v);

        let mut v = VendorRecord::new("ven-fern", "Fern Gardens", ServiceType::Venue, "Jaipur")
            .with_price(280_000.0)
            .with_capacity(280)
            .with_rating(4.4);
        v.venue_type = Some("garden".to_string());
        v.amenities = vec!["parking".to_string(), "open_lawn".to_string()];
        vendors.push(v);

        let mut v = VendorRecord::new("ven-bay", "Bayview Hall", ServiceType::Venue, "Udaipur")
            .with_price(350_000.0)
            .with_capacity(500)
            .with_rating(4.2);
        v.venue_type = Some("ballroom".to_string());
        v.amenities = vec!["valet".to_string(), "air_conditioning".to_string()];
        vendors.push(v);

        let mut v = VendorRecord::new("cat-spice", "Spice Route", ServiceType::Caterer, "Jaipur")
            .with_price(1_400.0)
            .with_rating(4.6);
        v.cuisines = vec!["north_indian".to_string(), "continental".to_string()];
        v.dietary_options = vec!["vegetarian".to_string(), "vegan".to_string()];
        vendors.push(v);

        let mut v = VendorRecord::new("cat-olive", "Olive Banquets", ServiceType::Caterer, "Jaipur")
            .with_price(1_100.0)
            .with_rating(4.3);
        v.cuisines = vec!["continental".to_string(), "italian".to_string()];
        v.dietary_options = vec!["vegetarian".to_string()];
        vendors.push(v);

        let mut v = VendorRecord::new("pho-lens", "Lens Loft", ServiceType::Photographer, "Jaipur")
            .with_price(120_000.0)
            .with_rating(4.8);
        v.styles = vec!["candid".to_string(), "cinematic".to_string()];
        v.deliverables = vec!["album".to_string(), "highlight_film".to_string()];
        vendors.push(v);

        let mut v = VendorRecord::new(
            "pho-frame",
            "Framed Stories",
            ServiceType::Photographer,
            "Udaipur",
        )
        .with_price(95_000.0)
        .with_rating(4.5);
        v.styles = vec!["traditional".to_string()];
        v.deliverables = vec!["album".to_string()];
        v.availability = Some(Availability {
            blackout_dates: vec![],
            restricted_weekdays: vec![chrono::Weekday::Mon],
        });
        vendors.push(v);

        let mut v = VendorRecord::new(
            "mua-glow",
            "Glow Studio",
            ServiceType::MakeupArtist,
            "Jaipur",
        )
        .with_price(45_000.0)
        .with_rating(4.6);
        v.styles = vec!["traditional".to_string(), "glamour".to_string()];
        vendors.push(v);

        let mut v = VendorRecord::new(
            "mua-mist",
            "Mist & Blush",
            ServiceType::MakeupArtist,
            "Jaipur",
        )
        .with_price(30_000.0)
        .with_rating(4.1);
        v.styles = vec!["minimal".to_string()];
        vendors.push(v);

        Self { vendors }
    }
}

#[async_trait]
impl VendorSource for CatalogSource {
    async fn query(
        &self,
        service_type: ServiceType,
        query: &VendorQuery,
    ) -> Result<Vec<VendorRecord>> {
        let mut matches: Vec<&VendorRecord> = self
            .vendors
            .iter()
            .filter(|v| v.service_type == service_type)
            .filter(|v| passes_hard_filters(v, query))
            .collect();

        // Stable sort keeps catalog order for ties, so ranking is
        // reproducible run to run.
        let soft_terms = query.soft.all_terms();
        matches.sort_by(|a, b| {
            rank_score(b, &soft_terms)
                .partial_cmp(&rank_score(a, &soft_terms))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let limit = if query.limit == 0 { matches.len() } else { query.limit };
        Ok(matches.into_iter().take(limit).cloned().collect())
    }
}

fn passes_hard_filters(vendor: &VendorRecord, query: &VendorQuery) -> bool {
    if let Some(city) = &query.city {
        if !vendor.location_city.eq_ignore_ascii_case(city.trim()) {
            return false;
        }
    }
    if let (Some(max_price), Some(price)) = (query.max_price, vendor.price) {
        if price > max_price {
            return false;
        }
    }
    if let Some(min_capacity) = query.min_capacity {
        match vendor.capacity {
            Some(capacity) if capacity >= min_capacity => {}
            Some(_) => return false,
            // Unknown capacity passes; scoring penalizes it later.
            None => {}
        }
    }
    true
}

/// Rating carries the ranking; soft-preference hits add a small nudge on
/// top, never an exclusion.
fn rank_score(vendor: &VendorRecord, soft_terms: &[String]) -> f64 {
    let rating_part = vendor.rating.unwrap_or(3.0) / 5.0;
    if soft_terms.is_empty() {
        return rating_part;
    }
    let haystack: Vec<String> = vendor
        .styles
        .iter()
        .chain(&vendor.deliverables)
        .chain(&vendor.amenities)
        .chain(&vendor.cuisines)
        .chain(vendor.venue_type.iter())
        .map(|s| s.to_ascii_lowercase())
        .collect();
    let hits = soft_terms
        .iter()
        .filter(|t| haystack.contains(&t.to_string()))
        .count();
    rating_part + 0.1 * (hits as f64 / soft_terms.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::{CatalogSource, VendorQuery, VendorSource};
    use crate::vendors::ServiceType;

    #[tokio::test]
    async fn hard_filters_exclude_and_rank_by_rating() {
        let source = CatalogSource::sample();
        let query = VendorQuery {
            city: Some("Jaipur".to_string()),
            max_price: Some(300_000.0),
            min_capacity: Some(200),
            limit: 5,
            ..VendorQuery::default()
        };
        let venues = source
            .query(ServiceType::Venue, &query)
            .await
            .expect("query failed");
        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].id, "ven-fern");
    }

    #[tokio::test]
    async fn soft_preferences_reorder_without_excluding() {
        let source = CatalogSource::sample();
        let mut query = VendorQuery {
            limit: 5,
            ..VendorQuery::default()
        };
        query
            .soft
            .categories
            .insert("style".to_string(), vec!["traditional".to_string()]);
        let photographers = source
            .query(ServiceType::Photographer, &query)
            .await
            .expect("query failed");
        // Both survive; the preference hit nudges the traditional shooter
        // past the higher-rated candid one.
        assert_eq!(photographers.len(), 2);
        assert_eq!(photographers[0].id, "pho-frame");
    }
}
