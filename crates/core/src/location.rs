//! Catalog of monitored forest locations.
//!
//! [`LocationRegistry`] is built once at startup and never mutated. Every
//! other component refers to locations by [`LocationId`] and resolves them
//! through the registry.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::LocationId;

/// One monitored forest area with fixed coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Continent-level grouping, e.g. `"Europe"`.
    pub region: String,
}

impl Location {
    pub fn new(
        id: impl Into<LocationId>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        region: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            region: region.into(),
        }
    }
}

/// Immutable, ordered catalog of locations.
#[derive(Debug, Clone)]
pub struct LocationRegistry {
    locations: Vec<Location>,
}

impl LocationRegistry {
    /// Build a registry, rejecting empty or duplicate ids and coordinates
    /// outside the valid lat/lon ranges.
    pub fn new(locations: Vec<Location>) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(locations.len());

        for loc in &locations {
            if loc.id.as_str().trim().is_empty() {
                return Err(CoreError::Validation(
                    "location id must not be empty".to_string(),
                ));
            }
            if !seen.insert(loc.id.clone()) {
                return Err(CoreError::Validation(format!(
                    "duplicate location id: {}",
                    loc.id
                )));
            }
            if !(-90.0..=90.0).contains(&loc.latitude) {
                return Err(CoreError::Validation(format!(
                    "latitude of {} must be between -90 and 90, got {}",
                    loc.id, loc.latitude
                )));
            }
            if !(-180.0..=180.0).contains(&loc.longitude) {
                return Err(CoreError::Validation(format!(
                    "longitude of {} must be between -180 and 180, got {}",
                    loc.id, loc.longitude
                )));
            }
        }

        Ok(Self { locations })
    }

    /// The built-in catalog of ten forests.
    pub fn forests() -> Self {
        let locations = vec![
            Location::new("yosemite", "Yosemite National Forest", 37.8651, -119.5383, "North America"),
            Location::new("sequoia", "Sequoia National Forest", 36.4864, -118.5658, "North America"),
            Location::new("redwood", "Redwood National Forest", 41.2132, -124.0046, "North America"),
            Location::new("black-forest", "Black Forest, Germany", 48.2647, 8.2735, "Europe"),
            Location::new("amazon", "Amazon Rainforest, Brazil", -3.4653, -62.2159, "South America"),
            Location::new("daintree", "Daintree Rainforest, Australia", -16.25, 145.25, "Oceania"),
            Location::new("sherwood", "Sherwood Forest, UK", 53.2054, -1.0661, "Europe"),
            Location::new("bialowieza", "Białowieża Forest, Poland", 52.7333, 23.8667, "Europe"),
            Location::new("sundarbans", "Sundarbans Forest, Bangladesh", 21.9497, 89.1833, "Asia"),
            Location::new("kakamega", "Kakamega Forest, Kenya", 0.2799, 34.8875, "Africa"),
        ];
        Self { locations }
    }

    /// All locations in catalog order.
    pub fn list_locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn get(&self, id: &LocationId) -> Result<&Location, CoreError> {
        self.locations
            .iter()
            .find(|loc| &loc.id == id)
            .ok_or_else(|| CoreError::location_not_found(id))
    }

    pub fn contains(&self, id: &LocationId) -> bool {
        self.locations.iter().any(|loc| &loc.id == id)
    }

    pub fn by_region<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a Location> + 'a {
        self.locations.iter().filter(move |loc| loc.region == region)
    }

    pub fn ids(&self) -> impl Iterator<Item = &LocationId> {
        self.locations.iter().map(|loc| &loc.id)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn forests_catalog_is_valid() {
        let forests = LocationRegistry::forests();
        assert_eq!(forests.len(), 10);
        // Re-validating the built-in catalog must succeed.
        assert!(LocationRegistry::new(forests.list_locations().to_vec()).is_ok());
    }

    #[test]
    fn get_known_and_unknown() {
        let forests = LocationRegistry::forests();
        let loc = forests.get(&"sherwood".into()).expect("sherwood exists");
        assert_eq!(loc.region, "Europe");

        assert_matches!(
            forests.get(&"atlantis".into()),
            Err(CoreError::NotFound { entity: "location", .. })
        );
    }

    #[test]
    fn list_preserves_catalog_order() {
        let registry = LocationRegistry::new(vec![
            Location::new("b", "B", 0.0, 0.0, "X"),
            Location::new("a", "A", 0.0, 0.0, "X"),
        ])
        .unwrap();
        let ids: Vec<&str> = registry.ids().map(LocationId::as_str).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = LocationRegistry::new(vec![
            Location::new("a", "A", 0.0, 0.0, "X"),
            Location::new("a", "A again", 1.0, 1.0, "X"),
        ]);
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("duplicate"));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(LocationRegistry::new(vec![Location::new("a", "A", 91.0, 0.0, "X")]).is_err());
        assert!(LocationRegistry::new(vec![Location::new("a", "A", 0.0, -181.0, "X")]).is_err());
    }

    #[test]
    fn rejects_blank_id() {
        assert!(LocationRegistry::new(vec![Location::new(" ", "A", 0.0, 0.0, "X")]).is_err());
    }

    #[test]
    fn filters_by_region() {
        let forests = LocationRegistry::forests();
        let europe: Vec<_> = forests.by_region("Europe").map(|l| l.id.as_str()).collect();
        assert_eq!(europe, ["black-forest", "sherwood", "bialowieza"]);
    }
}
