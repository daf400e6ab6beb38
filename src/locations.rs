use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named point the forecast is fetched for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    /// Stable identifier used in URLs
    pub key: String,
    /// Display name
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(key: &str, name: &str, lat: f64, lon: f64) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            lat,
            lon,
        }
    }
}

/// Ordered, read-only location registry keyed by `Location::key`
#[derive(Debug, Clone)]
pub struct LocationRegistry {
    locations: IndexMap<String, Location>,
}

impl LocationRegistry {
    /// Build from configuration order. Later duplicates of a key are ignored.
    pub fn new(locations: Vec<Location>) -> Self {
        let mut map = IndexMap::new();
        for location in locations {
            let key = normalize_key(&location.key);
            if map.contains_key(&key) {
                tracing::warn!(key = %key, "Duplicate location key ignored");
                continue;
            }
            map.insert(key, location);
        }
        Self { locations: map }
    }

    pub fn get(&self, key: &str) -> Option<&Location> {
        self.locations.get(&normalize_key(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }
}

/// Keys are matched case-insensitively, ignoring surrounding whitespace
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("gijon", "Gijón", 43.5322, -5.6610),
        Location::new("oviedo", "Oviedo", 43.3623, -5.8485),
        Location::new("llanes", "Llanes", 43.4211, -4.7562),
        Location::new("aviles", "Avilés", 43.5567, -5.9256),
        Location::new("luarca", "Luarca", 43.5420, -6.5359),
        Location::new("luanco", "Luanco", 43.6137, -5.7929),
        Location::new("salinas", "Salinas", 43.5753, -5.9585),
        Location::new("alicante", "Alicante", 38.3452, -0.4830),
        Location::new("cudillero", "Cudillero", 43.5629, -6.1453),
        Location::new("ribadesella", "Ribadesella", 43.4631, -5.0567),
    ]
}
