use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{city::City, provider::ProviderError};

#[derive(Debug, Error, PartialEq)]
#[error("hour {0} is out of range (expected 0..=23)")]
pub struct HourOutOfRange(pub u32);

/// Hour of the local day, 0 = midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Hour(u8);

impl Hour {
    pub const MIDNIGHT: Hour = Hour(0);

    pub fn new(hour: u32) -> Result<Self, HourOutOfRange> {
        if hour < 24 { Ok(Self(hour as u8)) } else { Err(HourOutOfRange(hour)) }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u32> for Hour {
    type Error = HourOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Hour::new(value)
    }
}

impl From<Hour> for u32 {
    fn from(hour: Hour) -> Self {
        hour.0 as u32
    }
}

impl std::fmt::Display for Hour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

/// Which temperature to ask the source for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// The latest observed value.
    #[default]
    Current,
    /// The forecast value at the given hour of today (Asia/Tokyo).
    Hourly(Hour),
}

impl FetchMode {
    pub fn hour(&self) -> Option<Hour> {
        match self {
            FetchMode::Current => None,
            FetchMode::Hourly(h) => Some(*h),
        }
    }
}

impl From<Option<Hour>> for FetchMode {
    fn from(hour: Option<Hour>) -> Self {
        hour.map_or(FetchMode::Current, FetchMode::Hourly)
    }
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchMode::Current => f.write_str("current"),
            FetchMode::Hourly(h) => write!(f, "hourly @ {h}"),
        }
    }
}

/// One temperature value as returned by a source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub temperature_c: f64,
    pub observed_at: Option<NaiveDateTime>,
}

/// RGBA fill color, each channel 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }

    pub fn a(&self) -> u8 {
        self.0[3]
    }
}

/// A city's observation plus its derived visual attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub city: City,
    pub temperature_c: f64,
    pub observed_at: Option<NaiveDateTime>,
    pub elevation: f64,
    pub color: Rgba,
}

/// A city the fetcher had to leave out, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct CityFailure {
    pub city: String,
    pub error: ProviderError,
}

impl std::fmt::Display for CityFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.city, self.error)
    }
}

/// Outcome of one fetch cycle. Successful cities keep registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub observations: Vec<(City, Observation)>,
    pub failures: Vec<CityFailure>,
}

impl FetchReport {
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
