//! Temperature to visual encoding: column height and fill color.
//!
//! Everything here is pure. Temperatures outside the color band saturate to
//! the band's edge color; they are never extrapolated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{City, Observation, Reading, Rgba};

#[derive(Debug, Error, PartialEq)]
#[error("height scale {0} is out of range ({}..={})", HeightScale::MIN, HeightScale::MAX)]
pub struct ScaleOutOfRange(pub f64);

/// Meters of column height per degree Celsius.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct HeightScale(f64);

impl HeightScale {
    pub const MIN: f64 = 1000.0;
    pub const MAX: f64 = 5000.0;
    pub const DEFAULT: HeightScale = HeightScale(3000.0);

    pub fn new(scale: f64) -> Result<Self, ScaleOutOfRange> {
        if (Self::MIN..=Self::MAX).contains(&scale) {
            Ok(Self(scale))
        } else {
            Err(ScaleOutOfRange(scale))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for HeightScale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for HeightScale {
    type Error = ScaleOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        HeightScale::new(value)
    }
}

impl From<HeightScale> for f64 {
    fn from(scale: HeightScale) -> Self {
        scale.0
    }
}

/// Column height for a temperature. Negative temperatures give a downward column.
pub fn elevation(temperature_c: f64, scale: f64) -> f64 {
    temperature_c * scale
}

/// Lower and upper edge of the gradient band, in °C.
pub const BAND_MIN: f64 = 5.0;
pub const BAND_MAX: f64 = 35.0;

const CHANNEL_STEP: f64 = 255.0 / (BAND_MAX - BAND_MIN);
const GRADIENT_GREEN: u8 = 50;
const GRADIENT_ALPHA: u8 = 200;

pub const COLD: Rgba = Rgba([0, 120, 255, 180]);
pub const MILD: Rgba = Rgba([255, 200, 0, 180]);
pub const HOT: Rgba = Rgba([255, 60, 0, 180]);

/// Bucket thresholds: below `COLD_BELOW` is cold, at or above `HOT_FROM` is hot.
pub const COLD_BELOW: f64 = 10.0;
pub const HOT_FROM: f64 = 25.0;

/// How a temperature becomes a fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorPolicy {
    /// Blue at `BAND_MIN`, red at `BAND_MAX`, linear in between.
    #[default]
    Gradient,
    /// Three fixed colors: cold, mild, hot.
    Buckets,
}

impl ColorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorPolicy::Gradient => "gradient",
            ColorPolicy::Buckets => "buckets",
        }
    }

    pub fn color(&self, temperature_c: f64) -> Rgba {
        match self {
            ColorPolicy::Gradient => gradient_color(temperature_c),
            ColorPolicy::Buckets => bucket_color(temperature_c),
        }
    }
}

impl std::fmt::Display for ColorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ColorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gradient" => Ok(ColorPolicy::Gradient),
            "buckets" | "bucket" => Ok(ColorPolicy::Buckets),
            other => Err(format!("unknown color policy '{other}' (expected gradient or buckets)")),
        }
    }
}

fn clamp_to_band(t: f64) -> f64 {
    if t.is_nan() { BAND_MIN } else { t.clamp(BAND_MIN, BAND_MAX) }
}

fn channel(v: f64) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

pub fn gradient_color(temperature_c: f64) -> Rgba {
    let t = clamp_to_band(temperature_c);
    let r = channel((t - BAND_MIN) * CHANNEL_STEP);
    let b = channel((BAND_MAX - t) * CHANNEL_STEP);
    Rgba([r, GRADIENT_GREEN, b, GRADIENT_ALPHA])
}

pub fn bucket_color(temperature_c: f64) -> Rgba {
    if temperature_c.is_nan() || temperature_c < COLD_BELOW {
        COLD
    } else if temperature_c < HOT_FROM {
        MILD
    } else {
        HOT
    }
}

/// Derive elevation and color for every observation, keeping order.
pub fn encode(
    observations: &[(City, Observation)],
    scale: HeightScale,
    policy: ColorPolicy,
) -> Vec<Reading> {
    observations
        .iter()
        .map(|(city, obs)| Reading {
            city: city.clone(),
            temperature_c: obs.temperature_c,
            observed_at: obs.observed_at,
            elevation: elevation(obs.temperature_c, scale.get()),
            color: policy.color(obs.temperature_c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevation_is_exact_product() {
        for t in [-12.5, -0.1, 0.0, 7.25, 20.0, 38.9] {
            for s in [HeightScale::MIN, 3000.0, HeightScale::MAX] {
                assert_eq!(elevation(t, s), t * s);
            }
        }
        assert!(elevation(-5.0, 3000.0) < 0.0);
    }

    #[test]
    fn tokyo_at_twenty_degrees() {
        let scale = HeightScale::default();
        assert_eq!(elevation(20.0, scale.get()), 60000.0);
        assert_eq!(bucket_color(20.0), Rgba([255, 200, 0, 180]));
    }

    #[test]
    fn gradient_edges() {
        assert_eq!(gradient_color(BAND_MIN), Rgba([0, 50, 255, 200]));
        assert_eq!(gradient_color(BAND_MAX), Rgba([255, 50, 0, 200]));
        assert_eq!(gradient_color(20.0), Rgba([127, 50, 127, 200]));
    }

    #[test]
    fn gradient_saturates_outside_band() {
        assert_eq!(gradient_color(BAND_MIN - 10.0), gradient_color(BAND_MIN));
        assert_eq!(gradient_color(BAND_MAX + 10.0), gradient_color(BAND_MAX));
        assert_eq!(gradient_color(40.0), gradient_color(35.0));
        assert_eq!(gradient_color(-273.0), gradient_color(BAND_MIN));
    }

    #[test]
    fn gradient_is_monotonic_across_band() {
        let mut prev = gradient_color(BAND_MIN);
        let mut t = BAND_MIN;
        while t <= BAND_MAX {
            let c = gradient_color(t);
            assert!(c.r() >= prev.r(), "red dropped at {t}");
            assert!(c.b() <= prev.b(), "blue rose at {t}");
            assert_eq!((c.g(), c.a()), (50, 200));
            prev = c;
            t += 0.25;
        }
    }

    #[test]
    fn nan_does_not_panic() {
        assert_eq!(gradient_color(f64::NAN), gradient_color(BAND_MIN));
        assert_eq!(bucket_color(f64::NAN), COLD);
    }

    #[test]
    fn bucket_thresholds() {
        assert_eq!(bucket_color(9.99), COLD);
        assert_eq!(bucket_color(COLD_BELOW), MILD);
        assert_eq!(bucket_color(24.9), MILD);
        assert_eq!(bucket_color(HOT_FROM), HOT);
        assert_eq!(bucket_color(-20.0), COLD);
        assert_eq!(bucket_color(45.0), HOT);
    }

    #[test]
    fn scale_validation() {
        assert!(HeightScale::new(999.0).is_err());
        assert!(HeightScale::new(5000.5).is_err());
        assert!(HeightScale::new(f64::NAN).is_err());
        assert_eq!(HeightScale::new(1000.0).map(HeightScale::get), Ok(1000.0));
        assert_eq!(HeightScale::new(5000.0).map(HeightScale::get), Ok(5000.0));
    }

    #[test]
    fn color_policy_parses() {
        assert_eq!("Gradient".parse::<ColorPolicy>(), Ok(ColorPolicy::Gradient));
        assert_eq!("buckets".parse::<ColorPolicy>(), Ok(ColorPolicy::Buckets));
        assert!("rainbow".parse::<ColorPolicy>().is_err());
    }

    #[test]
    fn encode_keeps_order_and_fields() {
        let obs = vec![
            (City::new("Tokyo", 35.6895, 139.6917), Observation { temperature_c: 20.0, observed_at: None }),
            (City::new("Sapporo", 43.0642, 141.3469), Observation { temperature_c: -4.0, observed_at: None }),
        ];
        let readings = encode(&obs, HeightScale::default(), ColorPolicy::Buckets);

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].city.name, "Tokyo");
        assert_eq!(readings[0].elevation, 60000.0);
        assert_eq!(readings[0].color, MILD);
        assert_eq!(readings[1].elevation, -12000.0);
        assert_eq!(readings[1].color, COLD);
    }
}
