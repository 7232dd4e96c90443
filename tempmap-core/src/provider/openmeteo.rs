use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{City, FetchMode, Hour, Observation};

use super::{ProviderError, TemperatureProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
const TIMEZONE: &str = "Asia/Tokyo";
const TOKYO_OFFSET_SECS: i64 = 9 * 3600;
const VARIABLE: &str = "temperature_2m";

/// Keyless client for the Open-Meteo forecast endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: String, http: Client) -> Self {
        Self { base_url, http }
    }

    async fn get(&self, city: &City, mode: FetchMode) -> Result<String, ProviderError> {
        debug!("GET {} city={} mode={}", self.base_url, city.name, mode);

        let res = self
            .http
            .get(&self.base_url)
            .query(&query(city, mode))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

/// Query string for one city. Times come back in Asia/Tokyo for both modes.
pub fn query(city: &City, mode: FetchMode) -> Vec<(&'static str, String)> {
    let mut query = vec![("latitude", city.lat.to_string()), ("longitude", city.lon.to_string())];
    match mode {
        FetchMode::Current => query.push(("current", VARIABLE.to_string())),
        FetchMode::Hourly(_) => query.push(("hourly", VARIABLE.to_string())),
    }
    query.push(("timezone", TIMEZONE.to_string()));
    query
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: Option<f64>,
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    temperature_2m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    time: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    utc_offset_seconds: Option<i64>,
    current: Option<OmCurrent>,
    hourly: Option<OmHourly>,
}

fn decode(body: &str) -> Result<OmResponse, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Extract `current.temperature_2m` (and `current.time`) from a response body.
pub fn parse_current(body: &str) -> Result<Observation, ProviderError> {
    let response = decode(body)?;
    let offset = response.utc_offset_seconds;
    let current = response
        .current
        .ok_or_else(|| ProviderError::MissingField("current".into()))?;

    let temperature_c = current
        .temperature_2m
        .ok_or_else(|| ProviderError::MissingField("current.temperature_2m".into()))?;

    Ok(Observation {
        temperature_c,
        observed_at: current.time.as_deref().and_then(|t| parse_time(t, offset)),
    })
}

/// Extract `hourly.temperature_2m[hour]` from a response body.
pub fn parse_hourly(body: &str, hour: Hour) -> Result<Observation, ProviderError> {
    let response = decode(body)?;
    let offset = response.utc_offset_seconds;
    let hourly = response
        .hourly
        .ok_or_else(|| ProviderError::MissingField("hourly".into()))?;

    let missing = || ProviderError::MissingField(format!("hourly.temperature_2m[{}]", hour.index()));

    let temperature_c = hourly
        .temperature_2m
        .as_ref()
        .and_then(|series| series.get(hour.index()).copied().flatten())
        .ok_or_else(missing)?;

    Ok(Observation {
        temperature_c,
        observed_at: hourly.time.get(hour.index()).and_then(|t| parse_time(t, offset)),
    })
}

/// Open-Meteo reports times as `YYYY-MM-DDTHH:MM` at `utc_offset_seconds`.
/// The result is always Asia/Tokyo wall-clock time; no offset means it already is.
fn parse_time(raw: &str, utc_offset_secs: Option<i64>) -> Option<NaiveDateTime> {
    let time = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;

    match utc_offset_secs {
        Some(offset) if offset != TOKYO_OFFSET_SECS => {
            time.checked_add_signed(TimeDelta::seconds(TOKYO_OFFSET_SECS - offset))
        }
        _ => Some(time),
    }
}

#[async_trait]
impl TemperatureProvider for OpenMeteoProvider {
    async fn observe(&self, city: &City, mode: FetchMode) -> Result<Observation, ProviderError> {
        let body = self.get(city, mode).await?;

        match mode {
            FetchMode::Current => parse_current(&body),
            FetchMode::Hourly(hour) => parse_hourly(&body, hour),
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
