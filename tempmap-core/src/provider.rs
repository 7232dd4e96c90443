use crate::{City, Config, FetchMode, Observation, provider::openmeteo::OpenMeteoProvider};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};
use thiserror::Error;

pub mod openmeteo;

/// Why a single city could not be observed. Never fatal for a fetch cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("response is missing {0}")]
    MissingField(String),
}

/// Something that can report one city's temperature.
#[async_trait]
pub trait TemperatureProvider: Send + Sync + Debug {
    async fn observe(&self, city: &City, mode: FetchMode) -> Result<Observation, ProviderError>;
}

/// Construct the Open-Meteo provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn TemperatureProvider>> {
    let provider = OpenMeteoProvider::new(
        config.api_base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;

    Ok(Box::new(provider))
}

#[async_trait]
impl<T: TemperatureProvider + ?Sized> TemperatureProvider for Box<T> {
    async fn observe(&self, city: &City, mode: FetchMode) -> Result<Observation, ProviderError> {
        (**self).observe(city, mode).await
    }
}
