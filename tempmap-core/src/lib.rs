//! Core library for the `tempmap` CLI.
//!
//! This crate defines:
//! - The city registries and the typed reading model
//! - Temperature providers (Open-Meteo) and a per-city fault-tolerant fetcher
//! - A time-boxed fetch cache passed explicitly by the caller
//! - Temperature to height/color encoding
//! - Table and deck.gl column-map presentation
//! - The interactive dashboard session and on-disk configuration
//!
//! It is used by `tempmap-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod city;
pub mod config;
pub mod dashboard;
pub mod encode;
pub mod fetch;
pub mod model;
pub mod present;
pub mod provider;

pub use cache::{FetchCache, FetchKey};
pub use city::{City, CityRegistry, CitySet, MapView, RegistryError};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardView};
pub use encode::{ColorPolicy, HeightScale, elevation};
pub use model::{CityFailure, FetchMode, FetchReport, Hour, Observation, Reading, Rgba};
pub use present::{ColumnMap, MapOptions, ReadingTable, SortOrder};
pub use provider::{ProviderError, TemperatureProvider};
