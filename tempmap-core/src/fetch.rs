use log::{debug, info, warn};
use std::time::Instant;

use crate::{
    CityFailure, CityRegistry, FetchMode, FetchReport,
    cache::{FetchCache, FetchKey},
    provider::TemperatureProvider,
};

/// Ask the provider for every city in registry order, one request at a time.
///
/// A city that fails is logged, recorded in `failures` and left out of
/// `observations`; the remaining cities are still fetched.
pub async fn fetch_readings<P>(provider: &P, registry: &CityRegistry, mode: FetchMode) -> FetchReport
where
    P: TemperatureProvider + ?Sized,
{
    let mut report = FetchReport::default();

    for city in registry.cities() {
        match provider.observe(city, mode).await {
            Ok(obs) => report.observations.push((city.clone(), obs)),
            Err(error) => {
                warn!("failed to fetch temperature for {}: {}", city.name, error);
                report.failures.push(CityFailure { city: city.name.clone(), error });
            }
        }
    }

    info!(
        "fetched {} of {} cities ({mode})",
        report.observations.len(),
        registry.len()
    );
    report
}

/// Like [`fetch_readings`], but served from `cache` while the entry is fresh.
pub async fn fetch_cached<P>(
    provider: &P,
    registry: &CityRegistry,
    mode: FetchMode,
    cache: &mut FetchCache,
) -> FetchReport
where
    P: TemperatureProvider + ?Sized,
{
    fetch_cached_at(provider, registry, mode, cache, Instant::now()).await
}

pub async fn fetch_cached_at<P>(
    provider: &P,
    registry: &CityRegistry,
    mode: FetchMode,
    cache: &mut FetchCache,
    now: Instant,
) -> FetchReport
where
    P: TemperatureProvider + ?Sized,
{
    let key = FetchKey::new(registry.cities(), mode);

    if let Some(hit) = cache.get_at(&key, now) {
        debug!("fetch cache hit ({mode})");
        return hit.clone();
    }

    debug!("fetch cache miss ({mode})");
    let report = fetch_readings(provider, registry, mode).await;
    cache.insert_at(key, report.clone(), now);
    report
}
