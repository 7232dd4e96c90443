//! The interactive session: user-adjustable state plus the fetch cache.

use crate::{
    CityFailure, CitySet, ColorPolicy, Config, FetchMode, HeightScale, Hour, MapView,
    cache::FetchCache,
    encode::encode,
    fetch::fetch_cached,
    present::{ColumnMap, MapOptions, ReadingTable, SortOrder},
    provider::TemperatureProvider,
};

/// Everything needed to draw one frame of the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub city_set: CitySet,
    pub mode: FetchMode,
    pub scale: HeightScale,
    pub view: MapView,
    pub table: ReadingTable,
    pub map: ColumnMap,
    pub failures: Vec<CityFailure>,
}

#[derive(Debug)]
pub struct Dashboard<P> {
    provider: P,
    cache: FetchCache,
    city_set: CitySet,
    mode: FetchMode,
    scale: HeightScale,
    sort: SortOrder,
    policy: ColorPolicy,
    map_options: MapOptions,
}

impl<P: TemperatureProvider> Dashboard<P> {
    pub fn new(provider: P, config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        Ok(Self {
            provider,
            cache: FetchCache::new(config.cache_ttl()),
            city_set: CitySet::default(),
            mode: FetchMode::Current,
            scale: config.scale()?,
            sort: SortOrder::default(),
            policy: config.color_policy,
            map_options: config.map_options(false),
        })
    }

    pub fn city_set(&self) -> CitySet {
        self.city_set
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    pub fn scale(&self) -> HeightScale {
        self.scale
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn labels(&self) -> bool {
        self.map_options.labels
    }

    pub fn color_policy(&self) -> ColorPolicy {
        self.policy
    }

    /// `None` switches back to current conditions.
    pub fn set_hour(&mut self, hour: Option<Hour>) {
        self.mode = FetchMode::from(hour);
    }

    pub fn set_scale(&mut self, scale: HeightScale) {
        self.scale = scale;
    }

    pub fn set_city_set(&mut self, city_set: CitySet) {
        self.city_set = city_set;
    }

    pub fn toggle_city_set(&mut self) -> CitySet {
        self.city_set = self.city_set.toggled();
        self.city_set
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    pub fn set_labels(&mut self, labels: bool) {
        self.map_options.labels = labels;
    }

    pub fn set_color_policy(&mut self, policy: ColorPolicy) {
        self.policy = policy;
    }

    /// Forget cached fetches so the next [`Dashboard::view`] hits the provider.
    pub fn refresh(&mut self) {
        self.cache.invalidate_all();
    }

    /// Fetch (memoized) and encode the current selection.
    pub async fn view(&mut self) -> DashboardView {
        let registry = self.city_set.registry();
        let report = fetch_cached(&self.provider, &registry, self.mode, &mut self.cache).await;

        let readings = encode(&report.observations, self.scale, self.policy);
        let table = ReadingTable::new(readings).sorted(self.sort);
        let map = ColumnMap::build(&table, registry.view(), &self.map_options);

        DashboardView {
            city_set: self.city_set,
            mode: self.mode,
            scale: self.scale,
            view: registry.view(),
            table,
            map,
            failures: report.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode::MILD, fetch::testing::ScriptedProvider};

    fn kyushu_provider() -> ScriptedProvider {
        ScriptedProvider::with(&[
            ("Fukuoka", 20.0),
            ("Saga", 21.0),
            ("Nagasaki", 19.0),
            ("Kumamoto", 22.0),
            ("Oita", 18.0),
            ("Miyazaki", 23.0),
            ("Kagoshima", 24.0),
            ("Tokyo", 20.0),
        ])
    }

    fn dashboard(provider: ScriptedProvider) -> Dashboard<ScriptedProvider> {
        Dashboard::new(provider, &Config::default()).unwrap()
    }

    #[tokio::test]
    async fn first_view_fetches_every_kyushu_city() {
        let mut dash = dashboard(kyushu_provider());
        let view = dash.view().await;

        assert_eq!(view.table.len(), 7);
        assert!(view.failures.is_empty());
        assert_eq!(view.map.column_count(), 7);
        assert_eq!(dash.provider.calls(), 7);
    }

    #[tokio::test]
    async fn scale_change_reencodes_without_refetch() {
        let mut dash = dashboard(kyushu_provider());
        dash.view().await;

        dash.set_scale(HeightScale::new(1000.0).unwrap());
        let view = dash.view().await;

        assert_eq!(dash.provider.calls(), 7);
        assert_eq!(view.table.rows()[0].elevation, 20_000.0);
    }

    #[tokio::test]
    async fn hour_change_refetches() {
        let mut dash = dashboard(kyushu_provider());
        dash.view().await;

        dash.set_hour(Some(Hour::new(3).unwrap()));
        let view = dash.view().await;

        assert_eq!(dash.provider.calls(), 14);
        assert_eq!(view.table.rows()[0].temperature_c, 23.0);

        dash.set_hour(None);
        dash.view().await;
        assert_eq!(dash.provider.calls(), 14, "current mode should still be cached");
    }

    #[tokio::test]
    async fn refresh_invalidates_cache() {
        let mut dash = dashboard(kyushu_provider());
        dash.view().await;
        dash.view().await;
        assert_eq!(dash.provider.calls(), 7);

        dash.refresh();
        dash.view().await;
        assert_eq!(dash.provider.calls(), 14);
    }

    #[tokio::test]
    async fn national_set_reports_unknown_cities_as_failures() {
        let mut dash = dashboard(kyushu_provider());
        assert_eq!(dash.toggle_city_set(), CitySet::National);
        dash.set_color_policy(ColorPolicy::Buckets);

        let view = dash.view().await;

        // Scripted provider only knows Tokyo, Fukuoka and Kagoshima.
        assert_eq!(view.table.len(), 3);
        assert_eq!(view.failures.len(), 6);

        let tokyo = view.table.rows().iter().find(|r| r.city.name == "Tokyo").unwrap();
        assert_eq!(tokyo.elevation, 60000.0);
        assert_eq!(tokyo.color, MILD);
    }

    #[tokio::test]
    async fn all_failures_produce_an_empty_view() {
        let mut dash = dashboard(ScriptedProvider::default());
        dash.set_labels(true);
        dash.set_sort(SortOrder::Warmest);

        let view = dash.view().await;

        assert!(view.table.is_empty());
        assert_eq!(view.failures.len(), 7);
        assert_eq!(view.map.column_count(), 0);
        assert_eq!(view.table.render_text(), "(no data)\n");
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = Config { default_scale: 10.0, ..Config::default() };
        assert!(Dashboard::new(ScriptedProvider::default(), &cfg).is_err());
    }
}
