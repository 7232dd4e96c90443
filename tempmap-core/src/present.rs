//! Turning encoded readings into something to look at: a sortable text
//! table and a deck.gl column map document.

use serde::Serialize;
use serde_json::{Value, json};
use std::{cmp::Ordering, fmt::Write as _};

use crate::{MapView, Reading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// As listed in the registry.
    #[default]
    Registry,
    Name,
    Coldest,
    Warmest,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Registry => "registry",
            SortOrder::Name => "name",
            SortOrder::Coldest => "coldest",
            SortOrder::Warmest => "warmest",
        }
    }

    pub const fn all() -> &'static [SortOrder] {
        &[SortOrder::Registry, SortOrder::Name, SortOrder::Coldest, SortOrder::Warmest]
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::all()
            .iter()
            .copied()
            .find(|o| o.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sort order '{s}' (expected registry, name, coldest or warmest)"))
    }
}

/// Readings in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingTable {
    rows: Vec<Reading>,
}

impl ReadingTable {
    pub fn new(rows: Vec<Reading>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Reading] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable sort; `Registry` keeps the order the rows were built in.
    pub fn sorted(mut self, order: SortOrder) -> Self {
        let by_temp = |a: &Reading, b: &Reading| {
            a.temperature_c.partial_cmp(&b.temperature_c).unwrap_or(Ordering::Equal)
        };

        match order {
            SortOrder::Registry => {}
            SortOrder::Name => self.rows.sort_by(|a, b| a.city.name.cmp(&b.city.name)),
            SortOrder::Coldest => self.rows.sort_by(by_temp),
            SortOrder::Warmest => self.rows.sort_by(|a, b| by_temp(b, a)),
        }
        self
    }

    /// Plain-text table: city, temperature and (when known) observation time.
    pub fn render_text(&self) -> String {
        if self.rows.is_empty() {
            return "(no data)\n".to_string();
        }

        let name_width = self
            .rows
            .iter()
            .map(|r| r.city.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("City".len());

        let mut out = String::new();
        let _ = writeln!(out, "{:<name_width$}  {:>9}  Observed", "City", "Temp (°C)");
        let _ = writeln!(out, "{}", "-".repeat(name_width + 2 + 9 + 2 + 16));

        for r in &self.rows {
            let observed = r
                .observed_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(out, "{:<name_width$}  {:>9.1}  {}", r.city.name, r.temperature_c, observed);
        }

        out
    }
}

/// Look and feel of the column map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub radius_m: u32,
    pub map_style: String,
    pub labels: bool,
    pub pitch: f64,
    pub bearing: f64,
}

/// `{field}` placeholders are filled from the hovered column's datum.
pub const TOOLTIP_HTML: &str = "<b>{city}</b><br>{temperature} °C";
pub const ATTRIBUTION: &str = "Data source: Open-Meteo.com (Free Weather API)";

pub const DEFAULT_MAP_STYLE: &str = "https://basemaps.cartocdn.com/gl/dark-matter-gl-style/style.json";
pub const DEFAULT_COLUMN_RADIUS_M: u32 = 12_000;

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_COLUMN_RADIUS_M,
            map_style: DEFAULT_MAP_STYLE.to_string(),
            labels: false,
            pitch: 50.0,
            bearing: -10.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct ColumnDatum<'a> {
    city: &'a str,
    lat: f64,
    lon: f64,
    temperature: f64,
    elevation: f64,
    color: [u8; 4],
}

/// A deck.gl JSON document (the `@deck.gl/json` dialect) for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    doc: Value,
}

impl ColumnMap {
    pub fn build(table: &ReadingTable, view: MapView, options: &MapOptions) -> Self {
        let data: Vec<ColumnDatum<'_>> = table
            .rows()
            .iter()
            .map(|r| ColumnDatum {
                city: &r.city.name,
                lat: r.city.lat,
                lon: r.city.lon,
                temperature: r.temperature_c,
                elevation: r.elevation,
                color: r.color.0,
            })
            .collect();

        let mut layers = vec![json!({
            "@@type": "ColumnLayer",
            "id": "temperature-columns",
            "data": data,
            "getPosition": "@@=[lon, lat]",
            "getElevation": "@@=elevation",
            "getFillColor": "@@=color",
            "radius": options.radius_m,
            "extruded": true,
            "pickable": true,
            "autoHighlight": true,
        })];

        if options.labels {
            layers.push(json!({
                "@@type": "TextLayer",
                "id": "city-labels",
                "data": data,
                "getPosition": "@@=[lon, lat, elevation > 0 ? elevation : 0]",
                "getText": "@@=city",
                "getSize": 14,
                "getColor": [255, 255, 255, 230],
                "getTextAnchor": "'middle'",
                "getAlignmentBaseline": "'bottom'",
            }));
        }

        let doc = json!({
            "initialViewState": {
                "latitude": view.lat,
                "longitude": view.lon,
                "zoom": view.zoom,
                "pitch": options.pitch,
                "bearing": options.bearing,
            },
            "mapStyle": options.map_style,
            "layers": layers,
            "tooltip": {
                "html": TOOLTIP_HTML,
                "style": { "color": "white", "backgroundColor": "#2c3e50" },
            },
        });

        Self { doc }
    }

    pub fn document(&self) -> &Value {
        &self.doc
    }

    pub fn column_count(&self) -> usize {
        self.doc["layers"][0]["data"].as_array().map_or(0, Vec::len)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.doc).unwrap_or_else(|_| "{}".to_string())
    }

    /// Standalone HTML page rendering the map with deck.gl from a CDN.
    pub fn render_html(&self, title: &str) -> String {
        // `</` inside a <script> would end it early.
        let json = serde_json::to_string(&self.doc)
            .unwrap_or_else(|_| "{}".to_string())
            .replace("</", "<\\/");

        HTML_TEMPLATE
            .replace("{{TITLE}}", &escape_html(title))
            .replace("{{ATTRIBUTION}}", &escape_html(ATTRIBUTION))
            .replace("{{DECK_JSON}}", &json)
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <title>{{TITLE}}</title>
  <script src="https://unpkg.com/deck.gl@^9.0.0/dist.min.js"></script>
  <script src="https://unpkg.com/@deck.gl/json@^9.0.0/dist.min.js"></script>
  <script src="https://unpkg.com/maplibre-gl@^4.0.0/dist/maplibre-gl.js"></script>
  <link href="https://unpkg.com/maplibre-gl@^4.0.0/dist/maplibre-gl.css" rel="stylesheet" />
  <style>
    body { margin: 0; background: #111; }
    #deck-container { position: absolute; inset: 0; }
    #attribution {
      position: absolute; right: 8px; bottom: 8px; z-index: 1;
      font: 12px sans-serif; color: #ccc; background: rgba(0, 0, 0, 0.5); padding: 2px 6px;
    }
  </style>
</head>
<body>
  <div id="deck-container"></div>
  <div id="attribution">{{ATTRIBUTION}}</div>
  <script>
    const { tooltip, ...spec } = {{DECK_JSON}};
    const converter = new deck.JSONConverter({
      configuration: new deck.JSONConfiguration({ classes: deck })
    });
    const props = converter.convert(spec);
    new deck.DeckGL({
      ...props,
      container: 'deck-container',
      map: maplibregl,
      controller: true,
      getTooltip: ({ object }) => object && tooltip && {
        html: tooltip.html.replace(/\{(\w+)\}/g, (_, key) => object[key] ?? ''),
        style: tooltip.style
      }
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{City, Rgba};

    fn reading(name: &str, t: f64) -> Reading {
        Reading {
            city: City::new(name, 33.0, 130.0),
            temperature_c: t,
            observed_at: None,
            elevation: t * 3000.0,
            color: Rgba([1, 2, 3, 4]),
        }
    }

    fn table() -> ReadingTable {
        ReadingTable::new(vec![reading("Saga", 21.0), reading("Fukuoka", 19.5), reading("Oita", 23.0)])
    }

    fn names(t: &ReadingTable) -> Vec<&str> {
        t.rows().iter().map(|r| r.city.name.as_str()).collect()
    }

    fn view() -> MapView {
        MapView { lat: 32.7, lon: 131.0, zoom: 6.0 }
    }

    #[test]
    fn sorting() {
        assert_eq!(names(&table().sorted(SortOrder::Registry)), ["Saga", "Fukuoka", "Oita"]);
        assert_eq!(names(&table().sorted(SortOrder::Name)), ["Fukuoka", "Oita", "Saga"]);
        assert_eq!(names(&table().sorted(SortOrder::Coldest)), ["Fukuoka", "Saga", "Oita"]);
        assert_eq!(names(&table().sorted(SortOrder::Warmest)), ["Oita", "Saga", "Fukuoka"]);
    }

    #[test]
    fn sort_order_parses_case_insensitively() {
        assert_eq!("Warmest".parse::<SortOrder>(), Ok(SortOrder::Warmest));
        assert!("hottest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn text_table_lists_every_city() {
        let text = table().render_text();
        assert!(text.starts_with("City"));
        assert!(text.contains("Fukuoka"));
        assert!(text.contains("19.5"));
        assert_eq!(text.lines().count(), 2 + 3);
    }

    #[test]
    fn empty_table_renders_without_panicking() {
        let empty = ReadingTable::default().sorted(SortOrder::Warmest);
        assert_eq!(empty.render_text(), "(no data)\n");

        let map = ColumnMap::build(&empty, view(), &MapOptions::default());
        assert_eq!(map.column_count(), 0);
        assert!(map.render_html("empty").contains("\"data\":[]"));
    }

    #[test]
    fn column_layer_carries_position_height_and_color() {
        let map = ColumnMap::build(&table(), view(), &MapOptions::default());
        let doc = map.document();

        assert_eq!(doc["initialViewState"]["zoom"], 6.0);
        assert_eq!(doc["initialViewState"]["pitch"], 50.0);

        let layer = &doc["layers"][0];
        assert_eq!(layer["@@type"], "ColumnLayer");
        assert_eq!(layer["radius"], 12000);
        assert_eq!(layer["data"][0]["city"], "Saga");
        assert_eq!(layer["data"][0]["elevation"], 63000.0);
        assert_eq!(layer["data"][0]["color"], json!([1, 2, 3, 4]));
        assert_eq!(doc["layers"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn tooltip_lives_in_the_document() {
        let map = ColumnMap::build(&table(), view(), &MapOptions::default());
        let tooltip = &map.document()["tooltip"];

        assert_eq!(tooltip["html"], TOOLTIP_HTML);
        assert_eq!(tooltip["style"]["backgroundColor"], "#2c3e50");
        assert!(map.to_json_pretty().contains("{city}"));
    }

    #[test]
    fn html_reads_tooltip_from_document_and_credits_source() {
        let html = ColumnMap::build(&table(), view(), &MapOptions::default()).render_html("Kyushu");

        assert!(html.contains("const { tooltip, ...spec } = {"));
        assert!(html.contains("tooltip.html.replace"));
        assert!(html.contains("<div id=\"attribution\">Data source: Open-Meteo.com"));
    }

    #[test]
    fn labels_add_a_text_layer() {
        let options = MapOptions { labels: true, ..MapOptions::default() };
        let map = ColumnMap::build(&table(), view(), &options);

        assert_eq!(map.document()["layers"][1]["@@type"], "TextLayer");
        assert_eq!(map.column_count(), 3);
    }

    #[test]
    fn html_escapes_script_breakouts() {
        let rows = vec![reading("</script><b>", 10.0)];
        let map = ColumnMap::build(&ReadingTable::new(rows), view(), &MapOptions::default());
        let html = map.render_html("<Kyushu>");

        assert!(html.contains("&lt;Kyushu&gt;"));
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("ColumnLayer"));
    }
}
