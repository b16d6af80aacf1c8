use crate::chart::format_thousands;
use crate::colormap::ColorScale;
use crate::config::{DisplayConfig, MapConfig};
use crate::processing::MapView;
use crate::render::escape;
use crate::types::ChoroplethFeature;
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::Serialize;
use serde_json::{json, Map};

/// Features with their fill color and tooltip baked into the properties.
pub fn choropleth_collection(
    features: &[ChoroplethFeature],
    scale: &ColorScale,
    display: &DisplayConfig,
) -> FeatureCollection {
    let features = features
        .iter()
        .map(|f| {
            let mut properties = Map::new();
            properties.insert("canton".to_string(), json!(f.canton));
            properties.insert("count".to_string(), json!(f.count));
            properties.insert("fill_color".to_string(), json!(scale.hex(f64::from(f.count))));
            properties.insert(
                "tooltip".to_string(),
                json!(format!(
                    "<b>{}:</b> {}<br><b>{}:</b> {}",
                    escape(&display.columns.canton),
                    escape(&f.canton),
                    escape(&display.count_label),
                    format_thousands(u64::from(f.count)),
                )),
            );

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::from(&f.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection { bbox: None, features, foreign_members: None }
}

/// JSON safe to place inside a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let raw = serde_json::to_string(value).context("Failed to serialize map data")?;
    Ok(raw.replace("</", "<\\/"))
}

pub fn render_legend(scale: &ColorScale, display: &DisplayConfig) -> String {
    format!(
        r#"<div class="legend">
  <div class="legend-caption">{caption}</div>
  <div class="legend-bar" style="background: {gradient};"></div>
  <div class="legend-ticks"><span>{min}</span><span>{max}</span></div>
</div>"#,
        caption = escape(&display.legend_caption),
        gradient = scale.css_gradient(),
        min = format_thousands(scale.min() as u64),
        max = format_thousands(scale.max() as u64),
    )
}

/// Leaflet choropleth: filled polygons, hover highlight, tooltips, legend and
/// a layer control.
pub fn render_map(
    view: &MapView,
    features: &[ChoroplethFeature],
    scale: &ColorScale,
    display: &DisplayConfig,
    config: &MapConfig,
) -> Result<String> {
    let collection = choropleth_collection(features, scale, display);

    Ok(format!(
        r#"<div class="map-wrap">
<div id="map"></div>
{legend}
</div>
<script>
(function() {{
  var map = L.map('map').setView([{lat}, {lon}], {zoom});
  var base = L.tileLayer({tile_url}, {{ attribution: {attribution} }}).addTo(map);
  var data = {data};
  var layer = L.geoJSON(data, {{
    style: function(feature) {{
      return {{ fillColor: feature.properties.fill_color, color: 'black', weight: 0.5, fillOpacity: 0.7 }};
    }},
    onEachFeature: function(feature, l) {{
      l.bindTooltip(feature.properties.tooltip, {{ sticky: true }});
      l.on({{
        mouseover: function(e) {{ e.target.setStyle({{ weight: 3, color: 'black', fillOpacity: 0.9 }}); }},
        mouseout: function(e) {{ layer.resetStyle(e.target); }}
      }});
    }}
  }}).addTo(map);
  var overlays = {{}};
  overlays[{layer_name}] = layer;
  L.control.layers({{ 'OpenStreetMap': base }}, overlays).addTo(map);
}})();
</script>"#,
        legend = render_legend(scale, display),
        lat = view.lat,
        lon = view.lon,
        zoom = view.zoom,
        tile_url = script_json(&config.tile_url)?,
        attribution = script_json(&config.tile_attribution)?,
        data = script_json(&collection)?,
        layer_name = script_json(&display.legend_caption)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{join_choropleth, aggregate_by_canton};
    use crate::processing::tests::{record, square};

    fn features() -> Vec<ChoroplethFeature> {
        let cantons = vec![square("Upala", -85.0, 10.8), square("Limón", -83.2, 9.8)];
        let records = vec![record("Alajuela", "Upala", 2)];
        join_choropleth(&cantons, &aggregate_by_canton(&records))
    }

    #[test]
    fn collection_carries_count_and_color() {
        let features = features();
        let scale = ColorScale::from_values(features.iter().map(|f| f.count));
        let collection = choropleth_collection(&features, &scale, &DisplayConfig::default());

        assert_eq!(collection.features.len(), 2);
        let upala = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(upala["canton"], "Upala");
        assert_eq!(upala["count"], 2);
        assert_eq!(upala["fill_color"], "#800026");

        let limon = collection.features[1].properties.as_ref().unwrap();
        assert_eq!(limon["count"], 0);
        assert_eq!(limon["fill_color"], "#ffffcc");
        assert!(limon["tooltip"].as_str().unwrap().contains("Limón"));
    }

    #[test]
    fn map_html_embeds_view_and_data() {
        let features = features();
        let scale = ColorScale::from_values(features.iter().map(|f| f.count));
        let view = MapView { lat: 9.7489, lon: -83.7534, zoom: 7 };
        let html = render_map(&view, &features, &scale, &DisplayConfig::default(), &MapConfig::default())
            .unwrap();

        assert!(html.contains("setView([9.7489, -83.7534], 7)"));
        assert!(html.contains("\"FeatureCollection\""));
        assert!(html.contains("L.control.layers"));
        assert!(html.contains("Centros de salud por cantón"));
    }

    #[test]
    fn script_json_cannot_close_the_tag() {
        let out = script_json(&"</script><b>").unwrap();
        assert!(!out.contains("</script>"));
    }
}
