use crate::colormap::ColorScale;
use crate::config::MapConfig;
use crate::data::DataStore;
use crate::processing::{self, MapView, ProvinceCantonSummary};
use crate::types::{CantonChoice, ChoroplethFeature, HealthCenterRecord};
use tracing::debug;

/// Everything one page view needs, recomputed for every selection.
#[derive(Debug)]
pub struct Dashboard<'a> {
    pub choice: CantonChoice,
    pub table: Vec<&'a HealthCenterRecord>,
    pub summary: ProvinceCantonSummary,
    pub view: MapView,
    pub features: Vec<ChoroplethFeature>,
    pub scale: ColorScale,
}

pub fn build<'a>(store: &'a DataStore, choice: CantonChoice, map: &MapConfig) -> Dashboard<'a> {
    let table = processing::select_canton(store.records(), &choice);

    // Chart sums, map takes the max
    let summary = processing::aggregate_by_province_canton(table.iter().copied());
    let per_canton = processing::aggregate_by_canton(table.iter().copied());

    let joined = processing::join_choropleth(store.cantons(), &per_canton);
    let features = processing::displayed_features(joined, &choice);
    let scale = ColorScale::from_values(features.iter().map(|f| f.count));
    let view = processing::map_view(store.cantons(), &choice, map);

    debug!(
        "Dashboard for {:?}: {} rows, {} groups, {} features",
        choice,
        table.len(),
        summary.rows.len(),
        features.len()
    );

    Dashboard { choice, table, summary, view, features, scale }
}
