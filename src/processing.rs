use crate::config::MapConfig;
use crate::types::{
    AggregatedCantonCount, CantonChoice, CantonGeometry, CantonMax, ChoroplethFeature,
    HealthCenterRecord,
};
use geo::Centroid;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Rows matching the selected canton, or every row for `All`.
pub fn select_canton<'a>(
    records: &'a [HealthCenterRecord],
    choice: &CantonChoice,
) -> Vec<&'a HealthCenterRecord> {
    match choice {
        CantonChoice::All => records.iter().collect(),
        CantonChoice::Canton(canton) => records.iter().filter(|r| &r.canton == canton).collect(),
    }
}

/// Chart input: per (province, canton) sums plus the province ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceCantonSummary {
    /// Ordered by (province, canton).
    pub rows: Vec<AggregatedCantonCount>,
    /// Provinces by descending total, ties in row order.
    pub province_order: Vec<String>,
}

impl ProvinceCantonSummary {
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn province_total(&self, province: &str) -> u64 {
        self.rows.iter().filter(|r| r.province == province).map(|r| r.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Groups by (province, canton) and sums the route indicator.
pub fn aggregate_by_province_canton<'a, I>(records: I) -> ProvinceCantonSummary
where
    I: IntoIterator<Item = &'a HealthCenterRecord>,
{
    let mut groups: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for record in records {
        *groups.entry((record.province.as_str(), record.canton.as_str())).or_default() +=
            u64::from(record.route);
    }

    let rows: Vec<AggregatedCantonCount> = groups
        .into_iter()
        .map(|((province, canton), count)| AggregatedCantonCount {
            province: province.to_string(),
            canton: canton.to_string(),
            count,
        })
        .collect();

    let mut totals: Vec<(String, u64)> = Vec::new();
    for row in &rows {
        match totals.iter_mut().find(|(p, _)| *p == row.province) {
            Some((_, total)) => *total += row.count,
            None => totals.push((row.province.clone(), row.count)),
        }
    }
    // sort_by is stable
    totals.sort_by(|a, b| b.1.cmp(&a.1));

    ProvinceCantonSummary {
        rows,
        province_order: totals.into_iter().map(|(p, _)| p).collect(),
    }
}

/// Groups by canton and keeps the maximum route indicator. The map shades
/// by this value while the chart sums; the two are kept separate on purpose.
pub fn aggregate_by_canton<'a, I>(records: I) -> Vec<CantonMax>
where
    I: IntoIterator<Item = &'a HealthCenterRecord>,
{
    let mut groups: BTreeMap<&str, u32> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(record.canton.as_str()).or_insert(record.route);
        *entry = (*entry).max(record.route);
    }

    groups
        .into_iter()
        .map(|(canton, value)| CantonMax { canton: canton.to_string(), value })
        .collect()
}

/// Left join of geometries with per-canton values; unmatched geometries get 0.
///
/// Names must match exactly. Every geometry yields exactly one feature.
pub fn join_choropleth(cantons: &[CantonGeometry], values: &[CantonMax]) -> Vec<ChoroplethFeature> {
    let lookup: HashMap<&str, u32> = values.iter().map(|v| (v.canton.as_str(), v.value)).collect();

    cantons
        .iter()
        .map(|c| ChoroplethFeature {
            canton: c.canton.clone(),
            geometry: c.geometry.clone(),
            count: lookup.get(c.canton.as_str()).copied().unwrap_or(0),
        })
        .collect()
}

/// Features actually drawn for the selection.
pub fn displayed_features(
    features: Vec<ChoroplethFeature>,
    choice: &CantonChoice,
) -> Vec<ChoroplethFeature> {
    match choice {
        CantonChoice::All => features,
        CantonChoice::Canton(canton) => features.into_iter().filter(|f| &f.canton == canton).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
}

pub fn map_view(cantons: &[CantonGeometry], choice: &CantonChoice, config: &MapConfig) -> MapView {
    let country = |zoom| MapView { lat: config.center_lat, lon: config.center_lon, zoom };

    let Some(selected) = choice.canton() else {
        return country(config.country_zoom);
    };

    let centroid = cantons
        .iter()
        .find(|c| c.canton == selected)
        .and_then(|c| c.geometry.centroid());

    match centroid {
        Some(point) => MapView { lat: point.y(), lon: point.x(), zoom: config.canton_zoom },
        None => country(config.fallback_zoom),
    }
}

/// Canton names present on only one side of the join.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct JoinReport {
    pub missing_geometry: Vec<String>,
    pub missing_records: Vec<String>,
}

impl JoinReport {
    pub fn is_clean(&self) -> bool {
        self.missing_geometry.is_empty() && self.missing_records.is_empty()
    }
}

pub fn validate_join(records: &[HealthCenterRecord], cantons: &[CantonGeometry]) -> JoinReport {
    let in_records: BTreeSet<&str> = records.iter().map(|r| r.canton.as_str()).collect();
    let in_geometry: BTreeSet<&str> = cantons.iter().map(|c| c.canton.as_str()).collect();

    JoinReport {
        missing_geometry: in_records.difference(&in_geometry).map(|s| s.to_string()).collect(),
        missing_records: in_geometry.difference(&in_records).map(|s| s.to_string()).collect(),
    }
}
