use geo::MultiPolygon;
use serde::{Deserialize, Deserializer, Serialize};

/// One health center row from the centers CSV.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HealthCenterRecord {
    pub name: String,
    pub operator: String,
    #[serde(rename = "PROVINCIA")]
    pub province: String,
    #[serde(rename = "CANTÓN")]
    pub canton: String,
    // 0/1 in practice, but the column is summed for the chart
    #[serde(rename = "ruta", deserialize_with = "deserialize_route")]
    pub route: u32,
}

#[derive(Debug, Clone)]
pub struct CantonGeometry {
    pub canton: String,
    pub geometry: MultiPolygon<f64>,
}

/// Sum of the route indicator for one (province, canton) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedCantonCount {
    pub province: String,
    pub canton: String,
    pub count: u64,
}

/// Max of the route indicator for one canton, used to shade the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CantonMax {
    pub canton: String,
    pub value: u32,
}

#[derive(Debug, Clone)]
pub struct ChoroplethFeature {
    pub canton: String,
    pub geometry: MultiPolygon<f64>,
    pub count: u32,
}

/// Canton selector state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CantonChoice {
    All,
    Canton(String),
}

impl CantonChoice {
    /// Interprets a selector value; `all_option` is the label of the "All" entry.
    pub fn from_selection(value: Option<&str>, all_option: &str) -> Self {
        match value {
            None => CantonChoice::All,
            Some(v) if v.trim().is_empty() => CantonChoice::All,
            Some(v) if v == all_option || v == "All" => CantonChoice::All,
            Some(v) => CantonChoice::Canton(v.to_string()),
        }
    }

    pub fn canton(&self) -> Option<&str> {
        match self {
            CantonChoice::All => None,
            CantonChoice::Canton(c) => Some(c.as_str()),
        }
    }
}

pub fn parse_route(raw: &str) -> Result<u32, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(0);
    }
    match value.to_ascii_lowercase().as_str() {
        "true" => return Ok(1),
        "false" => return Ok(0),
        _ => {}
    }
    if let Ok(n) = value.parse::<u32>() {
        return Ok(n);
    }
    match value.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
        _ => Err(format!(
            "invalid route indicator {:?}: expected an integer, true/false or a whole number",
            raw
        )),
    }
}

fn deserialize_route<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_route(&raw).map_err(serde::de::Error::custom)
}
