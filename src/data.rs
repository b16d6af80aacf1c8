use crate::config::AppConfig;
use crate::processing;
use crate::types::{CantonGeometry, HealthCenterRecord};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use shapefile::Reader;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// Loaded-once view of both source datasets.
///
/// Built at startup and shared read-only for the lifetime of the process;
/// every request filters and aggregates from these slices.
#[derive(Debug)]
pub struct DataStore {
    records: Vec<HealthCenterRecord>,
    cantons: Vec<CantonGeometry>,
    canton_options: Vec<String>,
}

impl DataStore {
    pub fn load(config: &AppConfig) -> Result<Self> {
        let records = load_records(&config.input.centers_csv)?;
        info!("Loaded {} health center records", records.len());

        let cantons = load_cantons(&config.input.cantons, &config.input.canton_column_shape)?;
        info!("Loaded geometry for {} cantons", cantons.len());

        let store = Self::from_parts(records, cantons, &config.display.all_option);

        let report = processing::validate_join(&store.records, &store.cantons);
        for name in &report.missing_geometry {
            warn!("Canton {:?} has records but no geometry; it will not be drawn", name);
        }
        for name in &report.missing_records {
            warn!("Canton {:?} has geometry but no records; it will be drawn with count 0", name);
        }

        Ok(store)
    }

    pub fn from_parts(
        records: Vec<HealthCenterRecord>,
        cantons: Vec<CantonGeometry>,
        all_option: &str,
    ) -> Self {
        let canton_options = canton_options(&records, all_option);
        Self { records, cantons, canton_options }
    }

    pub fn records(&self) -> &[HealthCenterRecord] {
        &self.records
    }

    pub fn cantons(&self) -> &[CantonGeometry] {
        &self.cantons
    }

    /// Selector entries: the "All" label followed by sorted distinct cantons.
    pub fn canton_options(&self) -> &[String] {
        &self.canton_options
    }
}

fn canton_options(records: &[HealthCenterRecord], all_option: &str) -> Vec<String> {
    let distinct: BTreeSet<&str> = records.iter().map(|r| r.canton.as_str()).collect();
    std::iter::once(all_option.to_string())
        .chain(distinct.into_iter().map(str::to_string))
        .collect()
}

pub fn load_records(path: &Path) -> Result<Vec<HealthCenterRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let mut rdr = ReaderBuilder::new().from_reader(file);

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: HealthCenterRecord = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                return Err(anyhow::Error::new(e)
                    .context(format!("Malformed row at line {} in {:?}", line, path)));
            }
        };
        records.push(record);
    }

    Ok(records)
}

pub fn load_cantons(path: &Path, canton_column: &str) -> Result<Vec<CantonGeometry>> {
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Canton geometry file has no extension"))?;

    match extension.as_str() {
        "shp" => load_shapefile(path, canton_column),
        "json" | "geojson" => load_geojson(path, canton_column),
        _ => Err(anyhow!("Unsupported geometry format: {}", extension)),
    }
}

fn load_shapefile(path: &Path, canton_column: &str) -> Result<Vec<CantonGeometry>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut cantons = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let name_value = record.get(canton_column)
            .ok_or_else(|| anyhow!("Canton column '{}' not found in Shapefile", canton_column))?;

        let canton = match name_value {
            shapefile::dbase::FieldValue::Character(Some(s)) => s.clone(),
            shapefile::dbase::FieldValue::Character(None) => continue,
            _ => return Err(anyhow!("Shapefile canton column must be a string")),
        };

        let geometry = match shape {
            shapefile::Shape::Polygon(polygon) => {
                let mp: MultiPolygon<f64> = polygon.try_into()
                    .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?;
                mp
            },
            shapefile::Shape::PolygonM(polygon) => {
                let mp: MultiPolygon<f64> = polygon.try_into()
                    .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?;
                mp
            },
            shapefile::Shape::PolygonZ(polygon) => {
                let mp: MultiPolygon<f64> = polygon.try_into()
                    .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?;
                mp
            },
            _ => continue,
        };

        cantons.push(CantonGeometry { canton, geometry });
    }

    Ok(cantons)
}

fn load_geojson(path: &Path, canton_column: &str) -> Result<Vec<CantonGeometry>> {
    use std::io::BufReader;
    use geojson::GeoJson;

    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let reader = BufReader::new(file);

    let geojson = GeoJson::from_reader(reader)
        .with_context(|| format!("Failed to parse GeoJSON: {:?}", path))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Canton GeoJSON must be a FeatureCollection")),
    };

    let mut cantons = Vec::new();

    for feature in collection.features {
        let name_val = feature.properties.as_ref()
            .and_then(|props| props.get(canton_column));

        let canton = match name_val {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => continue,
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let geo_geom: geo::Geometry<f64> = geom.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry of {}: {:?}", canton, e))?;

                match geo_geom {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        warn!("Skipping non-polygon geometry for canton {}", canton);
                        continue;
                    }
                }
            },
            None => continue,
        };

        cantons.push(CantonGeometry { canton, geometry });
    }

    Ok(cantons)
}
