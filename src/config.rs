use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub map: MapConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub centers_csv: PathBuf,
    pub cantons: PathBuf, // .shp, .geojson or .json
    #[serde(default = "default_canton_column")]
    pub canton_column_shape: String,
}

fn default_canton_column() -> String {
    "CANTÓN".to_string()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub title: String,
    pub credit: String,
    pub all_option: String,
    pub columns: ColumnLabels,
    pub count_label: String,
    pub legend_caption: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "Acceso a la salud de las personas migrantes en tránsito por Costa Rica".to_string(),
            credit: "Realizado por Carolina Guzmán Herrera".to_string(),
            all_option: "Todos".to_string(),
            columns: ColumnLabels::default(),
            count_label: "Centros de salud".to_string(),
            legend_caption: "Centros de salud por cantón".to_string(),
        }
    }
}

/// Display names for the table columns.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColumnLabels {
    pub name: String,
    pub operator: String,
    pub province: String,
    pub canton: String,
    pub route: String,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self {
            name: "Nombre".to_string(),
            operator: "Operador".to_string(),
            province: "Provincia".to_string(),
            canton: "Cantón".to_string(),
            route: "Establecimiento".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub country_zoom: u8,
    pub canton_zoom: u8,
    /// Used when the selected canton has no geometry.
    pub fallback_zoom: u8,
    pub tile_url: String,
    pub tile_attribution: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 9.7489,
            center_lon: -83.7534,
            country_zoom: 7,
            canton_zoom: 10,
            fallback_zoom: 8,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tile_attribution: "&copy; OpenStreetMap contributors".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn minimal_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[input]
centers_csv = "datos_completos.csv"
cantons = "cantones.geojson"

[server]
port = 8080
"#
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.input.canton_column_shape, "CANTÓN");
        assert_eq!(config.display.all_option, "Todos");
        assert_eq!(config.display.columns.route, "Establecimiento");
        assert_eq!(config.map.country_zoom, 7);
        assert_eq!(config.map.canton_zoom, 10);
        assert_ne!(config.map.fallback_zoom, config.map.country_zoom);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn partial_sections_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[input]
centers_csv = "a.csv"
cantons = "b.shp"
canton_column_shape = "NOM_CANT"

[display]
all_option = "All"

[display.columns]
canton = "Canton"

[map]
canton_zoom = 11

[server]
port = 3000
"#
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.input.canton_column_shape, "NOM_CANT");
        assert_eq!(config.display.all_option, "All");
        assert_eq!(config.display.columns.canton, "Canton");
        assert_eq!(config.display.columns.province, "Provincia");
        assert_eq!(config.map.canton_zoom, 11);
        assert_eq!(config.map.country_zoom, 7);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load_from_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
