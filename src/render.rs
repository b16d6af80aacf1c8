use crate::chart;
use crate::config::AppConfig;
use crate::dashboard::Dashboard;
use crate::map;
use crate::types::{CantonChoice, HealthCenterRecord};
use anyhow::Result;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; }
aside { width: 240px; padding: 1.5rem; background: #f0f2f6; min-height: 100vh; box-sizing: border-box; }
main { flex: 1; padding: 1.5rem 3rem; max-width: 1100px; }
table { border-collapse: collapse; font-size: 0.9rem; width: 100%; }
th, td { border-bottom: 1px solid #ddd; padding: 0.3rem 0.6rem; text-align: left; }
td.num { text-align: right; }
.table-wrap { max-height: 400px; overflow-y: auto; }
.map-wrap { position: relative; }
#map { height: 600px; width: 100%; }
.legend { position: absolute; top: 10px; right: 10px; z-index: 1000; background: white; padding: 6px 10px; border-radius: 4px; font-size: 12px; }
.legend-bar { width: 220px; height: 12px; margin: 4px 0; }
.legend-ticks { display: flex; justify-content: space-between; }
.credit { color: #666; }
"#;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_selector(options: &[String], choice: &CantonChoice) -> String {
    let mut html = String::from(
        r#"<form method="get" action="/"><label for="canton">Selecciona un cantón</label><br><select id="canton" name="canton" onchange="this.form.submit()">"#,
    );
    for (i, option) in options.iter().enumerate() {
        let selected = match choice {
            CantonChoice::All => i == 0,
            CantonChoice::Canton(c) => i > 0 && c == option,
        };
        html.push_str(&format!(
            r#"<option value="{v}"{sel}>{v}</option>"#,
            v = escape(option),
            sel = if selected { " selected" } else { "" },
        ));
    }
    html.push_str("</select><noscript><button type=\"submit\">OK</button></noscript></form>");
    html
}

/// Filtered rows under their display labels, no index column.
pub fn render_table(rows: &[&HealthCenterRecord], config: &AppConfig) -> String {
    let labels = &config.display.columns;
    let mut html = format!(
        "<div class=\"table-wrap\"><table><thead><tr><th>{}</th><th>{}</th><th>{}</th><th>{}</th><th>{}</th></tr></thead><tbody>",
        escape(&labels.name),
        escape(&labels.operator),
        escape(&labels.province),
        escape(&labels.canton),
        escape(&labels.route),
    );
    for row in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td></tr>",
            escape(&row.name),
            escape(&row.operator),
            escape(&row.province),
            escape(&row.canton),
            row.route,
        ));
    }
    html.push_str("</tbody></table></div>");
    html
}

pub fn render_page(dashboard: &Dashboard<'_>, options: &[String], config: &AppConfig) -> Result<String> {
    let display = &config.display;
    let chart = chart::render_bar_chart(&dashboard.summary, display);
    let map = map::render_map(
        &dashboard.view,
        &dashboard.features,
        &dashboard.scale,
        display,
        &config.map,
    )?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="{LEAFLET_CSS}">
<script src="{LEAFLET_JS}"></script>
<style>{STYLE}</style>
</head>
<body>
<aside>{selector}</aside>
<main>
<h1>{title}</h1>
<p class="credit">{credit}</p>
<h2>Centros de salud cercanos a la ruta migratoria</h2>
{table}
<h2>Distribución por cantón y provincia de centros de salud cercanos a la ruta migratoria</h2>
{chart}
<h2>Cantidad de centros de salud cercanos a la ruta migratoria por cantón</h2>
{map}
</main>
</body>
</html>
"#,
        title = escape(&display.title),
        credit = escape(&display.credit),
        selector = render_selector(options, &dashboard.choice),
        table = render_table(&dashboard.table, config),
    ))
}
