// SVG stacked bar chart: provinces on x, one segment per canton.

use crate::config::DisplayConfig;
use crate::processing::ProvinceCantonSummary;
use crate::render::escape;
use std::collections::HashMap;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 240.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 80.0;
const LEGEND_ROW: f64 = 20.0;

/// Qualitative palette cycled over cantons in order of appearance.
const PALETTE: [&str; 10] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692", "#b6e880",
    "#ff97ff", "#fecb52",
];

pub fn canton_colors(summary: &ProvinceCantonSummary) -> Vec<(String, &'static str)> {
    let mut colors: Vec<(String, &'static str)> = Vec::new();
    for row in &summary.rows {
        if !colors.iter().any(|(c, _)| *c == row.canton) {
            let color = PALETTE[colors.len() % PALETTE.len()];
            colors.push((row.canton.clone(), color));
        }
    }
    colors
}

/// SVG height: the plot keeps `HEIGHT`, the canvas grows to fit the legend.
pub fn chart_height(legend_entries: usize) -> f64 {
    let legend_bottom = MARGIN_TOP + 32.0 + LEGEND_ROW * legend_entries as f64;
    HEIGHT.max(legend_bottom)
}

/// Integer tick step giving roughly five intervals up to `max`.
pub fn tick_step(max: u64) -> u64 {
    if max <= 5 {
        return 1;
    }
    let raw = max as f64 / 5.0;
    let magnitude = 10f64.powi(raw.log10().floor() as i32);
    let residual = raw / magnitude;
    let nice = if residual <= 1.0 {
        1.0
    } else if residual <= 2.0 {
        2.0
    } else if residual <= 5.0 {
        5.0
    } else {
        10.0
    };
    ((nice * magnitude) as u64).max(1)
}

/// Plain integer with comma thousands separators, never scientific.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn render_bar_chart(summary: &ProvinceCantonSummary, display: &DisplayConfig) -> String {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_h;

    let max_total = summary
        .province_order
        .iter()
        .map(|p| summary.province_total(p))
        .max()
        .unwrap_or(0);
    let step = tick_step(max_total);
    let y_max = (max_total.div_ceil(step) * step).max(step);
    let scale_y = |v: u64| plot_h * v as f64 / y_max as f64;

    let colors = canton_colors(summary);
    let color_of: HashMap<&str, &str> = colors.iter().map(|(c, col)| (c.as_str(), *col)).collect();

    let mut grid = String::new();
    let mut tick = 0;
    while tick <= y_max {
        let y = baseline - scale_y(tick);
        grid.push_str(&format!(
            r##"<line x1="{x0}" y1="{y:.1}" x2="{x1}" y2="{y:.1}" stroke="#e5e5e5"/><text x="{tx}" y="{ty:.1}" text-anchor="end" font-size="12">{label}</text>"##,
            x0 = MARGIN_LEFT,
            x1 = MARGIN_LEFT + plot_w,
            tx = MARGIN_LEFT - 8.0,
            ty = y + 4.0,
            label = format_thousands(tick),
        ));
        tick += step;
    }

    let band = if summary.province_order.is_empty() {
        plot_w
    } else {
        plot_w / summary.province_order.len() as f64
    };
    let bar_w = band * 0.8;

    let mut bars = String::new();
    let mut x_labels = String::new();
    for (i, province) in summary.province_order.iter().enumerate() {
        let x = MARGIN_LEFT + band * i as f64 + (band - bar_w) / 2.0;
        let mut stacked = 0u64;

        for row in summary.rows.iter().filter(|r| &r.province == province) {
            if row.count == 0 {
                continue;
            }
            let y_top = baseline - scale_y(stacked + row.count);
            let h = scale_y(row.count);
            bars.push_str(&format!(
                r#"<rect class="bar" x="{x:.1}" y="{y_top:.1}" width="{bar_w:.1}" height="{h:.1}" fill="{fill}"><title>{pl}: {p}&#10;{cl}: {c}&#10;{vl}: {v}</title></rect>"#,
                fill = color_of.get(row.canton.as_str()).copied().unwrap_or(PALETTE[0]),
                pl = escape(&display.columns.province),
                p = escape(province),
                cl = escape(&display.columns.canton),
                c = escape(&row.canton),
                vl = escape(&display.count_label),
                v = format_thousands(row.count),
            ));
            stacked += row.count;
        }

        x_labels.push_str(&format!(
            r#"<text x="{cx:.1}" y="{y}" text-anchor="middle" font-size="13">{label}</text>"#,
            cx = MARGIN_LEFT + band * (i as f64 + 0.5),
            y = baseline + 20.0,
            label = escape(province),
        ));
    }

    let legend_x = WIDTH - MARGIN_RIGHT + 30.0;
    let mut legend = format!(
        r#"<text x="{legend_x}" y="{y}" font-size="16">{title}</text>"#,
        y = MARGIN_TOP + 10.0,
        title = escape(&display.columns.canton),
    );
    for (i, (canton, color)) in colors.iter().enumerate() {
        let y = MARGIN_TOP + 32.0 + LEGEND_ROW * i as f64;
        legend.push_str(&format!(
            r#"<rect x="{legend_x}" y="{ry}" width="12" height="12" fill="{color}"/><text x="{tx}" y="{y}" font-size="14">{name}</text>"#,
            ry = y - 11.0,
            tx = legend_x + 18.0,
            name = escape(canton),
        ));
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" class="bar-chart">
{grid}
<line x1="{ml}" y1="{baseline}" x2="{xr}" y2="{baseline}" stroke="#444"/>
{bars}
{x_labels}
<text x="{xc}" y="{xt}" text-anchor="middle" font-size="16">{x_title}</text>
<text x="20" y="{yc}" text-anchor="middle" font-size="16" transform="rotate(-90 20 {yc})">{y_title}</text>
{legend}
</svg>"##,
        w = WIDTH,
        h = chart_height(colors.len()),
        ml = MARGIN_LEFT,
        xr = MARGIN_LEFT + plot_w,
        xc = MARGIN_LEFT + plot_w / 2.0,
        xt = HEIGHT - 20.0,
        yc = MARGIN_TOP + plot_h / 2.0,
        x_title = escape(&display.columns.province),
        y_title = escape(&display.count_label),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::aggregate_by_province_canton;
    use crate::processing::tests::record;

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn tick_steps_are_integers() {
        assert_eq!(tick_step(0), 1);
        assert_eq!(tick_step(4), 1);
        assert_eq!(tick_step(12), 5);
        assert_eq!(tick_step(37), 10);
        assert_eq!(tick_step(2500), 500);
    }

    #[test]
    fn colors_follow_first_appearance() {
        let records = vec![record("Limón", "Talamanca", 1), record("Alajuela", "Upala", 1)];
        let summary = aggregate_by_province_canton(&records);
        let colors = canton_colors(&summary);
        assert_eq!(colors[0], ("Upala".to_string(), PALETTE[0]));
        assert_eq!(colors[1], ("Talamanca".to_string(), PALETTE[1]));
    }

    #[test]
    fn provinces_drawn_in_ranked_order() {
        let records = vec![
            record("Alajuela", "Upala", 1),
            record("Limón", "Talamanca", 2),
            record("Limón", "Pococí", 1),
        ];
        let summary = aggregate_by_province_canton(&records);
        let svg = render_bar_chart(&summary, &DisplayConfig::default());

        let limon = svg.find(">Limón</text>").unwrap();
        let alajuela = svg.find(">Alajuela</text>").unwrap();
        assert!(limon < alajuela);
        assert_eq!(svg.matches("class=\"bar\"").count(), 3);
        assert!(!svg.contains("e+"));
    }

    #[test]
    fn zero_segments_are_not_drawn() {
        let records = vec![record("Alajuela", "Upala", 0), record("Limón", "Talamanca", 2)];
        let summary = aggregate_by_province_canton(&records);
        let svg = render_bar_chart(&summary, &DisplayConfig::default());
        assert_eq!(svg.matches("class=\"bar\"").count(), 1);
        assert!(svg.contains(">Alajuela</text>"));
    }

    #[test]
    fn legend_fits_inside_canvas() {
        let records: Vec<_> = (0..40)
            .map(|i| record("Alajuela", &format!("Cantón {:02}", i), 1))
            .collect();
        let summary = aggregate_by_province_canton(&records);
        let svg = render_bar_chart(&summary, &DisplayConfig::default());

        let height = chart_height(40);
        assert!(height > HEIGHT);
        assert!(svg.contains(&format!("height=\"{}\" viewBox=\"0 0 {} {}\"", height, WIDTH, height)));

        assert_eq!(svg.matches("font-size=\"14\"").count(), 40);

        let ys: Vec<f64> = svg
            .split(" y=\"")
            .skip(1)
            .map(|rest| rest[..rest.find('"').unwrap()].parse().unwrap())
            .collect();
        for y in ys {
            assert!(y <= height, "element at y={} drawn below canvas {}", y, height);
        }
    }

    #[test]
    fn few_cantons_keep_default_height() {
        assert_eq!(chart_height(0), HEIGHT);
        assert_eq!(chart_height(5), HEIGHT);
    }

    #[test]
    fn empty_summary_renders_axes_only() {
        let summary = aggregate_by_province_canton(std::iter::empty::<&crate::types::HealthCenterRecord>());
        let svg = render_bar_chart(&summary, &DisplayConfig::default());
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("class=\"bar\""));
    }
}
