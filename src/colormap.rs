// Sequential color scale for the choropleth.

/// ColorBrewer YlOrRd, 9 classes.
pub const YL_OR_RD_9: [&str; 9] = [
    "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026",
    "#800026",
];

/// Linear ramp over evenly spaced stops spanning `[min, max]`.
///
/// Values at or below `min` take the first stop, so equal bounds give a
/// single flat color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
    stops: Vec<[u8; 3]>,
}

impl ColorScale {
    pub fn new(stops: &[&str], min: f64, max: f64) -> Self {
        Self { min, max, stops: stops.iter().map(|s| hex_to_rgb(s)).collect() }
    }

    pub fn yl_or_rd(min: f64, max: f64) -> Self {
        Self::new(&YL_OR_RD_9, min, max)
    }

    /// Domain taken from the values being displayed; `[0, 0]` when there are none.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut bounds: Option<(u32, u32)> = None;
        for v in values {
            bounds = Some(match bounds {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        let (lo, hi) = bounds.unwrap_or((0, 0));
        Self::yl_or_rd(f64::from(lo), f64::from(hi))
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn rgb(&self, value: f64) -> [u8; 3] {
        let n = self.stops.len();
        if n == 0 {
            return [0, 0, 0];
        }
        if value <= self.min || n == 1 {
            return self.stops[0];
        }
        if value >= self.max {
            return self.stops[n - 1];
        }

        let step = (self.max - self.min) / (n - 1) as f64;
        let position = (value - self.min) / step;
        let i = (position.floor() as usize).min(n - 2);
        let t = position - i as f64;

        let (a, b) = (self.stops[i], self.stops[i + 1]);
        let mut out = [0u8; 3];
        for c in 0..3 {
            let fa = f64::from(a[c]) / 255.0;
            let fb = f64::from(b[c]) / 255.0;
            out[c] = (((1.0 - t) * fa + t * fb) * 255.9999) as u8;
        }
        out
    }

    pub fn hex(&self, value: f64) -> String {
        let [r, g, b] = self.rgb(value);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// CSS gradient across all stops, for the legend bar.
    pub fn css_gradient(&self) -> String {
        let stops: Vec<String> = self
            .stops
            .iter()
            .map(|[r, g, b]| format!("#{:02x}{:02x}{:02x}", r, g, b))
            .collect();
        format!("linear-gradient(to right, {})", stops.join(", "))
    }
}

pub fn hex_to_rgb(hex: &str) -> [u8; 3] {
    let hex = hex.trim_start_matches('#');
    if hex.len() < 6 {
        return [0, 0, 0];
    }
    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
    [r, g, b]
}
