// Offer colors
use rand::Rng;

pub const DEFAULT_PALETTE: [&str; 10] = [
    "#6366F1", "#E07B54", "#0D9488", "#A855F7", "#84CC16", "#F472B6", "#D97706", "#64748B",
    "#BE185D", "#059669",
];

pub fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

/// `count` colors spread evenly around the hue wheel from a random start,
/// with a little hue jitter and alternating saturation/lightness.
pub fn generate_palette(count: usize) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }
    let mut rng = rand::rng();
    let base_hue: f64 = rng.random_range(0.0..360.0);
    let step = 360.0 / count as f64;

    (0..count)
        .map(|i| {
            let jitter = (rng.random::<f64>() - 0.5) * step * 0.25;
            let hue = (base_hue + i as f64 * step + jitter).rem_euclid(360.0);
            let saturation = 62.0 + (i % 3) as f64 * 8.0;
            let lightness = if i % 2 == 0 { 43.0 } else { 53.0 };
            hsl_to_hex(hue, saturation, lightness)
        })
        .collect()
}

/// HSL (degrees, percent, percent) to `#rrggbb`.
pub fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    let s = s / 100.0;
    let l = l / 100.0;
    let a = s * l.min(1.0 - l);
    let channel = |n: f64| {
        let k = (n + h / 30.0) % 12.0;
        let color = l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
        (255.0 * color).round().clamp(0.0, 255.0) as u8
    };
    format!("#{:02x}{:02x}{:02x}", channel(0.0), channel(8.0), channel(4.0))
}

/// First palette color no existing offer uses; otherwise cycles by count.
pub fn next_color<'a>(used: impl IntoIterator<Item = &'a str>, existing: usize, palette: &[String]) -> String {
    let used: Vec<&str> = used.into_iter().collect();
    palette
        .iter()
        .find(|c| !used.contains(&c.as_str()))
        .cloned()
        .or_else(|| palette.get(existing % palette.len().max(1)).cloned())
        .unwrap_or_else(|| DEFAULT_PALETTE[0].to_string())
}
