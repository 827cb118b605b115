use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Line colour of the daily page view chart.
pub const LINE_COLOR: Color32 = Color32::from_rgb(214, 38, 64);

/// Edge colour of box plot outlier markers.
pub const FLIER_COLOR: Color32 = Color32::LIGHT_GRAY;

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    generate_palette_with(n, 0.75, 0.55)
}

/// Same hue spacing as [`generate_palette`] with explicit saturation and
/// lightness, both in `0.0..=1.0`.
pub fn generate_palette_with(n: usize, saturation: f32, lightness: f32) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, saturation, lightness);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0).round() as u8,
                (rgb.green * 255.0).round() as u8,
                (rgb.blue * 255.0).round() as u8,
            )
        })
        .collect()
}

/// One colour per calendar month, January first.
pub fn month_colors() -> [Color32; 12] {
    let mut colors = [Color32::GRAY; 12];
    for (slot, c) in colors.iter_mut().zip(generate_palette(12)) {
        *slot = c;
    }
    colors
}

/// Muted fill colours for `n` box plot categories.
pub fn box_fills(n: usize) -> Vec<Color32> {
    generate_palette_with(n, 0.45, 0.65)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn palette_has_requested_length() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(5).len(), 5);
        assert_eq!(box_fills(4).len(), 4);
    }

    #[test]
    fn month_colors_are_distinct() {
        let colors = month_colors();
        let distinct: HashSet<[u8; 4]> = colors.iter().map(|c| c.to_array()).collect();
        assert_eq!(distinct.len(), 12);
    }

    #[test]
    fn first_hue_is_red() {
        let c = generate_palette(3)[0];
        assert!(c.r() > c.g() && c.r() > c.b());
    }
}
