//! Foreground colour for text drawn on a region's background colour.

pub const BLACK: &str = "#000000";
pub const WHITE: &str = "#FFFFFF";

/// Black on light backgrounds, white on dark ones.  Anything that is not a
/// six-digit hex colour (with or without `#`) gets black.
pub fn text_color(background: Option<&str>) -> &'static str {
    let Some((r, g, b)) = background.and_then(parse_hex) else {
        return BLACK;
    };
    // perceived brightness, ITU-R BT.601 weights
    let luminance = (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0;
    if luminance > 0.5 { BLACK } else { WHITE }
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
