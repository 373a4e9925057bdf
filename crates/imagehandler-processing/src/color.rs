//! Color parameters: `#RGB`, `#RRGGBB`, `#AARRGGBB` or a well-known name.

use image::Rgba;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const ORANGE: Rgba<u8> = Rgba([255, 165, 0, 255]);
pub const LIGHT_GRAY: Rgba<u8> = Rgba([211, 211, 211, 255]);
pub const DARK_GRAY: Rgba<u8> = Rgba([169, 169, 169, 255]);
pub const LIGHT_SLATE_GRAY: Rgba<u8> = Rgba([119, 136, 153, 255]);

const NAMED: &[(&str, [u8; 4])] = &[
    ("transparent", [255, 255, 255, 0]),
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("red", [255, 0, 0, 255]),
    ("green", [0, 128, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("orange", [255, 165, 0, 255]),
    ("darkorange", [255, 140, 0, 255]),
    ("orangered", [255, 69, 0, 255]),
    ("gray", [128, 128, 128, 255]),
    ("grey", [128, 128, 128, 255]),
    ("darkgray", [169, 169, 169, 255]),
    ("lightgray", [211, 211, 211, 255]),
    ("lightgrey", [211, 211, 211, 255]),
    ("dimgray", [105, 105, 105, 255]),
    ("gainsboro", [220, 220, 220, 255]),
    ("whitesmoke", [245, 245, 245, 255]),
    ("silver", [192, 192, 192, 255]),
    ("slategray", [112, 128, 144, 255]),
    ("lightslategray", [119, 136, 153, 255]),
    ("navy", [0, 0, 128, 255]),
    ("darkblue", [0, 0, 139, 255]),
    ("midnightblue", [25, 25, 112, 255]),
    ("royalblue", [65, 105, 225, 255]),
    ("dodgerblue", [30, 144, 255, 255]),
    ("steelblue", [70, 130, 180, 255]),
    ("skyblue", [135, 206, 235, 255]),
    ("lightblue", [173, 216, 230, 255]),
    ("aqua", [0, 255, 255, 255]),
    ("cyan", [0, 255, 255, 255]),
    ("teal", [0, 128, 128, 255]),
    ("lime", [0, 255, 0, 255]),
    ("lightgreen", [144, 238, 144, 255]),
    ("forestgreen", [34, 139, 34, 255]),
    ("darkgreen", [0, 100, 0, 255]),
    ("yellowgreen", [154, 205, 50, 255]),
    ("olive", [128, 128, 0, 255]),
    ("maroon", [128, 0, 0, 255]),
    ("darkred", [139, 0, 0, 255]),
    ("firebrick", [178, 34, 34, 255]),
    ("crimson", [220, 20, 60, 255]),
    ("tomato", [255, 99, 71, 255]),
    ("coral", [255, 127, 80, 255]),
    ("salmon", [250, 128, 114, 255]),
    ("pink", [255, 192, 203, 255]),
    ("fuchsia", [255, 0, 255, 255]),
    ("magenta", [255, 0, 255, 255]),
    ("purple", [128, 0, 128, 255]),
    ("violet", [238, 130, 238, 255]),
    ("indigo", [75, 0, 130, 255]),
    ("lavender", [230, 230, 250, 255]),
    ("brown", [165, 42, 42, 255]),
    ("chocolate", [210, 105, 30, 255]),
    ("tan", [210, 180, 140, 255]),
    ("wheat", [245, 222, 179, 255]),
    ("beige", [245, 245, 220, 255]),
    ("khaki", [240, 230, 140, 255]),
    ("gold", [255, 215, 0, 255]),
    ("ivory", [255, 255, 240, 255]),
];

/// Parse a color parameter. Names are case-insensitive.
pub fn parse_color(raw: &str) -> Option<Rgba<u8>> {
    let raw = raw.trim();
    match raw.strip_prefix('#') {
        Some(hex) => parse_hex(hex),
        None => {
            let name = raw.to_ascii_lowercase();
            NAMED
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, rgba)| Rgba(*rgba))
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 16 + v;
            }
            Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 => Some(Rgba([byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, 255])),
        8 => Some(Rgba([
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            byte(&hex[6..8])?,
            byte(&hex[0..2])?,
        ])),
        _ => None,
    }
}

/// Canonical `#AARRGGBB` form used in fingerprint fragments.
pub fn color_key(color: Rgba<u8>) -> String {
    let [r, g, b, a] = color.0;
    format!("#{:02X}{:02X}{:02X}{:02X}", a, r, g, b)
}
