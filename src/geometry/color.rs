//! Background color parsing
//!
//! Accepts `#RRGGBB`, `#AARRGGBB`, `#RGB` and a fixed table of named colors
//! (case-insensitive). Anything else parses to `None`.

/// Non-premultiplied RGBA8 color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    const fn opaque(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 0xFF)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::TRANSPARENT
    }
}

const NAMED: &[(&str, Rgba)] = &[
    ("black", Rgba::opaque(0x000000)),
    ("darkgray", Rgba::opaque(0x444444)),
    ("darkgrey", Rgba::opaque(0x444444)),
    ("gray", Rgba::opaque(0x888888)),
    ("grey", Rgba::opaque(0x888888)),
    ("lightgray", Rgba::opaque(0xCCCCCC)),
    ("lightgrey", Rgba::opaque(0xCCCCCC)),
    ("white", Rgba::opaque(0xFFFFFF)),
    ("red", Rgba::opaque(0xFF0000)),
    ("green", Rgba::opaque(0x00FF00)),
    ("blue", Rgba::opaque(0x0000FF)),
    ("yellow", Rgba::opaque(0xFFFF00)),
    ("cyan", Rgba::opaque(0x00FFFF)),
    ("magenta", Rgba::opaque(0xFF00FF)),
    ("aqua", Rgba::opaque(0x00FFFF)),
    ("fuchsia", Rgba::opaque(0xFF00FF)),
    ("lime", Rgba::opaque(0x00FF00)),
    ("maroon", Rgba::opaque(0x800000)),
    ("navy", Rgba::opaque(0x000080)),
    ("olive", Rgba::opaque(0x808000)),
    ("purple", Rgba::opaque(0x800080)),
    ("silver", Rgba::opaque(0xC0C0C0)),
    ("teal", Rgba::opaque(0x008080)),
    ("transparent", Rgba::TRANSPARENT),
];

/// Parse a color string
pub fn parse_color(input: &str) -> Option<Rgba> {
    let s = input.trim();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    NAMED
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(s))
        .map(|(_, color)| *color)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => {
            let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(Rgba::new(nibble(0)?, nibble(1)?, nibble(2)?, 0xFF))
        }
        6 => Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, 0xFF)),
        8 => Some(Rgba::new(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
        _ => None,
    }
}

/// Resolve an optional background string, falling back to transparent
///
/// A string that fails to parse is logged and otherwise ignored.
pub fn resolve_background(background: Option<&str>) -> Rgba {
    match background {
        None => Rgba::TRANSPARENT,
        Some(s) => parse_color(s).unwrap_or_else(|| {
            tracing::warn!(background = %s, "Unparseable background color, using transparent");
            Rgba::TRANSPARENT
        }),
    }
}
