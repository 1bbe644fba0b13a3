use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use rand::Rng;
use rand::seq::SliceRandom as _;
use serde::{Deserialize, Serialize};

const PALETTE_STEP: usize = 0x33;
const MIN_BRIGHTNESS: f64 = 40.0;
const MAX_BRIGHTNESS: f64 = 200.0;
const FOREGROUND_THRESHOLD: f64 = 125.0;

/// Used when the brightness band filters out every quantized color.
pub const FALLBACK_COLOR: HexColor = HexColor::new(0x00, 0x7B, 0xFF);

static PALETTE: Lazy<Vec<HexColor>> =
    Lazy::new(|| quantized_palette(MIN_BRIGHTNESS, MAX_BRIGHTNESS));

/// Error returned when a string is not a six-digit hex color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color: {0:?}")]
pub struct ColorParseError(pub String);

/// An RGB color serialized as six uppercase hex digits (`"33CC99"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const BLACK: HexColor = HexColor::new(0x00, 0x00, 0x00);
    pub const WHITE: HexColor = HexColor::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceived brightness on a 0..=255 scale.
    pub fn brightness(&self) -> f64 {
        (f64::from(self.r) * 299.0 + f64::from(self.g) * 587.0 + f64::from(self.b) * 114.0)
            / 1000.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for HexColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError(s.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.to_string()
    }
}

/// Text and background colors of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorPair {
    pub fg: HexColor,
    pub bg: HexColor,
}

impl ColorPair {
    /// Pairs `bg` with the readable text color for it.
    pub fn for_background(bg: HexColor) -> Self {
        Self {
            fg: foreground_for(bg),
            bg,
        }
    }
}

/// Black text on light backgrounds, white text on dark ones.
pub fn foreground_for(bg: HexColor) -> HexColor {
    if bg.brightness() > FOREGROUND_THRESHOLD {
        HexColor::BLACK
    } else {
        HexColor::WHITE
    }
}

/// The label background palette, built on first use.
pub fn palette() -> &'static [HexColor] {
    &PALETTE
}

/// Draws a background uniformly from the palette and pairs it with a
/// readable foreground. Colors may repeat across labels.
pub fn pick_color_pair<R: Rng + ?Sized>(rng: &mut R) -> ColorPair {
    let bg = palette().choose(rng).copied().unwrap_or(FALLBACK_COLOR);
    ColorPair::for_background(bg)
}

fn quantized_palette(min_brightness: f64, max_brightness: f64) -> Vec<HexColor> {
    let mut colors = Vec::new();
    for r in (0..=0xFF).step_by(PALETTE_STEP) {
        for g in (0..=0xFF).step_by(PALETTE_STEP) {
            for b in (0..=0xFF).step_by(PALETTE_STEP) {
                let color = HexColor::new(r as u8, g as u8, b as u8);
                let brightness = color.brightness();
                if brightness > min_brightness && brightness < max_brightness {
                    colors.push(color);
                }
            }
        }
    }
    if colors.is_empty() {
        colors.push(FALLBACK_COLOR);
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    #[test]
    fn palette_stays_inside_brightness_band() {
        let colors = palette();
        assert!(!colors.is_empty());
        for color in colors {
            let brightness = color.brightness();
            assert!(brightness > MIN_BRIGHTNESS && brightness < MAX_BRIGHTNESS, "{color}");
            for channel in [color.r, color.g, color.b] {
                assert_eq!(usize::from(channel) % PALETTE_STEP, 0);
            }
        }
        assert!(!colors.contains(&HexColor::BLACK));
        assert!(!colors.contains(&HexColor::WHITE));
    }

    #[test]
    fn empty_band_falls_back_to_single_color() {
        assert_eq!(quantized_palette(300.0, 400.0), vec![FALLBACK_COLOR]);
    }

    #[test]
    fn foreground_contrasts_with_background() {
        assert_eq!(foreground_for(HexColor::new(0xFF, 0xFF, 0x33)), HexColor::BLACK);
        assert_eq!(foreground_for(HexColor::new(0x33, 0x00, 0x66)), HexColor::WHITE);
    }

    #[test]
    fn picked_pairs_come_from_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let pair = pick_color_pair(&mut rng);
            assert!(palette().contains(&pair.bg));
            assert_eq!(pair.fg, foreground_for(pair.bg));
        }
    }

    #[test]
    fn hex_round_trips_through_strings() {
        let color: HexColor = "#33cc99".parse().expect("color");
        assert_eq!(color, HexColor::new(0x33, 0xCC, 0x99));
        assert_eq!(color.to_string(), "33CC99");
        assert!("12345".parse::<HexColor>().is_err());
        assert!("GG0000".parse::<HexColor>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let json = serde_json::to_string(&HexColor::new(0, 0x7B, 0xFF)).expect("json");
        assert_eq!(json, "\"007BFF\"");
        let back: HexColor = serde_json::from_str("\"007bff\"").expect("color");
        assert_eq!(back, FALLBACK_COLOR);
    }
}
