//! Label color handling.
//!
//! Foreground selection uses the perceptual luma weighting
//! `(299 R + 587 G + 114 B) / 1000` with an inclusive threshold of 128.

use serde::{Deserialize, Serialize};

const LUMA_THRESHOLD_MILLI: u32 = 128_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse a 6-digit hex color. A single leading `#` is accepted.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Luma scaled by 1000, so the threshold comparison stays in integers.
    pub fn luma_milli(&self) -> u32 {
        299 * u32::from(self.r) + 587 * u32::from(self.g) + 114 * u32::from(self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Foreground {
    /// Black text, for light backgrounds.
    Dark,
    /// White text, for dark backgrounds.
    Light,
}

/// Pick a readable text color for a label with the given background.
///
/// Unparseable colors get the light foreground.
pub fn contrast_color(hex: &str) -> Foreground {
    match Rgb::from_hex(hex) {
        Some(rgb) if rgb.luma_milli() >= LUMA_THRESHOLD_MILLI => Foreground::Dark,
        _ => Foreground::Light,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_background_gets_dark_text() {
        assert_eq!(contrast_color("FFFFFF"), Foreground::Dark);
    }

    #[test]
    fn black_background_gets_light_text() {
        assert_eq!(contrast_color("000000"), Foreground::Light);
    }

    #[test]
    fn threshold_is_inclusive() {
        // 0x80 = 128 on every channel: luma exactly 128.
        assert_eq!(Rgb::from_hex("808080").unwrap().luma_milli(), 128_000);
        assert_eq!(contrast_color("808080"), Foreground::Dark);
        assert_eq!(contrast_color("7F7F7F"), Foreground::Light);
    }

    #[test]
    fn weights_favor_green() {
        // Pure green: 587 * 255 / 1000 = 149.7
        assert_eq!(contrast_color("00FF00"), Foreground::Dark);
        // Pure blue: 114 * 255 / 1000 = 29.07
        assert_eq!(contrast_color("0000FF"), Foreground::Light);
        // Pure red: 299 * 255 / 1000 = 76.2
        assert_eq!(contrast_color("ff0000"), Foreground::Light);
    }

    #[test]
    fn github_default_labels() {
        // "bug"
        assert_eq!(contrast_color("d73a4a"), Foreground::Light);
        // "good first issue"
        assert_eq!(contrast_color("7057ff"), Foreground::Light);
        // "enhancement"
        assert_eq!(contrast_color("a2eeef"), Foreground::Dark);
    }

    #[test]
    fn leading_hash_is_accepted() {
        assert_eq!(
            Rgb::from_hex("#0a0b0c"),
            Some(Rgb {
                r: 10,
                g: 11,
                b: 12
            })
        );
    }

    #[test]
    fn malformed_colors_get_light_text() {
        assert_eq!(Rgb::from_hex("fff"), None);
        assert_eq!(Rgb::from_hex("zzzzzz"), None);
        assert_eq!(Rgb::from_hex("ｆｆｆ"), None);
        assert_eq!(contrast_color(""), Foreground::Light);
        assert_eq!(contrast_color("GGGGGG"), Foreground::Light);
    }
}
