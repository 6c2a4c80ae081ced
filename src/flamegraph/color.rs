//! Deterministic node colors.
//!
//! A node's fill depends only on its name: FNV-1a over the UTF-8 bytes
//! picks the hue and a small lightness jitter, so the same function gets
//! the same color in every run and every renderer. Names that look like
//! errors, warnings or successes get a fixed base color instead of a hue.

use serde::{Deserialize, Serialize};

const HASH_SATURATION: u32 = 200;
const HASH_VALUE: u32 = 230;
const JITTER_RANGE: u32 = 30;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// CSS color string
    pub fn to_css(self) -> String {
        if self.a == 255 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.2})",
                self.r,
                self.g,
                self.b,
                f64::from(self.a) / 255.0
            )
        }
    }

    /// Qt-style `lighter(factor)`: scale HSV value by `factor / 100`,
    /// spilling overflow into reduced saturation
    pub fn lighter(self, factor: u32) -> Self {
        let (h, s, v) = rgb_to_hsv(self.r, self.g, self.b);
        let mut s = s;
        let mut v = v * factor / 100;
        if v > 255 {
            s = s.saturating_sub(v - 255);
            v = 255;
        }
        let (r, g, b) = hsv_to_rgb(h, s, v);
        Self::rgba(r, g, b, self.a)
    }
}

pub const BACKGROUND: Rgba = Rgba::rgb(40, 44, 52);
pub const TEXT: Rgba = Rgba::rgb(255, 255, 255);
pub const HIGHLIGHT: Rgba = Rgba::rgb(97, 175, 239);
pub const SELECTION: Rgba = Rgba::rgb(73, 138, 244);
pub const WARNING: Rgba = Rgba::rgb(229, 192, 123);
pub const ERROR: Rgba = Rgba::rgb(224, 108, 117);
pub const SUCCESS: Rgba = Rgba::rgb(152, 195, 121);
pub const BORDER: Rgba = Rgba::rgb(0, 0, 0);

/// Fill applied to rectangles matching the active search
pub const SEARCH_MATCH: Rgba = Rgba::rgba(255, 255, 0, 100);

/// Which base color a name maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    Error,
    Warning,
    Success,
    /// Hue in degrees, taken from the name hash
    Hashed(u32),
}

impl ColorClass {
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("error") || lower.contains("exception") {
            Self::Error
        } else if lower.contains("warning") {
            Self::Warning
        } else if lower.contains("success") || lower.contains("ok") {
            Self::Success
        } else {
            Self::Hashed(name_hash(name) % 360)
        }
    }

    fn base(self) -> Rgba {
        match self {
            Self::Error => ERROR,
            Self::Warning => WARNING,
            Self::Success => SUCCESS,
            Self::Hashed(hue) => {
                let (r, g, b) = hsv_to_rgb(hue, HASH_SATURATION, HASH_VALUE);
                Rgba::rgb(r, g, b)
            }
        }
    }
}

/// 32-bit FNV-1a over the UTF-8 bytes of `name`
pub fn name_hash(name: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for b in name.as_bytes() {
        hash ^= u32::from(*b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Base fill for a node name
pub fn node_color(name: &str) -> Rgba {
    let jitter = name_hash(name) % JITTER_RANGE;
    ColorClass::from_name(name).base().lighter(100 + jitter)
}

/// `h` in degrees, `s` and `v` in 0..=255
fn hsv_to_rgb(h: u32, s: u32, v: u32) -> (u8, u8, u8) {
    let s = f64::from(s.min(255)) / 255.0;
    let v = f64::from(v.min(255)) / 255.0;
    let c = v * s;
    let sector = f64::from(h % 360) / 60.0;
    let x = c * (1.0 - ((sector % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match sector as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let channel = |value: f64| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (channel(r), channel(g), channel(b))
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u32, u32, u32) {
    let (rf, gf, bf) = (f64::from(r), f64::from(g), f64::from(b));
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (((gf - bf) / delta).rem_euclid(6.0))
    } else if max == gf {
        60.0 * (((bf - rf) / delta) + 2.0)
    } else {
        60.0 * (((rf - gf) / delta) + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max * 255.0 };

    (hue.round() as u32 % 360, saturation.round() as u32, max as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_value() {
        assert_eq!(name_hash("a"), 0xe40c_292c);
        assert_eq!(ColorClass::from_name("a"), ColorClass::Hashed(340));
    }

    #[test]
    fn test_color_is_stable() {
        assert_eq!(node_color("Renderer::draw"), node_color("Renderer::draw"));
        assert_ne!(node_color("Renderer::draw"), node_color("Physics::step"));
    }

    #[test]
    fn test_override_classes() {
        assert_eq!(ColorClass::from_name("throw_Exception"), ColorClass::Error);
        assert_eq!(ColorClass::from_name("log_warning"), ColorClass::Warning);
        assert_eq!(ColorClass::from_name("on_Success"), ColorClass::Success);
        assert_eq!(ColorClass::from_name("lookup"), ColorClass::Success);
    }

    #[test]
    fn test_lighter_grows_channels() {
        let lighter = ERROR.lighter(120);
        assert!(lighter.r >= ERROR.r && lighter.g >= ERROR.g);
    }

    #[test]
    fn test_css_output() {
        assert_eq!(Rgba::rgb(1, 2, 3).to_css(), "rgb(1, 2, 3)");
        assert_eq!(SEARCH_MATCH.to_css(), "rgba(255, 255, 0, 0.39)");
    }
}
