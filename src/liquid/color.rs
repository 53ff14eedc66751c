//! RGBA colors and color-spec resolution
//!
//! Liquids are described either by a hex code, a named color, or the name of
//! the fluorescent protein they carry. Protein names map to the display color
//! used for rendering (e.g. `sfGFP` renders as `lime`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BioartError, Result};

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Create a new color with explicit RGBA components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color (alpha = 255).
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Channels as floats in 0..=255, for blending.
    pub fn to_f32(self) -> [f32; 4] {
        [self.r as f32, self.g as f32, self.b as f32, self.a as f32]
    }

    /// Round float channels back to 8 bits.
    pub fn from_f32(channels: [f32; 4]) -> Self {
        let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        Self::new(q(channels[0]), q(channels[1]), q(channels[2]), q(channels[3]))
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() || !(digits.len() == 6 || digits.len() == 8) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let a = if digits.len() == 8 { byte(6)? } else { 255 };
        Some(Self::new(byte(0)?, byte(2)?, byte(4)?, a))
    }

    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const RED: Rgba = Rgba::rgb(255, 0, 0);
    pub const BLUE: Rgba = Rgba::rgb(0, 0, 255);
    pub const AGAR: Rgba = Rgba::rgb(0xd7, 0xca, 0x95);
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// Fluorescent protein → display color name.
pub const PROTEIN_VISUAL_COLORS: &[(&str, &str)] = &[
    // Reds / Pinks
    ("mrfp1", "red"),
    ("mcherry", "firebrick"),
    ("dsred", "darkred"),
    ("mruby2", "crimson"),
    ("mscarlet_i", "tomato"),
    ("mkate2", "deeppink"),
    ("mkate2_tf", "mediumvioletred"),
    ("tagrfp", "coral"),
    ("tdtomato", "orangered"),
    ("eqfp578", "salmon"),
    ("mlychee_tf", "hotpink"),
    ("mwatermelon", "lightcoral"),
    // Oranges / Yellows
    ("mko2", "orange"),
    ("mpapaya", "lightsalmon"),
    ("venus", "yellow"),
    ("mcitrine", "gold"),
    ("mvenus", "goldenrod"),
    ("mbanana", "khaki"),
    ("mstaygold2", "gold"),
    ("mchartreuse_tf", "chartreuse"),
    // Greens
    ("sfgfp", "lime"),
    ("egfp", "lime"),
    ("megfp", "limegreen"),
    ("avgfp", "palegreen"),
    ("mneongreen", "greenyellow"),
    ("mazamigreen", "forestgreen"),
    ("mclover3", "green"),
    ("mwasabi", "lightgreen"),
    ("mjuniper", "darkgreen"),
    ("zsgreen1", "springgreen"),
    ("pa_gfp", "mediumseagreen"),
    ("mhoneydew", "yellowgreen"),
    // Blues / Cyans
    ("azurite", "royalblue"),
    ("tagbfp", "blue"),
    ("mtagbfp2", "mediumblue"),
    ("ultramarine", "navy"),
    ("mturquoise2", "turquoise"),
    ("mcerulean3", "cyan"),
    ("mtfp1", "darkcyan"),
    ("mmicy", "aquamarine"),
    ("electra2", "deepskyblue"),
    // Others
    ("mplum", "purple"),
];

const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("aquamarine", Rgba::rgb(0x7f, 0xff, 0xd4)),
    ("beige", Rgba::rgb(0xf5, 0xf5, 0xdc)),
    ("black", Rgba::BLACK),
    ("blue", Rgba::BLUE),
    ("brown", Rgba::rgb(0xa5, 0x2a, 0x2a)),
    ("chartreuse", Rgba::rgb(0x7f, 0xff, 0x00)),
    ("coral", Rgba::rgb(0xff, 0x7f, 0x50)),
    ("crimson", Rgba::rgb(0xdc, 0x14, 0x3c)),
    ("cyan", Rgba::rgb(0x00, 0xff, 0xff)),
    ("darkcyan", Rgba::rgb(0x00, 0x8b, 0x8b)),
    ("darkgreen", Rgba::rgb(0x00, 0x64, 0x00)),
    ("darkred", Rgba::rgb(0x8b, 0x00, 0x00)),
    ("deeppink", Rgba::rgb(0xff, 0x14, 0x93)),
    ("deepskyblue", Rgba::rgb(0x00, 0xbf, 0xff)),
    ("firebrick", Rgba::rgb(0xb2, 0x22, 0x22)),
    ("forestgreen", Rgba::rgb(0x22, 0x8b, 0x22)),
    ("gold", Rgba::rgb(0xff, 0xd7, 0x00)),
    ("goldenrod", Rgba::rgb(0xda, 0xa5, 0x20)),
    ("gray", Rgba::rgb(0x80, 0x80, 0x80)),
    ("green", Rgba::rgb(0x00, 0x80, 0x00)),
    ("greenyellow", Rgba::rgb(0xad, 0xff, 0x2f)),
    ("grey", Rgba::rgb(0x80, 0x80, 0x80)),
    ("hotpink", Rgba::rgb(0xff, 0x69, 0xb4)),
    ("indigo", Rgba::rgb(0x4b, 0x00, 0x82)),
    ("khaki", Rgba::rgb(0xf0, 0xe6, 0x8c)),
    ("lightcoral", Rgba::rgb(0xf0, 0x80, 0x80)),
    ("lightgreen", Rgba::rgb(0x90, 0xee, 0x90)),
    ("lightsalmon", Rgba::rgb(0xff, 0xa0, 0x7a)),
    ("lime", Rgba::rgb(0x00, 0xff, 0x00)),
    ("limegreen", Rgba::rgb(0x32, 0xcd, 0x32)),
    ("magenta", Rgba::rgb(0xff, 0x00, 0xff)),
    ("mediumblue", Rgba::rgb(0x00, 0x00, 0xcd)),
    ("mediumseagreen", Rgba::rgb(0x3c, 0xb3, 0x71)),
    ("mediumvioletred", Rgba::rgb(0xc7, 0x15, 0x85)),
    ("navy", Rgba::rgb(0x00, 0x00, 0x80)),
    ("orange", Rgba::rgb(0xff, 0xa5, 0x00)),
    ("orangered", Rgba::rgb(0xff, 0x45, 0x00)),
    ("palegreen", Rgba::rgb(0x98, 0xfb, 0x98)),
    ("pink", Rgba::rgb(0xff, 0xc0, 0xcb)),
    ("purple", Rgba::rgb(0x80, 0x00, 0x80)),
    ("red", Rgba::RED),
    ("royalblue", Rgba::rgb(0x41, 0x69, 0xe1)),
    ("salmon", Rgba::rgb(0xfa, 0x80, 0x72)),
    ("springgreen", Rgba::rgb(0x00, 0xff, 0x7f)),
    ("tomato", Rgba::rgb(0xff, 0x63, 0x47)),
    ("turquoise", Rgba::rgb(0x40, 0xe0, 0xd0)),
    ("violet", Rgba::rgb(0xee, 0x82, 0xee)),
    ("white", Rgba::WHITE),
    ("yellow", Rgba::rgb(0xff, 0xff, 0x00)),
    ("yellowgreen", Rgba::rgb(0x9a, 0xcd, 0x32)),
];

/// Resolve a protein or color name to the color name used for display.
///
/// Lookup order: protein table (case-insensitive), then `green` → `lime` for
/// visibility on dark agar, otherwise the input is passed through unchanged.
pub fn resolve_visual_color(protein_or_color: &str) -> &str {
    let key = protein_or_color.trim().to_ascii_lowercase();
    if let Some((_, color)) = PROTEIN_VISUAL_COLORS.iter().find(|(p, _)| *p == key) {
        return color;
    }
    if key == "green" {
        return "lime";
    }
    protein_or_color
}

/// Look up a named color (case-insensitive).
pub fn named_color(name: &str) -> Option<Rgba> {
    let key = name.trim().to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == key)
        .map(|(_, color)| *color)
}

/// Parse a color spec: protein name, color name, or hex code.
pub fn parse_color(spec: &str) -> Result<Rgba> {
    let visual = resolve_visual_color(spec).trim();
    if visual.starts_with('#') {
        return Rgba::from_hex(visual).ok_or_else(|| BioartError::InvalidColor {
            spec: spec.to_string(),
        });
    }
    named_color(visual).ok_or_else(|| BioartError::InvalidColor {
        spec: spec.to_string(),
    })
}
