use rand::Rng;
use serde::{Deserialize, Serialize};

use super::surface::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Neon,
    Pastel,
    Monochrome,
    Rainbow,
}

const NEON: [Color; 4] = [
    Color::rgb(0x00, 0xff, 0x88),
    Color::rgb(0x00, 0xff, 0xff),
    Color::rgb(0xff, 0x00, 0xff),
    Color::rgb(0xff, 0xff, 0x00),
];

const PASTEL: [Color; 4] = [
    Color::rgb(0xff, 0xb3, 0xba),
    Color::rgb(0xba, 0xff, 0xc9),
    Color::rgb(0xba, 0xe1, 0xff),
    Color::rgb(0xff, 0xff, 0xba),
];

const MONOCHROME: [Color; 4] = [
    Color::rgb(0xff, 0xff, 0xff),
    Color::rgb(0xcc, 0xcc, 0xcc),
    Color::rgb(0x99, 0x99, 0x99),
    Color::rgb(0x66, 0x66, 0x66),
];

const RAINBOW: [Color; 7] = [
    Color::rgb(0xff, 0x00, 0x00),
    Color::rgb(0xff, 0x7f, 0x00),
    Color::rgb(0xff, 0xff, 0x00),
    Color::rgb(0x00, 0xff, 0x00),
    Color::rgb(0x00, 0x00, 0xff),
    Color::rgb(0x4b, 0x00, 0x82),
    Color::rgb(0x94, 0x00, 0xd3),
];

impl ColorScheme {
    pub const ALL: [ColorScheme; 4] = [
        ColorScheme::Neon,
        ColorScheme::Pastel,
        ColorScheme::Monochrome,
        ColorScheme::Rainbow,
    ];

    pub fn colors(self) -> &'static [Color] {
        match self {
            ColorScheme::Neon => &NEON,
            ColorScheme::Pastel => &PASTEL,
            ColorScheme::Monochrome => &MONOCHROME,
            ColorScheme::Rainbow => &RAINBOW,
        }
    }

    pub fn random_color(self, rng: &mut impl Rng) -> Color {
        let colors = self.colors();
        colors[rng.gen_range(0..colors.len())]
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorScheme::Neon => "NEON",
            ColorScheme::Pastel => "PASTEL",
            ColorScheme::Monochrome => "MONO",
            ColorScheme::Rainbow => "RAINBW",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}
