//! Canvas colors and the particle palette

use rand::Rng;
use std::fmt;

/// sRGB color with 8-bit channels and a fractional alpha, like CSS `rgba()`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    /// Channels converted to linear space, alpha clamped to `[0, 1]`
    pub fn to_linear(self) -> [f32; 4] {
        fn srgb_to_linear(c: u8) -> f32 {
            let x = c as f32 / 255.0;
            if x <= 0.04045 {
                x / 12.92
            } else {
                ((x + 0.055) / 1.055).powf(2.4)
            }
        }

        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
            self.a.clamp(0.0, 1.0),
        ]
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
    }
}

/// Canvas background, also used for the trailing fade
pub const BACKGROUND: Rgba = Rgba::new(10, 10, 10, 1.0);

/// Stroke color of the lines joining nearby particles
pub const CONNECTION: Rgba = Rgba::new(74, 158, 255, 1.0);

/// One weighted entry of the particle palette
#[derive(Clone, Copy, Debug)]
struct Swatch {
    /// Upper bound of this entry in the cumulative distribution
    cumulative: f32,
    base: Rgba,
    alpha_min: f32,
    alpha_spread: f32,
}

const PALETTE: [Swatch; 3] = [
    Swatch {
        cumulative: 0.6,
        base: Rgba::new(74, 158, 255, 1.0),
        alpha_min: 0.5,
        alpha_spread: 0.5,
    },
    Swatch {
        cumulative: 0.85,
        base: Rgba::new(107, 182, 255, 1.0),
        alpha_min: 0.5,
        alpha_spread: 0.5,
    },
    Swatch {
        cumulative: 1.0,
        base: Rgba::new(138, 196, 255, 1.0),
        alpha_min: 0.4,
        alpha_spread: 0.4,
    },
];

/// Draw a particle color: mostly the primary blue, occasionally a lighter tint
pub fn random_particle_color<R: Rng + ?Sized>(rng: &mut R) -> Rgba {
    let pick = rng.random::<f32>();
    let swatch = PALETTE
        .iter()
        .find(|s| pick < s.cumulative)
        .unwrap_or(&PALETTE[PALETTE.len() - 1]);

    swatch
        .base
        .with_alpha(swatch.alpha_min + rng.random::<f32>() * swatch.alpha_spread)
}
