//! Surface and density properties, with named presets.

/// An 8-bit RGBA colour used by drawing code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha (255 is opaque).
    pub a: u8,
}

impl Color {
    /// Opaque colour from RGB.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Opaque white.
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Color = Color::rgb(0, 0, 0);
}

/// Density and contact properties of an entity.
///
/// Equality is field-wise: two independently built materials with the
/// same numbers compare equal.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Mass per unit area.
    pub density: f64,
    /// Coefficient of restitution in `[0, 1]`.
    pub restitution: f64,
    /// Static friction coefficient.
    pub static_friction: f64,
    /// Dynamic friction coefficient.
    pub dynamic_friction: f64,
    /// Stroke colour.
    pub outline: Color,
    /// Fill colour.
    pub fill: Color,
}

impl Material {
    /// Names accepted by [`Material::preset`].
    pub const PRESETS: [&'static str; 6] = ["rock", "wood", "metal", "rubber", "ice", "bouncy"];

    /// A custom material with neutral colours.
    pub fn new(density: f64, restitution: f64, static_friction: f64, dynamic_friction: f64) -> Self {
        Self {
            density,
            restitution,
            static_friction,
            dynamic_friction,
            outline: Color::WHITE,
            fill: Color::rgb(128, 128, 128),
        }
    }

    /// Replace both colours.
    pub fn with_colors(mut self, outline: Color, fill: Color) -> Self {
        self.outline = outline;
        self.fill = fill;
        self
    }

    /// Look a preset up by name.
    pub fn preset(name: &str) -> Option<Material> {
        match name {
            "rock" => Some(Self::rock()),
            "wood" => Some(Self::wood()),
            "metal" => Some(Self::metal()),
            "rubber" => Some(Self::rubber()),
            "ice" => Some(Self::ice()),
            "bouncy" => Some(Self::bouncy()),
            _ => None,
        }
    }

    /// Dense, dull and grippy.
    pub fn rock() -> Self {
        Self::new(2.6, 0.2, 0.8, 0.6).with_colors(Color::rgb(90, 90, 90), Color::rgb(140, 135, 130))
    }

    /// Light with moderate bounce.
    pub fn wood() -> Self {
        Self::new(0.7, 0.4, 0.5, 0.35).with_colors(Color::rgb(90, 60, 30), Color::rgb(170, 120, 70))
    }

    /// Very dense, little bounce.
    pub fn metal() -> Self {
        Self::new(7.8, 0.15, 0.6, 0.4).with_colors(Color::rgb(60, 70, 80), Color::rgb(180, 190, 200))
    }

    /// High restitution and friction.
    pub fn rubber() -> Self {
        Self::new(1.1, 0.85, 1.0, 0.8).with_colors(Color::rgb(20, 20, 20), Color::rgb(50, 50, 55))
    }

    /// Nearly frictionless.
    pub fn ice() -> Self {
        Self::new(0.9, 0.05, 0.1, 0.03).with_colors(Color::rgb(150, 200, 230), Color::rgb(210, 235, 250))
    }

    /// Almost perfectly elastic.
    pub fn bouncy() -> Self {
        Self::new(1.0, 0.95, 0.4, 0.3).with_colors(Color::rgb(150, 20, 90), Color::rgb(240, 80, 160))
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(1.0, 0.5, 0.5, 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        let a = Material::new(1.0, 0.5, 0.5, 0.3);
        let b = Material::default();
        assert_eq!(a, b);
        assert_ne!(Material::rock(), Material::wood());
    }

    #[test]
    fn every_preset_name_resolves() {
        for name in Material::PRESETS {
            let m = Material::preset(name).unwrap();
            assert!(m.density > 0.0, "{name}");
            assert!((0.0..=1.0).contains(&m.restitution), "{name}");
        }
        assert!(Material::preset("cheese").is_none());
        assert_eq!(Material::preset("metal"), Some(Material::metal()));
    }
}
