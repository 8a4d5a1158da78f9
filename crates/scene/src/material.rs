use hotspot_common::Color;

/// How a fragment combines with what is already in the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

/// Unlit surface description shared by the renderer and the hotspot overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    pub blending: Blending,
    pub wireframe: bool,
    /// Front and back faces are both drawn and both pickable.
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            opacity: 1.0,
            transparent: false,
            blending: Blending::Normal,
            wireframe: false,
            double_sided: false,
        }
    }
}

impl Material {
    pub fn basic(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Set opacity; anything below 1.0 makes the material transparent.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.transparent = self.opacity < 1.0;
        self
    }

    pub fn additive(mut self) -> Self {
        self.blending = Blending::Additive;
        self
    }

    pub fn wireframe(mut self) -> Self {
        self.wireframe = true;
        self
    }

    pub fn double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }

    pub fn rgba(&self) -> [f32; 4] {
        self.color.with_alpha(self.opacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_opaque_white() {
        let m = Material::default();
        assert_eq!(m.color, Color::WHITE);
        assert!(!m.transparent);
        assert_eq!(m.blending, Blending::Normal);
    }

    #[test]
    fn opacity_controls_transparency() {
        let m = Material::basic(Color(0x47B1E9)).with_opacity(0.8);
        assert!(m.transparent);
        assert_eq!(m.rgba()[3], 0.8);
        assert!(!m.with_opacity(1.5).transparent);
    }

    #[test]
    fn builder_flags() {
        let m = Material::default().additive().wireframe().double_sided();
        assert_eq!(m.blending, Blending::Additive);
        assert!(m.wireframe);
        assert!(m.double_sided);
    }
}
