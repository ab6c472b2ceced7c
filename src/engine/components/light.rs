use serde::Deserialize;

use crate::engine::utils::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Point,
    Directional,
}

impl LightKind {
    fn w(self) -> f32 {
        match self {
            LightKind::Point => 1.0,
            LightKind::Directional => 0.0,
        }
    }
}

/// Light circling the Y axis. `position` is a point for point lights and a
/// direction for directional ones, told apart by its w component.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub intensity: Vec3,
    pub ambient: Vec3,
    angle: f32,
    radius: f32,
    height: f32,
    speed: f32,
    kind: LightKind,
    position: [f32; 4],
}

impl Light {
    pub fn new(
        intensity: Vec3,
        ambient: Vec3,
        angle: f32,
        radius: f32,
        height: f32,
        speed: f32,
        kind: LightKind
    ) -> Self {
        let mut light = Self {
            intensity,
            ambient,
            angle,
            radius,
            height,
            speed,
            kind,
            position: [0.0; 4],
        };
        light.place();
        light
    }

    /// Moves the light by `speed * step` radians (clockwise for positive
    /// speed).
    pub fn advance(&mut self, step: f32) {
        self.angle -= self.speed * step;
        self.place();
    }

    fn place(&mut self) {
        self.position = [
            self.angle.sin() * self.radius,
            self.height,
            self.angle.cos() * self.radius,
            self.kind.w(),
        ];
    }

    pub fn position(&self) -> [f32; 4] {
        self.position
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }
}

/// Light uniforms for one frame: positions as consecutive 4-vectors,
/// intensities as consecutive 3-vectors and the brightest ambient term per
/// channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedLights {
    pub positions: Vec<f32>,
    pub intensities: Vec<f32>,
    pub ambient: Vec3,
}

pub fn pack_lights(lights: &[Light]) -> PackedLights {
    let mut packed = PackedLights {
        positions: Vec::with_capacity(lights.len() * 4),
        intensities: Vec::with_capacity(lights.len() * 3),
        ambient: [0.0; 3],
    };
    for light in lights {
        packed.positions.extend_from_slice(&light.position);
        packed.intensities.extend_from_slice(&light.intensity);
        for i in 0..3 {
            packed.ambient[i] = packed.ambient[i].max(light.ambient[i]);
        }
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_follows_angle() {
        let light = Light::new([1.0; 3], [0.1; 3], 0.0, 2.0, 0.5, 1.0, LightKind::Point);
        assert_eq!(light.position(), [0.0, 0.5, 2.0, 1.0]);

        let directional = Light::new([1.0; 3], [0.1; 3], 0.0, 2.0, 0.5, 1.0, LightKind::Directional);
        assert_eq!(directional.position()[3], 0.0);
    }

    #[test]
    fn advance_moves_against_speed() {
        let mut light = Light::new([1.0; 3], [0.1; 3], 0.5, 1.0, 0.0, -1.0, LightKind::Point);
        light.advance(0.01);
        assert!((light.angle() - 0.51).abs() < 1e-6);

        let mut still = Light::new([1.0; 3], [0.1; 3], 0.5, 1.0, 0.0, 0.0, LightKind::Point);
        let before = still.position();
        still.advance(0.01);
        assert_eq!(still.position(), before);
    }

    #[test]
    fn packing_concatenates_and_maxes_ambient() {
        let a = Light::new([1.0, 0.0, 0.0], [0.1, 0.5, 0.0], 0.0, 1.0, 0.0, 0.0, LightKind::Point);
        let b = Light::new([0.0, 1.0, 0.0], [0.3, 0.2, 0.0], 0.0, 1.0, 0.0, 0.0, LightKind::Directional);

        let packed = pack_lights(&[a, b]);
        assert_eq!(packed.positions, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(packed.intensities, vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(packed.ambient, [0.3, 0.5, 0.0]);
    }

    #[test]
    fn no_lights_pack_to_zero_ambient() {
        let packed = pack_lights(&[]);
        assert!(packed.positions.is_empty());
        assert_eq!(packed.ambient, [0.0; 3]);
    }
}
