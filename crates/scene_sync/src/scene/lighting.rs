//! Directional lights extracted from scene descriptions

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Parallel-ray light such as sunlight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLight {
    /// Name from the description, possibly carrying external ids
    pub name: String,
    /// World-space direction the light travels in, normalized
    pub direction: Vec3,
    /// RGB colour in [0, 1]
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Whether the light contributes
    pub enabled: bool,
    /// Whether the light casts shadows
    pub cast_shadows: bool,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            name: String::new(),
            direction: Vec3::new(0.0, -1.0, 0.0),
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            enabled: true,
            cast_shadows: true,
        }
    }
}

impl DirectionalLight {
    /// Create a light with world-space direction
    ///
    /// The direction is normalized; a zero vector falls back to straight down.
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.try_normalize(f32::EPSILON).unwrap_or_else(|| Vec3::new(0.0, -1.0, 0.0)),
            color,
            intensity,
            ..Default::default()
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable or disable shadow casting
    pub fn with_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    /// Re-normalize the direction after deserialization
    pub(crate) fn normalized(mut self) -> Self {
        self.direction = self
            .direction
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| Vec3::new(0.0, -1.0, 0.0));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_directional_light_creation() {
        let light = DirectionalLight::new(Vec3::new(0.0, -2.0, 0.0), Vec3::new(1.0, 0.9, 0.8), 2.5);
        assert_relative_eq!(light.direction, Vec3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(light.intensity, 2.5);
        assert!(light.enabled);
        assert!(light.cast_shadows);
    }

    #[test]
    fn test_zero_direction_points_down() {
        let light = DirectionalLight::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), 1.0);
        assert_relative_eq!(light.direction, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_deserialized_direction_is_normalized() {
        let light: DirectionalLight = ron::from_str("(name: \"n40\", intensity: 0.5)").unwrap();
        assert_eq!(light.name, "n40");
        assert_relative_eq!(light.intensity, 0.5);

        let light = DirectionalLight {
            direction: Vec3::new(3.0, 0.0, 4.0),
            ..light
        }
        .normalized();
        assert_relative_eq!(light.direction, Vec3::new(0.6, 0.0, 0.8), epsilon = 1e-6);
    }
}
