/// Light trait and the explicit light kinds

use glam::Vec3;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::render_state::{LightKind, LightParams, RenderState};
use crate::resource::AABB;

/// A light owned by the `LightManager`
///
/// `params` is what shader drivers see. The pass hooks default to no-ops;
/// lights with visible geometry (flares, volumes) override them.
pub trait Light: Send {
    fn kind(&self) -> LightKind;

    fn name(&self) -> &str;

    fn params(&self) -> LightParams;

    /// Whether the light reaches a mesh with these world-space bounds
    fn affects(&self, _bounds: &AABB) -> bool {
        true
    }

    /// Once per frame, before any `apply_light`
    fn update(&mut self, _device: &mut dyn GraphicsDevice) -> Result<()> {
        Ok(())
    }

    fn draw_background(&self, _render_state: &RenderState, _device: &mut dyn GraphicsDevice) -> Result<()> {
        Ok(())
    }

    fn draw_foreground(&self, _render_state: &RenderState, _device: &mut dyn GraphicsDevice) -> Result<()> {
        Ok(())
    }
}

/// Sphere test shared by point and spot lights; a non-positive range is unbounded
fn within_range(bounds: &AABB, position: Vec3, range: f32) -> bool {
    range <= 0.0 || bounds.intersects_sphere(position, range)
}

// ===== DIRECTIONAL =====

#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub name: String,
    pub color: Vec3,
    pub intensity: f32,
    pub direction: Vec3,
}

impl DirectionalLight {
    pub fn new(name: &str, direction: Vec3) -> Self {
        Self {
            name: name.to_string(),
            color: Vec3::ONE,
            intensity: 1.0,
            direction: direction.normalize_or_zero(),
        }
    }
}

impl Light for DirectionalLight {
    fn kind(&self) -> LightKind {
        LightKind::Directional
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> LightParams {
        LightParams {
            color: self.color,
            intensity: self.intensity,
            direction: self.direction,
            ..LightParams::new(LightKind::Directional)
        }
    }
}

// ===== POINT =====

#[derive(Debug, Clone)]
pub struct PointLight {
    pub name: String,
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub range: f32,
    pub exponent: f32,
}

impl PointLight {
    pub fn new(name: &str, position: Vec3, range: f32) -> Self {
        Self {
            name: name.to_string(),
            color: Vec3::ONE,
            intensity: 1.0,
            position,
            range,
            exponent: 1.0,
        }
    }
}

impl Light for PointLight {
    fn kind(&self) -> LightKind {
        LightKind::Point
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> LightParams {
        LightParams {
            color: self.color,
            intensity: self.intensity,
            position: self.position,
            range: self.range,
            exponent: self.exponent,
            ..LightParams::new(LightKind::Point)
        }
    }

    fn affects(&self, bounds: &AABB) -> bool {
        within_range(bounds, self.position, self.range)
    }
}

// ===== SPOT =====

#[derive(Debug, Clone)]
pub struct SpotLight {
    pub name: String,
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub direction: Vec3,
    pub range: f32,
    pub exponent: f32,
    /// Half-angle in radians
    pub cone_angle: f32,
}

impl SpotLight {
    pub fn new(name: &str, position: Vec3, direction: Vec3, range: f32, cone_angle: f32) -> Self {
        Self {
            name: name.to_string(),
            color: Vec3::ONE,
            intensity: 1.0,
            position,
            direction: direction.normalize_or_zero(),
            range,
            exponent: 1.0,
            cone_angle,
        }
    }
}

impl Light for SpotLight {
    fn kind(&self) -> LightKind {
        LightKind::Spot
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> LightParams {
        LightParams {
            kind: LightKind::Spot,
            color: self.color,
            intensity: self.intensity,
            position: self.position,
            direction: self.direction,
            range: self.range,
            exponent: self.exponent,
            cone_angle: self.cone_angle,
        }
    }

    fn affects(&self, bounds: &AABB) -> bool {
        within_range(bounds, self.position, self.range)
    }
}

// ===== AMBIENT =====

#[derive(Debug, Clone)]
pub struct AmbientLight {
    pub name: String,
    pub color: Vec3,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(name: &str, color: Vec3) -> Self {
        Self { name: name.to_string(), color, intensity: 1.0 }
    }
}

impl Light for AmbientLight {
    fn kind(&self) -> LightKind {
        LightKind::Ambient
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> LightParams {
        LightParams {
            color: self.color,
            intensity: self.intensity,
            ..LightParams::new(LightKind::Ambient)
        }
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
