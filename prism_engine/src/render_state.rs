/// Per-draw render state filled by the light manager and read by shader drivers

use std::fmt;
use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::graphics_device::Texture;

/// Kind of an explicit light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
    Ambient,
}

/// Shader-facing parameters of one light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    /// World position (point, spot)
    pub position: Vec3,
    /// Normalized direction (directional, spot)
    pub direction: Vec3,
    /// Influence radius (point, spot)
    pub range: f32,
    /// Distance falloff exponent (point, spot)
    pub exponent: f32,
    /// Half-angle of the cone in radians (spot)
    pub cone_angle: f32,
}

impl LightParams {
    pub fn new(kind: LightKind) -> Self {
        Self {
            kind,
            color: Vec3::ONE,
            intensity: 1.0,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Y,
            range: 0.0,
            exponent: 1.0,
            cone_angle: 0.0,
        }
    }
}

/// Image-based environment contribution (from the standard IBL light)
#[derive(Clone)]
pub struct Environment {
    pub specular: Option<Arc<dyn Texture>>,
    pub diffuse: Option<Arc<dyn Texture>>,
    pub brdf_lut: Option<Arc<dyn Texture>>,
    pub intensity: f32,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |t: &Option<Arc<dyn Texture>>| t.as_ref().map(|t| t.name().to_string());
        f.debug_struct("Environment")
            .field("specular", &name(&self.specular))
            .field("diffuse", &name(&self.diffuse))
            .field("brdf_lut", &name(&self.brdf_lut))
            .field("intensity", &self.intensity)
            .finish()
    }
}

/// State consumed by shader drivers for one draw
#[derive(Debug, Clone)]
pub struct RenderState {
    pub view: Mat4,
    pub projection: Mat4,
    pub world: Mat4,
    pub eye_position: Vec3,
    /// Explicit lights affecting the current mesh, in light list order
    pub lights: Vec<LightParams>,
    pub environment: Option<Environment>,
    max_lights: usize,
}

impl RenderState {
    pub fn new(max_lights: usize) -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
            eye_position: Vec3::ZERO,
            lights: Vec::new(),
            environment: None,
            max_lights,
        }
    }

    pub fn max_lights(&self) -> usize {
        self.max_lights
    }

    pub fn set_camera(&mut self, view: Mat4, projection: Mat4, eye_position: Vec3) {
        self.view = view;
        self.projection = projection;
        self.eye_position = eye_position;
    }

    pub fn world_view_projection(&self) -> Mat4 {
        self.projection * self.view * self.world
    }

    pub fn inverse_view(&self) -> Mat4 {
        self.view.inverse()
    }

    /// Append a light; false when the state is already full
    pub fn push_light(&mut self, params: LightParams) -> bool {
        if self.lights.len() >= self.max_lights {
            return false;
        }
        self.lights.push(params);
        true
    }

    /// Drop lights and environment from the previous mesh
    pub fn clear_lighting(&mut self) {
        self.lights.clear();
        self.environment = None;
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(8)
    }
}
