/// Light manager: ordered light list, standard IBL and the light passes
///
/// Lights are processed in insertion order. The standard IBL light is kept
/// apart from the list and contributes the render state's environment.

use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, SharedDevice};
use crate::light::{Light, LightIbl};
use crate::render_state::RenderState;
use crate::resource::Mesh;
use crate::{engine_debug, engine_trace, engine_warn};

new_key_type! {
    /// Handle to a light owned by the `LightManager`
    pub struct LightKey;
}

/// Last pass issued in the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramePhase {
    Updated,
    Background,
    Foreground,
}

pub struct LightManager {
    device: SharedDevice,
    lights: SlotMap<LightKey, Box<dyn Light>>,
    order: Vec<LightKey>,
    standard_ibl: LightIbl,
    phase: FramePhase,
}

impl LightManager {
    pub fn new(device: SharedDevice) -> Self {
        Self {
            device,
            lights: SlotMap::with_key(),
            order: Vec::new(),
            standard_ibl: LightIbl::new("standard"),
            phase: FramePhase::Foreground,
        }
    }

    // ===== LIGHT LIST =====

    /// Append a light; insertion order is processing order
    pub fn add_light(&mut self, light: Box<dyn Light>) -> LightKey {
        engine_debug!("prism::LightManager", "Added {:?} light '{}'", light.kind(), light.name());
        let key = self.lights.insert(light);
        self.order.push(key);
        key
    }

    pub fn remove_light(&mut self, key: LightKey) -> Option<Box<dyn Light>> {
        let light = self.lights.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(light)
    }

    pub fn light(&self, key: LightKey) -> Option<&dyn Light> {
        self.lights.get(key).map(|l| &**l)
    }

    pub fn light_mut(&mut self, key: LightKey) -> Option<&mut (dyn Light + 'static)> {
        self.lights.get_mut(key).map(|l| &mut **l)
    }

    /// Lights in processing order
    pub fn lights(&self) -> impl Iterator<Item = &dyn Light> + '_ {
        self.order.iter().filter_map(|key| self.lights.get(*key).map(|l| &**l))
    }

    pub fn light_count(&self) -> usize {
        self.order.len()
    }

    pub fn clear(&mut self) {
        self.lights.clear();
        self.order.clear();
    }

    pub fn standard_ibl(&self) -> &LightIbl {
        &self.standard_ibl
    }

    pub fn standard_ibl_mut(&mut self) -> &mut LightIbl {
        &mut self.standard_ibl
    }

    // ===== FRAME =====

    /// Per-frame update, before any `apply_light`
    ///
    /// A failing light is logged and the remaining lights still update.
    pub fn update(&mut self) -> Result<()> {
        let mut device = self.device.lock()
            .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))?;
        for key in &self.order {
            if let Some(light) = self.lights.get_mut(*key) {
                if let Err(err) = light.update(&mut *device) {
                    engine_warn!("prism::LightManager", "Light '{}' update failed: {}", light.name(), err);
                }
            }
        }
        if let Err(err) = self.standard_ibl.update(&mut *device) {
            engine_warn!("prism::LightManager", "Standard IBL update failed: {}", err);
        }
        self.phase = FramePhase::Updated;
        Ok(())
    }

    /// Write the lights reaching `mesh` into `render_state`
    ///
    /// Explicit lights go first, in list order, up to the state's capacity;
    /// the standard IBL then becomes the environment. Bounds are taken in
    /// world space using `render_state.world`.
    pub fn apply_light(&self, render_state: &mut RenderState, mesh: &Mesh) {
        render_state.clear_lighting();
        let bounds = mesh.bounds().transformed(&render_state.world);

        for light in self.lights() {
            if !light.affects(&bounds) {
                continue;
            }
            if !render_state.push_light(light.params()) {
                engine_trace!("prism::LightManager",
                    "Render state full ({} lights), dropping the rest for '{}'",
                    render_state.max_lights(), mesh.name());
                break;
            }
        }
        render_state.environment = self.standard_ibl.environment();
    }

    /// Background pass: IBL backdrop, then each light's background
    pub fn draw_background(&mut self, render_state: &RenderState) -> Result<()> {
        let mut device = self.device.lock()
            .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))?;
        if let Err(err) = self.standard_ibl.draw_background(render_state, &mut *device) {
            engine_warn!("prism::LightManager", "Standard IBL background failed: {}", err);
        }
        self.draw_pass(render_state, &mut *device, |light, rs, device| light.draw_background(rs, device));
        self.phase = FramePhase::Background;
        Ok(())
    }

    /// Foreground pass; expected after `draw_background` in the same frame
    pub fn draw_foreground(&mut self, render_state: &RenderState) -> Result<()> {
        if self.phase != FramePhase::Background {
            engine_warn!("prism::LightManager", "draw_foreground issued without a preceding draw_background");
        }
        let mut device = self.device.lock()
            .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))?;
        self.draw_pass(render_state, &mut *device, |light, rs, device| light.draw_foreground(rs, device));
        self.phase = FramePhase::Foreground;
        Ok(())
    }

    fn draw_pass(
        &self,
        render_state: &RenderState,
        device: &mut dyn GraphicsDevice,
        pass: impl Fn(&dyn Light, &RenderState, &mut dyn GraphicsDevice) -> Result<()>,
    ) {
        for light in self.lights() {
            if let Err(err) = pass(light, render_state, &mut *device) {
                engine_warn!("prism::LightManager", "Skipped light '{}': {}", light.name(), err);
            }
        }
    }
}

#[cfg(test)]
#[path = "light_manager_tests.rs"]
mod tests;
