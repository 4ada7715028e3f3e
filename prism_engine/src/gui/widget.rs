/// Widget trait

use glam::Vec2;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;

/// Node of the GUI tree
///
/// Parents are visited before their children in every traversal.
pub trait Widget: Send {
    fn name(&self) -> &str;

    fn resize(&mut self, _size: Vec2) {}

    fn update(&mut self) {}

    fn draw(&self, _device: &mut dyn GraphicsDevice) -> Result<()> {
        Ok(())
    }
}

/// Grouping widget with no drawing of its own
#[derive(Debug, Clone)]
pub struct Panel {
    name: String,
    size: Vec2,
}

impl Panel {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), size: Vec2::ZERO }
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }
}

impl Widget for Panel {
    fn name(&self) -> &str {
        &self.name
    }

    fn resize(&mut self, size: Vec2) {
        self.size = size;
    }
}
