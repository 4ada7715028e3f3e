/*!
# Prism Engine

Resource-management core of the Prism real-time renderer.

Turns raw asset bytes into live engine objects, tracks them by identity and
hands them to the rendering components.

## Architecture

- **ResourceFactory**: format-aware create/release for one resource kind
  (models, textures, shaders), tagged with a 4-byte type code
- **ResourceManager**: path-deduplicated model and texture handles
- **ShaderManager**: shader registry with stable ids and the active bind
- **ShaderDriverManager**: binds parameter drivers to shaders by annotation
- **LightManager**: ordered lights, standard IBL light, light passes
- **GuiManager**: widget tree forwarding resize/update/draw
- **Engine**: explicit context owning all of the above

GPU work goes through the `GraphicsDevice` trait; backends provide the
concrete shader, texture and buffer handles.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod memory;
pub mod graphics_device;
pub mod render_state;
pub mod resource;
pub mod shader;
pub mod light;
pub mod gui;

// Main prism namespace module
pub mod prism {
    // Error types
    pub use crate::error::{Error, Result, PrismError, PrismResult};

    // Engine context and configuration
    pub use crate::engine::Engine;
    pub use crate::config::EngineConfig;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod graphics_device {
        pub use crate::graphics_device::*;
    }

    pub mod memory {
        pub use crate::memory::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod shader {
        pub use crate::shader::*;
    }

    pub mod light {
        pub use crate::light::*;
        pub use crate::render_state::{RenderState, LightKind, LightParams, Environment};
    }

    pub mod gui {
        pub use crate::gui::*;
    }
}

pub use crate::error::{PrismError, PrismResult};

// Re-export math library at crate root
pub use glam;
