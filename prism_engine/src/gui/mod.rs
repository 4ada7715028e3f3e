//! GUI module
//!
//! Widget tree with a single owned root; the manager forwards resize,
//! update and draw through it.

mod widget;
mod gui_manager;

pub use widget::{Widget, Panel};
pub use gui_manager::{GuiManager, WidgetKey};
