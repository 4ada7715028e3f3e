/// GUI manager: widget arena rooted at a single widget
///
/// Widgets live in a slot map and refer to each other by key, so removing a
/// subtree never leaves a dangling parent or child. Without a root every
/// forwarding call is a no-op.

use glam::Vec2;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::gui::Widget;
use crate::{engine_debug, engine_warn};

new_key_type! {
    /// Handle to a widget in the GUI tree
    pub struct WidgetKey;
}

struct WidgetNode {
    widget: Box<dyn Widget>,
    parent: Option<WidgetKey>,
    children: Vec<WidgetKey>,
}

pub struct GuiManager {
    nodes: SlotMap<WidgetKey, WidgetNode>,
    root: Option<WidgetKey>,
    size: Vec2,
}

impl GuiManager {
    pub fn new() -> Self {
        Self { nodes: SlotMap::with_key(), root: None, size: Vec2::ZERO }
    }

    // ===== TREE =====

    /// Replace the whole tree with a new root
    pub fn set_root(&mut self, widget: Box<dyn Widget>) -> WidgetKey {
        self.nodes.clear();
        let key = self.nodes.insert(WidgetNode { widget, parent: None, children: Vec::new() });
        self.root = Some(key);
        if self.size != Vec2::ZERO {
            if let Some(node) = self.nodes.get_mut(key) {
                node.widget.resize(self.size);
            }
        }
        key
    }

    pub fn root(&self) -> Option<WidgetKey> {
        self.root
    }

    /// Attach a widget under the root; no-op (None) without a root
    pub fn add_widget(&mut self, widget: Box<dyn Widget>) -> Option<WidgetKey> {
        let Some(root) = self.root else {
            engine_warn!("prism::GuiManager", "Dropping widget '{}': no root widget", widget.name());
            return None;
        };
        self.add_child(root, widget)
    }

    /// Attach a widget under `parent`
    pub fn add_child(&mut self, parent: WidgetKey, mut widget: Box<dyn Widget>) -> Option<WidgetKey> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        if self.size != Vec2::ZERO {
            widget.resize(self.size);
        }
        engine_debug!("prism::GuiManager", "Added widget '{}'", widget.name());
        let key = self.nodes.insert(WidgetNode { widget, parent: Some(parent), children: Vec::new() });
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(key);
        }
        Some(key)
    }

    /// Move a widget (and its subtree) under a new parent
    pub fn reparent(&mut self, key: WidgetKey, new_parent: WidgetKey) -> Result<()> {
        if !self.nodes.contains_key(key) || !self.nodes.contains_key(new_parent) {
            return Err(Error::NotFound("widget".to_string()));
        }
        if self.is_ancestor_or_self(key, new_parent) {
            return Err(Error::InvalidState("cannot move a widget under its own subtree".to_string()));
        }

        if let Some(old_parent) = self.nodes.get(key).and_then(|n| n.parent) {
            if let Some(node) = self.nodes.get_mut(old_parent) {
                node.children.retain(|k| *k != key);
            }
        }
        if let Some(node) = self.nodes.get_mut(new_parent) {
            node.children.push(key);
        }
        if let Some(node) = self.nodes.get_mut(key) {
            node.parent = Some(new_parent);
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: WidgetKey, mut key: WidgetKey) -> bool {
        loop {
            if key == ancestor {
                return true;
            }
            match self.nodes.get(key).and_then(|n| n.parent) {
                Some(parent) => key = parent,
                None => return false,
            }
        }
    }

    /// Remove a widget and its subtree; returns the widget itself
    pub fn remove_widget(&mut self, key: WidgetKey) -> Option<Box<dyn Widget>> {
        let parent = self.nodes.get(key)?.parent;
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.retain(|k| *k != key);
            }
        }
        if self.root == Some(key) {
            self.root = None;
        }

        let subtree = self.collect_from(key);
        let mut removed = None;
        for k in subtree {
            if let Some(node) = self.nodes.remove(k) {
                if k == key {
                    removed = Some(node.widget);
                }
            }
        }
        removed
    }

    pub fn widget(&self, key: WidgetKey) -> Option<&dyn Widget> {
        self.nodes.get(key).map(|n| &*n.widget)
    }

    pub fn widget_mut(&mut self, key: WidgetKey) -> Option<&mut (dyn Widget + 'static)> {
        self.nodes.get_mut(key).map(|n| &mut *n.widget)
    }

    pub fn parent(&self, key: WidgetKey) -> Option<WidgetKey> {
        self.nodes.get(key)?.parent
    }

    pub fn children(&self, key: WidgetKey) -> &[WidgetKey] {
        match self.nodes.get(key) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    pub fn widget_count(&self) -> usize {
        self.nodes.len()
    }

    /// Pre-order keys of the subtree rooted at `key`
    fn collect_from(&self, key: WidgetKey) -> Vec<WidgetKey> {
        let mut order = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.get(k) {
                order.push(k);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    fn traversal(&self) -> Vec<WidgetKey> {
        self.root.map(|root| self.collect_from(root)).unwrap_or_default()
    }

    // ===== FORWARDING =====

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn resize(&mut self, size: Vec2) {
        self.size = size;
        for key in self.traversal() {
            if let Some(node) = self.nodes.get_mut(key) {
                node.widget.resize(size);
            }
        }
    }

    pub fn update(&mut self) {
        for key in self.traversal() {
            if let Some(node) = self.nodes.get_mut(key) {
                node.widget.update();
            }
        }
    }

    /// Draw parents before children; a failing widget is logged and skipped
    pub fn draw(&self, device: &mut dyn GraphicsDevice) {
        for key in self.traversal() {
            if let Some(node) = self.nodes.get(key) {
                if let Err(err) = node.widget.draw(device) {
                    engine_warn!("prism::GuiManager", "Widget '{}' failed to draw: {}", node.widget.name(), err);
                }
            }
        }
    }
}

impl Default for GuiManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "gui_manager_tests.rs"]
mod tests;
