use slotmap::SlotMap;

use super::PipelineSource;
use super::item::{ItemId, ItemKind, PipelineItem, ShaderPass};
use crate::errors::{Result, ShaderLabError};

/// Owner of the user-authored item list.
///
/// Items are stored in a [`SlotMap`]; the top-level render sequence is an
/// ordered list of ids. Child items (geometry, state changes) are listed by
/// their parent pass.
#[derive(Debug, Default)]
pub struct PipelineManager {
    items: SlotMap<ItemId, PipelineItem>,
    order: Vec<ItemId>,
}

impl PipelineManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a shader pass to the end of the sequence.
    pub fn add_pass(&mut self, name: impl Into<String>, pass: ShaderPass) -> ItemId {
        self.add_item(name, ItemKind::ShaderPass(pass))
    }

    /// Appends any item to the top-level sequence.
    ///
    /// Only shader passes are rendered at top level; other kinds are kept in
    /// the sequence but reported by the engine.
    pub fn add_item(&mut self, name: impl Into<String>, kind: ItemKind) -> ItemId {
        let id = self.items.insert(PipelineItem::new(name, kind));
        self.order.push(id);
        id
    }

    /// Inserts a shader pass so that it ends up at `index`.
    pub fn insert_pass(
        &mut self,
        index: usize,
        name: impl Into<String>,
        pass: ShaderPass,
    ) -> Result<ItemId> {
        self.insert_item(index, name, ItemKind::ShaderPass(pass))
    }

    pub fn insert_item(
        &mut self,
        index: usize,
        name: impl Into<String>,
        kind: ItemKind,
    ) -> Result<ItemId> {
        if index > self.order.len() {
            return Err(ShaderLabError::IndexOutOfBounds {
                context: "insert pipeline item",
                index,
                len: self.order.len(),
            });
        }
        let id = self.items.insert(PipelineItem::new(name, kind));
        self.order.insert(index, id);
        Ok(id)
    }

    /// Appends a child item to the pass `parent`.
    pub fn add_child(
        &mut self,
        parent: ItemId,
        name: impl Into<String>,
        kind: ItemKind,
    ) -> Result<ItemId> {
        let name = name.into();
        if matches!(kind, ItemKind::ShaderPass(_)) {
            return Err(ShaderLabError::InvalidChild(name));
        }

        let parent_item = self
            .items
            .get(parent)
            .ok_or_else(|| ShaderLabError::ItemNotFound(format!("{parent:?}")))?;
        if parent_item.as_shader_pass().is_none() {
            return Err(ShaderLabError::NotAShaderPass(parent_item.name.clone()));
        }

        let id = self.items.insert(PipelineItem::new(name, kind));
        if let Some(pass) = self.items.get_mut(parent).and_then(PipelineItem::as_shader_pass_mut) {
            pass.items.push(id);
        }
        Ok(id)
    }

    /// Removes an item. Removing a pass also removes its children.
    pub fn remove(&mut self, id: ItemId) -> Result<PipelineItem> {
        let item = self
            .items
            .remove(id)
            .ok_or_else(|| ShaderLabError::ItemNotFound(format!("{id:?}")))?;

        if let Some(pass) = item.as_shader_pass() {
            for child in &pass.items {
                self.items.remove(*child);
            }
        }

        if let Some(pos) = self.order.iter().position(|&other| other == id) {
            self.order.remove(pos);
        } else {
            for parent in self.items.values_mut() {
                if let Some(pass) = parent.as_shader_pass_mut() {
                    pass.items.retain(|&child| child != id);
                }
            }
        }

        Ok(item)
    }

    /// Moves a top-level item to position `to`.
    pub fn move_item(&mut self, id: ItemId, to: usize) -> Result<()> {
        let from = self.position(id)?;
        if to >= self.order.len() {
            return Err(ShaderLabError::IndexOutOfBounds {
                context: "move pipeline item",
                index: to,
                len: self.order.len(),
            });
        }
        let id = self.order.remove(from);
        self.order.insert(to, id);
        Ok(())
    }

    /// Swaps a top-level item with its predecessor. Returns `false` if it is
    /// already first.
    pub fn move_up(&mut self, id: ItemId) -> Result<bool> {
        let pos = self.position(id)?;
        if pos == 0 {
            return Ok(false);
        }
        self.order.swap(pos, pos - 1);
        Ok(true)
    }

    /// Swaps a top-level item with its successor. Returns `false` if it is
    /// already last.
    pub fn move_down(&mut self, id: ItemId) -> Result<bool> {
        let pos = self.position(id)?;
        if pos + 1 >= self.order.len() {
            return Ok(false);
        }
        self.order.swap(pos, pos + 1);
        Ok(true)
    }

    /// Index of a top-level item in the sequence.
    pub fn position(&self, id: ItemId) -> Result<usize> {
        self.order
            .iter()
            .position(|&other| other == id)
            .ok_or_else(|| ShaderLabError::ItemNotFound(format!("{id:?}")))
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&PipelineItem> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut PipelineItem> {
        self.items.get_mut(id)
    }

    /// First item (top-level or child) with the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<ItemId> {
        self.items
            .iter()
            .find(|(_, item)| item.name == name)
            .map(|(id, _)| id)
    }

    pub fn rename(&mut self, id: ItemId, name: impl Into<String>) -> Result<()> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| ShaderLabError::ItemNotFound(format!("{id:?}")))?;
        item.name = name.into();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
    }

    /// Top-level ids in render order.
    #[must_use]
    pub fn list(&self) -> &[ItemId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(id)
    }
}

impl PipelineSource for PipelineManager {
    fn ordered_items(&self) -> &[ItemId] {
        &self.order
    }

    fn item(&self, id: ItemId) -> Option<&PipelineItem> {
        self.items.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::create_triangle;
    use crate::pipeline::GeometryItem;

    fn pass() -> ShaderPass {
        ShaderPass::new("a.wgsl", "vs_main", "a.wgsl", "fs_main")
    }

    #[test]
    fn removing_a_pass_removes_its_children() {
        let mut manager = PipelineManager::new();
        let p = manager.add_pass("P", pass());
        let child = manager
            .add_child(p, "tri", ItemKind::Geometry(GeometryItem::new(create_triangle(1.0))))
            .unwrap();

        manager.remove(p).unwrap();
        assert!(!manager.contains(child));
        assert!(manager.is_empty());
    }

    #[test]
    fn removing_a_child_detaches_it_from_the_parent() {
        let mut manager = PipelineManager::new();
        let p = manager.add_pass("P", pass());
        let child = manager
            .add_child(p, "tri", ItemKind::Geometry(GeometryItem::new(create_triangle(1.0))))
            .unwrap();

        manager.remove(child).unwrap();
        let parent = manager.get(p).unwrap().as_shader_pass().unwrap();
        assert!(parent.items.is_empty());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn move_up_at_front_is_a_no_op() {
        let mut manager = PipelineManager::new();
        let a = manager.add_pass("A", pass());
        let b = manager.add_pass("B", pass());

        assert!(!manager.move_up(a).unwrap());
        assert!(manager.move_up(b).unwrap());
        assert_eq!(manager.list(), &[b, a]);
        assert!(!manager.move_down(a).unwrap());
    }
}
