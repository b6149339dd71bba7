//! Operator selection.
//!
//! Clicking a grouped fragment selects or deselects the whole group, the same
//! way the canvas treats a group as one object.

use crate::registry::FragmentRegistry;
use papyrlab_core::FragmentId;

/// Ordered set of selected fragment ids (selection order is kept).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<FragmentId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[FragmentId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: FragmentId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Adds an id if it is not selected yet.
    pub fn add(&mut self, id: FragmentId) {
        if !self.contains(id) {
            self.ids.push(id);
        }
    }

    /// Drops an id, e.g. after the fragment was deleted.
    pub fn remove(&mut self, id: FragmentId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&other| other != id);
        self.ids.len() != before
    }

    /// Toggles the fragment under `(x, y)`, or its whole group.
    ///
    /// Clicking on empty canvas clears the selection. Returns the id that was
    /// hit, if any.
    pub fn toggle_at(&mut self, registry: &FragmentRegistry, x: f64, y: f64) -> Option<FragmentId> {
        let Some(hit) = registry.fragment_at(x, y).map(|f| f.id) else {
            self.clear();
            return None;
        };

        let targets: Vec<FragmentId> = match registry.fragments_of_group(hit) {
            Some(members) => members.iter().copied().collect(),
            None => vec![hit],
        };

        if self.contains(hit) {
            self.ids.retain(|id| !targets.contains(id));
        } else {
            for id in targets {
                self.add(id);
            }
        }
        Some(hit)
    }

    /// Translates every selected fragment by `(dx, dy)`.
    pub fn move_by(&self, registry: &mut FragmentRegistry, dx: i32, dy: i32) {
        registry.translate_fragments(&self.ids, dx, dy);
    }
}
